//! Shared geometry buffers.
//!
//! Many independent producers (quads) write into one contiguous vertex store
//! through [`Connection`]s. Each connection owns a stable [`Key`]; the store
//! compacts on erase, so the physical position behind a key may change and is
//! re-resolved lazily.
//!
//! Locking:
//! - structural operations (`connect`, `erase`, `read`) take the exclusive side
//!   of the buffer lock and wait for in-flight per-handle writes to finish
//! - per-handle writes take the shared side plus their slot's own mutex, so
//!   writes through different connections never wait on each other
//! - every wait is bounded by the buffer's lock timeout
//!
//! Index values handed to the GPU are "virtual": a producer binds a base to its
//! key, and uploads translate `base + offset` into the group's current physical
//! position through an [`IndexResolver`].

mod connection;
mod error;
mod index;
mod layout;
mod resolve;
mod sync;
mod upload;
mod vertex;
mod wgpu_buffer;

pub use connection::Connection;
pub use error::{BufferError, OutOfRangeAccess};
pub use index::{IndexBuffer, SharedIndexBuffer};
pub use layout::{BufferLayout, VertexScalar};
pub use resolve::{Identity, IndexResolver};
pub use sync::{
    BufferSnapshot, HandleId, HandlerLock, Key, Relocation, SynchronizedBuffer,
    DEFAULT_LOCK_TIMEOUT,
};
pub use upload::{upload, GpuBuffer, HostBuffer, UploadKind, UploadOp};
pub use vertex::Vertex;
pub use wgpu_buffer::WgpuBuffer;
