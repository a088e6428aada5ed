//! GPU device, window surface, and GPU error attribution.
//!
//! [`Gpu`] owns the wgpu device and the surface it presents to. [`call()`] wraps
//! GPU work so that problems reported during it come back as a [`GpuError`]
//! naming the caller.

pub mod call;
mod context;
mod error;
mod frame;
mod init;

pub use call::{call, capture_device_errors, report};
pub use context::Gpu;
pub use error::{ids, DebugMessage, GpuError, MessageKind, MessageSource, Severity, SurfaceErrorAction};
pub use frame::GpuFrame;
pub use init::GpuInit;
