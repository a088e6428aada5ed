use std::time::Duration;

use crate::device::GpuError;

use super::sync::Key;

/// Access to a slot or index id that does not exist.
///
/// Soft failure: per-call updates log it and carry on.
#[derive(Debug, Copy, Clone, Eq, PartialEq, thiserror::Error)]
pub enum OutOfRangeAccess {
    #[error("no element group for key {0}")]
    Key(Key),
    #[error("no index with id {0}")]
    IndexId(u32),
    #[error("group {key} does not belong to handle {handle}")]
    NotOwner { key: Key, handle: usize },
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum BufferError {
    #[error("{op}: gave up after {waited:?} waiting for the buffer lock ({busy} handler(s) mid-write)")]
    LockTimeout {
        op: &'static str,
        waited: Duration,
        busy: usize,
    },

    #[error(transparent)]
    OutOfRange(#[from] OutOfRangeAccess),

    #[error(transparent)]
    Gpu(#[from] GpuError),
}
