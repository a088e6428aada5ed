use crate::device::call::{call, report};
use crate::device::ids;
use crate::device::{DebugMessage, GpuError};

/// GPU-side storage that geometry is uploaded into.
pub trait GpuBuffer {
    /// Allocated size in bytes.
    fn capacity(&self) -> u64;

    /// Replaces the storage with a new allocation of at least
    /// `contents.len()` bytes, initialized from `contents`.
    fn reallocate(&mut self, contents: &[u8]) -> Result<(), GpuError>;

    /// Overwrites `contents.len()` bytes starting at `offset`.
    fn write(&mut self, offset: u64, contents: &[u8]) -> Result<(), GpuError>;
}

/// How an upload reached the GPU.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum UploadKind {
    /// The data outgrew the allocation; the buffer was recreated.
    Reallocated,
    /// The data fit; written in place from offset 0.
    SubRange,
    /// Nothing to upload.
    Skipped,
}

/// Uploads `bytes` to the start of `buffer`, growing it only when needed.
#[track_caller]
pub fn upload<B: GpuBuffer + ?Sized>(buffer: &mut B, bytes: &[u8]) -> Result<UploadKind, GpuError> {
    if bytes.is_empty() {
        return Ok(UploadKind::Skipped);
    }
    if bytes.len() as u64 > buffer.capacity() {
        buffer.reallocate(bytes)?;
        Ok(UploadKind::Reallocated)
    } else {
        buffer.write(0, bytes)?;
        Ok(UploadKind::SubRange)
    }
}

// ── host backend ──────────────────────────────────────────────────────────

/// One operation recorded by a [`HostBuffer`].
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum UploadOp {
    Reallocate { size: u64 },
    Write { offset: u64, len: u64 },
}

/// CPU-memory [`GpuBuffer`] that records every operation.
///
/// Used for headless runs and to observe upload behavior in tests.
#[derive(Debug, Clone, Default)]
pub struct HostBuffer {
    data: Vec<u8>,
    ops: Vec<UploadOp>,
}

impl HostBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> &[u8] {
        &self.data
    }

    /// Contents reinterpreted as `u32` values (index buffers).
    pub fn to_u32s(&self) -> Vec<u32> {
        self.data
            .chunks_exact(4)
            .map(|c| u32::from_ne_bytes([c[0], c[1], c[2], c[3]]))
            .collect()
    }

    pub fn ops(&self) -> &[UploadOp] {
        &self.ops
    }

    pub fn take_ops(&mut self) -> Vec<UploadOp> {
        std::mem::take(&mut self.ops)
    }
}

impl GpuBuffer for HostBuffer {
    fn capacity(&self) -> u64 {
        self.data.len() as u64
    }

    #[track_caller]
    fn reallocate(&mut self, contents: &[u8]) -> Result<(), GpuError> {
        call(|| {
            self.data = contents.to_vec();
            self.ops.push(UploadOp::Reallocate { size: contents.len() as u64 });
        })
    }

    #[track_caller]
    fn write(&mut self, offset: u64, contents: &[u8]) -> Result<(), GpuError> {
        call(|| {
            let end = offset + contents.len() as u64;
            if end > self.data.len() as u64 {
                report(DebugMessage::api_error(
                    ids::OUT_OF_BOUNDS,
                    format!("write of {} bytes at offset {offset} overruns a {}-byte buffer", contents.len(), self.data.len()),
                ));
                return;
            }
            self.data[offset as usize..end as usize].copy_from_slice(contents);
            self.ops.push(UploadOp::Write { offset, len: contents.len() as u64 });
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn growth_reallocates_and_shrink_writes_in_place() {
        let mut buf = HostBuffer::new();

        assert_eq!(upload(&mut buf, &[1; 8]).unwrap(), UploadKind::Reallocated);
        assert_eq!(upload(&mut buf, &[2; 8]).unwrap(), UploadKind::SubRange);
        assert_eq!(upload(&mut buf, &[3; 4]).unwrap(), UploadKind::SubRange);
        assert_eq!(upload(&mut buf, &[4; 12]).unwrap(), UploadKind::Reallocated);

        assert_eq!(
            buf.ops(),
            &[
                UploadOp::Reallocate { size: 8 },
                UploadOp::Write { offset: 0, len: 8 },
                UploadOp::Write { offset: 0, len: 4 },
                UploadOp::Reallocate { size: 12 },
            ]
        );
        assert_eq!(buf.contents(), &[4; 12]);
    }

    #[test]
    fn empty_upload_is_skipped() {
        let mut buf = HostBuffer::new();
        assert_eq!(upload(&mut buf, &[]).unwrap(), UploadKind::Skipped);
        assert!(buf.ops().is_empty());
    }

    #[test]
    fn overrun_is_reported_as_gpu_error() {
        let mut buf = HostBuffer::new();
        upload(&mut buf, &[0; 4]).unwrap();

        let err = buf.write(2, &[0; 4]).unwrap_err();
        assert_eq!(err.id, ids::OUT_OF_BOUNDS);
        assert!(err.location.file().ends_with("upload.rs"));
        assert_eq!(buf.ops().len(), 1);
    }
}
