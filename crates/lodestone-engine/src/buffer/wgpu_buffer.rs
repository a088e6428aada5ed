use crate::device::call::{call, report};
use crate::device::{ids, DebugMessage, GpuError};
use crate::render::RenderCtx;

use super::upload::GpuBuffer;

/// Smallest allocation made on growth.
const MIN_CAPACITY: u64 = 256;

/// [`GpuBuffer`] backed by a `wgpu::Buffer`.
///
/// Starts unallocated. Growth rounds up to the next power of two so steady
/// producers settle into sub-range writes.
pub struct WgpuBuffer {
    device: wgpu::Device,
    queue: wgpu::Queue,
    usage: wgpu::BufferUsages,
    label: &'static str,
    buffer: Option<wgpu::Buffer>,
    capacity: u64,
}

impl WgpuBuffer {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        usage: wgpu::BufferUsages,
        label: &'static str,
    ) -> Self {
        Self {
            device: device.clone(),
            queue: queue.clone(),
            usage: usage | wgpu::BufferUsages::COPY_DST,
            label,
            buffer: None,
            capacity: 0,
        }
    }

    pub fn vertex(ctx: &RenderCtx<'_>, label: &'static str) -> Self {
        Self::new(ctx.device, ctx.queue, wgpu::BufferUsages::VERTEX, label)
    }

    pub fn index(ctx: &RenderCtx<'_>, label: &'static str) -> Self {
        Self::new(ctx.device, ctx.queue, wgpu::BufferUsages::INDEX, label)
    }

    /// The underlying buffer, once something has been uploaded.
    pub fn raw(&self) -> Option<&wgpu::Buffer> {
        self.buffer.as_ref()
    }

    fn check_alignment(&self, offset: u64, len: u64) -> bool {
        let align = wgpu::COPY_BUFFER_ALIGNMENT;
        if offset % align != 0 || len % align != 0 {
            report(DebugMessage::api_error(
                ids::MISALIGNED,
                format!("{}: copy of {len} bytes at offset {offset} is not {align}-byte aligned", self.label),
            ));
            return false;
        }
        true
    }
}

impl GpuBuffer for WgpuBuffer {
    fn capacity(&self) -> u64 {
        self.capacity
    }

    #[track_caller]
    fn reallocate(&mut self, contents: &[u8]) -> Result<(), GpuError> {
        call(|| {
            let len = contents.len() as u64;
            let max = self.device.limits().max_buffer_size;
            if len > max {
                report(DebugMessage::api_error(
                    ids::TOO_LARGE,
                    format!("{}: {len} bytes exceeds the device limit of {max}", self.label),
                ));
                return;
            }
            if !self.check_alignment(0, len) {
                return;
            }

            let size = len.next_power_of_two().max(MIN_CAPACITY).min(max);
            let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(self.label),
                size,
                usage: self.usage,
                mapped_at_creation: false,
            });
            self.queue.write_buffer(&buffer, 0, contents);

            log::debug!("{}: reallocated {} -> {size} bytes", self.label, self.capacity);
            self.buffer = Some(buffer);
            self.capacity = size;
        })
    }

    #[track_caller]
    fn write(&mut self, offset: u64, contents: &[u8]) -> Result<(), GpuError> {
        call(|| {
            let len = contents.len() as u64;
            let Some(buffer) = self.buffer.as_ref() else {
                report(DebugMessage::api_error(
                    ids::NOT_ALLOCATED,
                    format!("{}: write before first allocation", self.label),
                ));
                return;
            };
            if offset + len > self.capacity {
                report(DebugMessage::api_error(
                    ids::OUT_OF_BOUNDS,
                    format!(
                        "{}: write of {len} bytes at offset {offset} overruns {} bytes",
                        self.label, self.capacity
                    ),
                ));
                return;
            }
            if !self.check_alignment(offset, len) {
                return;
            }
            self.queue.write_buffer(buffer, offset, contents);
        })
    }
}
