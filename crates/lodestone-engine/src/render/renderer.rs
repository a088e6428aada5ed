use bytemuck::Pod;

use crate::buffer::{BufferError, SharedIndexBuffer, WgpuBuffer};
use crate::paint::Color;
use crate::render::{RenderTarget, Shader, VertexArray};

/// Stateless draw helpers over a [`RenderTarget`].
pub struct Renderer;

impl Renderer {
    /// Clears the whole target to `color`.
    pub fn clear(target: &mut RenderTarget<'_>, color: Color) {
        let _pass = target.begin_pass("lodestone clear pass", Some(color.into()));
    }

    /// Uploads pending geometry and draws every live index as triangles.
    ///
    /// Locks `indices` for the whole call, then snapshots the vertex store;
    /// producers block on neither for longer than the upload.
    pub fn draw<T: Pod + Send, const N: usize>(
        target: &mut RenderTarget<'_>,
        vao: &mut VertexArray<T, N, WgpuBuffer>,
        indices: &SharedIndexBuffer<WgpuBuffer>,
        shader: &Shader,
        bindings: &wgpu::BindGroup,
    ) -> Result<u32, BufferError> {
        let mut ibo = indices.lock();
        let count = vao.sync(&mut ibo)?;
        if count == 0 {
            return Ok(0);
        }

        let (Some(vertex_buffer), Some(index_buffer)) = (vao.buffer().raw(), ibo.backend().raw()) else {
            log::warn!("draw skipped: {count} indices but no GPU buffers yet");
            return Ok(0);
        };

        let mut pass = target.begin_pass("lodestone quad pass", None);
        pass.set_pipeline(shader.pipeline());
        pass.set_bind_group(0, bindings, &[]);
        pass.set_vertex_buffer(0, vertex_buffer.slice(..));
        pass.set_index_buffer(index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        pass.draw_indexed(0..count, 0, 0..1);

        Ok(count)
    }
}
