use std::sync::Arc;

use bytemuck::Pod;

use crate::buffer::{upload, BufferError, BufferLayout, GpuBuffer, IndexBuffer, SynchronizedBuffer};

/// Pairs a shared vertex store with the GPU buffer it is mirrored into.
pub struct VertexArray<T: Pod + Send, const N: usize, B> {
    source: Arc<SynchronizedBuffer<T, N>>,
    layout: BufferLayout,
    buffer: B,
    groups: usize,
}

impl<T: Pod + Send, const N: usize, B: GpuBuffer> VertexArray<T, N, B> {
    pub fn new(source: Arc<SynchronizedBuffer<T, N>>, layout: BufferLayout, buffer: B) -> Self {
        Self {
            source,
            layout,
            buffer,
            groups: 0,
        }
    }

    /// Uploads a snapshot of the store, then refreshes `indices` against the
    /// same snapshot so both agree on physical positions.
    ///
    /// The caller must already hold `indices` (index buffer before vertex
    /// store). Returns the number of indices to draw.
    pub fn sync<I: GpuBuffer>(&mut self, indices: &mut IndexBuffer<I>) -> Result<u32, BufferError> {
        let snapshot = self.source.read()?;
        upload(&mut self.buffer, snapshot.as_bytes())?;
        self.groups = snapshot.len();
        indices.refresh(&snapshot)?;
        drop(snapshot);

        Ok(indices.len() as u32)
    }

    pub fn source(&self) -> &Arc<SynchronizedBuffer<T, N>> {
        &self.source
    }

    pub fn layout(&self) -> &BufferLayout {
        &self.layout
    }

    pub fn buffer(&self) -> &B {
        &self.buffer
    }

    /// Groups in the last uploaded snapshot.
    pub fn groups(&self) -> usize {
        self.groups
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::{HostBuffer, Vertex};
    use crate::primitives::{quad_fan, Quad, QuadDesc, QuadVertices};

    #[test]
    fn sync_uploads_vertices_and_resolved_indices_together() {
        let vertices = Arc::new(QuadVertices::new());
        let indices = IndexBuffer::with_resolver(HostBuffer::new(), vertices.clone()).into_shared();
        let mut vao = VertexArray::new(vertices.clone(), Vertex::layout(), HostBuffer::new());

        let first = Quad::new(QuadDesc::default(), &vertices, &indices).unwrap();
        let second = Quad::new(
            QuadDesc {
                texture_layer: 3,
                ..QuadDesc::default()
            },
            &vertices,
            &indices,
        )
        .unwrap();
        drop(first);

        let mut ibo = indices.lock();
        assert_eq!(vao.sync(&mut ibo).unwrap(), 6);
        assert_eq!(vao.groups(), 1);

        let uploaded: Vec<Vertex> = bytemuck::pod_collect_to_vec(vao.buffer().contents());
        assert_eq!(uploaded.len(), 4);
        assert!(uploaded.iter().all(|v| v.texture_layer == 3));
        assert_eq!(ibo.backend().to_u32s()[..6], quad_fan(0));

        drop(ibo);
        drop(second);
    }

    #[test]
    fn empty_store_draws_nothing() {
        let vertices = Arc::new(QuadVertices::new());
        let mut ibo = IndexBuffer::with_resolver(HostBuffer::new(), vertices.clone());
        let mut vao = VertexArray::new(vertices, Vertex::layout(), HostBuffer::new());

        assert_eq!(vao.sync(&mut ibo).unwrap(), 0);
        assert!(vao.buffer().ops().is_empty());
    }
}
