use std::sync::Arc;

use crate::buffer::{BufferError, Connection, GpuBuffer, Key, SharedIndexBuffer, SynchronizedBuffer, Vertex};
use crate::coords::Vec2;

/// The vertex store quads write into.
pub type QuadVertices = SynchronizedBuffer<Vertex, 4>;

/// Texture coordinates per corner, matching [`quad_corners`] order.
pub const QUAD_UVS: [[f32; 2]; 4] = [[0.0, 1.0], [0.0, 0.0], [1.0, 0.0], [1.0, 1.0]];

/// Construction parameters for a [`Quad`].
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct QuadDesc {
    pub size: Vec2,
    /// Pivot in `[0, 1]²`; `(0, 0)` is the bottom-left corner. Clamped.
    pub anchor: Vec2,
    pub position: Vec2,
    pub texture_layer: u32,
}

impl Default for QuadDesc {
    fn default() -> Self {
        Self {
            size: Vec2::splat(100.0),
            anchor: Vec2::zero(),
            position: Vec2::zero(),
            texture_layer: 0,
        }
    }
}

/// Corners of a quad in scene space (+Y up): top-left, bottom-left,
/// bottom-right, top-right.
pub fn quad_corners(size: Vec2, anchor: Vec2, position: Vec2) -> [Vec2; 4] {
    let lo = -size.mul_elem(anchor);
    let hi = size.mul_elem(Vec2::splat(1.0) - anchor);
    [
        Vec2::new(lo.x, hi.y) + position,
        Vec2::new(lo.x, lo.y) + position,
        Vec2::new(hi.x, lo.y) + position,
        Vec2::new(hi.x, hi.y) + position,
    ]
}

/// Two triangles over four vertices starting at `base`.
pub fn quad_fan(base: u32) -> [u32; 6] {
    [base, base + 1, base + 2, base + 2, base + 3, base]
}

/// A textured rectangle living in a shared vertex buffer.
///
/// Owns one four-vertex group (through its connection) and six indices.
/// Moving the quad rewrites its vertices only; dropping it releases both.
pub struct Quad<B: GpuBuffer> {
    size: Vec2,
    anchor: Vec2,
    position: Vec2,
    texture_layer: u32,
    corners: [Vec2; 4],
    index_ids: [u32; 6],
    indices: SharedIndexBuffer<B>,
    connection: Connection<Vertex, 4>,
}

impl<B: GpuBuffer> Quad<B> {
    pub fn new(
        desc: QuadDesc,
        vertices: &Arc<QuadVertices>,
        indices: &SharedIndexBuffer<B>,
    ) -> Result<Self, BufferError> {
        let anchor = desc.anchor.clamp(Vec2::zero(), Vec2::splat(1.0));
        let corners = quad_corners(desc.size, anchor, desc.position);

        let mut connection = vertices.connect()?;
        connection.update(build_vertices(&corners, desc.texture_layer))?;

        let index_ids = {
            let mut ibo = indices.lock();
            let base = ibo.next_base();
            connection.bind_index_base(base)?;
            ibo.insert(quad_fan(base))?
        };

        log::trace!("quad {} created at {:?}", connection.key(), desc.position);

        Ok(Self {
            size: desc.size,
            anchor,
            position: desc.position,
            texture_layer: desc.texture_layer,
            corners,
            index_ids,
            indices: Arc::clone(indices),
            connection,
        })
    }

    /// Moves the quad; only its own vertex group is rewritten.
    pub fn set_position(&mut self, position: Vec2) -> Result<(), BufferError> {
        self.position = position;
        self.push()
    }

    pub fn set_texture_layer(&mut self, layer: u32) -> Result<(), BufferError> {
        self.texture_layer = layer;
        self.push()
    }

    fn push(&mut self) -> Result<(), BufferError> {
        self.corners = quad_corners(self.size, self.anchor, self.position);
        self.connection
            .update(build_vertices(&self.corners, self.texture_layer))
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn size(&self) -> Vec2 {
        self.size
    }

    pub fn anchor(&self) -> Vec2 {
        self.anchor
    }

    pub fn texture_layer(&self) -> u32 {
        self.texture_layer
    }

    pub fn corners(&self) -> [Vec2; 4] {
        self.corners
    }

    pub fn index_ids(&self) -> [u32; 6] {
        self.index_ids
    }

    pub fn key(&self) -> Key {
        self.connection.key()
    }
}

impl<B: GpuBuffer> Drop for Quad<B> {
    fn drop(&mut self) {
        if let Err(e) = self.indices.lock().erase(&self.index_ids) {
            log::error!("failed to release indices of quad {}: {e}", self.connection.key());
        }
    }
}

fn build_vertices(corners: &[Vec2; 4], texture_layer: u32) -> [Vertex; 4] {
    std::array::from_fn(|i| Vertex {
        position: corners[i].to_array(),
        uv: QUAD_UVS[i],
        texture_layer,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::{HostBuffer, IndexBuffer, UploadKind};

    fn v(x: f32, y: f32) -> Vec2 {
        Vec2::new(x, y)
    }

    fn setup() -> (Arc<QuadVertices>, SharedIndexBuffer<HostBuffer>) {
        let vertices = Arc::new(QuadVertices::new());
        let indices = IndexBuffer::with_resolver(HostBuffer::new(), vertices.clone()).into_shared();
        (vertices, indices)
    }

    fn desc(size: f32, anchor: Vec2, position: Vec2) -> QuadDesc {
        QuadDesc {
            size: Vec2::splat(size),
            anchor,
            position,
            texture_layer: 0,
        }
    }

    // ── anchor math ───────────────────────────────────────────────────────

    #[test]
    fn bottom_left_anchor_spans_positive_quadrant() {
        let corners = quad_corners(Vec2::splat(200.0), Vec2::zero(), Vec2::zero());
        assert_eq!(corners, [v(0.0, 200.0), v(0.0, 0.0), v(200.0, 0.0), v(200.0, 200.0)]);
    }

    #[test]
    fn center_anchor_is_symmetric_around_position() {
        let corners = quad_corners(Vec2::splat(50.0), Vec2::splat(0.5), v(50.0, 50.0));
        assert_eq!(corners, [v(25.0, 75.0), v(25.0, 25.0), v(75.0, 25.0), v(75.0, 75.0)]);
    }

    #[test]
    fn anchor_is_clamped_to_unit_square() {
        let (vertices, indices) = setup();
        let quad = Quad::new(desc(10.0, v(2.0, -1.0), Vec2::zero()), &vertices, &indices).unwrap();

        assert_eq!(quad.anchor(), v(1.0, 0.0));
        assert_eq!(quad.corners()[1], v(-10.0, 0.0));
    }

    // ── indices ───────────────────────────────────────────────────────────

    #[test]
    fn fans_are_disjoint_and_well_formed() {
        let (vertices, indices) = setup();
        let a = Quad::new(QuadDesc::default(), &vertices, &indices).unwrap();
        let b = Quad::new(QuadDesc::default(), &vertices, &indices).unwrap();

        let values: Vec<u32> = indices.lock().values().collect();
        assert_eq!(&values[..6], &quad_fan(0));
        assert_eq!(&values[6..], &quad_fan(4));
        assert_ne!(a.index_ids(), b.index_ids());
    }

    #[test]
    fn drop_releases_vertices_and_indices() {
        let (vertices, indices) = setup();
        let keep = Quad::new(QuadDesc::default(), &vertices, &indices).unwrap();
        let gone = Quad::new(QuadDesc::default(), &vertices, &indices).unwrap();
        drop(gone);

        assert_eq!(vertices.len(), 1);
        assert_eq!(indices.lock().len(), 6);
        assert_eq!(indices.lock().next_base(), 8);

        let third = Quad::new(QuadDesc::default(), &vertices, &indices).unwrap();
        assert_eq!(indices.lock().values().last(), Some(8));
        drop((keep, third));
    }

    #[test]
    fn uploaded_indices_follow_compaction() {
        let (vertices, indices) = setup();
        let first = Quad::new(QuadDesc::default(), &vertices, &indices).unwrap();
        let _second = Quad::new(QuadDesc::default(), &vertices, &indices).unwrap();
        drop(first);

        // The second quad moved to position 0 while keeping virtual base 4.
        let mut ibo = indices.lock();
        assert_eq!(ibo.values().collect::<Vec<_>>(), quad_fan(4).to_vec());
        assert_ne!(ibo.refresh(vertices.as_ref()).unwrap(), UploadKind::Skipped);
        assert_eq!(ibo.backend().to_u32s()[..6], quad_fan(0));
        assert_eq!(ibo.refresh(vertices.as_ref()).unwrap(), UploadKind::Skipped);
    }

    // ── end to end ────────────────────────────────────────────────────────

    #[test]
    fn moving_one_quad_leaves_the_other_untouched() {
        let (vertices, indices) = setup();
        let mut q1 = Quad::new(desc(200.0, Vec2::zero(), v(0.0, 0.0)), &vertices, &indices).unwrap();
        let q2 = Quad::new(desc(200.0, Vec2::zero(), v(400.0, 0.0)), &vertices, &indices).unwrap();

        let q2_before = vertices.get(q2.key()).unwrap().unwrap();
        q1.set_position(v(50.0, 50.0)).unwrap();
        let q2_after = vertices.get(q2.key()).unwrap().unwrap();

        assert_eq!(bytemuck::bytes_of(&q2_before), bytemuck::bytes_of(&q2_after));

        let q1_now = vertices.get(q1.key()).unwrap().unwrap();
        let positions: Vec<[f32; 2]> = q1_now.iter().map(|v| v.position).collect();
        assert_eq!(positions, vec![[50.0, 250.0], [50.0, 50.0], [250.0, 50.0], [250.0, 250.0]]);
        assert_eq!(q1_now[0].uv, QUAD_UVS[0]);
    }
}
