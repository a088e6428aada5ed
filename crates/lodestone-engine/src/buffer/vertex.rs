use bytemuck::{Pod, Zeroable};

use super::layout::BufferLayout;

/// One vertex of a textured quad.
///
/// Layout (20 bytes):
///
///  offset  0  position       [f32; 2]  loc 0
///  offset  8  uv             [f32; 2]  loc 1
///  offset 16  texture_layer  u32       loc 2
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 2],
    pub uv: [f32; 2],
    pub texture_layer: u32,
}

impl Vertex {
    pub fn layout() -> BufferLayout {
        BufferLayout::new()
            .push::<f32>(2)
            .push::<f32>(2)
            .push::<u32>(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_matches_struct() {
        let layout = Vertex::layout();
        assert_eq!(layout.stride(), std::mem::size_of::<Vertex>() as u64);
        assert_eq!(layout.attributes()[2].offset, 16);
        assert_eq!(layout.attributes()[2].format, wgpu::VertexFormat::Uint32);
    }
}
