//! GPU types shared by the quad and overlay pipelines.

use bytemuck::{Pod, Zeroable};

use crate::coords::{Vec2, Viewport};

pub(crate) fn premul_alpha_blend() -> wgpu::BlendState {
    wgpu::BlendState {
        color: wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::One,
            dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
            operation: wgpu::BlendOperation::Add,
        },
        alpha: wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::One,
            dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
            operation: wgpu::BlendOperation::Add,
        },
    }
}

/// Maps logical pixels to clip space: `viewport` is the visible extent,
/// `offset` the logical position shown at the origin corner.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct ProjectionUniform {
    pub viewport: [f32; 2],
    pub offset: [f32; 2],
}

impl ProjectionUniform {
    pub fn new(viewport: Viewport, offset: Vec2) -> Self {
        Self {
            viewport: viewport.to_uniform(),
            offset: offset.to_array(),
        }
    }

    /// Size as a binding size; never zero.
    pub(crate) fn binding_size() -> Option<std::num::NonZeroU64> {
        std::num::NonZeroU64::new(std::mem::size_of::<Self>() as u64)
    }
}

pub(crate) fn primitive_state() -> wgpu::PrimitiveState {
    wgpu::PrimitiveState {
        topology: wgpu::PrimitiveTopology::TriangleList,
        strip_index_format: None,
        front_face: wgpu::FrontFace::Ccw,
        cull_mode: None,
        polygon_mode: wgpu::PolygonMode::Fill,
        unclipped_depth: false,
        conservative: false,
    }
}

pub(crate) fn linear_clamp_sampler(device: &wgpu::Device, label: &str) -> wgpu::Sampler {
    device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some(label),
        address_mode_u: wgpu::AddressMode::ClampToEdge,
        address_mode_v: wgpu::AddressMode::ClampToEdge,
        address_mode_w: wgpu::AddressMode::ClampToEdge,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        mipmap_filter: wgpu::MipmapFilterMode::Nearest,
        ..Default::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn projection_uniform_is_16_bytes() {
        assert_eq!(std::mem::size_of::<ProjectionUniform>(), 16);
        assert!(ProjectionUniform::binding_size().is_some());
    }

    #[test]
    fn projection_clamps_degenerate_viewport() {
        let u = ProjectionUniform::new(Viewport::new(0.0, 600.0), Vec2::new(10.0, 0.0));
        assert_eq!(u.viewport, [1.0, 600.0]);
        assert_eq!(u.offset, [10.0, 0.0]);
    }
}
