/// Scalar types that can make up a vertex attribute.
pub trait VertexScalar {
    /// Size of one component in bytes.
    const SIZE: u64;

    /// Attribute format for 1..=4 components.
    fn format(count: u32) -> Option<wgpu::VertexFormat>;
}

impl VertexScalar for f32 {
    const SIZE: u64 = 4;

    fn format(count: u32) -> Option<wgpu::VertexFormat> {
        match count {
            1 => Some(wgpu::VertexFormat::Float32),
            2 => Some(wgpu::VertexFormat::Float32x2),
            3 => Some(wgpu::VertexFormat::Float32x3),
            4 => Some(wgpu::VertexFormat::Float32x4),
            _ => None,
        }
    }
}

impl VertexScalar for u32 {
    const SIZE: u64 = 4;

    fn format(count: u32) -> Option<wgpu::VertexFormat> {
        match count {
            1 => Some(wgpu::VertexFormat::Uint32),
            2 => Some(wgpu::VertexFormat::Uint32x2),
            3 => Some(wgpu::VertexFormat::Uint32x3),
            4 => Some(wgpu::VertexFormat::Uint32x4),
            _ => None,
        }
    }
}

impl VertexScalar for i32 {
    const SIZE: u64 = 4;

    fn format(count: u32) -> Option<wgpu::VertexFormat> {
        match count {
            1 => Some(wgpu::VertexFormat::Sint32),
            2 => Some(wgpu::VertexFormat::Sint32x2),
            3 => Some(wgpu::VertexFormat::Sint32x3),
            4 => Some(wgpu::VertexFormat::Sint32x4),
            _ => None,
        }
    }
}

/// Interleaved vertex layout built attribute by attribute.
///
/// Shader locations are assigned in push order, offsets accumulate.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BufferLayout {
    attributes: Vec<wgpu::VertexAttribute>,
    stride: u64,
    first_location: u32,
}

impl BufferLayout {
    pub fn new() -> Self {
        Self::default()
    }

    /// Layout for a second vertex buffer whose attributes follow another's.
    pub fn starting_at(first_location: u32) -> Self {
        Self {
            first_location,
            ..Self::default()
        }
    }

    /// Appends an attribute of `count` components of `S`.
    ///
    /// # Panics
    /// If `count` is not in `1..=4`.
    pub fn push<S: VertexScalar>(mut self, count: u32) -> Self {
        let Some(format) = S::format(count) else {
            panic!("vertex attributes hold 1 to 4 components, got {count}");
        };
        self.attributes.push(wgpu::VertexAttribute {
            format,
            offset: self.stride,
            shader_location: self.first_location + self.attributes.len() as u32,
        });
        self.stride += S::SIZE * count as u64;
        self
    }

    pub fn stride(&self) -> u64 {
        self.stride
    }

    pub fn attributes(&self) -> &[wgpu::VertexAttribute] {
        &self.attributes
    }

    pub fn as_wgpu(&self, step_mode: wgpu::VertexStepMode) -> wgpu::VertexBufferLayout<'_> {
        wgpu::VertexBufferLayout {
            array_stride: self.stride,
            step_mode,
            attributes: &self.attributes,
        }
    }
}
