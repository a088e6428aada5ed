use std::path::Path;

use crate::assets::{load_shader_source, ResourceLoadError};
use crate::buffer::BufferLayout;
use crate::coords::{Vec2, Viewport};
use crate::device::call::call;
use crate::device::GpuError;
use crate::render::{RenderCtx, TextureArray};

use super::common::{linear_clamp_sampler, premul_alpha_blend, primitive_state, ProjectionUniform};

pub const VERTEX_ENTRY: &str = "vs_main";
pub const FRAGMENT_ENTRY: &str = "fs_main";

#[derive(Debug, thiserror::Error)]
pub enum ShaderError {
    #[error(transparent)]
    Load(#[from] ResourceLoadError),

    /// Parse or validation failure, positioned in the source file.
    #[error("[{file}:{line}][Shader]: {message}")]
    Compile {
        file: String,
        line: u32,
        column: u32,
        message: String,
    },

    #[error("[{file}][Shader]: missing entry point `{name}`")]
    MissingEntryPoint { file: String, name: &'static str },

    #[error("[{file}][Shader]: vertex input @location({location}) has no matching buffer attribute")]
    UnboundInput { file: String, location: u32 },

    #[error(transparent)]
    Gpu(#[from] GpuError),
}

/// Parses and validates WGSL, reporting the first problem with its position.
pub fn validate_wgsl(file: &str, source: &str) -> Result<naga::Module, ShaderError> {
    let module = naga::front::wgsl::parse_str(source).map_err(|e| {
        let (line, column) = e
            .location(source)
            .map_or((0, 0), |l| (l.line_number, l.line_position));
        ShaderError::Compile {
            file: file.to_owned(),
            line,
            column,
            message: e.message().to_owned(),
        }
    })?;

    let mut validator = naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::all(),
    );
    validator.validate(&module).map_err(|e| {
        let (line, column) = e
            .location(source)
            .map_or((0, 0), |l| (l.line_number, l.line_position));
        ShaderError::Compile {
            file: file.to_owned(),
            line,
            column,
            message: e.as_inner().to_string(),
        }
    })?;

    Ok(module)
}

/// Checks entry points and that every vertex input is fed by `layout`.
pub fn check_interface(file: &str, module: &naga::Module, layout: &BufferLayout) -> Result<(), ShaderError> {
    let find = |stage: naga::ShaderStage, name: &'static str| {
        module
            .entry_points
            .iter()
            .find(|ep| ep.stage == stage && ep.name == name)
            .ok_or_else(|| ShaderError::MissingEntryPoint {
                file: file.to_owned(),
                name,
            })
    };
    let vertex = find(naga::ShaderStage::Vertex, VERTEX_ENTRY)?;
    find(naga::ShaderStage::Fragment, FRAGMENT_ENTRY)?;

    let mut locations = Vec::new();
    for arg in &vertex.function.arguments {
        match &arg.binding {
            Some(naga::Binding::Location { location, .. }) => locations.push(*location),
            Some(_) => {}
            None => {
                if let naga::TypeInner::Struct { members, .. } = &module.types[arg.ty].inner {
                    locations.extend(members.iter().filter_map(|m| match &m.binding {
                        Some(naga::Binding::Location { location, .. }) => Some(*location),
                        _ => None,
                    }));
                }
            }
        }
    }

    match locations
        .into_iter()
        .find(|loc| !layout.attributes().iter().any(|a| a.shader_location == *loc))
    {
        Some(location) => Err(ShaderError::UnboundInput {
            file: file.to_owned(),
            location,
        }),
        None => Ok(()),
    }
}

/// A validated render pipeline for textured geometry.
///
/// Bindings (group 0):
/// - 0: [`ProjectionUniform`] (vertex)
/// - 1: `texture_2d_array<f32>` (fragment)
/// - 2: filtering sampler (fragment)
pub struct Shader {
    name: String,
    pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    projection: wgpu::Buffer,
    sampler: wgpu::Sampler,
}

impl Shader {
    /// Loads, validates, and builds the pipeline for a WGSL file.
    pub fn load(ctx: &RenderCtx<'_>, path: impl AsRef<Path>, layout: &BufferLayout) -> Result<Self, ShaderError> {
        let path = path.as_ref();
        let source = load_shader_source(path)?;
        let name = path
            .file_name()
            .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
        Self::from_wgsl(ctx, &name, &source, layout)
    }

    pub fn from_wgsl(ctx: &RenderCtx<'_>, name: &str, source: &str, layout: &BufferLayout) -> Result<Self, ShaderError> {
        let module = validate_wgsl(name, source)?;
        check_interface(name, &module, layout)?;

        let shader = call(|| {
            let module = ctx.device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(name),
                source: wgpu::ShaderSource::Wgsl(source.into()),
            });

            let bind_group_layout = ctx.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("lodestone quad bgl"),
                entries: &[
                    wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::VERTEX,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Uniform,
                            has_dynamic_offset: false,
                            min_binding_size: ProjectionUniform::binding_size(),
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Texture {
                            sample_type: wgpu::TextureSampleType::Float { filterable: true },
                            view_dimension: wgpu::TextureViewDimension::D2Array,
                            multisampled: false,
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 2,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                        count: None,
                    },
                ],
            });

            let pipeline_layout = ctx.device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("lodestone quad pipeline layout"),
                bind_group_layouts: &[&bind_group_layout],
                immediate_size: 0,
            });

            let pipeline = ctx.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(name),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &module,
                    entry_point: Some(VERTEX_ENTRY),
                    compilation_options: Default::default(),
                    buffers: &[layout.as_wgpu(wgpu::VertexStepMode::Vertex)],
                },
                fragment: Some(wgpu::FragmentState {
                    module: &module,
                    entry_point: Some(FRAGMENT_ENTRY),
                    compilation_options: Default::default(),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: ctx.surface_format,
                        blend: Some(premul_alpha_blend()),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),
                primitive: primitive_state(),
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                multiview_mask: None,
                cache: None,
            });

            let projection = ctx.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("lodestone projection ubo"),
                size: std::mem::size_of::<ProjectionUniform>() as u64,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            });

            Self {
                name: name.to_owned(),
                pipeline,
                bind_group_layout,
                projection,
                sampler: linear_clamp_sampler(ctx.device, "lodestone quad sampler"),
            }
        })?;

        log::info!("shader {name} ready");
        Ok(shader)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pipeline(&self) -> &wgpu::RenderPipeline {
        &self.pipeline
    }

    /// Maps `viewport` logical pixels, starting at `offset`, onto the target.
    pub fn set_projection(&self, queue: &wgpu::Queue, viewport: Viewport, offset: Vec2) {
        let uniform = ProjectionUniform::new(viewport, offset);
        queue.write_buffer(&self.projection, 0, bytemuck::bytes_of(&uniform));
    }

    /// Bind group pairing this shader's uniform and sampler with `textures`.
    pub fn bind_textures(&self, device: &wgpu::Device, textures: &TextureArray) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("lodestone quad bind group"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: self.projection.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(textures.view()),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::Vertex;

    const QUAD: &str = r#"
struct Projection {
    viewport: vec2<f32>,
    offset: vec2<f32>,
};

@group(0) @binding(0) var<uniform> u_projection: Projection;
@group(0) @binding(1) var t_layers: texture_2d_array<f32>;
@group(0) @binding(2) var s_layers: sampler;

struct VsIn {
    @location(0) position: vec2<f32>,
    @location(1) uv: vec2<f32>,
    @location(2) texture_layer: u32,
};

struct VsOut {
    @builtin(position) clip: vec4<f32>,
    @location(0) uv: vec2<f32>,
    @location(1) @interpolate(flat) texture_layer: u32,
};

@vertex
fn vs_main(v: VsIn) -> VsOut {
    let p = (v.position - u_projection.offset) / u_projection.viewport;
    var out: VsOut;
    out.clip = vec4<f32>(p * 2.0 - vec2<f32>(1.0, 1.0), 0.0, 1.0);
    out.uv = v.uv;
    out.texture_layer = v.texture_layer;
    return out;
}

@fragment
fn fs_main(v: VsOut) -> @location(0) vec4<f32> {
    let c = textureSample(t_layers, s_layers, v.uv, v.texture_layer);
    return vec4<f32>(c.rgb * c.a, c.a);
}
"#;

    #[test]
    fn valid_shader_matches_vertex_layout() {
        let module = validate_wgsl("quad.wgsl", QUAD).unwrap();
        check_interface("quad.wgsl", &module, &Vertex::layout()).unwrap();
    }

    #[test]
    fn syntax_error_reports_file_and_line() {
        let src = "fn ok() {}\n\nfn broken( {\n}\n";
        let err = validate_wgsl("broken.wgsl", src).unwrap_err();
        match &err {
            ShaderError::Compile { file, line, .. } => {
                assert_eq!(file, "broken.wgsl");
                assert_eq!(*line, 3);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(err.to_string().starts_with("[broken.wgsl:3][Shader]: "));
    }

    #[test]
    fn type_error_is_a_compile_error() {
        let src = "@fragment\nfn fs_main() -> @location(0) vec4<f32> {\n    return 1u;\n}\n";
        assert!(matches!(
            validate_wgsl("types.wgsl", src),
            Err(ShaderError::Compile { .. })
        ));
    }

    #[test]
    fn missing_fragment_entry_is_reported() {
        let src = QUAD.replace("fn fs_main", "fn fs_other");
        let module = validate_wgsl("quad.wgsl", &src).unwrap();
        let err = check_interface("quad.wgsl", &module, &Vertex::layout()).unwrap_err();
        assert!(matches!(err, ShaderError::MissingEntryPoint { name: FRAGMENT_ENTRY, .. }));
    }

    #[test]
    fn unfed_vertex_input_is_reported() {
        let short = BufferLayout::new().push::<f32>(2).push::<f32>(2);
        let module = validate_wgsl("quad.wgsl", QUAD).unwrap();
        let err = check_interface("quad.wgsl", &module, &short).unwrap_err();
        assert!(matches!(err, ShaderError::UnboundInput { location: 2, .. }));
    }
}
