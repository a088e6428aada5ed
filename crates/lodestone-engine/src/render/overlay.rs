use std::collections::HashMap;

use bytemuck::{Pod, Zeroable};
use fontdue::layout::{CoordinateSystem, GlyphRasterConfig, Layout, LayoutSettings, TextStyle};
use wgpu::util::DeviceExt;

use crate::buffer::BufferLayout;
use crate::coords::{Rect, Vec2};
use crate::overlay::{FontSystem, OverlayCmd, OverlayList};
use crate::paint::Color;
use crate::render::{RenderCtx, RenderTarget, FRAGMENT_ENTRY, VERTEX_ENTRY};

use super::common::{linear_clamp_sampler, premul_alpha_blend, primitive_state, ProjectionUniform};

const ATLAS_SIZE: u32 = 1024;
const GLYPH_PADDING: u32 = 1;
/// Opaque block at the atlas origin; rects sample inside it.
const WHITE_BLOCK: u32 = 2;
const WHITE_UV: [f32; 2] = [1.0 / ATLAS_SIZE as f32, 1.0 / ATLAS_SIZE as f32];
const MIN_INSTANCES: usize = 64;

// ── atlas packing ─────────────────────────────────────────────────────────

/// Row-by-row allocator over the square atlas.
#[derive(Debug)]
struct ShelfPacker {
    x: u32,
    y: u32,
    row_height: u32,
    full: bool,
}

impl Default for ShelfPacker {
    fn default() -> Self {
        // The first row already holds the white block.
        Self {
            x: WHITE_BLOCK + GLYPH_PADDING,
            y: 0,
            row_height: WHITE_BLOCK,
            full: false,
        }
    }
}

impl ShelfPacker {
    /// Top-left corner for a `w` x `h` region, or `None` once the atlas is full.
    fn place(&mut self, w: u32, h: u32) -> Option<(u32, u32)> {
        if self.full || w + GLYPH_PADDING > ATLAS_SIZE {
            return None;
        }
        if self.x + w + GLYPH_PADDING > ATLAS_SIZE {
            self.y += self.row_height + GLYPH_PADDING;
            self.x = 0;
            self.row_height = 0;
        }
        if self.y + h + GLYPH_PADDING > ATLAS_SIZE {
            log::warn!("overlay glyph atlas is full; further glyphs are dropped");
            self.full = true;
            return None;
        }
        let at = (self.x, self.y);
        self.x += w + GLYPH_PADDING;
        self.row_height = self.row_height.max(h);
        Some(at)
    }
}

#[derive(Debug, Copy, Clone)]
struct GlyphUv {
    min: [f32; 2],
    max: [f32; 2],
}

impl GlyphUv {
    fn of_region(x: u32, y: u32, w: u32, h: u32) -> Self {
        let s = ATLAS_SIZE as f32;
        Self {
            min: [x as f32 / s, y as f32 / s],
            max: [(x + w) as f32 / s, (y + h) as f32 / s],
        }
    }
}

/// Rasterized glyphs and where they live in the atlas.
struct GlyphCache {
    packer: ShelfPacker,
    uvs: HashMap<GlyphRasterConfig, GlyphUv>,
    layout: Layout<()>,
    warned_no_font: bool,
}

impl Default for GlyphCache {
    fn default() -> Self {
        Self {
            packer: ShelfPacker::default(),
            uvs: HashMap::new(),
            layout: Layout::new(CoordinateSystem::PositiveYDown),
            warned_no_font: false,
        }
    }
}

impl GlyphCache {
    /// Lays `text` out in physical pixels (crisp at any scale factor) and
    /// appends one instance per visible glyph, in logical pixels.
    #[allow(clippy::too_many_arguments)]
    fn push_text(
        &mut self,
        queue: &wgpu::Queue,
        atlas: &wgpu::Texture,
        fonts: &FontSystem,
        out: &mut Vec<OverlayInstance>,
        origin: Vec2,
        text: &str,
        size: f32,
        color: Color,
        scale: f32,
    ) {
        let Some(font) = fonts.primary() else {
            if !self.warned_no_font {
                log::warn!("no overlay font loaded; labels are not drawn");
                self.warned_no_font = true;
            }
            return;
        };

        self.layout.reset(&LayoutSettings {
            x: origin.x * scale,
            y: origin.y * scale,
            ..LayoutSettings::default()
        });
        self.layout.append(&[font], &TextStyle::new(text, size * scale, 0));

        let color = color.premultiplied();
        for g in self.layout.glyphs() {
            if !g.char_data.rasterize() || g.width == 0 || g.height == 0 {
                continue;
            }
            let uv = match self.uvs.get(&g.key) {
                Some(uv) => *uv,
                None => {
                    let (metrics, bitmap) = font.rasterize_config(g.key);
                    let (w, h) = (metrics.width as u32, metrics.height as u32);
                    if w == 0 || h == 0 {
                        continue;
                    }
                    let Some((x, y)) = self.packer.place(w, h) else {
                        continue;
                    };
                    write_atlas(queue, atlas, x, y, w, h, &bitmap);
                    let uv = GlyphUv::of_region(x, y, w, h);
                    self.uvs.insert(g.key, uv);
                    uv
                }
            };

            out.push(OverlayInstance {
                dst_min: [g.x / scale, g.y / scale],
                dst_max: [(g.x + g.width as f32) / scale, (g.y + g.height as f32) / scale],
                uv_min: uv.min,
                uv_max: uv.max,
                color,
            });
        }
    }
}

// ── GPU resources ─────────────────────────────────────────────────────────

/// Everything the overlay pass needs, created together for one surface format.
struct OverlayGpu {
    format: wgpu::TextureFormat,
    pipeline: wgpu::RenderPipeline,
    bind_group: wgpu::BindGroup,
    projection: wgpu::Buffer,
    atlas: wgpu::Texture,
    corners: wgpu::Buffer,
    corner_indices: wgpu::Buffer,
    instances: wgpu::Buffer,
    instance_capacity: usize,
}

impl OverlayGpu {
    fn new(ctx: &RenderCtx<'_>) -> Self {
        let device = ctx.device;

        let atlas = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("lodestone overlay atlas"),
            size: wgpu::Extent3d {
                width: ATLAS_SIZE,
                height: ATLAS_SIZE,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::R8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let white = [u8::MAX; (WHITE_BLOCK * WHITE_BLOCK) as usize];
        write_atlas(ctx.queue, &atlas, 0, 0, WHITE_BLOCK, WHITE_BLOCK, &white);

        let projection = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("lodestone overlay projection"),
            size: std::mem::size_of::<ProjectionUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let sampler = linear_clamp_sampler(device, "lodestone overlay sampler");

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("lodestone overlay bind group layout"),
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
                        view_dimension: wgpu::TextureViewDimension::D2,
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

        let atlas_view = atlas.create_view(&wgpu::TextureViewDescriptor::default());
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("lodestone overlay bind group"),
            layout: &bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: projection.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&atlas_view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&sampler),
                },
            ],
        });

        let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("lodestone overlay shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/overlay.wgsl").into()),
        });
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("lodestone overlay pipeline layout"),
            bind_group_layouts: &[&bind_group_layout],
            immediate_size: 0,
        });
        let (corner_layout, instance_layout) = (corner_layout(), instance_layout());
        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("lodestone overlay pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &module,
                entry_point: Some(VERTEX_ENTRY),
                compilation_options: Default::default(),
                buffers: &[
                    corner_layout.as_wgpu(wgpu::VertexStepMode::Vertex),
                    instance_layout.as_wgpu(wgpu::VertexStepMode::Instance),
                ],
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

        let corners = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("lodestone overlay corners"),
            contents: bytemuck::cast_slice(&CORNERS),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let corner_indices = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("lodestone overlay corner indices"),
            contents: bytemuck::cast_slice(&CORNER_INDICES),
            usage: wgpu::BufferUsages::INDEX,
        });

        Self {
            format: ctx.surface_format,
            pipeline,
            bind_group,
            projection,
            atlas,
            corners,
            corner_indices,
            instances: instance_buffer(device, MIN_INSTANCES),
            instance_capacity: MIN_INSTANCES,
        }
    }

    fn reserve(&mut self, device: &wgpu::Device, count: usize) {
        if count > self.instance_capacity {
            self.instance_capacity = count.next_power_of_two();
            self.instances = instance_buffer(device, self.instance_capacity);
        }
    }
}

fn instance_buffer(device: &wgpu::Device, capacity: usize) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("lodestone overlay instances"),
        size: (capacity * std::mem::size_of::<OverlayInstance>()) as u64,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

fn write_atlas(queue: &wgpu::Queue, atlas: &wgpu::Texture, x: u32, y: u32, w: u32, h: u32, coverage: &[u8]) {
    queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture: atlas,
            mip_level: 0,
            origin: wgpu::Origin3d { x, y, z: 0 },
            aspect: wgpu::TextureAspect::All,
        },
        coverage,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(w),
            rows_per_image: Some(h),
        },
        wgpu::Extent3d {
            width: w,
            height: h,
            depth_or_array_layers: 1,
        },
    );
}

// ── renderer ──────────────────────────────────────────────────────────────

/// Draws an [`OverlayList`] in one instanced pass.
///
/// Rects and glyphs are both unit quads stretched over an R8 coverage atlas;
/// rects sample its white block. GPU objects are built on first use and
/// rebuilt (dropping cached glyphs) if the surface format changes.
#[derive(Default)]
pub struct OverlayRenderer {
    gpu: Option<OverlayGpu>,
    glyphs: GlyphCache,
}

impl OverlayRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn render(&mut self, ctx: &RenderCtx<'_>, target: &mut RenderTarget<'_>, list: &OverlayList, fonts: &FontSystem) {
        if list.is_empty() {
            return;
        }
        if self.gpu.as_ref().is_some_and(|g| g.format != ctx.surface_format) {
            log::debug!("surface format changed; rebuilding the overlay pipeline");
            self.gpu = None;
            self.glyphs = GlyphCache::default();
        }
        let gpu = self.gpu.get_or_insert_with(|| OverlayGpu::new(ctx));

        let scale = ctx.scale_factor.max(0.25);
        let mut instances = Vec::with_capacity(list.len());
        for cmd in list.iter() {
            match cmd {
                OverlayCmd::Rect { rect, color } => instances.push(OverlayInstance::rect(*rect, *color)),
                OverlayCmd::Text { origin, text, size, color } => self.glyphs.push_text(
                    ctx.queue,
                    &gpu.atlas,
                    fonts,
                    &mut instances,
                    *origin,
                    text,
                    *size,
                    *color,
                    scale,
                ),
            }
        }
        if instances.is_empty() {
            return;
        }

        gpu.reserve(ctx.device, instances.len());
        ctx.queue.write_buffer(&gpu.instances, 0, bytemuck::cast_slice(&instances));
        let projection = ProjectionUniform::new(ctx.viewport, Vec2::zero());
        ctx.queue.write_buffer(&gpu.projection, 0, bytemuck::bytes_of(&projection));

        let mut pass = target.begin_pass("lodestone overlay pass", None);
        pass.set_pipeline(&gpu.pipeline);
        pass.set_bind_group(0, &gpu.bind_group, &[]);
        pass.set_vertex_buffer(0, gpu.corners.slice(..));
        pass.set_vertex_buffer(1, gpu.instances.slice(..));
        pass.set_index_buffer(gpu.corner_indices.slice(..), wgpu::IndexFormat::Uint16);
        pass.draw_indexed(0..CORNER_INDICES.len() as u32, 0, 0..instances.len() as u32);
    }
}

// ── vertex data ───────────────────────────────────────────────────────────

const CORNERS: [[f32; 2]; 4] = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];
const CORNER_INDICES: [u16; 6] = [0, 1, 2, 0, 2, 3];

fn corner_layout() -> BufferLayout {
    BufferLayout::new().push::<f32>(2)
}

fn instance_layout() -> BufferLayout {
    BufferLayout::starting_at(1)
        .push::<f32>(2)
        .push::<f32>(2)
        .push::<f32>(2)
        .push::<f32>(2)
        .push::<f32>(4)
}

/// One stretched quad: destination rect, atlas rect, premultiplied color.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
struct OverlayInstance {
    dst_min: [f32; 2],
    dst_max: [f32; 2],
    uv_min: [f32; 2],
    uv_max: [f32; 2],
    color: [f32; 4],
}

impl OverlayInstance {
    fn rect(rect: Rect, color: Color) -> Self {
        Self {
            dst_min: rect.min().to_array(),
            dst_max: rect.max().to_array(),
            uv_min: WHITE_UV,
            uv_max: WHITE_UV,
            color: color.premultiplied(),
        }
    }
}
