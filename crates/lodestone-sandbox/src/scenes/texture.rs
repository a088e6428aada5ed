use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;

use lodestone_engine::assets::{load_texture, RawImage};
use lodestone_engine::buffer::{IndexBuffer, SharedIndexBuffer, Vertex, WgpuBuffer};
use lodestone_engine::coords::Vec2;
use lodestone_engine::overlay::DebugUi;
use lodestone_engine::primitives::{Quad, QuadDesc, QuadVertices};
use lodestone_engine::render::{RenderCtx, RenderTarget, Renderer, Shader, TextureArray, VertexArray};
use lodestone_engine::scene::Scene;

pub const NAME: &str = "Texture";

pub const LAYER_SIZE: u32 = 256;
pub const LAYER_FILES: [&str; 3] = ["texarr1.png", "texarr2.png", "texarr3.png"];

const MAX_POSITION: f32 = 500.0;
const MAX_QUADS: usize = 16;

/// Fallback tint per layer when its file cannot be loaded.
const FALLBACK_TINTS: [[u8; 4]; 3] = [[220, 80, 80, 255], [80, 200, 90, 255], [70, 110, 230, 255]];

/// The three quads the scene opens with.
pub fn initial_quads() -> [QuadDesc; 3] {
    [
        QuadDesc {
            size: Vec2::splat(200.0),
            anchor: Vec2::zero(),
            position: Vec2::zero(),
            texture_layer: 2,
        },
        QuadDesc {
            size: Vec2::splat(50.0),
            anchor: Vec2::splat(0.5),
            position: Vec2::zero(),
            texture_layer: 0,
        },
        QuadDesc {
            size: Vec2::splat(300.0),
            anchor: Vec2::zero(),
            position: Vec2::zero(),
            texture_layer: 1,
        },
    ]
}

/// Loads every layer file, resized to `size`. Unreadable files become a
/// checkerboard so the array keeps its layer count.
pub fn load_layers(paths: &[PathBuf], size: u32) -> Vec<RawImage> {
    paths
        .iter()
        .enumerate()
        .map(|(i, path)| match load_texture(path) {
            Ok(img) if img.width == size && img.height == size => img,
            Ok(img) => {
                log::debug!("resizing {} from {}x{}", path.display(), img.width, img.height);
                img.resized(size, size)
            }
            Err(e) => {
                log::warn!("{e}; using a checkerboard for layer {i}");
                let tint = FALLBACK_TINTS[i % FALLBACK_TINTS.len()];
                RawImage::checkerboard(size, size, size / 8, tint, [255, 255, 255, 255])
            }
        })
        .collect()
}

/// Textured quads sharing one vertex store, one index buffer and one
/// texture array.
pub struct TextureScene {
    vertices: Arc<QuadVertices>,
    indices: SharedIndexBuffer<WgpuBuffer>,
    vao: VertexArray<Vertex, 4, WgpuBuffer>,
    shader: Shader,
    layers: u32,
    bindings: wgpu::BindGroup,
    quads: Vec<Quad<WgpuBuffer>>,
}

impl TextureScene {
    pub fn new(ctx: &RenderCtx<'_>, shader_path: &Path, texture_paths: &[PathBuf]) -> anyhow::Result<Self> {
        let vertices = Arc::new(QuadVertices::new());
        let indices = IndexBuffer::with_resolver(WgpuBuffer::index(ctx, "texture scene indices"), vertices.clone())
            .into_shared();
        let vao = VertexArray::new(
            vertices.clone(),
            Vertex::layout(),
            WgpuBuffer::vertex(ctx, "texture scene vertices"),
        );

        let shader = Shader::load(ctx, shader_path, vao.layout()).context("loading the quad shader")?;
        let textures = TextureArray::new(ctx, "texture scene layers", &load_layers(texture_paths, LAYER_SIZE))
            .context("uploading the texture layers")?;
        let bindings = shader.bind_textures(ctx.device, &textures);

        let quads = initial_quads()
            .into_iter()
            .map(|desc| Quad::new(desc, &vertices, &indices))
            .collect::<Result<Vec<_>, _>>()?;

        log::info!("texture scene ready: {} quads, {} layers", quads.len(), textures.layers());

        Ok(Self {
            vertices,
            indices,
            vao,
            shader,
            layers: textures.layers(),
            bindings,
            quads,
        })
    }

    fn add_quad(&mut self) -> anyhow::Result<()> {
        let layer = self.quads.len() as u32 % self.layers.max(1);
        let quad = Quad::new(
            QuadDesc {
                texture_layer: layer,
                ..QuadDesc::default()
            },
            &self.vertices,
            &self.indices,
        )?;
        self.quads.push(quad);
        Ok(())
    }
}

impl Scene for TextureScene {
    fn name(&self) -> &str {
        NAME
    }

    fn on_render(&mut self, ctx: &RenderCtx<'_>, target: &mut RenderTarget<'_>) -> anyhow::Result<()> {
        self.shader.set_projection(ctx.queue, ctx.viewport, Vec2::zero());
        Renderer::draw(target, &mut self.vao, &self.indices, &self.shader, &self.bindings)?;
        Ok(())
    }

    fn on_debug_ui(&mut self, ui: &mut dyn DebugUi) -> anyhow::Result<()> {
        for (i, quad) in self.quads.iter_mut().enumerate() {
            let mut position = quad.position();
            if ui.slider_vec2(&format!("Position{}", i + 1), &mut position, 0.0, MAX_POSITION) {
                quad.set_position(position)?;
            }
        }

        ui.separator();
        if ui.button("Add quad") && self.quads.len() < MAX_QUADS {
            self.add_quad()?;
        }
        if ui.button("Remove quad") {
            self.quads.pop();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_layers_fall_back_to_checkerboards() {
        let paths: Vec<PathBuf> = LAYER_FILES.iter().map(|f| PathBuf::from("/nonexistent").join(f)).collect();
        let layers = load_layers(&paths, 64);

        assert_eq!(layers.len(), 3);
        assert!(layers.iter().all(|l| l.width == 64 && l.height == 64));
        assert_eq!(layers[0].pixels.len(), 64 * 64 * 4);
        // Each fallback has its own tint in the first cell.
        assert_ne!(layers[0].pixels[..4], layers[1].pixels[..4]);
    }

    #[test]
    fn opening_layout_matches_the_demo() {
        let quads = initial_quads();
        assert_eq!(quads.map(|q| q.texture_layer), [2, 0, 1]);
        assert_eq!(quads[1].anchor, Vec2::splat(0.5));
        assert_eq!(quads[2].size, Vec2::splat(300.0));
    }
}
