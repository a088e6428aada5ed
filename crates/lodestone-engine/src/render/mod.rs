//! GPU rendering.
//!
//! - [`Shader`]: validated WGSL pipeline for textured quads in scene space
//!   (+Y up), fed by a projection uniform
//! - [`TextureArray`]: the layers quads sample from
//! - [`VertexArray`] + [`Renderer`]: mirror a shared vertex store and its index
//!   buffer to the GPU and draw them
//! - [`OverlayRenderer`]: debug overlay in overlay space (+Y down)

mod common;
mod ctx;
mod overlay;
mod renderer;
mod shader;
mod texture;
mod vertex_array;

pub use common::ProjectionUniform;
pub use ctx::{RenderCtx, RenderTarget};
pub use overlay::OverlayRenderer;
pub use renderer::Renderer;
pub use shader::{check_interface, validate_wgsl, Shader, ShaderError, FRAGMENT_ENTRY, VERTEX_ENTRY};
pub use texture::{check_layers, TextureArray, TextureError};
pub use vertex_array::VertexArray;
