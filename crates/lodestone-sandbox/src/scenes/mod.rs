//! Demo scenes shown in the sandbox menu.

pub mod clear_color;
pub mod texture;

pub use clear_color::ClearColor;
pub use texture::TextureScene;
