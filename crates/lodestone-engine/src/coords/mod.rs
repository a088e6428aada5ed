//! Coordinate and geometry types shared across the engine.
//!
//! Two spaces are in use:
//! - scene space: logical pixels, origin bottom-left, +Y up (quads)
//! - overlay space: logical pixels, origin top-left, +Y down (debug UI)
//!
//! Both are converted to NDC in shaders using a viewport uniform.

mod rect;
mod vec2;
mod viewport;

pub use rect::Rect;
pub use vec2::Vec2;
pub use viewport::Viewport;
