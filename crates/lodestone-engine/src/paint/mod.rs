//! Color model shared by the host, scenes, and the overlay.

mod color;

pub use color::Color;
