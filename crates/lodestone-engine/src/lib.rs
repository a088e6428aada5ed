//! Lodestone engine crate.
//!
//! Owns the platform + GPU runtime pieces, the shared geometry buffers that
//! quads write into, and the scene host that drives the demo scenes.

pub mod device;
pub mod window;
pub mod input;
pub mod time;
pub mod core;

pub mod logging;
pub mod coords;
pub mod paint;
pub mod assets;
pub mod buffer;
pub mod primitives;
pub mod render;
pub mod overlay;
pub mod scene;
