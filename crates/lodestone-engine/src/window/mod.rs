//! The winit event loop and the one window it drives.

mod runtime;

pub use runtime::{Runtime, RuntimeConfig};
