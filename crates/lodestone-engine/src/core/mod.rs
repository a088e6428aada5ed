//! Contracts between the window runtime and whatever it drives.
//!
//! The runtime owns the platform loop; an [`App`] sees one [`FrameCtx`] per
//! redraw and never touches winit or the surface directly.

mod app;
mod ctx;

pub use app::{App, AppControl};
pub use ctx::{FrameCtx, WindowCtx};
