//! Debug overlay: an immediate-mode panel drawn on top of the scene.
//!
//! Widgets are laid out in overlay space (top-left origin, +Y down) and
//! recorded into an [`OverlayList`]; `render::OverlayRenderer` draws the list.

mod font;
mod list;
mod ui;

pub use font::{FontId, FontLoadError, FontSystem, SYSTEM_FONT_CANDIDATES};
pub use list::{OverlayCmd, OverlayList};
pub use ui::{DebugUi, OverlayInput, OverlayOutput, OverlayState, OverlayUi, ROW_HEIGHT, TEXT_SIZE};
