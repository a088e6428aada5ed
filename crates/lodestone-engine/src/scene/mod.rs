//! Demo scenes and the host loop that switches between them.

mod host;
mod registry;

pub use host::{SceneHost, SceneHostConfig, MENU_CLEAR};
pub use registry::{SceneFactory, SceneRegistry};

use crate::overlay::DebugUi;
use crate::render::{RenderCtx, RenderTarget};

/// A selectable unit of content driven by the [`SceneHost`].
///
/// Every callback may fail; the host logs the error and returns to the menu.
pub trait Scene {
    fn name(&self) -> &str;

    /// Advances the scene by `dt` seconds.
    fn on_update(&mut self, dt: f32) -> anyhow::Result<()> {
        let _ = dt;
        Ok(())
    }

    /// Draws into `target`, which the host has already cleared.
    fn on_render(&mut self, ctx: &RenderCtx<'_>, target: &mut RenderTarget<'_>) -> anyhow::Result<()>;

    /// Adds the scene's widgets to the debug panel.
    fn on_debug_ui(&mut self, ui: &mut dyn DebugUi) -> anyhow::Result<()> {
        let _ = ui;
        Ok(())
    }
}
