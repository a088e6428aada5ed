use lodestone_engine::overlay::DebugUi;
use lodestone_engine::paint::Color;
use lodestone_engine::render::{RenderCtx, RenderTarget, Renderer};
use lodestone_engine::scene::Scene;

pub const NAME: &str = "Clear color.";

/// Fills the window with one editable color.
pub struct ClearColor {
    color: Color,
}

impl Default for ClearColor {
    fn default() -> Self {
        Self {
            color: Color::rgba(1.0, 0.8, 0.8, 1.0),
        }
    }
}

impl Scene for ClearColor {
    fn name(&self) -> &str {
        NAME
    }

    fn on_render(&mut self, _ctx: &RenderCtx<'_>, target: &mut RenderTarget<'_>) -> anyhow::Result<()> {
        Renderer::clear(target, self.color);
        Ok(())
    }

    fn on_debug_ui(&mut self, ui: &mut dyn DebugUi) -> anyhow::Result<()> {
        ui.color_edit("Clear Color", &mut self.color);
        Ok(())
    }
}
