use std::path::PathBuf;

use crate::coords::Vec2;
use crate::core::{App, AppControl, FrameCtx};
use crate::input::Key;
use crate::overlay::{DebugUi, FontSystem, OverlayInput, OverlayOutput, OverlayState, OverlayUi};
use crate::paint::Color;
use crate::render::OverlayRenderer;

use super::SceneRegistry;

/// Clear color while no scene is selected.
pub const MENU_CLEAR: Color = Color::rgba(0.1, 0.1, 0.1, 0.1);

#[derive(Debug, Clone)]
pub struct SceneHostConfig {
    /// Top-left corner of the debug panel, overlay space.
    pub panel_origin: Vec2,
    pub panel_width: f32,
    /// Fonts tried before the system locations.
    pub font_paths: Vec<PathBuf>,
    /// Escape in the menu closes the app (in a scene it always goes back).
    pub exit_on_escape: bool,
}

impl Default for SceneHostConfig {
    fn default() -> Self {
        Self {
            panel_origin: Vec2::new(10.0, 10.0),
            panel_width: 280.0,
            font_paths: Vec::new(),
            exit_on_escape: true,
        }
    }
}

enum MenuAction {
    Select(String),
    Back,
    Failed(anyhow::Error),
}

/// Drives the selected scene and the debug panel around it.
///
/// With no scene selected the panel lists every registered scene; with one
/// selected it shows that scene's widgets and a "Back" button. Any scene
/// error is logged and returns to the menu.
pub struct SceneHost {
    config: SceneHostConfig,
    registry: SceneRegistry,
    overlay_state: OverlayState,
    overlay: OverlayRenderer,
    fonts: FontSystem,
}

impl SceneHost {
    pub fn new(registry: SceneRegistry, config: SceneHostConfig) -> Self {
        let mut fonts = FontSystem::new();
        if let Err(e) = fonts.load_system_font(&config.font_paths) {
            log::warn!("overlay text disabled: {e}");
        }
        Self {
            config,
            registry,
            overlay_state: OverlayState::default(),
            overlay: OverlayRenderer::new(),
            fonts,
        }
    }

    pub fn registry(&self) -> &SceneRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut SceneRegistry {
        &mut self.registry
    }

    fn fail(&mut self, err: anyhow::Error) {
        let name = self.registry.selected_name().unwrap_or("<none>").to_owned();
        log::error!("scene \"{name}\" failed: {err:#}");
        self.registry.deselect();
    }

    /// Lays out this frame's panel and applies the menu action it produced.
    fn build_panel(&mut self, input: OverlayInput, fps: f32) -> OverlayOutput {
        let mut ui = OverlayUi::begin(&mut self.overlay_state, input, self.config.panel_origin, self.config.panel_width);
        ui.label(&format!("Framerate {fps:.2}"));
        ui.separator();

        let mut action = None;
        let in_menu = self.registry.current_mut().is_none();
        if in_menu {
            for name in self.registry.names() {
                if ui.button(name) {
                    action = Some(MenuAction::Select(name.to_owned()));
                }
            }
        } else if let Some(scene) = self.registry.current_mut() {
            ui.label(scene.name());
            if ui.button("Back") {
                action = Some(MenuAction::Back);
            }
            ui.separator();
            if let Err(e) = scene.on_debug_ui(&mut ui) {
                action = Some(MenuAction::Failed(e.context("debug ui")));
            }
        }
        let output = ui.finish();

        match action {
            Some(MenuAction::Select(name)) => {
                self.registry.select(&name);
            }
            Some(MenuAction::Back) => self.registry.deselect(),
            Some(MenuAction::Failed(e)) => self.fail(e),
            None => {}
        }
        output
    }
}

impl App for SceneHost {
    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        let time = ctx.time;

        if ctx.input_frame.key_pressed(Key::Escape) {
            if self.registry.selected_name().is_some() {
                self.registry.deselect();
            } else if self.config.exit_on_escape {
                log::info!("escape pressed in menu; exiting");
                return AppControl::Exit;
            }
        }

        if self.registry.needs_instance() {
            let rctx = ctx.render_ctx();
            if let Err(e) = self.registry.ensure_instance(&rctx) {
                log::error!("{e:#}");
            }
        }

        if let Some(scene) = self.registry.current_mut() {
            if let Err(e) = scene.on_update(time.dt) {
                self.fail(e.context("update"));
            }
        }

        let output = self.build_panel(OverlayInput::from_input(ctx.input, ctx.input_frame), time.fps);

        let (registry, overlay, fonts) = (&mut self.registry, &mut self.overlay, &self.fonts);
        let mut render_error = None;
        let control = ctx.render(MENU_CLEAR, |rctx, target| {
            if let Some(scene) = registry.current_mut() {
                render_error = scene.on_render(rctx, target).err();
            }
            overlay.render(rctx, target, &output.list, fonts);
        });

        if let Some(e) = render_error {
            self.fail(e.context("render"));
        }
        control
    }
}
