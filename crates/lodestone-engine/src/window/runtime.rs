use anyhow::{Context, Result};
use ouroboros::self_referencing;
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{ElementState, MouseButton as WinitButton, WindowEvent};
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Fullscreen, Window, WindowId};

use crate::coords::Vec2;
use crate::core::{App, AppControl, FrameCtx, WindowCtx};
use crate::device::{Gpu, GpuInit};
use crate::input::{ButtonState, InputEvent, InputFrame, InputState, Key, MouseButton};
use crate::time::FrameClock;

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub title: String,
    pub initial_size: LogicalSize<f64>,
    pub resizable: bool,
    /// Borderless, on the current monitor.
    pub fullscreen: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            title: "lodestone".to_string(),
            initial_size: LogicalSize::new(800.0, 800.0),
            resizable: true,
            fullscreen: false,
        }
    }
}

/// Opens one window and redraws it continuously.
pub struct Runtime;

impl Runtime {
    /// Runs `app` until it asks to exit or the window is closed.
    ///
    /// A window or GPU setup failure stops the loop and is returned here.
    pub fn run<A: App + 'static>(config: RuntimeConfig, gpu_init: GpuInit, app: A) -> Result<()> {
        let event_loop = EventLoop::new().context("could not create the event loop")?;
        let mut driver = Driver {
            config,
            gpu_init,
            app,
            entry: None,
            failure: None,
            done: false,
        };
        event_loop
            .run_app(&mut driver)
            .context("event loop stopped with an error")?;

        driver.failure.map_or(Ok(()), Err)
    }
}

#[self_referencing]
struct WindowEntry {
    input: InputState,
    input_frame: InputFrame,
    clock: FrameClock,
    window: Window,
    #[borrows(window)]
    #[covariant]
    gpu: Gpu<'this>,
}

struct Driver<A> {
    config: RuntimeConfig,
    gpu_init: GpuInit,
    app: A,
    entry: Option<WindowEntry>,
    failure: Option<anyhow::Error>,
    done: bool,
}

impl<A: App + 'static> Driver<A> {
    fn open(&self, event_loop: &ActiveEventLoop) -> Result<WindowEntry> {
        let attrs = Window::default_attributes()
            .with_title(self.config.title.as_str())
            .with_inner_size(self.config.initial_size)
            .with_resizable(self.config.resizable)
            .with_fullscreen(self.config.fullscreen.then_some(Fullscreen::Borderless(None)));
        let window = event_loop.create_window(attrs).context("could not open the window")?;

        let gpu_init = self.gpu_init.clone();
        WindowEntryTryBuilder {
            input: InputState::default(),
            input_frame: InputFrame::default(),
            clock: FrameClock::default(),
            window,
            gpu_builder: |w| pollster::block_on(Gpu::new(w, gpu_init)).context("GPU setup failed"),
        }
        .try_build()
    }

    /// Drops the GPU before the window it borrows, then leaves the loop.
    fn shutdown(&mut self, event_loop: &ActiveEventLoop) {
        self.done = true;
        self.entry = None;
        event_loop.exit();
    }

    fn redraw(&mut self) -> AppControl {
        let (app, Some(entry)) = (&mut self.app, self.entry.as_mut()) else {
            return AppControl::Continue;
        };
        entry.with_mut(|f| {
            let mut ctx = FrameCtx {
                window: WindowCtx { window: f.window },
                gpu: f.gpu,
                input: f.input,
                input_frame: f.input_frame,
                time: f.clock.tick(),
            };
            let control = app.on_frame(&mut ctx);
            f.input_frame.clear();
            control
        })
    }
}

impl<A: App + 'static> ApplicationHandler for Driver<A> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.entry.is_some() || self.done {
            return;
        }
        match self.open(event_loop) {
            Ok(entry) => {
                log::info!("window \"{}\" opened", self.config.title);
                entry.with_window(|w| w.request_redraw());
                self.entry = Some(entry);
            }
            Err(e) => {
                log::error!("{e:#}");
                self.failure = Some(e);
                self.shutdown(event_loop);
            }
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(entry) = &self.entry {
            entry.with_window(|w| w.request_redraw());
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        if self.done {
            return;
        }
        if self.app.on_window_event(&event) == AppControl::Exit {
            self.shutdown(event_loop);
            return;
        }
        let Some(entry) = self.entry.as_mut() else {
            return;
        };

        match &event {
            WindowEvent::CloseRequested => {
                log::info!("window close requested");
                self.shutdown(event_loop);
            }
            WindowEvent::Resized(size) => entry.with_gpu_mut(|gpu| gpu.resize(*size)),
            WindowEvent::ScaleFactorChanged { .. } => {
                let size = entry.with_window(|w| w.inner_size());
                entry.with_gpu_mut(|gpu| gpu.resize(size));
            }
            WindowEvent::RedrawRequested => {
                if self.redraw() == AppControl::Exit {
                    self.shutdown(event_loop);
                }
            }
            other => entry.with_mut(|f| {
                if let Some(ev) = input_event(f.window, other) {
                    f.input.apply_event(f.input_frame, ev);
                }
            }),
        }
    }
}

fn button_state(state: ElementState) -> ButtonState {
    if state.is_pressed() {
        ButtonState::Pressed
    } else {
        ButtonState::Released
    }
}

/// Pointer positions are converted to logical pixels.
fn input_event(window: &Window, event: &WindowEvent) -> Option<InputEvent> {
    Some(match event {
        WindowEvent::Focused(focused) => InputEvent::Focused(*focused),
        WindowEvent::CursorLeft { .. } => InputEvent::PointerLeft,
        WindowEvent::CursorMoved { position, .. } => {
            let p = position.to_logical::<f32>(window.scale_factor());
            InputEvent::PointerMoved(Vec2::new(p.x, p.y))
        }
        WindowEvent::MouseInput { state, button, .. } => InputEvent::PointerButton {
            button: map_button(*button),
            state: button_state(*state),
        },
        WindowEvent::KeyboardInput { event, .. } => InputEvent::Key {
            key: map_key(event.physical_key),
            state: button_state(event.state),
            repeat: event.repeat,
        },
        _ => return None,
    })
}

fn map_button(button: WinitButton) -> MouseButton {
    match button {
        WinitButton::Left => MouseButton::Left,
        WinitButton::Right => MouseButton::Right,
        WinitButton::Middle => MouseButton::Middle,
        WinitButton::Back => MouseButton::Other(3),
        WinitButton::Forward => MouseButton::Other(4),
        WinitButton::Other(n) => MouseButton::Other(n),
    }
}

fn map_key(key: PhysicalKey) -> Key {
    let PhysicalKey::Code(code) = key else {
        return Key::Other(0);
    };
    match code {
        KeyCode::Escape => Key::Escape,
        KeyCode::Enter | KeyCode::NumpadEnter => Key::Enter,
        KeyCode::Space => Key::Space,
        KeyCode::Tab => Key::Tab,
        KeyCode::Backspace => Key::Backspace,
        KeyCode::ArrowUp => Key::ArrowUp,
        KeyCode::ArrowDown => Key::ArrowDown,
        KeyCode::ArrowLeft => Key::ArrowLeft,
        KeyCode::ArrowRight => Key::ArrowRight,
        other => Key::Other(other as u32),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_keys_map_through() {
        assert_eq!(map_key(PhysicalKey::Code(KeyCode::Escape)), Key::Escape);
        assert_eq!(map_key(PhysicalKey::Code(KeyCode::NumpadEnter)), Key::Enter);
    }

    #[test]
    fn unnamed_keys_keep_their_code() {
        assert_eq!(map_key(PhysicalKey::Code(KeyCode::KeyQ)), Key::Other(KeyCode::KeyQ as u32));
    }

    #[test]
    fn extra_mouse_buttons_are_numbered() {
        assert_eq!(map_button(WinitButton::Back), MouseButton::Other(3));
        assert_eq!(map_button(WinitButton::Other(9)), MouseButton::Other(9));
    }

    #[test]
    fn default_config_is_an_800_square_resizable_window() {
        let cfg = RuntimeConfig::default();
        assert_eq!(cfg.initial_size, LogicalSize::new(800.0, 800.0));
        assert!(cfg.resizable);
        assert!(!cfg.fullscreen);
    }
}
