use std::collections::HashSet;
use std::hash::Hash;

use crate::coords::Vec2;

use super::frame::{Edges, InputFrame};
use super::types::{ButtonState, InputEvent, Key, MouseButton};

/// What is held right now, and where the pointer is.
#[derive(Debug, Default)]
pub struct InputState {
    pub focused: bool,
    /// Overlay space. `None` while the pointer is outside the window.
    pub pointer: Option<Vec2>,
    pub keys_down: HashSet<Key>,
    pub buttons_down: HashSet<MouseButton>,
}

/// Records an edge only when the held set actually changes, so key repeat
/// and duplicate presses do not count twice.
fn transition<T: Copy + Eq + Hash>(down: &mut HashSet<T>, edges: &mut Edges<T>, item: T, state: ButtonState) {
    match state {
        ButtonState::Pressed if down.insert(item) => {
            edges.pressed.insert(item);
        }
        ButtonState::Released if down.remove(&item) => {
            edges.released.insert(item);
        }
        _ => {}
    }
}

impl InputState {
    pub fn apply_event(&mut self, frame: &mut InputFrame, ev: InputEvent) {
        match ev {
            InputEvent::Key { key, state, .. } => transition(&mut self.keys_down, &mut frame.keys, key, state),
            InputEvent::PointerButton { button, state } => {
                transition(&mut self.buttons_down, &mut frame.buttons, button, state)
            }
            InputEvent::PointerMoved(p) => self.pointer = Some(p),
            InputEvent::PointerLeft => self.pointer = None,
            InputEvent::Focused(focused) => {
                self.focused = focused;
                if !focused {
                    self.keys_down.clear();
                    self.buttons_down.clear();
                }
            }
        }
        frame.events.push(ev);
    }

    pub fn key_down(&self, key: Key) -> bool {
        self.keys_down.contains(&key)
    }

    pub fn button_down(&self, button: MouseButton) -> bool {
        self.buttons_down.contains(&button)
    }
}
