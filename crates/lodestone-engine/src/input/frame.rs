use std::collections::HashSet;
use std::hash::Hash;

use super::types::{InputEvent, Key, MouseButton};

/// Press and release edges of one kind of input.
#[derive(Debug)]
pub struct Edges<T> {
    pub pressed: HashSet<T>,
    pub released: HashSet<T>,
}

impl<T> Default for Edges<T> {
    fn default() -> Self {
        Self {
            pressed: HashSet::new(),
            released: HashSet::new(),
        }
    }
}

impl<T: Eq + Hash> Edges<T> {
    fn clear(&mut self) {
        self.pressed.clear();
        self.released.clear();
    }
}

/// What changed since the previous frame. Cleared after every frame callback.
#[derive(Debug, Default)]
pub struct InputFrame {
    /// Raw events in arrival order.
    pub events: Vec<InputEvent>,
    pub keys: Edges<Key>,
    pub buttons: Edges<MouseButton>,
}

impl InputFrame {
    pub fn clear(&mut self) {
        self.events.clear();
        self.keys.clear();
        self.buttons.clear();
    }

    pub fn key_pressed(&self, key: Key) -> bool {
        self.keys.pressed.contains(&key)
    }

    pub fn button_pressed(&self, button: MouseButton) -> bool {
        self.buttons.pressed.contains(&button)
    }

    pub fn button_released(&self, button: MouseButton) -> bool {
        self.buttons.released.contains(&button)
    }
}
