use crate::coords::Vec2;

/// Keys the host and scenes react to. Anything else keeps its platform code.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Key {
    Escape,
    Enter,
    Space,
    Tab,
    Backspace,
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    Other(u32),
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    Other(u16),
}

/// Edge reported for a key or a mouse button.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ButtonState {
    Pressed,
    Released,
}

/// Window input, already translated out of the platform's types.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum InputEvent {
    Key {
        key: Key,
        state: ButtonState,
        repeat: bool,
    },
    /// Logical pixels, top-left origin.
    PointerMoved(Vec2),
    PointerButton {
        button: MouseButton,
        state: ButtonState,
    },
    PointerLeft,
    Focused(bool),
}
