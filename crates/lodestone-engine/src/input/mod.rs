//! Polled window input.
//!
//! The window runtime translates winit events into [`InputEvent`]s; nothing
//! here names a winit type.

mod frame;
mod state;
mod types;

pub use frame::{Edges, InputFrame};
pub use state::InputState;
pub use types::{ButtonState, InputEvent, Key, MouseButton};
