//! Frame timing.
//!
//! One `FrameClock` per render loop; call `tick()` once per presented frame to
//! obtain a `FrameTime` carrying the clamped delta and a smoothed framerate.

mod frame_clock;

pub use frame_clock::{FrameClock, FrameTime};
