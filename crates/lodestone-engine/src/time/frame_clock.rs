use std::time::{Duration, Instant};

/// What the clock measured for one frame.
#[derive(Debug, Copy, Clone)]
pub struct FrameTime {
    /// Seconds since the previous tick, clamped.
    pub dt: f32,
    pub now: Instant,
    /// Starts at 0 and wraps.
    pub frame_index: u64,

    /// Exponentially smoothed frames per second.
    pub fps: f32,
}

/// Measures the time between redraws.
///
/// Deltas are clamped so a stall (debugger break, minimized window) does not
/// reach the scenes as a multi-second step.
#[derive(Debug, Clone)]
pub struct FrameClock {
    last: Instant,
    frame_index: u64,
    dt_min: Duration,
    dt_max: Duration,
    fps: f32,
}

/// Weight of the newest sample in the framerate average.
const FPS_SMOOTHING: f32 = 0.1;

impl FrameClock {
    /// Clamps deltas to 0.1 ms ..= 250 ms.
    pub fn new() -> Self {
        Self::with_clamps(Duration::from_micros(100), Duration::from_millis(250))
    }

    pub fn with_clamps(dt_min: Duration, dt_max: Duration) -> Self {
        debug_assert!(dt_min <= dt_max);
        Self {
            last: Instant::now(),
            frame_index: 0,
            dt_min,
            dt_max,
            fps: 0.0,
        }
    }

    /// Measures the next tick from now.
    pub fn reset(&mut self) {
        self.last = Instant::now();
    }

    /// Ends the current frame.
    pub fn tick(&mut self) -> FrameTime {
        let now = Instant::now();
        let elapsed = now.saturating_duration_since(self.last);
        self.last = now;
        self.advance(now, elapsed)
    }

    fn advance(&mut self, now: Instant, elapsed: Duration) -> FrameTime {
        let dt = elapsed.clamp(self.dt_min, self.dt_max).as_secs_f32();

        let sample = 1.0 / dt;
        self.fps = if self.frame_index == 0 {
            sample
        } else {
            self.fps + (sample - self.fps) * FPS_SMOOTHING
        };

        let time = FrameTime {
            dt,
            now,
            frame_index: self.frame_index,
            fps: self.fps,
        };

        self.frame_index = self.frame_index.wrapping_add(1);

        time
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delta_is_clamped_to_max() {
        let mut clock = FrameClock::new();
        let ft = clock.advance(Instant::now(), Duration::from_secs(3));
        assert_eq!(ft.dt, 0.25);
    }

    #[test]
    fn delta_is_clamped_to_min() {
        let mut clock = FrameClock::new();
        let ft = clock.advance(Instant::now(), Duration::ZERO);
        assert!((ft.dt - 0.0001).abs() < 1e-7);
    }

    #[test]
    fn fps_converges_towards_steady_rate() {
        let mut clock = FrameClock::new();
        let now = Instant::now();
        let first = clock.advance(now, Duration::from_millis(10));
        assert!((first.fps - 100.0).abs() < 0.5);

        let mut last = first;
        for _ in 0..200 {
            last = clock.advance(now, Duration::from_millis(20));
        }
        assert!((last.fps - 50.0).abs() < 0.5, "fps = {}", last.fps);
        assert_eq!(last.frame_index, 200);
    }
}
