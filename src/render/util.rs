//! Render-loop timing.

use std::time::Instant;

/// A frame timer that tracks:
/// - `elapsed`: seconds since creation
/// - `dt`: seconds since the last `tick()`
///
/// `tick()` clamps unreasonable `dt` (e.g. when resuming from a breakpoint or after the
/// window was occluded for a while).
#[derive(Debug, Clone)]
pub struct FrameClock {
    start: Instant,
    last: Instant,
    /// Max dt allowed from `tick()` (in seconds).
    max_dt: f32,
    frames: u64,
}

impl FrameClock {
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            start: now,
            last: now,
            max_dt: 0.1,
            frames: 0,
        }
    }

    /// Set the `max_dt` clamp for `tick()`.
    #[inline]
    pub fn with_max_dt(mut self, max_dt: f32) -> Self {
        self.max_dt = max_dt.max(0.0);
        self
    }

    /// Seconds since this clock was created.
    #[inline]
    pub fn elapsed_s(&self) -> f32 {
        self.start.elapsed().as_secs_f32()
    }

    /// Number of `tick()` calls so far.
    #[inline]
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Advance the clock and return `dt` in seconds, clamped to `[0, max_dt]`.
    #[inline]
    pub fn tick(&mut self) -> f32 {
        let now = Instant::now();
        let dt = (now - self.last).as_secs_f32();
        self.last = now;
        self.frames += 1;
        dt.clamp(0.0, self.max_dt)
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
    fn test_tick_is_clamped() {
        let mut clock = FrameClock::new().with_max_dt(0.0);
        std::thread::sleep(std::time::Duration::from_millis(2));
        assert_eq!(clock.tick(), 0.0);
        assert_eq!(clock.frames(), 1);
    }
}
