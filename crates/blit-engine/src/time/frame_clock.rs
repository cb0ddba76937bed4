use std::time::{Duration, Instant};

/// Timing snapshot taken at the start of a frame.
#[derive(Debug, Copy, Clone)]
pub struct FrameTime {
    /// Seconds since the previous tick, clamped.
    pub dt: f32,
    /// Seconds since the clock was created or last reset.
    pub elapsed: f32,
    pub now: Instant,
    pub frame_index: u64,
}

/// Produces [`FrameTime`]s and a smoothed frame rate.
///
/// Delta time is clamped so a debugger pause or a minimized window does not
/// feed a huge step into animations.
#[derive(Debug, Clone)]
pub struct FrameClock {
    start: Instant,
    last: Instant,
    frame_index: u64,
    dt_min: Duration,
    dt_max: Duration,
    fps: f32,
}

/// Weight of the newest sample in the fps moving average.
const FPS_SMOOTHING: f32 = 0.1;

impl FrameClock {
    pub fn new() -> Self {
        Self::with_clamps(Duration::from_micros(100), Duration::from_millis(250))
    }

    pub fn with_clamps(dt_min: Duration, dt_max: Duration) -> Self {
        debug_assert!(dt_min <= dt_max);
        let now = Instant::now();
        Self {
            start: now,
            last: now,
            frame_index: 0,
            dt_min,
            dt_max,
            fps: 0.0,
        }
    }

    /// Restarts delta and elapsed time, e.g. after the window is restored.
    pub fn reset(&mut self) {
        let now = Instant::now();
        self.start = now;
        self.last = now;
    }

    pub fn tick(&mut self) -> FrameTime {
        let now = Instant::now();
        self.tick_at(now)
    }

    fn tick_at(&mut self, now: Instant) -> FrameTime {
        let dt = now
            .saturating_duration_since(self.last)
            .clamp(self.dt_min, self.dt_max)
            .as_secs_f32();
        self.last = now;

        let sample = 1.0 / dt;
        self.fps = if self.frame_index == 0 {
            sample
        } else {
            self.fps + (sample - self.fps) * FPS_SMOOTHING
        };

        let ft = FrameTime {
            dt,
            elapsed: now.saturating_duration_since(self.start).as_secs_f32(),
            now,
            frame_index: self.frame_index,
        };
        self.frame_index = self.frame_index.wrapping_add(1);
        ft
    }

    /// Exponentially smoothed frames per second.
    pub fn fps(&self) -> f32 {
        self.fps
    }

    pub fn frame_index(&self) -> u64 {
        self.frame_index
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
    use approx::assert_relative_eq;

    #[test]
    fn dt_is_clamped() {
        let mut clock = FrameClock::new();
        let base = clock.last;

        let ft = clock.tick_at(base + Duration::from_secs(5));
        assert_relative_eq!(ft.dt, 0.25);
        assert_eq!(ft.frame_index, 0);

        let ft = clock.tick_at(base + Duration::from_secs(5));
        assert_relative_eq!(ft.dt, 0.0001);
        assert_eq!(ft.frame_index, 1);
    }

    #[test]
    fn fps_tracks_steady_rate() {
        let mut clock = FrameClock::new();
        let mut t = clock.last;
        for _ in 0..200 {
            t += Duration::from_millis(20);
            clock.tick_at(t);
        }
        assert_relative_eq!(clock.fps(), 50.0, epsilon = 0.5);
        assert_eq!(clock.frame_index(), 200);
    }

    #[test]
    fn elapsed_accumulates_and_resets() {
        let mut clock = FrameClock::new();
        let t0 = clock.start;
        clock.tick_at(t0 + Duration::from_millis(100));
        let ft = clock.tick_at(t0 + Duration::from_millis(200));
        assert_relative_eq!(ft.elapsed, 0.2, epsilon = 1e-4);

        clock.reset();
        let ft = clock.tick_at(clock.start + Duration::from_millis(50));
        assert_relative_eq!(ft.elapsed, 0.05, epsilon = 1e-4);
    }
}
