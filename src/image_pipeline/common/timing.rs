use std::time::{Duration, Instant};

/// Measures a single named step, e.g. one demosaic pass.
pub struct Timer {
    start: Instant,
    name: String,
}

impl Timer {
    pub fn start(name: impl Into<String>) -> Self {
        Self {
            start: Instant::now(),
            name: name.into(),
        }
    }

    pub fn stop(self) -> (String, Duration) {
        (self.name, self.start.elapsed())
    }
}

/// Running frame-rate estimate from consecutive capture timestamps.
///
/// The estimate is `1 / (t_n - t_{n-1})`, so there is none until a second frame
/// has been recorded.
#[derive(Debug, Default, Clone)]
pub struct FrameRate {
    last: Option<Instant>,
    fps: Option<f64>,
    frames: u64,
}

impl FrameRate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a capture at `now` and returns the updated estimate.
    pub fn record(&mut self, now: Instant) -> Option<f64> {
        if let Some(last) = self.last {
            let elapsed = now.saturating_duration_since(last).as_secs_f64();
            // Two frames stamped at the same instant carry no rate information.
            if elapsed > 0.0 {
                self.fps = Some(1.0 / elapsed);
            }
        }
        self.last = Some(now);
        self.frames += 1;
        self.fps
    }

    pub fn fps(&self) -> Option<f64> {
        self.fps
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
