// Measures the frame rate the camera actually delivers, one window at a time.

use std::time::Instant;

pub const DEFAULT_WINDOW: u32 = 30;

#[derive(Debug, Clone)]
pub struct ThroughputMeter {
    window: u32,
    frames: u32,
    window_start: Option<Instant>,
}

/// One completed measurement window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThroughputSample {
    pub frames: u32,
    pub seconds: f64,
    pub fps: f64,
}

impl ThroughputMeter {
    pub fn new(window: u32) -> Self {
        Self {
            window: window.max(1),
            frames: 0,
            window_start: None,
        }
    }

    /// Counts a frame. Returns a sample every `window` frames and starts a new
    /// window. The first call only starts the clock.
    pub fn tick(&mut self, now: Instant) -> Option<ThroughputSample> {
        let Some(start) = self.window_start else {
            self.window_start = Some(now);
            return None;
        };

        self.frames += 1;
        if self.frames < self.window {
            return None;
        }

        let seconds = now.saturating_duration_since(start).as_secs_f64();
        let frames = self.frames;
        self.frames = 0;
        self.window_start = Some(now);

        let fps = if seconds > 0.0 { frames as f64 / seconds } else { f64::INFINITY };
        Some(ThroughputSample { frames, seconds, fps })
    }
}

impl Default for ThroughputMeter {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn reports_once_per_window() {
        let start = Instant::now();
        let mut meter = ThroughputMeter::new(3);
        assert_eq!(meter.tick(start), None);
        assert_eq!(meter.tick(start + Duration::from_millis(100)), None);
        assert_eq!(meter.tick(start + Duration::from_millis(200)), None);

        let sample = meter.tick(start + Duration::from_millis(300)).unwrap();
        assert_eq!(sample.frames, 3);
        assert!((sample.seconds - 0.3).abs() < 1e-9);
        assert!((sample.fps - 10.0).abs() < 1e-6);

        assert_eq!(meter.tick(start + Duration::from_millis(400)), None);
    }
}
