// THEORY:
// After an attempt finds no motion the engine waits out a quiet period before
// looking again. The timer only remembers when the last quiet attempt happened. An
// unset timer means "already elapsed", so a fresh cycle may attempt immediately.
// The boundary is exclusive: an attempt is due only once strictly more than the
// quiet period has passed.

use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuietPeriodTimer {
    period: Duration,
    last_quiet: Option<Instant>,
}

impl QuietPeriodTimer {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            last_quiet: None,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn is_elapsed(&self, now: Instant) -> bool {
        match self.last_quiet {
            None => true,
            Some(since) => now.saturating_duration_since(since) > self.period,
        }
    }

    /// Records a "no motion" attempt, or an abandoned session, at `now`.
    pub fn mark_quiet(&mut self, now: Instant) {
        self.last_quiet = Some(now);
    }
}
