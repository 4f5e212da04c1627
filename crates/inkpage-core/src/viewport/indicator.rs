//! Auto-hiding indicator flags.

use std::time::{Duration, Instant};

/// A flag that turns on when shown and turns itself off once `duration`
/// has passed without another `show`.
#[derive(Debug, Clone)]
pub struct IndicatorTimer {
    duration: Duration,
    visible_until: Option<Instant>,
}

impl IndicatorTimer {
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            visible_until: None,
        }
    }

    /// Show the indicator at `now`, restarting the hide countdown.
    pub fn show(&mut self, now: Instant) {
        self.visible_until = Some(now + self.duration);
    }

    pub fn hide(&mut self) {
        self.visible_until = None;
    }

    pub fn is_visible(&self, now: Instant) -> bool {
        self.visible_until.is_some_and(|until| now < until)
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }
}
