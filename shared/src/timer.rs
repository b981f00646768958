use std::time::{Duration, Instant};

/// A timer which rings once its duration has elapsed since the last reset
pub struct Timer {
    duration: Duration,
    last: Instant,
}

impl Timer {
    pub fn new(duration: Duration) -> Self {
        Self::new_at(duration, Instant::now())
    }

    pub fn new_at(duration: Duration, now: Instant) -> Self {
        Self {
            duration,
            last: now,
        }
    }

    pub fn reset_at(&mut self, now: Instant) {
        self.last = now;
    }

    pub fn ringing_at(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.last) >= self.duration
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }
}
