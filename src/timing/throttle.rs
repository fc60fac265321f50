use tokio::time::{Duration, Instant};

/// At most one invocation per window; calls inside the window are dropped.
#[derive(Debug, Clone)]
pub struct Throttle {
    window: Duration,
    last_fired_at: Option<Instant>,
}

impl Throttle {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_fired_at: None,
        }
    }

    pub fn from_millis(ms: u64) -> Self {
        Self::new(Duration::from_millis(ms))
    }

    /// Returns true if a call at `now` would be let through.
    pub fn should_fire(&self, now: Instant) -> bool {
        match self.last_fired_at {
            None => true,
            Some(last) => now.saturating_duration_since(last) >= self.window,
        }
    }

    pub fn record_fire(&mut self, now: Instant) {
        self.last_fired_at = Some(now);
    }

    /// Check and record in one step, against the tokio clock.
    pub fn try_fire(&mut self) -> bool {
        let now = Instant::now();
        if self.should_fire(now) {
            self.record_fire(now);
            true
        } else {
            false
        }
    }
}
