use std::time::{Duration, Instant};

/// Periodic deadline for one publisher, driven by the executor loop.
#[derive(Debug, Clone)]
pub struct PublishTimer {
    period: Duration,
    last_call_time: Instant,
    next_call_time: Instant,
}

impl PublishTimer {
    /// Start a timer firing `rate` times per second, first deadline one period
    /// from `now`. The period is whole milliseconds, at least one.
    pub fn from_rate(rate: f64, now: Instant) -> Option<Self> {
        if !rate.is_finite() || rate <= 0.0 {
            return None;
        }
        let millis = ((1000.0 / rate) as u64).max(1);
        Some(Self::new(Duration::from_millis(millis), now))
    }

    pub fn new(period: Duration, now: Instant) -> Self {
        Self {
            period,
            last_call_time: now,
            next_call_time: now + period,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn last_call_time(&self) -> Instant {
        self.last_call_time
    }

    pub fn next_call_time(&self) -> Instant {
        self.next_call_time
    }

    pub fn is_ready(&self, now: Instant) -> bool {
        self.next_call_time <= now
    }

    pub fn time_until_next_call(&self, now: Instant) -> Duration {
        self.next_call_time.saturating_duration_since(now)
    }

    /// Record a call at `now` and schedule the next one.
    ///
    /// Missed periods are skipped rather than fired in a burst.
    pub fn update(&mut self, now: Instant) {
        self.last_call_time = now;
        if self.period.is_zero() {
            self.next_call_time = now;
        } else {
            self.next_call_time += self.period;
            if let Some(behind) = now.checked_duration_since(self.next_call_time) {
                let period_ns = self.period.as_nanos();
                let advance = (behind.as_nanos() / period_ns + 1) * period_ns;
                self.next_call_time = u64::try_from(advance)
                    .ok()
                    .and_then(|ns| self.next_call_time.checked_add(Duration::from_nanos(ns)))
                    .unwrap_or(now + self.period);
            }
        }
    }
}
