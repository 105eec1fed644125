use std::time::Duration;

/// Reconnect attempt counter with exponential backoff
#[derive(Debug, Clone)]
pub struct ReconnectTimer {
    attempts: u32,
    base: Duration,
    max_attempts: u32,
    cap: Option<Duration>,
}

impl ReconnectTimer {
    pub fn new(base: Duration, max_attempts: u32) -> Self {
        Self {
            attempts: 0,
            base,
            max_attempts,
            cap: None,
        }
    }

    /// Upper bound for a single delay
    pub fn with_cap(mut self, cap: Option<Duration>) -> Self {
        self.cap = cap;
        self
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Counts an attempt and returns its delay, or `None` once the ceiling is reached.
    ///
    /// Attempt `n` waits `base * 2^(n-1)`.
    pub fn next_delay(&mut self) -> Option<Duration> {
        if self.attempts >= self.max_attempts {
            return None;
        }

        self.attempts += 1;
        let factor = 2u32.checked_pow(self.attempts - 1).unwrap_or(u32::MAX);
        let delay = self.base.saturating_mul(factor);

        Some(match self.cap {
            Some(cap) => delay.min(cap),
            None => delay,
        })
    }

    /// Reset after a successful connection
    pub fn reset(&mut self) {
        self.attempts = 0;
    }
}
