use std::time::Duration;
use warren_domain::config::RetryConfig;

/// Paces attempts to (re)open a channel.
pub trait RetryPolicy: Send + Sync + 'static {
    /// Delay before the next attempt, given the number of failed attempts so far
    /// (starting at 1). `None` gives up.
    fn next_delay(&self, attempt: u32) -> Option<Duration>;
}

/// `initial * multiplier^(attempt - 1)`, capped at `max`.
#[derive(Debug, Clone, PartialEq)]
pub struct ExponentialBackoff {
    initial: Duration,
    max: Duration,
    multiplier: f64,
    max_attempts: Option<u32>,
}

impl ExponentialBackoff {
    /// Doubles from `initial` up to `max`, retrying forever.
    #[must_use]
    pub const fn new(initial: Duration, max: Duration) -> Self {
        Self { initial, max, multiplier: 2.0, max_attempts: None }
    }

    #[must_use]
    pub const fn multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    /// Gives up once `attempts` attempts have failed.
    #[must_use]
    pub const fn max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = Some(attempts);
        self
    }
}

impl Default for ExponentialBackoff {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

impl From<&RetryConfig> for ExponentialBackoff {
    fn from(config: &RetryConfig) -> Self {
        Self {
            initial: config.initial_delay(),
            max: config.max_delay(),
            multiplier: config.multiplier,
            max_attempts: config.max_attempts,
        }
    }
}

impl RetryPolicy for ExponentialBackoff {
    fn next_delay(&self, attempt: u32) -> Option<Duration> {
        if self.max_attempts.is_some_and(|max| attempt >= max) {
            return None;
        }

        let exponent = i32::try_from(attempt.saturating_sub(1)).unwrap_or(i32::MAX);
        let secs = self.initial.as_secs_f64() * self.multiplier.powi(exponent);
        let delay = Duration::try_from_secs_f64(secs).unwrap_or(self.max);
        Some(delay.min(self.max))
    }
}
