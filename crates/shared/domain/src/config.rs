use serde::Deserialize;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use std::time::Duration;

/// Top-level client configuration.
#[derive(Default, Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ClientConfigInner {
    pub channel: PersistentChannelConfig,
}

/// Thin Arc-wrapped config for inexpensive cloning into channels and factories.
#[derive(Default, Debug, Clone, PartialEq, Deserialize)]
pub struct ClientConfig {
    #[serde(flatten, default)]
    inner: Arc<ClientConfigInner>,
}

impl ClientConfig {
    #[must_use]
    pub fn new(inner: ClientConfigInner) -> Self {
        Self { inner: Arc::new(inner) }
    }
}

impl Deref for ClientConfig {
    type Target = ClientConfigInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl DerefMut for ClientConfig {
    fn deref_mut(&mut self) -> &mut ClientConfigInner {
        Arc::make_mut(&mut self.inner)
    }
}

/// Persistent channel behaviour.
#[derive(Default, Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PersistentChannelConfig {
    pub retry: RetryConfig,
}

/// Exponential backoff between attempts to (re)open a channel.
///
/// The delay after the n-th failed attempt is `initial_delay_ms * multiplier^(n-1)`,
/// capped at `max_delay_ms`. `max_attempts = None` retries until cancelled or disposed.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub multiplier: f64,
    pub max_attempts: Option<u32>,
}

impl RetryConfig {
    #[must_use]
    pub const fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms)
    }

    #[must_use]
    pub const fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }
}

// --- Default ---

impl Default for RetryConfig {
    fn default() -> Self {
        Self { initial_delay_ms: 100, max_delay_ms: 10_000, multiplier: 2.0, max_attempts: None }
    }
}
