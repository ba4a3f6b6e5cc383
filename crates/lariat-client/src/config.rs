//! Client configuration.

use std::time::Duration;

use crate::retry::RetryPolicy;

/// Per-client settings.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Per-call timeout raced against the network exchange.
    pub timeout: Duration,
    /// Retry policy used by [`crate::retry::ReliableChannel`]. One-shot
    /// HTTP calls do not retry.
    pub retry: RetryPolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(3600),
            retry: RetryPolicy::default(),
        }
    }
}

impl ClientConfig {
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}
