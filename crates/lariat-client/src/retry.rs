//! Transport reliability for persistent-channel transports.
//!
//! One-shot HTTP calls rely solely on the client-side timeout; transports
//! that hold a channel open wrap it in a [`ReliableChannel`], which retries
//! transient failures with linearly increasing backoff and reinitializes
//! the channel between attempts.

use std::time::Duration;

use async_trait::async_trait;
use futures::future::BoxFuture;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use lariat_core::Result;

/// Retry budget and backoff unit. The delay before attempt `n` is
/// `n * base_delay`, so backoff is monotonically non-decreasing.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
        }
    }

    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        self.base_delay * attempt
    }
}

/// Creates and tracks the state of a persistent channel.
#[async_trait]
pub trait ChannelFactory: Send + Sync {
    type Channel: Send;

    async fn open(&self) -> Result<Self::Channel>;

    /// Whether the factory itself is still usable. A factory that is not
    /// open is reinitialized before the next attempt.
    fn is_open(&self) -> bool {
        true
    }

    /// Reinitialize the factory after a failure. Default does nothing.
    async fn reset(&self) {}
}

/// Wraps a channel factory with bounded retry.
///
/// Transient failures (timeout, connection, socket class) tear the channel
/// down and retry after `attempt * base_delay`, up to the policy's budget;
/// the last observed failure surfaces once the budget is exhausted.
/// Non-transient failures propagate immediately.
pub struct ReliableChannel<F: ChannelFactory> {
    factory: F,
    policy: RetryPolicy,
    channel: Mutex<Option<F::Channel>>,
}

impl<F: ChannelFactory> ReliableChannel<F> {
    pub fn new(factory: F) -> Self {
        Self::with_policy(factory, RetryPolicy::default())
    }

    pub fn with_policy(factory: F, policy: RetryPolicy) -> Self {
        Self {
            factory,
            policy,
            channel: Mutex::new(None),
        }
    }

    /// Run one call through the channel, retrying per the policy.
    pub async fn call<R>(
        &self,
        op: impl for<'a> Fn(&'a mut F::Channel) -> BoxFuture<'a, Result<R>>,
    ) -> Result<R> {
        let mut guard = self.channel.lock().await;
        let mut attempt: u32 = 0;

        loop {
            if guard.is_none() {
                match self.factory.open().await {
                    Ok(channel) => *guard = Some(channel),
                    Err(e) => {
                        if !e.is_transient() {
                            return Err(e);
                        }
                        attempt += 1;
                        if attempt >= self.policy.max_attempts {
                            warn!(attempt, "retry budget exhausted opening channel");
                            return Err(e);
                        }
                        self.backoff(attempt, &e).await;
                        continue;
                    }
                }
            }

            let Some(channel) = guard.as_mut() else {
                continue;
            };
            match op(channel).await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() => {
                    attempt += 1;
                    *guard = None;
                    if attempt >= self.policy.max_attempts {
                        warn!(attempt, error = %e, "retry budget exhausted");
                        return Err(e);
                    }
                    self.backoff(attempt, &e).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn backoff(&self, attempt: u32, error: &lariat_core::Error) {
        if !self.factory.is_open() {
            self.factory.reset().await;
        }
        let delay = self.policy.delay_for_attempt(attempt);
        debug!(
            attempt,
            delay_ms = delay.as_millis() as u64,
            error = %error,
            "retrying after transient failure"
        );
        tokio::time::sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lariat_core::{Error, RpcError};
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Channel whose calls fail transiently a configured number of times.
    struct FlakyFactory {
        opens: AtomicU32,
        resets: AtomicU32,
    }

    impl FlakyFactory {
        fn new() -> Self {
            Self {
                opens: AtomicU32::new(0),
                resets: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl ChannelFactory for FlakyFactory {
        type Channel = u32;

        async fn open(&self) -> Result<u32> {
            Ok(self.opens.fetch_add(1, Ordering::SeqCst))
        }

        fn is_open(&self) -> bool {
            false
        }

        async fn reset(&self) {
            self.resets.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::new(max_attempts, Duration::from_millis(1))
    }

    #[tokio::test]
    async fn succeeds_after_transient_failures() {
        let channel = ReliableChannel::with_policy(FlakyFactory::new(), fast_policy(10));
        let failures_left = AtomicU32::new(3);

        let result = channel
            .call(|_ch| {
                let remaining = failures_left.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
                    Some(n.saturating_sub(1))
                });
                Box::pin(async move {
                    match remaining {
                        Ok(n) if n > 0 => Err(Error::transport("connection reset")),
                        _ => Ok(99u32),
                    }
                })
            })
            .await;

        assert_eq!(result.unwrap(), 99);
        // One initial open plus one per failed attempt.
        assert_eq!(channel.factory.opens.load(Ordering::SeqCst), 4);
        assert_eq!(channel.factory.resets.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn exhausted_budget_surfaces_last_failure() {
        let channel = ReliableChannel::with_policy(FlakyFactory::new(), fast_policy(3));
        let calls = AtomicU32::new(0);

        let result: Result<u32> = channel
            .call(|_ch| {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                Box::pin(async move { Err(Error::transport(format!("failure {}", n))) })
            })
            .await;

        match result {
            Err(Error::Transport(message)) => assert_eq!(message, "failure 2"),
            other => panic!("expected transport error, got {:?}", other),
        }
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn non_transient_failures_are_not_retried() {
        let channel = ReliableChannel::with_policy(FlakyFactory::new(), fast_policy(10));
        let calls = AtomicU32::new(0);

        let result: Result<u32> = channel
            .call(|_ch| {
                calls.fetch_add(1, Ordering::SeqCst);
                Box::pin(async move { Err(Error::Remote(RpcError::new("domain failure", ""))) })
            })
            .await;

        assert!(matches!(result, Err(Error::Remote(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn backoff_is_monotonically_non_decreasing() {
        let policy = RetryPolicy::default();
        let mut previous = Duration::ZERO;
        for attempt in 1..=policy.max_attempts {
            let delay = policy.delay_for_attempt(attempt);
            assert!(delay >= previous);
            previous = delay;
        }
        assert_eq!(policy.delay_for_attempt(3), Duration::from_secs(3));
    }
}
