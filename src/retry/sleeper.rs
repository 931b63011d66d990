//! # Pluggable backoff sleeping.
//!
//! The executor never calls `tokio::time::sleep` directly: it goes through a
//! [`Sleeper`], so tests can observe (or skip) every backoff.

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

/// Waits for a backoff delay.
#[async_trait]
pub trait Sleeper: Send + Sync + 'static {
    /// Suspends the caller for `delay`.
    async fn sleep(&self, delay: Duration);
}

/// Default sleeper backed by [`tokio::time::sleep`].
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, delay: Duration) {
        tokio::time::sleep(delay).await;
    }
}

/// Sleeper that records every requested delay and returns immediately.
///
/// Useful in tests to assert the exact backoff sequence without waiting for it.
#[derive(Debug, Default)]
pub struct RecordingSleeper {
    delays: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every delay requested so far, in call order.
    pub fn delays(&self) -> Vec<Duration> {
        self.delays
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, delay: Duration) {
        self.delays
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(delay);
    }
}
