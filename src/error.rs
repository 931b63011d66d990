//! Error types used by the taskcore primitives.
//!
//! This module defines two error enums:
//!
//! - [`ConfigError`]: a strategy, job or pool was constructed with disallowed parameters.
//! - [`PoolError`]: a [`WorkerPool`](crate::WorkerPool) call was made in the wrong lifecycle state.
//!
//! Failures of the user operation itself are **not** errors of this crate: they are
//! captured as values inside [`Outcome`](crate::Outcome) and never cross the pool boundary.
//!
//! Both types provide `as_label` for logs/metrics.

use thiserror::Error;

/// # Rejected construction parameters.
///
/// Surfaces at construction time only (strategy constructors, [`JobBuilder::build`](crate::JobBuilder::build),
/// [`WorkerPool::new`](crate::WorkerPool::new)).
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A parameter is out of its allowed range (negative duration, zero `max_tries`, zero workers...).
    #[error("invalid configuration: {reason}")]
    InvalidConfiguration {
        /// What was rejected and why.
        reason: String,
    },
}

impl ConfigError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        ConfigError::InvalidConfiguration {
            reason: reason.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use taskcore::Strategy;
    ///
    /// let err = Strategy::constant(-1.0).unwrap_err();
    /// assert_eq!(err.as_label(), "invalid_configuration");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            ConfigError::InvalidConfiguration { .. } => "invalid_configuration",
        }
    }
}

/// # Pool lifecycle violations.
///
/// Returned by the offending [`WorkerPool`](crate::WorkerPool) call; the pool state is left unchanged.
#[non_exhaustive]
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolError {
    /// `submit` (or `join`) was called before `start`.
    #[error("pool not started")]
    NotStarted,

    /// `start` was called on a pool that was already started.
    #[error("pool already started")]
    AlreadyStarted,

    /// The pool has been joined (or has drained and closed during `join`) and no longer accepts calls.
    #[error("pool already joined")]
    Joined,

    /// Bounded queue is full (only from `try_submit`; `submit` waits instead).
    #[error("job queue full")]
    QueueFull,
}

impl PoolError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            PoolError::NotStarted => "pool_not_started",
            PoolError::AlreadyStarted => "pool_already_started",
            PoolError::Joined => "pool_joined",
            PoolError::QueueFull => "pool_queue_full",
        }
    }

    /// Indicates whether the error is a lifecycle violation (a programming error
    /// at the call site) rather than back-pressure.
    ///
    /// # Example
    /// ```
    /// use taskcore::PoolError;
    ///
    /// assert!(PoolError::NotStarted.is_lifecycle_violation());
    /// assert!(!PoolError::QueueFull.is_lifecycle_violation());
    /// ```
    pub fn is_lifecycle_violation(&self) -> bool {
        !matches!(self, PoolError::QueueFull)
    }
}
