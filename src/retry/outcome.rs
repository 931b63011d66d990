//! # Terminal results of a retry loop.
//!
//! [`Outcome`] is what a caller of [`RetryExecutor::execute`](crate::RetryExecutor::execute)
//! gets back: either the operation's value or exactly one classified [`Failure`].
//!
//! ```text
//! Outcome<T>
//!   ├─ Success(T)
//!   ├─ Failure(Failure { kind, attempts_used, cause })
//!   │            kind ∈ { Fatal, RetriesExhausted, InvalidConfiguration, WorkerCrashed }
//!   │            cause ∈ { Timeout, Error(anyhow::Error), Panic }
//!   └─ Cancelled   (reserved for layers above the core; never produced by it)
//! ```

use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// What went wrong in one attempt.
#[derive(Error, Debug)]
pub enum Cause {
    /// The attempt exceeded its bound and was abandoned.
    #[error("timed out after {timeout:?}")]
    Timeout {
        /// The bound that was exceeded.
        timeout: Duration,
    },

    /// The operation returned an error.
    #[error("{0:#}")]
    Error(anyhow::Error),

    /// The operation (or its completion hook) panicked inside a pool worker.
    #[error("panicked: {message}")]
    Panic {
        /// Panic payload rendered as text.
        message: String,
    },
}

impl Cause {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            Cause::Timeout { .. } => "cause_timeout",
            Cause::Error(_) => "cause_error",
            Cause::Panic { .. } => "cause_panic",
        }
    }

    /// True for [`Cause::Timeout`].
    pub fn is_timeout(&self) -> bool {
        matches!(self, Cause::Timeout { .. })
    }

    /// The operation's error, if this cause is one.
    pub fn error(&self) -> Option<&anyhow::Error> {
        match self {
            Cause::Error(e) => Some(e),
            _ => None,
        }
    }

    /// Downcasts the operation's error to a concrete type.
    ///
    /// # Example
    /// ```
    /// use taskcore::Cause;
    ///
    /// #[derive(Debug, thiserror::Error)]
    /// #[error("boom")]
    /// struct Boom;
    ///
    /// let cause = Cause::Error(Boom.into());
    /// assert!(cause.downcast_ref::<Boom>().is_some());
    /// ```
    pub fn downcast_ref<E>(&self) -> Option<&E>
    where
        E: fmt::Display + fmt::Debug + Send + Sync + 'static,
    {
        self.error().and_then(|e| e.downcast_ref::<E>())
    }
}

/// Classification of a terminal failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// The transient predicate rejected a failure; remaining attempts were skipped.
    Fatal,
    /// Every attempt failed transiently.
    RetriesExhausted,
    /// The call itself was malformed (`max_tries == 0`); the operation never ran.
    InvalidConfiguration,
    /// The job panicked inside a pool worker.
    WorkerCrashed,
}

impl FailureKind {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            FailureKind::Fatal => "fatal",
            FailureKind::RetriesExhausted => "retries_exhausted",
            FailureKind::InvalidConfiguration => "invalid_configuration",
            FailureKind::WorkerCrashed => "worker_crashed",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}

/// A classified terminal failure.
#[derive(Error, Debug)]
#[error("{kind} after {attempts_used} attempt(s)")]
pub struct Failure {
    /// Failure classification.
    pub kind: FailureKind,
    /// Number of times the operation was invoked.
    pub attempts_used: u32,
    /// Last observed cause (`None` only for `InvalidConfiguration`).
    #[source]
    pub cause: Option<Cause>,
}

impl Failure {
    pub(crate) fn new(kind: FailureKind, attempts_used: u32, cause: Option<Cause>) -> Self {
        Self {
            kind,
            attempts_used,
            cause,
        }
    }
}

/// Terminal result of a retry loop or of a pool job.
#[derive(Debug)]
pub enum Outcome<T> {
    /// The operation returned a value.
    Success(T),
    /// The loop gave up; see [`Failure::kind`].
    Failure(Failure),
    /// Reserved for cancellation layered above the core. Never produced by `taskcore` itself.
    Cancelled,
}

impl<T> Outcome<T> {
    /// True for [`Outcome::Success`].
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    /// The success value, if any.
    pub fn ok(self) -> Option<T> {
        match self {
            Outcome::Success(v) => Some(v),
            _ => None,
        }
    }

    /// The failure, if any.
    pub fn failure(&self) -> Option<&Failure> {
        match self {
            Outcome::Failure(f) => Some(f),
            _ => None,
        }
    }

    /// Maps the success value, keeping failures untouched.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Outcome::Success(v) => Outcome::Success(f(v)),
            Outcome::Failure(e) => Outcome::Failure(e),
            Outcome::Cancelled => Outcome::Cancelled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_display_and_source() {
        use std::error::Error as _;

        let f = Failure::new(
            FailureKind::RetriesExhausted,
            3,
            Some(Cause::Timeout {
                timeout: Duration::from_millis(100),
            }),
        );
        assert_eq!(f.to_string(), "retries_exhausted after 3 attempt(s)");
        assert_eq!(
            f.source().map(|s| s.to_string()).as_deref(),
            Some("timed out after 100ms")
        );
    }

    #[test]
    fn cause_error_renders_context_chain() {
        let err = anyhow::anyhow!("disk full").context("write failed");
        assert_eq!(Cause::Error(err).to_string(), "write failed: disk full");
    }

    #[test]
    fn outcome_helpers() {
        let ok: Outcome<u8> = Outcome::Success(1);
        assert!(ok.is_success());
        assert_eq!(ok.map(|v| v + 1).ok(), Some(2));

        let cancelled: Outcome<u8> = Outcome::Cancelled;
        assert!(cancelled.failure().is_none());
        assert!(cancelled.ok().is_none());
    }
}
