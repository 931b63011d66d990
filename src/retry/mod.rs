//! # Retry execution.
//!
//! - [`RetryExecutor`] runs an operation with per-attempt timeouts and backoff
//! - [`TransientPredicate`] classifies failures as retryable or fatal
//! - [`Outcome`] / [`Failure`] / [`Cause`] describe how it ended
//! - [`Sleeper`] abstracts the backoff wait ([`TokioSleeper`] by default)

mod executor;
mod outcome;
mod predicate;
mod runner;
mod sleeper;

pub use executor::{Attempt, RetryExecutor};
pub use outcome::{Cause, Failure, FailureKind, Outcome};
pub use predicate::TransientPredicate;
pub use sleeper::{RecordingSleeper, Sleeper, TokioSleeper};

pub(crate) use executor::Scope;
