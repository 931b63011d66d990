//! # Retry executor: run an operation until it succeeds, fails fatally or runs out of tries.
//!
//! [`RetryExecutor`] owns two strategies and a classifier:
//! - **timeout strategy**: bound for each attempt (`+inf`, see [`Strategy::unbounded`], = none)
//! - **backoff strategy**: delay slept after a transient failure
//! - **transient predicate**: decides retry vs. abort
//!
//! ## Flow
//! ```text
//! execute(op, max_tries)
//!   ├─► max_tries == 0 → Failure(InvalidConfiguration, attempts_used = 0)
//!   └─► for attempt in 1..=max_tries:
//!         ├─► timeout = timeout_strategy.next_bound()
//!         ├─► backoff = backoff_strategy.next()
//!         ├─► run_once(op, timeout)
//!         │     ├─ Ok(v)          → Success(v)
//!         │     └─ Err(cause)
//!         │          ├─ fatal     → Failure(Fatal, attempt, cause)
//!         │          └─ transient → sleep(backoff) unless last attempt
//!         └─► (loop)
//!       → Failure(RetriesExhausted, max_tries, last cause)
//! ```
//!
//! ## Rules
//! - Both strategies advance **exactly once per attempt**, before the call, in lock-step.
//!   The backoff value drawn for the final attempt is discarded.
//! - The predicate is consulted **once per failure**.
//! - `execute` does **not** reset the strategies. A long-lived executor keeps its cursors;
//!   call [`RetryExecutor::reset`] between independent operations (the pool does this
//!   before every job).
//! - On timeout the attempt is abandoned: its future is dropped and its
//!   [`Attempt::token`] is cancelled. Nothing forcibly stops work it spawned elsewhere.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::events::{Event, EventKind};
use crate::policies::Strategy;
use crate::pool::WorkerId;
use crate::retry::runner::run_once;
use crate::retry::{Cause, Failure, FailureKind, Outcome, Sleeper, TokioSleeper, TransientPredicate};
use crate::subscribers::SubscriberSet;

/// Per-attempt context handed to operations run via [`RetryExecutor::execute_with`].
#[derive(Debug, Clone)]
pub struct Attempt {
    /// 1-based attempt number.
    pub number: u32,
    /// Cancelled when this attempt times out or the caller's token is cancelled.
    pub token: CancellationToken,
}

/// Where events emitted by one run are attributed.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct Scope<'a> {
    pub job: Option<&'a Arc<str>>,
    pub worker: Option<WorkerId>,
}

impl Scope<'_> {
    fn event(&self, kind: EventKind) -> Event {
        Event::new(kind)
            .with_job_opt(self.job)
            .with_worker_opt(self.worker)
    }
}

/// Outcome plus the number of times the operation ran.
pub(crate) struct Report<T> {
    pub outcome: Outcome<T>,
    pub attempts: u32,
}

/// Runs fallible operations with per-attempt timeouts and backoff between attempts.
///
/// Not `Sync`-shared: each worker owns its own executor (clones are independent,
/// each with its own strategy cursors).
///
/// # Example
/// ```
/// use taskcore::{FailureKind, Outcome, RetryExecutor, Strategy, TransientPredicate};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> anyhow::Result<()> {
/// let mut exec = RetryExecutor::new(Strategy::constant(100.0)?, Strategy::constant(0.0)?)
///     .with_transient(TransientPredicate::always());
///
/// let mut calls = 0;
/// let out = exec
///     .execute(
///         || {
///             calls += 1;
///             let n = calls;
///             async move {
///                 if n < 3 { anyhow::bail!("not yet") }
///                 Ok(n)
///             }
///         },
///         5,
///     )
///     .await;
/// assert_eq!(out.ok(), Some(3));
///
/// let out = exec.execute(|| async { Ok::<_, anyhow::Error>(()) }, 0).await;
/// assert_eq!(out.failure().map(|f| f.kind), Some(FailureKind::InvalidConfiguration));
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct RetryExecutor {
    timeout: Strategy,
    backoff: Strategy,
    transient: TransientPredicate,
    sleeper: Arc<dyn Sleeper>,
    subs: Option<Arc<SubscriberSet>>,
}

impl RetryExecutor {
    /// Creates an executor with the never-transient predicate and the Tokio sleeper.
    #[must_use]
    pub fn new(timeout: Strategy, backoff: Strategy) -> Self {
        Self {
            timeout,
            backoff,
            transient: TransientPredicate::default(),
            sleeper: Arc::new(TokioSleeper),
            subs: None,
        }
    }

    /// Replaces the transient predicate.
    #[must_use]
    pub fn with_transient(mut self, transient: TransientPredicate) -> Self {
        self.transient = transient;
        self
    }

    /// Replaces the backoff sleeper.
    #[must_use]
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Publishes attempt-level events to `subs`.
    #[must_use]
    pub fn with_subscribers(mut self, subs: Arc<SubscriberSet>) -> Self {
        self.subs = Some(subs);
        self
    }

    /// Returns both strategies to their initial cursor.
    pub fn reset(&mut self) {
        self.timeout.reset();
        self.backoff.reset();
    }

    /// Timeout strategy (read-only).
    pub fn timeout_strategy(&self) -> &Strategy {
        &self.timeout
    }

    /// Backoff strategy (read-only).
    pub fn backoff_strategy(&self) -> &Strategy {
        &self.backoff
    }

    pub(crate) fn has_subscribers(&self) -> bool {
        self.subs.is_some()
    }

    /// Runs `op` up to `max_tries` times.
    ///
    /// Returns [`Outcome::Success`] with the first value produced, or exactly one
    /// [`Outcome::Failure`]. Never returns [`Outcome::Cancelled`].
    pub async fn execute<T, F, Fut>(&mut self, mut op: F, max_tries: u32) -> Outcome<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = anyhow::Result<T>>,
    {
        let token = CancellationToken::new();
        self.execute_with(move |_attempt| op(), max_tries, &token)
            .await
    }

    /// Like [`execute`](Self::execute), but hands each attempt its number and a
    /// child of `token` that is cancelled when the attempt times out.
    pub async fn execute_with<T, F, Fut>(
        &mut self,
        op: F,
        max_tries: u32,
        token: &CancellationToken,
    ) -> Outcome<T>
    where
        F: FnMut(Attempt) -> Fut,
        Fut: Future<Output = anyhow::Result<T>>,
    {
        self.run(Scope::default(), op, max_tries, token)
            .await
            .outcome
    }

    pub(crate) async fn run<T, F, Fut>(
        &mut self,
        scope: Scope<'_>,
        mut op: F,
        max_tries: u32,
        parent: &CancellationToken,
    ) -> Report<T>
    where
        F: FnMut(Attempt) -> Fut,
        Fut: Future<Output = anyhow::Result<T>>,
    {
        if max_tries == 0 {
            return Report {
                outcome: Outcome::Failure(Failure::new(FailureKind::InvalidConfiguration, 0, None)),
                attempts: 0,
            };
        }

        let mut last: Option<Cause> = None;
        for attempt in 1..=max_tries {
            let timeout = self.timeout.next_bound();
            let backoff = self.backoff.next();

            self.emit(|| {
                let ev = scope.event(EventKind::AttemptStarting).with_attempt(attempt);
                match timeout {
                    Some(t) => ev.with_timeout(t),
                    None => ev,
                }
            })
            .await;

            let cause = match run_once(&mut op, attempt, timeout, parent).await {
                Ok(value) => {
                    self.emit(|| scope.event(EventKind::AttemptSucceeded).with_attempt(attempt))
                        .await;
                    return Report {
                        outcome: Outcome::Success(value),
                        attempts: attempt,
                    };
                }
                Err(cause) => cause,
            };

            self.emit(|| match &cause {
                Cause::Timeout { timeout } => scope
                    .event(EventKind::AttemptTimedOut)
                    .with_attempt(attempt)
                    .with_timeout(*timeout),
                other => scope
                    .event(EventKind::AttemptFailed)
                    .with_attempt(attempt)
                    .with_reason(other.to_string()),
            })
            .await;

            if !self.transient.is_transient(&cause) {
                self.emit(|| {
                    scope
                        .event(EventKind::FatalFailure)
                        .with_attempt(attempt)
                        .with_reason(cause.to_string())
                })
                .await;
                return Report {
                    outcome: Outcome::Failure(Failure::new(FailureKind::Fatal, attempt, Some(cause))),
                    attempts: attempt,
                };
            }

            if attempt < max_tries {
                self.emit(|| {
                    scope
                        .event(EventKind::BackoffScheduled)
                        .with_attempt(attempt)
                        .with_delay(backoff)
                        .with_reason(cause.to_string())
                })
                .await;
                self.sleeper.sleep(backoff).await;
            }
            last = Some(cause);
        }

        self.emit(|| {
            let ev = scope
                .event(EventKind::RetriesExhausted)
                .with_attempt(max_tries);
            match &last {
                Some(c) => ev.with_reason(c.to_string()),
                None => ev,
            }
        })
        .await;

        Report {
            outcome: Outcome::Failure(Failure::new(FailureKind::RetriesExhausted, max_tries, last)),
            attempts: max_tries,
        }
    }

    /// Builds and publishes an event only when someone is listening.
    async fn emit(&self, make: impl FnOnce() -> Event) {
        if let Some(subs) = &self.subs {
            subs.emit(make()).await;
        }
    }
}

impl fmt::Debug for RetryExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryExecutor")
            .field("timeout", &self.timeout)
            .field("backoff", &self.backoff)
            .field("transient", &self.transient)
            .field("subscribers", &self.subs.as_ref().map(|s| s.len()))
            .finish_non_exhaustive()
    }
}
