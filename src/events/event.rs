//! # Events emitted by the retry executor and the worker pool.
//!
//! The [`EventKind`] enum classifies event types across three categories:
//! - **Attempt events**: one retry loop step (starting, succeeded, failed, timed out, backoff)
//! - **Terminal events**: the retry loop gave up (exhausted, fatal) or a job completed
//! - **Worker events**: pool worker lifecycle (started, exiting, crashed)
//!
//! The [`Event`] struct carries additional metadata such as timestamps, job name,
//! worker id, reasons and durations.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//! Use `seq` to restore the exact order when events are observed by different subscribers.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use taskcore::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::AttemptFailed)
//!     .with_job("resize-images")
//!     .with_reason("boom")
//!     .with_attempt(3)
//!     .with_timeout(Duration::from_secs(5));
//!
//! assert_eq!(ev.kind, EventKind::AttemptFailed);
//! assert_eq!(ev.job.as_deref(), Some("resize-images"));
//! assert_eq!(ev.reason.as_deref(), Some("boom"));
//! assert_eq!(ev.timeout_ms, Some(5_000));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

use crate::jobs::JobStatus;
use crate::pool::WorkerId;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets:
    /// - `reason`: `subscriber=<name> info=<panic message>`
    SubscriberPanicked,

    // === Attempt events ===
    /// An attempt is about to invoke the operation.
    ///
    /// Sets:
    /// - `job`, `worker` (when run by the pool)
    /// - `attempt`: 1-based attempt number
    /// - `timeout_ms`: bound for this attempt (absent when unbounded)
    AttemptStarting,

    /// The operation returned a value within its bound.
    ///
    /// Sets: `job`, `worker`, `attempt`
    AttemptSucceeded,

    /// The operation returned an error.
    ///
    /// Sets: `job`, `worker`, `attempt`, `reason`
    AttemptFailed,

    /// The operation exceeded its bound and was abandoned.
    ///
    /// Sets: `job`, `worker`, `attempt`, `timeout_ms`
    AttemptTimedOut,

    /// A transient failure will be retried after a delay.
    ///
    /// Sets: `job`, `worker`, `attempt` (the failed one), `delay_ms`, `reason`
    BackoffScheduled,

    // === Terminal events ===
    /// Every attempt failed transiently; the loop gave up.
    ///
    /// Sets: `job`, `worker`, `attempt` (= attempts used), `reason` (last cause)
    RetriesExhausted,

    /// A failure was classified as fatal; remaining attempts were skipped.
    ///
    /// Sets: `job`, `worker`, `attempt`, `reason`
    FatalFailure,

    /// A pool job reached its terminal state (after `on_complete` ran).
    ///
    /// Sets: `job`, `worker`, `status`, `attempt` (attempts used, when known)
    JobCompleted,

    // === Worker events ===
    /// A pool worker entered its loop.
    ///
    /// Sets: `worker`
    WorkerStarted,

    /// A pool worker received the shutdown sentinel and is leaving its loop.
    ///
    /// Sets: `worker`
    WorkerExiting,

    /// A job panicked inside a worker, or a worker task died.
    ///
    /// Sets:
    /// - job panic: `worker`, `job` (if named), `status = Crashed`, `reason` (panic message)
    /// - dead worker: `worker`, `reason` (no `status`)
    WorkerCrashed,
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Job name, if applicable.
    pub job: Option<Arc<str>>,
    /// Pool worker id, if applicable.
    pub worker: Option<WorkerId>,
    /// Attempt number (starting from 1).
    pub attempt: Option<u32>,
    /// Attempt bound in milliseconds (compact).
    pub timeout_ms: Option<u32>,
    /// Backoff delay before the next attempt in milliseconds (compact).
    pub delay_ms: Option<u32>,
    /// Human-readable reason (errors, panic details, etc.).
    pub reason: Option<Arc<str>>,
    /// Terminal job status (only for `JobCompleted`).
    pub status: Option<JobStatus>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            job: None,
            worker: None,
            attempt: None,
            timeout_ms: None,
            delay_ms: None,
            reason: None,
            status: None,
        }
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches a job name.
    #[inline]
    pub fn with_job(mut self, job: impl Into<Arc<str>>) -> Self {
        self.job = Some(job.into());
        self
    }

    /// Attaches a job name if one is known.
    #[inline]
    pub(crate) fn with_job_opt(mut self, job: Option<&Arc<str>>) -> Self {
        self.job = job.cloned();
        self
    }

    /// Attaches a worker id.
    #[inline]
    pub fn with_worker(mut self, worker: WorkerId) -> Self {
        self.worker = Some(worker);
        self
    }

    #[inline]
    pub(crate) fn with_worker_opt(mut self, worker: Option<WorkerId>) -> Self {
        self.worker = worker;
        self
    }

    /// Attaches an attempt number.
    #[inline]
    pub fn with_attempt(mut self, n: u32) -> Self {
        self.attempt = Some(n);
        self
    }

    /// Attaches an attempt bound (stored as milliseconds).
    #[inline]
    pub fn with_timeout(mut self, d: Duration) -> Self {
        self.timeout_ms = Some(compact_ms(d));
        self
    }

    /// Attaches a backoff delay (stored as milliseconds).
    #[inline]
    pub fn with_delay(mut self, d: Duration) -> Self {
        self.delay_ms = Some(compact_ms(d));
        self
    }

    /// Attaches a terminal job status.
    #[inline]
    pub fn with_status(mut self, status: JobStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: &str) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_reason(format!("subscriber={subscriber} info={info}"))
    }

    /// True for events reporting a panicking subscriber.
    #[inline]
    pub fn is_subscriber_panic(&self) -> bool {
        matches!(self.kind, EventKind::SubscriberPanicked)
    }
}

fn compact_ms(d: Duration) -> u32 {
    d.as_millis().min(u128::from(u32::MAX)) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_is_monotonic() {
        let a = Event::new(EventKind::WorkerStarted);
        let b = Event::new(EventKind::WorkerExiting);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn huge_durations_saturate() {
        let ev = Event::new(EventKind::BackoffScheduled).with_delay(Duration::MAX);
        assert_eq!(ev.delay_ms, Some(u32::MAX));
    }
}
