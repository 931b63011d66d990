//! # LogWriter: structured event logger
//!
//! A subscriber that forwards every [`Event`] to [`tracing`] as structured fields.
//! The core never writes to a stream on its own; attach this subscriber (feature
//! `logging`) and install any `tracing` subscriber to get logs.
//!
//! ## Example output (with `tracing-subscriber` fmt layer)
//! ```text
//! INFO taskcore: worker started worker=0
//! DEBUG taskcore: attempt starting job="resize" worker=0 attempt=1 timeout_ms=100
//! WARN taskcore: attempt timed out job="resize" worker=0 attempt=1 timeout_ms=100
//! DEBUG taskcore: backoff scheduled job="resize" worker=0 attempt=1 delay_ms=50
//! INFO taskcore: job completed job="resize" worker=0 status=Succeeded
//! ```

use async_trait::async_trait;
use tracing::{debug, error, info, warn};

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let job = e.job.as_deref().unwrap_or("-");
        let reason = e.reason.as_deref().unwrap_or("");

        match e.kind {
            EventKind::WorkerStarted => {
                info!(target: "taskcore", worker = ?e.worker, "worker started");
            }
            EventKind::WorkerExiting => {
                info!(target: "taskcore", worker = ?e.worker, "worker exiting");
            }
            EventKind::WorkerCrashed => {
                error!(target: "taskcore", job, worker = ?e.worker, reason, "worker crashed");
            }
            EventKind::AttemptStarting => {
                debug!(
                    target: "taskcore",
                    job, worker = ?e.worker, attempt = ?e.attempt, timeout_ms = ?e.timeout_ms,
                    "attempt starting"
                );
            }
            EventKind::AttemptSucceeded => {
                debug!(target: "taskcore", job, worker = ?e.worker, attempt = ?e.attempt, "attempt succeeded");
            }
            EventKind::AttemptFailed => {
                warn!(target: "taskcore", job, worker = ?e.worker, attempt = ?e.attempt, reason, "attempt failed");
            }
            EventKind::AttemptTimedOut => {
                warn!(
                    target: "taskcore",
                    job, worker = ?e.worker, attempt = ?e.attempt, timeout_ms = ?e.timeout_ms,
                    "attempt timed out"
                );
            }
            EventKind::BackoffScheduled => {
                debug!(
                    target: "taskcore",
                    job, worker = ?e.worker, attempt = ?e.attempt, delay_ms = ?e.delay_ms, reason,
                    "backoff scheduled"
                );
            }
            EventKind::RetriesExhausted => {
                warn!(target: "taskcore", job, worker = ?e.worker, attempts = ?e.attempt, reason, "retries exhausted");
            }
            EventKind::FatalFailure => {
                error!(target: "taskcore", job, worker = ?e.worker, attempt = ?e.attempt, reason, "fatal failure");
            }
            EventKind::JobCompleted => {
                info!(target: "taskcore", job, worker = ?e.worker, status = ?e.status, "job completed");
            }
            EventKind::SubscriberPanicked => {
                error!(target: "taskcore", reason, "subscriber panicked");
            }
        }
    }

    fn name(&self) -> &'static str {
        "log-writer"
    }
}
