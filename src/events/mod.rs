//! Runtime events: the observation data model.
//!
//! Every observable step of the executor and the pool (attempt start, attempt
//! timeout, attempt failure, retries exhausted, worker started, worker exiting,
//! job completed) is described by one [`Event`] and delivered to subscribers
//! through a [`SubscriberSet`](crate::SubscriberSet). The core itself never
//! writes to stdout/stderr.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//!
//! ## Quick reference
//! - **Publishers**: `RetryExecutor` (attempt events), pool workers
//!   (worker lifecycle, job completion), `SubscriberSet` workers (panics).
//! - **Consumers**: user [`Subscribe`](crate::Subscribe) implementations,
//!   [`WorkerTracker`](crate::WorkerTracker), `LogWriter` (feature `logging`).

mod event;

pub use event::{Event, EventKind};
