//! # taskcore
//!
//! **taskcore** is a small task execution core for Tokio.
//!
//! It runs user-supplied async work with controlled concurrency, bounded retries
//! and per-attempt time limits. Three pieces form a pipeline:
//! callers submit [`Job`]s to a [`WorkerPool`]; each worker runs its job through a
//! [`RetryExecutor`]; each attempt is bounded by a timeout [`Strategy`] and each
//! transient failure is spaced by a backoff [`Strategy`].
//!
//! ## Architecture
//! ### Overview
//! ```text
//!  caller ──► WorkerPool::submit(Job) ──► queue (bounded or unbounded)
//!                                              │
//!              ┌───────────────────────────────┼───────────────────────────────┐
//!              ▼                               ▼                               ▼
//!      ┌──────────────┐                ┌──────────────┐                ┌──────────────┐
//!      │   Worker 0   │                │   Worker 1   │                │   Worker N   │
//!      │RetryExecutor │                │RetryExecutor │                │RetryExecutor │
//!      └──────┬───────┘                └──────┬───────┘                └──────┬───────┘
//!             │ Publishes events:             │                               │
//!             │ - WorkerStarted / Exiting     │                               │
//!             │ - AttemptStarting / Failed    │                               │
//!             │ - BackoffScheduled            │                               │
//!             │ - JobCompleted                │                               │
//!             ▼                               ▼                               ▼
//! ┌──────────────────────────────────────────────────────────────────────────────────┐
//! │                     SubscriberSet (per-subscriber bounded queues)                │
//! └───────────────┬───────────────────────────┬───────────────────────────┬──────────┘
//!                 ▼                           ▼                           ▼
//!           WorkerTracker                 LogWriter                  user subscriber
//! ```
//!
//! ### Retry loop
//! ```text
//! for attempt in 1..=max_tries {
//!   ├─► timeout = timeout_strategy.next()     (+inf = unbounded)
//!   ├─► backoff = backoff_strategy.next()
//!   ├─► run_once(op, timeout)
//!   │       ├─ Ok(v)  ──► Success(v)
//!   │       └─ Err(c) ──► predicate(c)?
//!   │                      ├─ fatal     ─► Failure(Fatal)
//!   │                      └─ transient ─► sleep(backoff) unless last attempt
//! }
//! Failure(RetriesExhausted, last cause)
//! ```
//!
//! ## Features
//! | Area              | Description                                                   | Key types / traits                          |
//! |-------------------|---------------------------------------------------------------|---------------------------------------------|
//! | **Strategies**    | Constant, linear, multiplicative and functional durations.    | [`Strategy`], [`JitterPolicy`]              |
//! | **Retries**       | Bounded attempts, per-attempt timeouts, pluggable predicate.  | [`RetryExecutor`], [`TransientPredicate`]   |
//! | **Pool**          | Fixed workers, drain-on-join, lifecycle checks.               | [`WorkerPool`], [`PoolConfig`]              |
//! | **Jobs**          | Operation envelope with arguments and completion hook.        | [`Job`], [`JobContext`]                     |
//! | **Subscriber API**| Observe every attempt and completion.                         | [`Subscribe`], [`WorkerTracker`]            |
//! | **Errors**        | Typed construction and lifecycle errors.                      | [`ConfigError`], [`PoolError`]              |
//!
//! ## Optional features
//! - `logging`: exports [`LogWriter`], a subscriber forwarding every event to `tracing`.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use taskcore::{
//!     Job, PoolConfig, RetryExecutor, Strategy, Subscribe, TransientPredicate, WorkerPool,
//!     WorkerTracker,
//! };
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let tracker = Arc::new(WorkerTracker::new());
//!     let subs: Vec<Arc<dyn Subscribe>> = vec![tracker.clone()];
//!
//!     let pool = WorkerPool::builder(PoolConfig::with_workers(2))
//!         .with_subscribers(subs)
//!         .with_worker_factory(|_id| {
//!             RetryExecutor::new(Strategy::unbounded(), Strategy::zero())
//!                 .with_transient(TransientPredicate::always())
//!         })
//!         .build()?;
//!     pool.start()?;
//!
//!     let job = Job::builder(|ctx| async move {
//!         if ctx.attempt() < 2 {
//!             anyhow::bail!("warming up");
//!         }
//!         Ok("done")
//!     })
//!     .name("hello")
//!     .max_tries(3)
//!     .on_complete(|out| assert_eq!(out.ok(), Some("done")))
//!     .build()?;
//!
//!     pool.submit(job).await?;
//!     pool.join().await?;
//!
//!     assert!(tracker.alive().is_empty());
//!     Ok(())
//! }
//! ```
mod config;
mod error;
mod events;
mod jobs;
mod policies;
mod pool;
mod retry;
mod subscribers;

// ---- Public re-exports ----

pub use config::PoolConfig;
pub use error::{ConfigError, PoolError};
pub use events::{Event, EventKind};
pub use jobs::{ArgValue, Job, JobBuilder, JobContext, JobStatus};
pub use policies::{JitterPolicy, Strategy, StrategyFn, StrategyKind};
pub use pool::{WorkerFactory, WorkerId, WorkerPool, WorkerPoolBuilder};
pub use retry::{
    Attempt, Cause, Failure, FailureKind, Outcome, RecordingSleeper, RetryExecutor, Sleeper,
    TokioSleeper, TransientPredicate,
};
pub use subscribers::{Subscribe, SubscriberSet, WorkerTracker};

// Optional: expose a built-in logger subscriber.
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
