//! # Worker pool: fixed workers, shared queue, drain-on-join.
//!
//! The [`WorkerPool`] owns the job queue, a [`SubscriberSet`] and the worker tasks.
//!
//! ## Lifecycle
//! ```text
//! new/build (inert) ──► start() ──► submit()* ──► join() ──► terminal
//!                          │                         │
//!                          └─ spawns N workers       ├─ accept follow-ups while outstanding > 0
//!                                                    ├─ close once outstanding == 0
//!                                                    ├─ post N shutdown sentinels
//!                                                    ├─ await every worker
//!                                                    └─ flush subscribers
//! ```
//!
//! ## Rules
//! - `submit` before `start` → [`PoolError::NotStarted`]
//! - `start` twice (or after `join`) → [`PoolError::AlreadyStarted`]
//! - `submit` while `join` drains is accepted as long as accepted jobs are still
//!   outstanding (a running job may hand off follow-up work); once drained → [`PoolError::Joined`]
//! - `join`/`subscribe` once `join` began → [`PoolError::Joined`]
//! - Every accepted job completes (its hook runs exactly once) before `join` returns
//! - Every event published during the pool's life is delivered before `join` returns
//! - Dropping a running pool without `join` lets workers drain the queue and exit
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use taskcore::{Job, PoolConfig, WorkerPool};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let pool = WorkerPool::new(PoolConfig::with_workers(2))?;
//!     pool.start()?;
//!
//!     let done = Arc::new(AtomicUsize::new(0));
//!     for i in 0..10u64 {
//!         let done = done.clone();
//!         let job = Job::builder(move |_ctx| async move { Ok(i * i) })
//!             .on_complete(move |out| {
//!                 if out.is_success() {
//!                     done.fetch_add(1, Ordering::SeqCst);
//!                 }
//!             })
//!             .build()?;
//!         pool.submit(job).await?;
//!     }
//!
//!     pool.join().await?;
//!     assert_eq!(done.load(Ordering::SeqCst), 10);
//!     Ok(())
//! }
//! ```

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::task::JoinHandle;

use crate::config::PoolConfig;
use crate::error::{ConfigError, PoolError};
use crate::events::{Event, EventKind};
use crate::jobs::Job;
use crate::pool::queue::{JobQueue, PoolState};
use crate::pool::worker::Worker;
use crate::pool::{WorkerFactory, WorkerId, WorkerPoolBuilder};
use crate::subscribers::{Subscribe, SubscriberSet};

/// Fixed-size pool of workers that run [`Job`]s through a retry executor.
///
/// Share it behind an `Arc` to submit from several tasks.
pub struct WorkerPool {
    cfg: PoolConfig,
    factory: WorkerFactory,
    subs: Arc<SubscriberSet>,
    queue: Arc<JobQueue>,
    workers: Mutex<Vec<(WorkerId, JoinHandle<()>)>>,
}

impl WorkerPool {
    /// Creates an inert pool with default workers (single unbounded attempt per job).
    pub fn new(cfg: PoolConfig) -> Result<Self, ConfigError> {
        WorkerPoolBuilder::new(cfg).build()
    }

    /// Starts a builder for pools with subscribers or a custom worker factory.
    pub fn builder(cfg: PoolConfig) -> WorkerPoolBuilder {
        WorkerPoolBuilder::new(cfg)
    }

    pub(crate) fn new_internal(
        cfg: PoolConfig,
        factory: WorkerFactory,
        subs: Arc<SubscriberSet>,
    ) -> Self {
        let queue = Arc::new(JobQueue::new(cfg.queue_limit()));
        Self {
            cfg,
            factory,
            subs,
            queue,
            workers: Mutex::new(Vec::new()),
        }
    }

    /// Pool configuration.
    pub fn config(&self) -> &PoolConfig {
        &self.cfg
    }

    /// Spawns exactly `workers` worker tasks.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(&self) -> Result<(), PoolError> {
        self.queue
            .transition(PoolState::Inert, PoolState::Running)
            .map_err(|_| PoolError::AlreadyStarted)?;

        let mut workers = self.workers.lock().unwrap_or_else(PoisonError::into_inner);
        for id in 0..self.cfg.workers {
            let mut exec = (self.factory)(id);
            if !exec.has_subscribers() {
                exec = exec.with_subscribers(Arc::clone(&self.subs));
            }
            let worker = Worker::new(id, Arc::clone(&self.queue), Arc::clone(&self.subs), exec);
            workers.push((id, tokio::spawn(worker.run())));
        }
        Ok(())
    }

    /// Queues a job, waiting for a free slot when the queue is bounded and full.
    pub async fn submit<T: Send + 'static>(&self, job: Job<T>) -> Result<(), PoolError> {
        self.queue.push(Box::new(job)).await
    }

    /// Queues a job without waiting; fails with [`PoolError::QueueFull`] on a full bounded queue.
    pub fn try_submit<T: Send + 'static>(&self, job: Job<T>) -> Result<(), PoolError> {
        self.queue.try_push(Box::new(job))
    }

    /// Attaches a subscriber; it observes events published after this call.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn subscribe(&self, listener: Arc<dyn Subscribe>) -> Result<(), PoolError> {
        match self.queue.state() {
            PoolState::Joining | PoolState::Closed | PoolState::Joined => Err(PoolError::Joined),
            PoolState::Inert | PoolState::Running => {
                self.subs.add(listener);
                Ok(())
            }
        }
    }

    /// Waits for every accepted job, stops all workers and flushes subscribers.
    ///
    /// If a worker task dies outside a job it is reported as `WorkerCrashed`
    /// and `join` still completes.
    pub async fn join(&self) -> Result<(), PoolError> {
        self.queue
            .transition(PoolState::Running, PoolState::Joining)
            .map_err(|found| match found {
                PoolState::Inert => PoolError::NotStarted,
                _ => PoolError::Joined,
            })?;

        self.queue.close_when_drained().await;

        let handles = std::mem::take(
            &mut *self.workers.lock().unwrap_or_else(PoisonError::into_inner),
        );
        self.queue.push_sentinels(handles.len());
        self.reap(handles).await;

        let _ = self.queue.transition(PoolState::Closed, PoolState::Joined);
        self.subs.shutdown().await;
        Ok(())
    }

    /// Awaits every worker task; one that died outside a job is reported
    /// as `WorkerCrashed` without a job status.
    async fn reap(&self, handles: Vec<(WorkerId, JoinHandle<()>)>) {
        for (id, handle) in handles {
            if let Err(e) = handle.await {
                self.subs
                    .emit(
                        Event::new(EventKind::WorkerCrashed)
                            .with_worker(id)
                            .with_reason(e.to_string()),
                    )
                    .await;
            }
        }
    }

    /// Jobs accepted but not yet completed.
    pub fn outstanding(&self) -> usize {
        self.queue.outstanding()
    }

    /// True between `start()` and the beginning of `join()`.
    pub fn is_running(&self) -> bool {
        self.queue.state() == PoolState::Running
    }
}

impl fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerPool")
            .field("cfg", &self.cfg)
            .field("state", &self.queue.state())
            .field("outstanding", &self.queue.outstanding())
            .field("subscribers", &self.subs.len())
            .finish_non_exhaustive()
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        // a `join` abandoned mid-drain leaves the pool in `Joining`
        let stopped = [PoolState::Running, PoolState::Joining]
            .into_iter()
            .any(|from| self.queue.transition(from, PoolState::Joined).is_ok());
        if stopped {
            let n = self
                .workers
                .get_mut()
                .unwrap_or_else(PoisonError::into_inner)
                .len();
            self.queue.push_sentinels(n);
        }
    }
}
