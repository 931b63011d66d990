//! # Pool worker: pull jobs until a shutdown sentinel arrives.
//!
//! Each worker is one Tokio task owning one [`RetryExecutor`].
//!
//! ## Flow
//! ```text
//! WorkerStarted
//!   loop {
//!     queue.pop()
//!       ├─ Shutdown → break
//!       └─ Job
//!            ├─► job.run(worker, exec)   (exec reset first unless the job brings its own)
//!            ├─► WorkerCrashed            (only if the job or its hook panicked)
//!            ├─► JobCompleted { status }
//!            └─► queue.complete()         (outstanding -= 1)
//!   }
//! WorkerExiting
//! ```
//!
//! ## Rules
//! - A job panic never kills the worker; the job is reported `Crashed` and the loop continues
//! - `JobCompleted` is published **before** the outstanding count drops, so `join()` never
//!   returns ahead of a completion event

use std::sync::Arc;

use crate::events::{Event, EventKind};
use crate::jobs::JobStatus;
use crate::pool::WorkerId;
use crate::pool::queue::{JobQueue, QueueItem};
use crate::retry::RetryExecutor;
use crate::subscribers::SubscriberSet;

pub(crate) struct Worker {
    id: WorkerId,
    queue: Arc<JobQueue>,
    subs: Arc<SubscriberSet>,
    exec: RetryExecutor,
}

impl Worker {
    pub(crate) fn new(
        id: WorkerId,
        queue: Arc<JobQueue>,
        subs: Arc<SubscriberSet>,
        exec: RetryExecutor,
    ) -> Self {
        Self {
            id,
            queue,
            subs,
            exec,
        }
    }

    pub(crate) async fn run(mut self) {
        self.subs
            .emit(Event::new(EventKind::WorkerStarted).with_worker(self.id))
            .await;

        while let Some(item) = self.queue.pop().await {
            let job = match item {
                QueueItem::Shutdown => break,
                QueueItem::Job(job) => job,
            };
            let name = job.name().cloned();
            let done = job.run(self.id, &mut self.exec, Some(&self.subs)).await;

            if let Some(message) = done.panic {
                self.subs
                    .emit(
                        Event::new(EventKind::WorkerCrashed)
                            .with_worker(self.id)
                            .with_job_opt(name.as_ref())
                            .with_status(JobStatus::Crashed)
                            .with_reason(message),
                    )
                    .await;
            }
            let mut completed = Event::new(EventKind::JobCompleted)
                .with_worker(self.id)
                .with_job_opt(name.as_ref())
                .with_status(done.status);
            if let Some(n) = done.status.attempts_used() {
                completed = completed.with_attempt(n);
            }
            self.subs.emit(completed).await;
            self.queue.complete();
        }

        self.subs
            .emit(Event::new(EventKind::WorkerExiting).with_worker(self.id))
            .await;
    }
}
