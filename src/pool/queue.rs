//! # Job queue shared by the pool handle and its workers.
//!
//! ## Architecture
//! ```text
//! submit ──► [slots]? ──► lock{state, items.push_back} ──► outstanding += 1 ──► ready.add_permits(1)
//!                                                                                  │
//! worker ◄── items.pop_front() ◄── lock ◄──────────────── ready.acquire() ◄────────┘
//!   │
//!   └─► run job ──► JobCompleted ──► outstanding -= 1 ──► (join wakes at 0)
//! ```
//!
//! ## Rules
//! - `ready` holds exactly one permit per queued item (jobs and sentinels)
//! - `slots` (bounded queues only) holds one permit per free job slot; sentinels bypass it
//! - `outstanding` counts jobs accepted but not yet completed; it only increases under `inner`
//! - While `Joining`, pushes are accepted only as long as `outstanding > 0` (follow-up work
//!   handed off by running jobs); [`JobQueue::close_when_drained`] moves to `Closed` under the
//!   same lock that observes zero, so nothing can be accepted after the last completion

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::{Semaphore, TryAcquireError, watch};

use crate::error::PoolError;
use crate::jobs::Runnable;

/// Lifecycle of a pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PoolState {
    Inert,
    Running,
    /// `join` is waiting for outstanding jobs; follow-up submits are still accepted.
    Joining,
    /// Drained and closed; shutdown sentinels follow.
    Closed,
    Joined,
}

pub(crate) enum QueueItem {
    Job(Box<dyn Runnable>),
    Shutdown,
}

struct Inner {
    state: PoolState,
    items: VecDeque<QueueItem>,
}

pub(crate) struct JobQueue {
    inner: Mutex<Inner>,
    ready: Semaphore,
    slots: Option<Semaphore>,
    outstanding: watch::Sender<usize>,
}

impl JobQueue {
    pub(crate) fn new(capacity: Option<usize>) -> Self {
        Self {
            inner: Mutex::new(Inner {
                state: PoolState::Inert,
                items: VecDeque::new(),
            }),
            ready: Semaphore::new(0),
            slots: capacity.map(Semaphore::new),
            outstanding: watch::Sender::new(0),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn state(&self) -> PoolState {
        self.lock().state
    }

    /// Moves `from` → `to`; returns the state actually found on mismatch.
    pub(crate) fn transition(&self, from: PoolState, to: PoolState) -> Result<(), PoolState> {
        let mut inner = self.lock();
        if inner.state != from {
            return Err(inner.state);
        }
        inner.state = to;
        Ok(())
    }

    pub(crate) fn outstanding(&self) -> usize {
        *self.outstanding.borrow()
    }

    /// Enqueues a job, waiting for a free slot on bounded queues.
    pub(crate) async fn push(&self, job: Box<dyn Runnable>) -> Result<(), PoolError> {
        self.check_admissible()?;
        if let Some(slots) = &self.slots {
            match slots.acquire().await {
                Ok(permit) => permit.forget(),
                Err(_closed) => return Err(PoolError::Joined),
            }
        }
        self.commit(job)
    }

    /// Enqueues a job without waiting.
    pub(crate) fn try_push(&self, job: Box<dyn Runnable>) -> Result<(), PoolError> {
        self.check_admissible()?;
        if let Some(slots) = &self.slots {
            match slots.try_acquire() {
                Ok(permit) => permit.forget(),
                Err(TryAcquireError::NoPermits) => return Err(PoolError::QueueFull),
                Err(TryAcquireError::Closed) => return Err(PoolError::Joined),
            }
        }
        self.commit(job)
    }

    /// Second half of a push: the slot (if any) is already taken.
    fn commit(&self, job: Box<dyn Runnable>) -> Result<(), PoolError> {
        {
            let mut inner = self.lock();
            if let Err(e) = self.admissible(inner.state) {
                drop(inner);
                self.release_slot();
                return Err(e);
            }
            inner.items.push_back(QueueItem::Job(job));
            self.outstanding.send_modify(|n| *n += 1);
        }
        self.ready.add_permits(1);
        Ok(())
    }

    fn check_admissible(&self) -> Result<(), PoolError> {
        let inner = self.lock();
        self.admissible(inner.state)
    }

    /// Must be called with `inner` held so `outstanding` cannot grow concurrently.
    fn admissible(&self, state: PoolState) -> Result<(), PoolError> {
        match state {
            PoolState::Inert => Err(PoolError::NotStarted),
            PoolState::Running => Ok(()),
            PoolState::Joining if self.outstanding() > 0 => Ok(()),
            PoolState::Joining | PoolState::Closed | PoolState::Joined => Err(PoolError::Joined),
        }
    }

    fn release_slot(&self) {
        if let Some(slots) = &self.slots {
            slots.add_permits(1);
        }
    }

    /// Posts `n` shutdown sentinels behind every queued item.
    pub(crate) fn push_sentinels(&self, n: usize) {
        {
            let mut inner = self.lock();
            inner.items.extend((0..n).map(|_| QueueItem::Shutdown));
        }
        self.ready.add_permits(n);
    }

    /// Waits for the next item. `None` means the queue can never yield again.
    pub(crate) async fn pop(&self) -> Option<QueueItem> {
        self.ready.acquire().await.ok()?.forget();
        let item = self.lock().items.pop_front()?;
        if matches!(item, QueueItem::Job(_)) {
            self.release_slot();
        }
        Some(item)
    }

    /// Marks one popped job as completed.
    pub(crate) fn complete(&self) {
        self.outstanding.send_modify(|n| *n = n.saturating_sub(1));
    }

    /// Waits until no accepted job is left uncompleted, then closes the queue.
    ///
    /// A job may hand off follow-up work right before it completes; in that case
    /// the count never reaches zero in between and the wait simply continues.
    pub(crate) async fn close_when_drained(&self) {
        let mut rx = self.outstanding.subscribe();
        loop {
            let _ = rx.wait_for(|n| *n == 0).await;
            let closed = {
                let mut inner = self.lock();
                if self.outstanding() == 0 {
                    inner.state = PoolState::Closed;
                    true
                } else {
                    false
                }
            };
            if closed {
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::Job;

    fn job() -> Box<dyn Runnable> {
        Box::new(Job::new(|_ctx| async { Ok(()) }))
    }

    #[tokio::test]
    async fn lifecycle_gates_pushes() {
        let q = JobQueue::new(None);
        assert_eq!(q.push(job()).await, Err(PoolError::NotStarted));

        q.transition(PoolState::Inert, PoolState::Running).unwrap();
        assert_eq!(q.push(job()).await, Ok(()));
        assert_eq!(q.outstanding(), 1);

        // joining with work still outstanding keeps accepting follow-ups
        q.transition(PoolState::Running, PoolState::Joining).unwrap();
        assert_eq!(q.try_push(job()), Ok(()));
        assert_eq!(q.outstanding(), 2);

        for _ in 0..2 {
            let _ = q.pop().await;
            q.complete();
        }
        assert_eq!(q.try_push(job()), Err(PoolError::Joined));
        assert_eq!(q.outstanding(), 0);
    }

    #[tokio::test]
    async fn bounded_queue_reports_full_until_popped() {
        let q = JobQueue::new(Some(1));
        q.transition(PoolState::Inert, PoolState::Running).unwrap();

        assert_eq!(q.try_push(job()), Ok(()));
        assert_eq!(q.try_push(job()), Err(PoolError::QueueFull));

        assert!(matches!(q.pop().await, Some(QueueItem::Job(_))));
        assert_eq!(q.try_push(job()), Ok(()));
    }

    #[tokio::test]
    async fn sentinels_queue_behind_jobs() {
        let q = JobQueue::new(Some(1));
        q.transition(PoolState::Inert, PoolState::Running).unwrap();
        q.push(job()).await.unwrap();
        q.push_sentinels(2);

        assert!(matches!(q.pop().await, Some(QueueItem::Job(_))));
        assert!(matches!(q.pop().await, Some(QueueItem::Shutdown)));
        assert!(matches!(q.pop().await, Some(QueueItem::Shutdown)));
    }

    #[tokio::test]
    async fn close_waits_for_follow_ups() {
        let q = std::sync::Arc::new(JobQueue::new(None));
        q.transition(PoolState::Inert, PoolState::Running).unwrap();
        q.push(job()).await.unwrap();
        q.transition(PoolState::Running, PoolState::Joining).unwrap();

        let waiter = {
            let q = q.clone();
            tokio::spawn(async move { q.close_when_drained().await })
        };
        tokio::task::yield_now().await;
        assert!(!waiter.is_finished());

        // the running job hands off a follow-up before completing
        let _ = q.pop().await;
        q.push(job()).await.unwrap();
        q.complete();
        tokio::task::yield_now().await;
        assert!(!waiter.is_finished());
        assert_eq!(q.state(), PoolState::Joining);

        let _ = q.pop().await;
        q.complete();
        waiter.await.unwrap();
        assert_eq!(q.state(), PoolState::Closed);
        assert_eq!(q.push(job()).await, Err(PoolError::Joined));
    }

    #[tokio::test]
    async fn close_on_empty_queue_is_immediate() {
        let q = JobQueue::new(None);
        q.transition(PoolState::Inert, PoolState::Running).unwrap();
        q.transition(PoolState::Running, PoolState::Joining).unwrap();
        assert_eq!(q.try_push(job()), Err(PoolError::Joined));

        q.close_when_drained().await;
        assert_eq!(q.state(), PoolState::Closed);
    }
}
