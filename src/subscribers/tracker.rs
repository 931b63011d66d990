//! # Worker lifecycle tracker with sequence-based ordering.
//!
//! Maintains the set of pool workers that are currently alive, using event
//! sequence numbers to ignore stale deliveries.
//!
//! ## Architecture
//! ```text
//! pool worker ──► SubscriberSet ──► WorkerTracker::on_event()
//!                                          │
//!                                          ▼
//!                              HashMap<WorkerId, WorkerState>
//!                                   (id → {seq, alive})
//! ```
//!
//! ## Rules
//! - `WorkerStarted` marks a worker alive
//! - `WorkerExiting` marks it gone
//! - `WorkerCrashed` **without** a job status marks it gone (the worker task died);
//!   with one it only reports a job panic, the worker keeps running
//! - Events with `seq <= last_seq` are **rejected** (stale)

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::pool::WorkerId;
use crate::subscribers::Subscribe;

/// Per-worker state for ordering validation.
#[derive(Debug, Clone, Copy)]
struct WorkerState {
    last_seq: u64,
    alive: bool,
}

/// Thread-safe tracker of alive pool workers.
///
/// Attach it as a subscriber before `start()`; after `join()` returns,
/// [`WorkerTracker::alive`] is empty.
#[derive(Default)]
pub struct WorkerTracker {
    state: RwLock<HashMap<WorkerId, WorkerState>>,
}

impl WorkerTracker {
    /// Creates a new empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Updates worker state if the event is newer than the last seen one.
    ///
    /// Returns `true` if the alive flag was written.
    pub fn update(&self, ev: &Event) -> bool {
        let Some(id) = ev.worker else {
            return false;
        };
        let alive = match ev.kind {
            EventKind::WorkerStarted => true,
            EventKind::WorkerExiting => false,
            EventKind::WorkerCrashed if ev.status.is_none() => false,
            _ => return false,
        };

        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let entry = state.entry(id).or_insert(WorkerState {
            last_seq: 0,
            alive: false,
        });
        if entry.last_seq != 0 && ev.seq <= entry.last_seq {
            return false;
        }
        entry.last_seq = ev.seq;
        entry.alive = alive;
        true
    }

    /// Returns the sorted ids of currently alive workers.
    #[must_use]
    pub fn alive(&self) -> Vec<WorkerId> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        let mut ids: Vec<WorkerId> = state
            .iter()
            .filter(|(_, ws)| ws.alive)
            .map(|(id, _)| *id)
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Returns true if the worker is currently alive.
    pub fn is_alive(&self, id: WorkerId) -> bool {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .is_some_and(|ws| ws.alive)
    }

    /// Number of distinct workers ever observed.
    pub fn seen(&self) -> usize {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

#[async_trait]
impl Subscribe for WorkerTracker {
    async fn on_event(&self, ev: &Event) {
        self.update(ev);
    }

    fn name(&self) -> &'static str {
        "worker-tracker"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::JobStatus;

    #[test]
    fn start_then_exit() {
        let t = WorkerTracker::new();
        assert!(t.update(&Event::new(EventKind::WorkerStarted).with_worker(0)));
        assert!(t.update(&Event::new(EventKind::WorkerStarted).with_worker(1)));
        assert_eq!(t.alive(), vec![0, 1]);

        t.update(&Event::new(EventKind::WorkerExiting).with_worker(0));
        assert_eq!(t.alive(), vec![1]);
        assert!(!t.is_alive(0));
        assert_eq!(t.seen(), 2);
    }

    #[test]
    fn stale_events_are_rejected() {
        let t = WorkerTracker::new();
        let started = Event::new(EventKind::WorkerStarted).with_worker(3);
        let exiting = Event::new(EventKind::WorkerExiting).with_worker(3);

        assert!(t.update(&exiting));
        assert!(!t.update(&started));
        assert!(!t.is_alive(3));
    }

    #[test]
    fn job_panic_does_not_kill_worker() {
        let t = WorkerTracker::new();
        t.update(&Event::new(EventKind::WorkerStarted).with_worker(7));
        t.update(
            &Event::new(EventKind::WorkerCrashed)
                .with_worker(7)
                .with_status(JobStatus::Crashed),
        );
        assert!(t.is_alive(7));

        t.update(&Event::new(EventKind::WorkerCrashed).with_worker(7));
        assert!(!t.is_alive(7));
    }

    #[test]
    fn unrelated_events_are_ignored() {
        let t = WorkerTracker::new();
        assert!(!t.update(&Event::new(EventKind::JobCompleted).with_worker(1)));
        assert!(!t.update(&Event::new(EventKind::WorkerStarted)));
        assert_eq!(t.seen(), 0);
    }
}
