//! # Event fan-out to multiple subscribers.
//!
//! Provides [`SubscriberSet`], which distributes events to multiple subscribers, each
//! through its own queue and worker task.
//!
//! ## Architecture
//! ```text
//! emit(event)
//!     │
//!     ├──► [queue 1] ──► worker 1 ──► subscriber1.on_event()
//!     │    (bounded)         └──────► panic → SubscriberPanicked (to the others)
//!     ├──► [queue 2] ──► worker 2 ──► subscriber2.on_event()
//!     │    (bounded)
//!     └──► [queue N] ──► worker N ──► subscriberN.on_event()
//!          (bounded)
//! ```
//!
//! ## Rules
//! - **Exactly once**: `emit()` waits for queue space instead of dropping
//! - **No cross-subscriber ordering**: subscriber A may process event N while B processes N+5
//! - **Isolation**: a panicking subscriber doesn't affect others
//! - **Per-subscriber FIFO**: each subscriber sees events in order
//! - **Flush on shutdown**: [`SubscriberSet::shutdown`] returns once every queued event was handled
//!
//! ## Panic handling
//! Worker tasks use `catch_unwind` to isolate panics:
//! - Panic is caught and converted to a `SubscriberPanicked` event for the other subscribers
//!   (best effort: dropped if their queue is full)
//! - Worker continues processing next event
//!
//! **Warning**: `AssertUnwindSafe` is used, which can leave shared state inconsistent
//! if subscriber uses `Arc<Mutex<T>>` and panics while holding the lock.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock, Weak};

use futures::FutureExt;
use tokio::{sync::mpsc, task::JoinHandle};

use crate::events::Event;
use crate::subscribers::Subscribe;

/// Per-subscriber channel metadata.
#[derive(Clone)]
struct SubscriberChannel {
    /// Unique per set; names may repeat.
    id: usize,
    sender: mpsc::Sender<Arc<Event>>,
}

#[derive(Default)]
struct Shared {
    channels: RwLock<Vec<SubscriberChannel>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    next_id: AtomicUsize,
}

impl Shared {
    fn senders(&self) -> Vec<SubscriberChannel> {
        self.channels
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Non-blocking delivery to every channel except `skip`.
    fn try_emit_except(&self, skip: usize, event: Arc<Event>) {
        for channel in self.senders() {
            if channel.id != skip {
                let _ = channel.sender.try_send(Arc::clone(&event));
            }
        }
    }
}

/// Fan-out coordinator for multiple event subscribers.
///
/// Cheap to share: wrap in an `Arc` and hand the same set to the pool and to
/// standalone executors.
#[derive(Default)]
pub struct SubscriberSet {
    shared: Arc<Shared>,
}

impl SubscriberSet {
    /// Creates a new set and spawns one worker task per subscriber.
    ///
    /// Must be called from within a Tokio runtime when `subs` is not empty.
    #[must_use]
    pub fn new(subs: Vec<Arc<dyn Subscribe>>) -> Self {
        let set = Self::default();
        for sub in subs {
            set.add(sub);
        }
        set
    }

    /// Attaches one more subscriber and spawns its worker.
    ///
    /// The subscriber observes events emitted after this call returns.
    /// Must be called from within a Tokio runtime.
    pub fn add(&self, sub: Arc<dyn Subscribe>) {
        let cap = sub.queue_capacity().max(1);
        let name = sub.name();
        let id = self.shared.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, mut rx) = mpsc::channel::<Arc<Event>>(cap);
        let shared: Weak<Shared> = Arc::downgrade(&self.shared);

        let handle = tokio::spawn(async move {
            while let Some(ev) = rx.recv().await {
                let fut = sub.on_event(ev.as_ref());

                if let Err(panic_err) = std::panic::AssertUnwindSafe(fut).catch_unwind().await {
                    let info = panic_message(&*panic_err);
                    if let Some(shared) = shared.upgrade() {
                        shared.try_emit_except(
                            id,
                            Arc::new(Event::subscriber_panicked(name, &info)),
                        );
                    }
                }
            }
        });

        self.shared
            .channels
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(SubscriberChannel { id, sender: tx });
        self.shared
            .workers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(handle);
    }

    /// Number of attached subscribers.
    pub fn len(&self) -> usize {
        self.shared
            .channels
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns true if no subscriber is attached.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Delivers an event to every subscriber.
    ///
    /// Waits while a subscriber queue is full. Subscribers whose worker is gone are skipped.
    pub async fn emit(&self, event: Event) {
        let channels = self.shared.senders();
        if channels.is_empty() {
            return;
        }
        let event = Arc::new(event);
        for channel in channels {
            let _ = channel.sender.send(Arc::clone(&event)).await;
        }
    }

    /// Closes every queue and waits until all workers drained them.
    ///
    /// Idempotent. Events emitted afterwards are discarded.
    pub async fn shutdown(&self) {
        self.shared
            .channels
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();

        let workers: Vec<JoinHandle<()>> = std::mem::take(
            &mut *self
                .shared
                .workers
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        );
        for h in workers {
            let _ = h.await;
        }
    }
}

/// Extracts a printable message from a panic payload.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
