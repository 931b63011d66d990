//! # Event subscribers.
//!
//! This module provides the [`Subscribe`] trait, the [`SubscriberSet`] fan-out and
//! built-in implementations.
//!
//! ## Architecture
//! ```text
//! Event flow:
//!   RetryExecutor / pool worker ── emit(Event) ──► SubscriberSet
//!                                                     │
//!                                          ┌──────────┼──────────┬─────────┐
//!                                          ▼          ▼          ▼         ▼
//!                                    WorkerTracker  LogWriter  Custom     ...
//! ```
//!
//! ## Built-in subscribers
//! - [`WorkerTracker`]: which pool workers are alive (sequence-ordered)
//! - `LogWriter` (feature `logging`): structured `tracing` output

#[cfg(feature = "logging")]
mod log;
mod subscriber;
mod subscriber_set;
mod tracker;

#[cfg(feature = "logging")]
pub use log::LogWriter;
pub use subscriber::Subscribe;
pub use subscriber_set::SubscriberSet;
pub use tracker::WorkerTracker;

pub(crate) use subscriber_set::panic_message;
