//! # Worker pool.
//!
//! - [`WorkerPool`] owns N workers pulling from one shared queue
//! - [`WorkerPoolBuilder`] adds subscribers and a custom [`WorkerFactory`]
//!
//! Each worker runs its jobs through its own [`RetryExecutor`](crate::RetryExecutor),
//! built by the factory when the pool starts.

mod builder;
#[allow(clippy::module_inception)]
mod pool;
mod queue;
mod worker;

use std::sync::Arc;

use crate::retry::RetryExecutor;

pub use builder::WorkerPoolBuilder;
pub use pool::WorkerPool;

/// Index of a worker inside its pool (`0..workers`).
pub type WorkerId = usize;

/// Builds the executor each worker runs its jobs with.
pub type WorkerFactory = Arc<dyn Fn(WorkerId) -> RetryExecutor + Send + Sync>;
