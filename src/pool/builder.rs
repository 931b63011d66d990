use std::sync::Arc;

use crate::config::PoolConfig;
use crate::error::ConfigError;
use crate::policies::Strategy;
use crate::pool::{WorkerFactory, WorkerId, WorkerPool};
use crate::retry::RetryExecutor;
use crate::subscribers::{Subscribe, SubscriberSet};

/// Builder for constructing a [`WorkerPool`] with optional features.
pub struct WorkerPoolBuilder {
    cfg: PoolConfig,
    subscribers: Vec<Arc<dyn Subscribe>>,
    factory: Option<WorkerFactory>,
}

impl WorkerPoolBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: PoolConfig) -> Self {
        Self {
            cfg,
            subscribers: Vec::new(),
            factory: None,
        }
    }

    /// Sets event subscribers for observability.
    ///
    /// Subscribers receive worker lifecycle, attempt and job completion events
    /// through dedicated workers with bounded queues.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Sets the function that builds each worker's executor.
    ///
    /// Called once per worker by `start()`. Executors without subscribers of their
    /// own publish to the pool's subscribers.
    pub fn with_worker_factory<F>(mut self, factory: F) -> Self
    where
        F: Fn(WorkerId) -> RetryExecutor + Send + Sync + 'static,
    {
        self.factory = Some(Arc::new(factory));
        self
    }

    /// Validates the configuration and builds the pool (inert until `start()`).
    ///
    /// Must be called from within a Tokio runtime when subscribers are set.
    pub fn build(self) -> Result<WorkerPool, ConfigError> {
        self.cfg.validate()?;
        let factory: WorkerFactory = match self.factory {
            Some(f) => f,
            None => Arc::new(default_executor),
        };
        let subs = Arc::new(SubscriberSet::new(self.subscribers));
        Ok(WorkerPool::new_internal(self.cfg, factory, subs))
    }
}

/// Single unbounded attempt, no backoff, nothing transient.
fn default_executor(_id: WorkerId) -> RetryExecutor {
    RetryExecutor::new(Strategy::unbounded(), Strategy::zero())
}
