//! # Worker pool configuration.
//!
//! Provides [`PoolConfig`] the settings a [`WorkerPool`](crate::WorkerPool) is built from.
//!
//! ## Sentinel values
//! - `queue_capacity = 0` → unbounded queue (`submit` never waits)
//!
//! # Example
//! ```
//! use taskcore::PoolConfig;
//!
//! let mut cfg = PoolConfig::default();
//! cfg.workers = 4;
//! cfg.queue_capacity = 64;
//!
//! assert_eq!(cfg.queue_limit(), Some(64));
//! assert!(cfg.validate().is_ok());
//! ```

use std::num::NonZeroUsize;
use std::thread;

use crate::error::ConfigError;

/// Settings for a worker pool.
///
/// ## Field semantics
/// - `workers`: Number of worker tasks spawned by `start()` (must be `>= 1`)
/// - `queue_capacity`: Pending-job limit (`0` = unbounded)
///
/// ## Notes
/// All fields are public for flexibility. Prefer the helper accessors to avoid
/// sprinkling sentinel checks (`0`) across the codebase.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PoolConfig {
    /// Number of workers.
    pub workers: usize,

    /// Maximum number of jobs waiting in the queue.
    ///
    /// - `0` = unbounded
    /// - `n > 0` = `submit` waits while `n` jobs are pending; `try_submit` fails with `QueueFull`
    ///
    /// Shutdown sentinels never count against this limit.
    pub queue_capacity: usize,
}

impl PoolConfig {
    /// Config with `workers` workers and an unbounded queue.
    #[must_use]
    pub fn with_workers(workers: usize) -> Self {
        Self {
            workers,
            queue_capacity: 0,
        }
    }

    /// Returns the queue limit as an `Option`.
    ///
    /// - `None` → unbounded
    /// - `Some(n)` → at most `n` pending jobs
    #[inline]
    pub fn queue_limit(&self) -> Option<usize> {
        if self.queue_capacity == 0 {
            None
        } else {
            Some(self.queue_capacity)
        }
    }

    /// Rejects configurations a pool cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers == 0 {
            return Err(ConfigError::invalid("workers must be at least 1"));
        }
        Ok(())
    }
}

impl Default for PoolConfig {
    /// Default configuration:
    ///
    /// - `workers = available parallelism` (falls back to 1)
    /// - `queue_capacity = 0` (unbounded)
    fn default() -> Self {
        let workers = thread::available_parallelism()
            .map(NonZeroUsize::get)
            .unwrap_or(1);
        Self::with_workers(workers)
    }
}
