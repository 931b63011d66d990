//! # Example: pool_drain
//!
//! Submits 100 short jobs to a 4-worker pool and joins it.
//!
//! Shows how to:
//! - Build a [`WorkerPool`] with a bounded queue and a [`WorkerTracker`].
//! - Pass arguments to jobs and collect results through `on_complete`.
//! - Rely on `join()` to drain every accepted job before returning.
//!
//! ## Flow
//! ```text
//! start() ──► 4 × WorkerStarted
//! submit() × 100 ──► queue (capacity 16, submit waits when full)
//! join()
//!   ├─► wait outstanding == 0
//!   ├─► 4 × shutdown sentinel ──► 4 × WorkerExiting
//!   └─► flush subscribers
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example pool_drain
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use taskcore::{Job, JobContext, PoolConfig, Subscribe, WorkerPool, WorkerTracker};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Pool: 4 workers, at most 16 pending jobs.
    let mut cfg = PoolConfig::with_workers(4);
    cfg.queue_capacity = 16;

    let tracker = Arc::new(WorkerTracker::new());
    #[allow(unused_mut)]
    let mut subs: Vec<Arc<dyn Subscribe>> = vec![tracker.clone()];
    #[cfg(feature = "logging")]
    subs.push(Arc::new(taskcore::LogWriter::new()));

    let pool = WorkerPool::builder(cfg).with_subscribers(subs).build()?;
    pool.start()?;
    println!("[main] alive workers: {:?}", tracker.alive());

    // 2. Submit: each job squares its argument after 10ms of "work".
    let sum = Arc::new(AtomicU64::new(0));
    let started = Instant::now();
    for i in 0..100u64 {
        let sum = sum.clone();
        let job = Job::builder(|ctx: JobContext| {
            let n = ctx.arg::<u64>(0).copied().unwrap_or_default();
            async move {
                tokio::time::sleep(Duration::from_millis(10)).await;
                Ok(n * n)
            }
        })
        .name(format!("square-{i}"))
        .arg(i)
        .on_complete(move |out| {
            if let Some(v) = out.ok() {
                sum.fetch_add(v, Ordering::Relaxed);
            }
        })
        .build()?;
        pool.submit(job).await?;
    }

    // 3. Drain.
    pool.join().await?;

    println!(
        "[main] sum of squares = {} in {:?}",
        sum.load(Ordering::Relaxed),
        started.elapsed()
    );
    println!("[main] alive workers after join: {:?}", tracker.alive());
    Ok(())
}
