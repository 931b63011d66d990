//! # Example: custom_subscriber
//!
//! Demonstrates how to build and attach a custom event subscriber.
//!
//! Shows how to:
//! - Implement the [`Subscribe`] trait.
//! - Inspect [`Event`] / [`EventKind`] for attempt and job metrics.
//! - Wire the subscriber into [`WorkerPool::builder`].
//!
//! ## Flow
//! ```text
//! WorkerPool::submit(job)
//!     └─► Worker
//!           ├─► RetryExecutor: AttemptStarting / AttemptFailed / AttemptTimedOut / BackoffScheduled
//!           ├─► JobCompleted { status }
//!           └─► SubscriberSet ──► ConsoleSubscriber.on_event()
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example custom_subscriber
//! ```

use std::sync::Arc;
use std::time::Duration;

use taskcore::{
    Event, EventKind, Job, PoolConfig, RetryExecutor, Strategy, Subscribe, TransientPredicate,
    WorkerPool,
};

/// A simple console subscriber that prints selected events.
/// In real life, you could export metrics, ship logs, or trigger alerts.
struct ConsoleSubscriber;

#[async_trait::async_trait]
impl Subscribe for ConsoleSubscriber {
    async fn on_event(&self, ev: &Event) {
        let job = ev.job.as_deref().unwrap_or("<anonymous>");
        match ev.kind {
            // === Workers ===
            EventKind::WorkerStarted | EventKind::WorkerExiting => {
                println!("[sub] {:?}: worker={}", ev.kind, ev.worker.unwrap_or_default());
            }

            // === Attempts ===
            EventKind::AttemptStarting => {
                println!(
                    "[sub] starting: job={job} attempt={} timeout={}ms",
                    ev.attempt.unwrap_or(0),
                    ev.timeout_ms.unwrap_or(0)
                );
            }
            EventKind::AttemptFailed => {
                println!(
                    "[sub] failed:   job={job} attempt={} reason={}",
                    ev.attempt.unwrap_or(0),
                    ev.reason.as_deref().unwrap_or("<none>")
                );
            }
            EventKind::AttemptTimedOut => {
                println!(
                    "[sub] timeout:  job={job} attempt={} timeout={}ms",
                    ev.attempt.unwrap_or(0),
                    ev.timeout_ms.unwrap_or(0)
                );
            }
            EventKind::BackoffScheduled => {
                println!(
                    "[sub] backoff:  job={job} delay={}ms after_attempt={}",
                    ev.delay_ms.unwrap_or(0),
                    ev.attempt.unwrap_or(0)
                );
            }

            // === Terminal ===
            EventKind::JobCompleted => {
                let status = ev.status.map(|s| s.as_label()).unwrap_or("<unknown>");
                println!("[sub] done:     job={job} status={status}");
            }
            _ => {}
        }
    }

    fn name(&self) -> &'static str {
        "console"
    }

    fn queue_capacity(&self) -> usize {
        256
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(ConsoleSubscriber)];

    // Every worker: 150ms per attempt, linear backoff 50ms, 100ms, ...; timeouts are transient.
    let timeout = Strategy::constant(150.0)?;
    let backoff = Strategy::linear(50.0, 50.0)?;
    let pool = WorkerPool::builder(PoolConfig::with_workers(2))
        .with_subscribers(subs)
        .with_worker_factory(move |_id| {
            RetryExecutor::new(timeout.clone(), backoff.clone())
                .with_transient(TransientPredicate::timeouts())
        })
        .build()?;
    pool.start()?;

    // 400ms, 200ms, 133ms: times out twice, succeeds on the third attempt.
    let slow = Job::builder(|ctx| async move {
        let work = 400 / u64::from(ctx.attempt());
        tokio::time::sleep(Duration::from_millis(work)).await;
        Ok(work)
    })
    .name("slow-start")
    .max_tries(4)
    .build()?;

    let broken: Job<()> = Job::builder(|_ctx| async { Err(anyhow::anyhow!("bad input")) })
        .name("broken")
        .max_tries(4)
        .build()?;

    pool.submit(slow).await?;
    pool.submit(broken).await?;
    pool.join().await?;

    println!("[main] done.");
    Ok(())
}
