//! # Example: retry_with_backoff
//!
//! Demonstrates how [`RetryExecutor`] retries a flaky operation with a
//! multiplicative backoff and a per-attempt timeout.
//!
//! The operation fails twice, then succeeds. A second run shows a fatal error
//! aborting immediately because the predicate only treats timeouts as transient.
//!
//! ## Flow
//! ```text
//! execute(op, max_tries=5)
//!   ├─► attempt=1 timeout=500ms → Err("boom #1")  → sleep 100ms
//!   ├─► attempt=2 timeout=500ms → Err("boom #2")  → sleep ≈200ms (jittered)
//!   └─► attempt=3 timeout=500ms → Ok("payload")   → Success
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example retry_with_backoff
//! ```

use std::sync::atomic::{AtomicU32, Ordering};

use taskcore::{Cause, JitterPolicy, Outcome, RetryExecutor, Strategy, TransientPredicate};

static CALLS: AtomicU32 = AtomicU32::new(0);

#[derive(Debug, thiserror::Error)]
#[error("connection reset")]
struct Reset;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Timeouts: every attempt gets 500ms.
    let timeout = Strategy::constant(500.0)?;

    // 2. Backoff: 100ms, 200ms, 400ms ... capped at 2s, equal jitter.
    let backoff = Strategy::multiplicative(100.0, 2.0)?
        .with_cap(2_000.0)?
        .with_jitter(JitterPolicy::Equal);

    // 3. Only resets and timeouts are worth retrying.
    let transient = TransientPredicate::from_fn(|c: &Cause| {
        c.is_timeout() || c.downcast_ref::<Reset>().is_some()
    });

    let mut exec = RetryExecutor::new(timeout, backoff).with_transient(transient);

    // 4. Flaky operation: fails twice with a transient error.
    let out = exec
        .execute(
            || async {
                let attempt = CALLS.fetch_add(1, Ordering::Relaxed) + 1;
                println!("[flaky] attempt {attempt}");
                if attempt <= 2 {
                    return Err(Reset.into());
                }
                Ok("payload")
            },
            5,
        )
        .await;

    match out {
        Outcome::Success(v) => println!("[main] success: {v}"),
        Outcome::Failure(f) => println!("[main] failure: {f}"),
        Outcome::Cancelled => println!("[main] cancelled"),
    }

    // 5. Fatal error: not a reset, not a timeout → no retry.
    exec.reset();
    let out: Outcome<()> = exec
        .execute(|| async { Err(anyhow::anyhow!("malformed request")) }, 5)
        .await;
    if let Some(f) = out.failure() {
        println!(
            "[main] {f}: {}",
            f.cause.as_ref().map(ToString::to_string).unwrap_or_default()
        );
    }

    println!("[main] done.");
    Ok(())
}
