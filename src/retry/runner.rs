//! # Run a single attempt of an operation.
//!
//! - **Execute ONE attempt** with a child cancellation token
//! - **Apply the bound** when there is one (wraps execution in `tokio::time::timeout`);
//!   a zero bound still polls the operation once before it elapses
//!
//! ## Flow
//! ```text
//! Success:  op(attempt) → Ok(v)            → Ok(v)
//! Failure:  op(attempt) → Err(e)           → Err(Cause::Error(e))
//! Timeout:  bound elapsed → cancel child   → Err(Cause::Timeout)
//! ```
//!
//! ## Rules
//! - Derives a **child token** per attempt (isolated cancellation)
//! - Child cancellation does **not** affect the parent
//! - On timeout the operation's future is dropped (abandoned); work it spawned
//!   elsewhere is not stopped, cooperative operations observe the cancelled token

use std::future::Future;
use std::time::Duration;

use tokio::time;
use tokio_util::sync::CancellationToken;

use crate::retry::{Attempt, Cause};

/// Executes one attempt of `op`, bounded by `timeout` (`None` = unbounded).
pub(crate) async fn run_once<T, F, Fut>(
    op: &mut F,
    number: u32,
    timeout: Option<Duration>,
    parent: &CancellationToken,
) -> Result<T, Cause>
where
    F: FnMut(Attempt) -> Fut,
    Fut: Future<Output = anyhow::Result<T>>,
{
    let child = parent.child_token();
    let fut = op(Attempt {
        number,
        token: child.clone(),
    });

    let Some(timeout) = timeout else {
        return fut.await.map_err(Cause::Error);
    };
    match time::timeout(timeout, fut).await {
        Ok(r) => r.map_err(Cause::Error),
        Err(_elapsed) => {
            child.cancel();
            Err(Cause::Timeout { timeout })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn timeout_cancels_child_not_parent() {
        let parent = CancellationToken::new();
        let mut seen: Option<CancellationToken> = None;

        let res: Result<(), Cause> = run_once(
            &mut |a: Attempt| {
                seen = Some(a.token.clone());
                async move {
                    time::sleep(Duration::from_secs(10)).await;
                    Ok(())
                }
            },
            1,
            Some(Duration::from_millis(50)),
            &parent,
        )
        .await;

        assert!(matches!(res, Err(Cause::Timeout { timeout }) if timeout == Duration::from_millis(50)));
        assert!(seen.is_some_and(|t| t.is_cancelled()));
        assert!(!parent.is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn no_bound_waits_for_the_operation() {
        let res = run_once(
            &mut |_a: Attempt| async {
                time::sleep(Duration::from_secs(3600)).await;
                Ok(7)
            },
            1,
            None,
            &CancellationToken::new(),
        )
        .await;
        assert_eq!(res.ok(), Some(7));
    }

    #[tokio::test(start_paused = true)]
    async fn zero_bound_times_out_pending_work() {
        let res: Result<(), Cause> = run_once(
            &mut |_a: Attempt| async {
                time::sleep(Duration::from_millis(1)).await;
                Ok(())
            },
            1,
            Some(Duration::ZERO),
            &CancellationToken::new(),
        )
        .await;
        assert!(matches!(res, Err(Cause::Timeout { timeout }) if timeout.is_zero()));

        let ready = run_once(
            &mut |_a: Attempt| async { Ok(3) },
            1,
            Some(Duration::ZERO),
            &CancellationToken::new(),
        )
        .await;
        assert_eq!(ready.ok(), Some(3));
    }

    #[tokio::test]
    async fn error_is_wrapped() {
        let res: Result<(), Cause> = run_once(
            &mut |_a: Attempt| async { Err(anyhow::anyhow!("nope")) },
            2,
            Some(Duration::from_secs(1)),
            &CancellationToken::new(),
        )
        .await;
        assert!(matches!(res, Err(Cause::Error(e)) if e.to_string() == "nope"));
    }
}
