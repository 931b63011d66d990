use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use taskcore::{
    Cause, FailureKind, Outcome, RecordingSleeper, RetryExecutor, Strategy, TransientPredicate,
};

#[derive(Debug, thiserror::Error)]
#[error("boom")]
struct Boom;

fn ms(v: u64) -> Duration {
    Duration::from_millis(v)
}

#[tokio::test(start_paused = true)]
async fn all_success_once() {
    let sleeper = Arc::new(RecordingSleeper::new());
    let mut exec = RetryExecutor::new(
        Strategy::constant(1000.0).unwrap(),
        Strategy::constant(10.0).unwrap(),
    )
    .with_sleeper(sleeper.clone());

    let calls = AtomicU32::new(0);
    let out = exec
        .execute(
            || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Ok(42) }
            },
            3,
        )
        .await;

    assert!(matches!(out, Outcome::Success(42)));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(sleeper.delays().is_empty());
    assert_eq!(exec.timeout_strategy().calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn recover_on_third_attempt() {
    let sleeper = Arc::new(RecordingSleeper::new());
    let mut exec = RetryExecutor::new(
        Strategy::constant(1000.0).unwrap(),
        Strategy::constant(50.0).unwrap(),
    )
    .with_transient(TransientPredicate::always())
    .with_sleeper(sleeper.clone());

    let calls = AtomicU32::new(0);
    let out = exec
        .execute(
            || {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                async move {
                    if n < 3 {
                        anyhow::bail!("transient #{n}");
                    }
                    Ok("ok")
                }
            },
            5,
        )
        .await;

    assert_eq!(out.ok(), Some("ok"));
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert_eq!(sleeper.delays(), vec![ms(50), ms(50)]);
}

#[tokio::test(start_paused = true)]
async fn retries_exhausted_on_timeout() {
    let sleeper = Arc::new(RecordingSleeper::new());
    let mut exec = RetryExecutor::new(
        Strategy::constant(100.0).unwrap(),
        Strategy::linear(0.0, 10.0).unwrap(),
    )
    .with_transient(TransientPredicate::timeouts())
    .with_sleeper(sleeper.clone());

    let out: Outcome<()> = exec
        .execute(
            || async {
                tokio::time::sleep(ms(2000)).await;
                Ok(())
            },
            3,
        )
        .await;

    let failure = out.failure().expect("exhausted");
    assert_eq!(failure.kind, FailureKind::RetriesExhausted);
    assert_eq!(failure.attempts_used, 3);
    assert!(matches!(failure.cause, Some(Cause::Timeout { timeout }) if timeout == ms(100)));
    assert_eq!(sleeper.delays(), vec![ms(0), ms(10)]);
    assert_eq!(exec.timeout_strategy().calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn fatal_aborts_immediately() {
    let sleeper = Arc::new(RecordingSleeper::new());
    let mut exec = RetryExecutor::new(
        Strategy::constant(100.0).unwrap(),
        Strategy::constant(10.0).unwrap(),
    )
    .with_transient(TransientPredicate::timeouts())
    .with_sleeper(sleeper.clone());

    let calls = AtomicU32::new(0);
    let out: Outcome<()> = exec
        .execute(
            || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(Boom.into()) }
            },
            10,
        )
        .await;

    let failure = out.failure().expect("fatal");
    assert_eq!(failure.kind, FailureKind::Fatal);
    assert_eq!(failure.attempts_used, 1);
    assert!(failure.cause.as_ref().and_then(|c| c.downcast_ref::<Boom>()).is_some());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(sleeper.delays().is_empty());
}

#[tokio::test(start_paused = true)]
async fn always_transient_calls_exactly_max_tries() {
    for max_tries in [1u32, 2, 7] {
        let sleeper = Arc::new(RecordingSleeper::new());
        let mut exec = RetryExecutor::new(Strategy::unbounded(), Strategy::constant(5.0).unwrap())
            .with_transient(TransientPredicate::always())
            .with_sleeper(sleeper.clone());

        let calls = AtomicU32::new(0);
        let out: Outcome<()> = exec
            .execute(
                || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    async { Err(anyhow::anyhow!("nope")) }
                },
                max_tries,
            )
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), max_tries);
        assert_eq!(out.failure().map(|f| f.attempts_used), Some(max_tries));
        assert_eq!(sleeper.delays().len() as u32, max_tries - 1);
        assert_eq!(exec.timeout_strategy().calls(), max_tries);
        assert_eq!(exec.backoff_strategy().calls(), max_tries);
    }
}

#[tokio::test(start_paused = true)]
async fn tokio_sleeper_waits_real_backoff() {
    let mut exec = RetryExecutor::new(Strategy::unbounded(), Strategy::constant(250.0).unwrap())
        .with_transient(TransientPredicate::always());

    let started = tokio::time::Instant::now();
    let out: Outcome<()> = exec
        .execute(|| async { Err(anyhow::anyhow!("again")) }, 3)
        .await;

    assert_eq!(out.failure().map(|f| f.kind), Some(FailureKind::RetriesExhausted));
    assert_eq!(started.elapsed(), ms(500));
}

#[tokio::test(start_paused = true)]
async fn zero_first_bound_times_out_the_attempt() {
    let mut exec = RetryExecutor::new(Strategy::linear(0.0, 100.0).unwrap(), Strategy::zero())
        .with_transient(TransientPredicate::timeouts());

    let started = tokio::time::Instant::now();
    let out: Outcome<()> = exec
        .execute(
            || async {
                tokio::time::sleep(ms(1000)).await;
                Ok(())
            },
            1,
        )
        .await;

    let failure = out.failure().expect("bounded by zero");
    assert_eq!(failure.kind, FailureKind::RetriesExhausted);
    assert!(matches!(failure.cause, Some(Cause::Timeout { timeout }) if timeout.is_zero()));
    assert!(started.elapsed() < ms(1000));
}

#[tokio::test(start_paused = true)]
async fn unbounded_timeout_lets_slow_work_finish() {
    let mut exec = RetryExecutor::new(Strategy::unbounded(), Strategy::zero());

    let out = exec
        .execute(
            || async {
                tokio::time::sleep(ms(60_000)).await;
                Ok("late")
            },
            1,
        )
        .await;

    assert_eq!(out.ok(), Some("late"));
}
