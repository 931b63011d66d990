use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use taskcore::{
    Event, EventKind, FailureKind, Job, JobStatus, PoolConfig, PoolError, RetryExecutor, Strategy,
    Subscribe, TransientPredicate, WorkerPool, WorkerTracker,
};

#[derive(Default)]
struct Recorder {
    events: Mutex<Vec<Event>>,
}

impl Recorder {
    fn count(&self, kind: EventKind) -> usize {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.kind == kind)
            .count()
    }

    fn statuses(&self) -> Vec<JobStatus> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.kind == EventKind::JobCompleted)
            .filter_map(|e| e.status)
            .collect()
    }
}

#[async_trait]
impl Subscribe for Recorder {
    async fn on_event(&self, ev: &Event) {
        self.events.lock().unwrap().push(ev.clone());
    }

    fn name(&self) -> &'static str {
        "recorder"
    }
}

fn noop() -> Job<()> {
    Job::new(|_ctx| async { Ok(()) })
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn pool_drains_all_submissions() {
    let tracker = Arc::new(WorkerTracker::new());
    let recorder = Arc::new(Recorder::default());
    let second = Arc::new(Recorder::default());
    let subs: Vec<Arc<dyn Subscribe>> = vec![tracker.clone(), recorder.clone(), second.clone()];

    let pool = WorkerPool::builder(PoolConfig::with_workers(4))
        .with_subscribers(subs)
        .build()
        .unwrap();
    pool.start().unwrap();

    let hooks = Arc::new(AtomicUsize::new(0));
    for i in 0..100usize {
        let hooks = hooks.clone();
        let job = Job::builder(move |_ctx| async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            Ok(i)
        })
        .name(format!("job-{i}"))
        .on_complete(move |out| {
            assert_eq!(out.ok(), Some(i));
            hooks.fetch_add(1, Ordering::SeqCst);
        })
        .build()
        .unwrap();
        pool.submit(job).await.unwrap();
    }

    pool.join().await.unwrap();

    assert_eq!(hooks.load(Ordering::SeqCst), 100);
    for rec in [&recorder, &second] {
        assert_eq!(rec.count(EventKind::JobCompleted), 100);
        assert_eq!(rec.count(EventKind::WorkerStarted), 4);
        assert_eq!(rec.count(EventKind::WorkerExiting), 4);
    }
    let mut completed: Vec<String> = second
        .events
        .lock()
        .unwrap()
        .iter()
        .filter(|e| e.kind == EventKind::JobCompleted)
        .filter_map(|e| e.job.as_deref().map(str::to_owned))
        .collect();
    completed.sort();
    completed.dedup();
    assert_eq!(completed.len(), 100);
    assert!(tracker.alive().is_empty());
    assert_eq!(tracker.seen(), 4);
    assert_eq!(pool.outstanding(), 0);
}

#[tokio::test]
async fn lifecycle_violations() {
    let pool = WorkerPool::new(PoolConfig::with_workers(2)).unwrap();
    assert_eq!(pool.submit(noop()).await, Err(PoolError::NotStarted));
    assert_eq!(pool.join().await, Err(PoolError::NotStarted));

    pool.start().unwrap();
    assert_eq!(pool.start(), Err(PoolError::AlreadyStarted));
    assert!(pool.is_running());

    pool.join().await.unwrap();
    let err = pool.submit(noop()).await.unwrap_err();
    assert_eq!(err, PoolError::Joined);
    assert!(err.is_lifecycle_violation());
    assert_eq!(pool.try_submit(noop()), Err(PoolError::Joined));
    assert_eq!(pool.start(), Err(PoolError::AlreadyStarted));
    assert_eq!(pool.join().await, Err(PoolError::Joined));
    assert!(!pool.is_running());
}

#[tokio::test]
async fn zero_workers_rejected() {
    let err = WorkerPool::new(PoolConfig::with_workers(0)).unwrap_err();
    assert_eq!(err.as_label(), "invalid_configuration");
}

#[tokio::test(start_paused = true)]
async fn running_job_can_hand_off_work_during_join() {
    let pool = Arc::new(WorkerPool::new(PoolConfig::with_workers(2)).unwrap());
    pool.start().unwrap();

    let handed_off = Arc::new(Mutex::new(None));
    let follow_up_ran = Arc::new(AtomicUsize::new(0));
    let job = {
        let pool = pool.clone();
        let handed_off = handed_off.clone();
        let follow_up_ran = follow_up_ran.clone();
        Job::new(move |_ctx| {
            let pool = pool.clone();
            let handed_off = handed_off.clone();
            let ran = follow_up_ran.clone();
            async move {
                // join() is already waiting by the time this wakes up
                tokio::time::sleep(Duration::from_millis(50)).await;
                let follow_up = Job::new(move |_ctx| {
                    let ran = ran.clone();
                    async move {
                        ran.fetch_add(1, Ordering::SeqCst);
                        Ok(())
                    }
                });
                let res = pool.submit(follow_up).await;
                *handed_off.lock().unwrap() = Some(res);
                Ok(())
            }
        })
    };
    pool.submit(job).await.unwrap();
    pool.join().await.unwrap();

    assert_eq!(*handed_off.lock().unwrap(), Some(Ok(())));
    assert_eq!(follow_up_ran.load(Ordering::SeqCst), 1);
    assert_eq!(pool.outstanding(), 0);
    assert_eq!(pool.try_submit(noop()), Err(PoolError::Joined));
}

#[tokio::test]
async fn start_then_join_without_jobs() {
    let tracker = Arc::new(WorkerTracker::new());
    let subs: Vec<Arc<dyn Subscribe>> = vec![tracker.clone()];
    let pool = WorkerPool::builder(PoolConfig::with_workers(3))
        .with_subscribers(subs)
        .build()
        .unwrap();

    pool.start().unwrap();
    pool.join().await.unwrap();

    assert_eq!(tracker.seen(), 3);
    assert!(tracker.alive().is_empty());
}

#[tokio::test]
async fn single_worker_preserves_submission_order() {
    let pool = WorkerPool::new(PoolConfig::with_workers(1)).unwrap();
    pool.start().unwrap();

    let order = Arc::new(Mutex::new(Vec::new()));
    for i in 0..20u32 {
        let order = order.clone();
        let job = Job::builder(move |_ctx| {
            let order = order.clone();
            async move {
                tokio::task::yield_now().await;
                order.lock().unwrap().push(i);
                Ok(())
            }
        })
        .build()
        .unwrap();
        pool.submit(job).await.unwrap();
    }
    pool.join().await.unwrap();

    assert_eq!(*order.lock().unwrap(), (0..20).collect::<Vec<_>>());
}

#[tokio::test]
async fn bounded_queue_applies_back_pressure() {
    let mut cfg = PoolConfig::with_workers(1);
    cfg.queue_capacity = 1;
    let pool = Arc::new(WorkerPool::new(cfg).unwrap());
    pool.start().unwrap();

    let gate = Arc::new(tokio::sync::Notify::new());
    let blocker = {
        let gate = gate.clone();
        Job::new(move |_ctx| {
            let gate = gate.clone();
            async move {
                gate.notified().await;
                Ok(())
            }
        })
    };
    pool.submit(blocker).await.unwrap();

    // wait until the worker picked the blocker up, freeing the slot
    while pool.try_submit(noop()).is_err() {
        tokio::task::yield_now().await;
    }
    assert_eq!(pool.try_submit(noop()), Err(PoolError::QueueFull));

    let waiting = {
        let pool = pool.clone();
        tokio::spawn(async move { pool.submit(noop()).await })
    };
    tokio::task::yield_now().await;
    assert!(!waiting.is_finished());

    gate.notify_one();
    waiting.await.unwrap().unwrap();
    pool.join().await.unwrap();
    assert_eq!(pool.outstanding(), 0);
}

#[tokio::test]
async fn panicking_job_is_reported_and_pool_survives() {
    let recorder = Arc::new(Recorder::default());
    let subs: Vec<Arc<dyn Subscribe>> = vec![recorder.clone()];
    let pool = WorkerPool::builder(PoolConfig::with_workers(1))
        .with_subscribers(subs)
        .build()
        .unwrap();
    pool.start().unwrap();

    let crashed = Arc::new(Mutex::new(None));
    let sink = crashed.clone();
    let job: Job<()> = Job::builder(|_ctx| async {
        if true {
            panic!("job exploded");
        }
        Ok(())
    })
    .name("exploder")
    .on_complete(move |out| *sink.lock().unwrap() = out.failure().map(|f| f.kind))
    .build()
    .unwrap();

    pool.submit(job).await.unwrap();
    pool.submit(noop()).await.unwrap();
    pool.join().await.unwrap();

    assert_eq!(*crashed.lock().unwrap(), Some(FailureKind::WorkerCrashed));
    assert_eq!(recorder.count(EventKind::WorkerCrashed), 1);
    assert_eq!(
        recorder.statuses(),
        vec![JobStatus::Crashed, JobStatus::Succeeded { attempts_used: 1 }]
    );
}

#[tokio::test(start_paused = true)]
async fn worker_factory_executor_retries_and_resets_per_job() {
    let recorder = Arc::new(Recorder::default());
    let subs: Vec<Arc<dyn Subscribe>> = vec![recorder.clone()];
    let pool = WorkerPool::builder(PoolConfig::with_workers(1))
        .with_subscribers(subs)
        .with_worker_factory(|_id| {
            RetryExecutor::new(Strategy::unbounded(), Strategy::linear(10.0, 10.0).unwrap())
                .with_transient(TransientPredicate::always())
        })
        .build()
        .unwrap();
    pool.start().unwrap();

    for name in ["a", "b"] {
        let job = Job::builder(|ctx| async move {
            if ctx.attempt() < 3 {
                anyhow::bail!("attempt {} failed", ctx.attempt());
            }
            Ok(())
        })
        .name(name)
        .max_tries(3)
        .build()
        .unwrap();
        pool.submit(job).await.unwrap();
    }
    pool.join().await.unwrap();

    let delays: Vec<u32> = recorder
        .events
        .lock()
        .unwrap()
        .iter()
        .filter(|e| e.kind == EventKind::BackoffScheduled)
        .filter_map(|e| e.delay_ms)
        .collect();
    assert_eq!(delays, vec![10, 20, 10, 20]);
    assert_eq!(
        recorder.statuses(),
        vec![JobStatus::Succeeded { attempts_used: 3 }; 2]
    );
}

#[tokio::test]
async fn job_failure_is_delivered_not_propagated() {
    let pool = WorkerPool::new(PoolConfig::with_workers(2)).unwrap();
    pool.start().unwrap();

    let kind = Arc::new(Mutex::new(None));
    let sink = kind.clone();
    let job: Job<()> = Job::builder(|_ctx| async { Err(anyhow::anyhow!("bad payload")) })
        .on_complete(move |out| *sink.lock().unwrap() = out.failure().map(|f| f.kind))
        .build()
        .unwrap();

    pool.submit(job).await.unwrap();
    assert_eq!(pool.join().await, Ok(()));
    assert_eq!(*kind.lock().unwrap(), Some(FailureKind::Fatal));
}
