//! # Job envelope.
//!
//! A [`Job`] carries everything a pool worker needs to run one unit of work:
//!
//! ```text
//! Job<T>
//!   ├─ op           FnMut(JobContext) -> Future<anyhow::Result<T>>   (called once per attempt)
//!   ├─ args/kwargs  type-erased, read back via JobContext::arg / kwarg
//!   ├─ name         attached to every event the job produces
//!   ├─ max_tries    attempts allowed (default 1)
//!   ├─ executor     optional override of the worker's RetryExecutor
//!   ├─ token        parent of every attempt token
//!   └─ on_complete  FnOnce(Outcome<T>), invoked exactly once
//! ```
//!
//! The pool never looks inside the operation or its value.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use futures::FutureExt;
use futures::future::BoxFuture;
use tokio_util::sync::CancellationToken;

use crate::error::ConfigError;
use crate::jobs::{ArgValue, JobContext, JobStatus};
use crate::pool::WorkerId;
use crate::retry::{Attempt, Cause, Failure, FailureKind, Outcome, RetryExecutor, Scope};
use crate::subscribers::{SubscriberSet, panic_message};

type JobOp<T> = Box<dyn FnMut(JobContext) -> BoxFuture<'static, anyhow::Result<T>> + Send>;
type CompletionHook<T> = Box<dyn FnOnce(Outcome<T>) + Send>;

/// Unit of work submitted to a [`WorkerPool`](crate::WorkerPool).
///
/// # Example
/// ```
/// use taskcore::Job;
///
/// let job = Job::builder(|ctx| {
///     let width = ctx.arg::<u32>(0).copied().unwrap_or(0);
///     async move { Ok(width * 2) }
/// })
/// .name("double")
/// .arg(21u32)
/// .on_complete(|out| assert_eq!(out.ok(), Some(42)))
/// .build()?;
///
/// assert_eq!(job.name(), Some("double"));
/// # Ok::<_, taskcore::ConfigError>(())
/// ```
pub struct Job<T> {
    name: Option<Arc<str>>,
    op: JobOp<T>,
    args: Arc<[ArgValue]>,
    kwargs: Arc<HashMap<String, ArgValue>>,
    max_tries: u32,
    executor: Option<RetryExecutor>,
    token: CancellationToken,
    on_complete: Option<CompletionHook<T>>,
}

impl<T: Send + 'static> Job<T> {
    /// Creates an anonymous single-attempt job without arguments or hook.
    pub fn new<F, Fut>(op: F) -> Self
    where
        F: FnMut(JobContext) -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
    {
        Self::builder(op).into_job()
    }

    /// Starts a fluent builder around `op`.
    pub fn builder<F, Fut>(op: F) -> JobBuilder<T>
    where
        F: FnMut(JobContext) -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
    {
        JobBuilder::new(op)
    }
}

impl<T> Job<T> {
    /// Job name, if one was given.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Attempts allowed for this job.
    pub fn max_tries(&self) -> u32 {
        self.max_tries
    }

    /// Parent token of every attempt.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }
}

impl<T> fmt::Debug for Job<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Job")
            .field("name", &self.name)
            .field("args", &self.args.len())
            .field("kwargs", &self.kwargs.len())
            .field("max_tries", &self.max_tries)
            .field("executor", &self.executor.is_some())
            .field("on_complete", &self.on_complete.is_some())
            .finish_non_exhaustive()
    }
}

/// Fluent builder for [`Job`].
pub struct JobBuilder<T> {
    job: Job<T>,
    kwargs: HashMap<String, ArgValue>,
    args: Vec<ArgValue>,
}

impl<T: Send + 'static> JobBuilder<T> {
    fn new<F, Fut>(mut op: F) -> Self
    where
        F: FnMut(JobContext) -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
    {
        let op: JobOp<T> = Box::new(move |ctx: JobContext| -> BoxFuture<'static, anyhow::Result<T>> {
            Box::pin(op(ctx))
        });
        Self {
            job: Job {
                name: None,
                op,
                args: Arc::from(Vec::new()),
                kwargs: Arc::default(),
                max_tries: 1,
                executor: None,
                token: CancellationToken::new(),
                on_complete: None,
            },
            kwargs: HashMap::new(),
            args: Vec::new(),
        }
    }
}

impl<T> JobBuilder<T> {
    /// Names the job; the name is attached to every event it produces.
    pub fn name(mut self, name: impl Into<Arc<str>>) -> Self {
        self.job.name = Some(name.into());
        self
    }

    /// Appends a positional argument.
    pub fn arg<A: Any + Send + Sync>(mut self, value: A) -> Self {
        self.args.push(Arc::new(value));
        self
    }

    /// Sets a keyed argument (replacing an earlier one with the same key).
    pub fn kwarg<A: Any + Send + Sync>(mut self, key: impl Into<String>, value: A) -> Self {
        self.kwargs.insert(key.into(), Arc::new(value));
        self
    }

    /// Attempts allowed; must be at least 1.
    pub fn max_tries(mut self, max_tries: u32) -> Self {
        self.job.max_tries = max_tries;
        self
    }

    /// Runs this job with its own executor instead of the worker's.
    pub fn executor(mut self, executor: RetryExecutor) -> Self {
        self.job.executor = Some(executor);
        self
    }

    /// Parent token for every attempt of this job.
    pub fn token(mut self, token: CancellationToken) -> Self {
        self.job.token = token;
        self
    }

    /// Hook invoked exactly once with the job's outcome.
    pub fn on_complete<F>(mut self, hook: F) -> Self
    where
        F: FnOnce(Outcome<T>) + Send + 'static,
    {
        self.job.on_complete = Some(Box::new(hook));
        self
    }

    /// Validates and returns the job.
    pub fn build(self) -> Result<Job<T>, ConfigError> {
        if self.job.max_tries == 0 {
            return Err(ConfigError::invalid("max_tries must be at least 1"));
        }
        Ok(self.into_job())
    }

    fn into_job(self) -> Job<T> {
        let mut job = self.job;
        job.args = self.args.into();
        job.kwargs = Arc::new(self.kwargs);
        job
    }
}

/// How a job run ended, as seen by the worker.
pub(crate) struct Completion {
    pub status: JobStatus,
    pub panic: Option<String>,
}

/// Type-erased job as stored in the pool queue.
pub(crate) trait Runnable: Send + 'static {
    fn name(&self) -> Option<&Arc<str>>;

    fn run<'a>(
        self: Box<Self>,
        worker: WorkerId,
        exec: &'a mut RetryExecutor,
        subs: Option<&'a Arc<SubscriberSet>>,
    ) -> BoxFuture<'a, Completion>;
}

impl<T: Send + 'static> Runnable for Job<T> {
    fn name(&self) -> Option<&Arc<str>> {
        self.name.as_ref()
    }

    fn run<'a>(
        self: Box<Self>,
        worker: WorkerId,
        exec: &'a mut RetryExecutor,
        subs: Option<&'a Arc<SubscriberSet>>,
    ) -> BoxFuture<'a, Completion> {
        Box::pin((*self).run_on(worker, exec, subs))
    }
}

impl<T: Send + 'static> Job<T> {
    async fn run_on(
        self,
        worker: WorkerId,
        worker_exec: &mut RetryExecutor,
        subs: Option<&Arc<SubscriberSet>>,
    ) -> Completion {
        let Job {
            name,
            mut op,
            args,
            kwargs,
            max_tries,
            executor,
            token,
            on_complete,
        } = self;

        let mut own;
        let exec = match executor {
            Some(e) => {
                own = match subs {
                    Some(s) if !e.has_subscribers() => e.with_subscribers(Arc::clone(s)),
                    _ => e,
                };
                &mut own
            }
            None => {
                worker_exec.reset();
                worker_exec
            }
        };

        let scope = Scope {
            job: name.as_ref(),
            worker: Some(worker),
        };
        let last_attempt = AtomicU32::new(0);
        let run = exec.run(
            scope,
            |attempt: Attempt| {
                last_attempt.store(attempt.number, Ordering::Relaxed);
                op(JobContext {
                    attempt,
                    worker,
                    name: name.clone(),
                    args: Arc::clone(&args),
                    kwargs: Arc::clone(&kwargs),
                })
            },
            max_tries,
            &token,
        );

        let (outcome, mut status, mut panic) = match AssertUnwindSafe(run).catch_unwind().await {
            Ok(report) => {
                let status = JobStatus::from_outcome(&report.outcome, report.attempts);
                (report.outcome, status, None)
            }
            Err(payload) => {
                let message = panic_message(&*payload);
                let failure = Failure::new(
                    FailureKind::WorkerCrashed,
                    last_attempt.load(Ordering::Relaxed),
                    Some(Cause::Panic {
                        message: message.clone(),
                    }),
                );
                (Outcome::Failure(failure), JobStatus::Crashed, Some(message))
            }
        };

        if let Some(hook) = on_complete {
            if let Err(payload) = std::panic::catch_unwind(AssertUnwindSafe(|| hook(outcome))) {
                status = JobStatus::Crashed;
                panic.get_or_insert_with(|| panic_message(&*payload));
            }
        }

        Completion { status, panic }
    }
}
