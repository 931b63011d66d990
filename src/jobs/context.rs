//! # Per-attempt view of a job.
//!
//! A [`JobContext`] is built fresh for every attempt. It carries the attempt's
//! cancellation token together with the job's type-erased positional and keyed
//! arguments, which the operation reads back with [`JobContext::arg`] and
//! [`JobContext::kwarg`].

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::pool::WorkerId;
use crate::retry::Attempt;

/// Type-erased job argument.
pub type ArgValue = Arc<dyn Any + Send + Sync>;

/// What a job operation sees on each attempt.
#[derive(Debug, Clone)]
pub struct JobContext {
    pub(crate) attempt: Attempt,
    pub(crate) worker: WorkerId,
    pub(crate) name: Option<Arc<str>>,
    pub(crate) args: Arc<[ArgValue]>,
    pub(crate) kwargs: Arc<HashMap<String, ArgValue>>,
}

impl JobContext {
    /// 1-based attempt number.
    pub fn attempt(&self) -> u32 {
        self.attempt.number
    }

    /// Cancelled when this attempt times out or the job's token is cancelled.
    pub fn token(&self) -> &CancellationToken {
        &self.attempt.token
    }

    /// Id of the worker running the job.
    pub fn worker(&self) -> WorkerId {
        self.worker
    }

    /// Job name, if one was given.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Positional argument `index`, if present and of type `T`.
    pub fn arg<T: Any>(&self, index: usize) -> Option<&T> {
        self.args.get(index).and_then(|v| v.downcast_ref::<T>())
    }

    /// Keyed argument `key`, if present and of type `T`.
    pub fn kwarg<T: Any>(&self, key: &str) -> Option<&T> {
        self.kwargs.get(key).and_then(|v| v.downcast_ref::<T>())
    }

    /// Number of positional arguments.
    pub fn args_len(&self) -> usize {
        self.args.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_accessors() {
        let mut kwargs: HashMap<String, ArgValue> = HashMap::new();
        kwargs.insert("retries".into(), Arc::new(3u32));

        let ctx = JobContext {
            attempt: Attempt {
                number: 2,
                token: CancellationToken::new(),
            },
            worker: 1,
            name: Some("resize".into()),
            args: vec![Arc::new("img.png".to_string()) as ArgValue, Arc::new(640u32) as ArgValue].into(),
            kwargs: Arc::new(kwargs),
        };

        assert_eq!(ctx.attempt(), 2);
        assert_eq!(ctx.name(), Some("resize"));
        assert_eq!(ctx.arg::<String>(0).map(String::as_str), Some("img.png"));
        assert_eq!(ctx.arg::<u32>(1), Some(&640));
        assert_eq!(ctx.arg::<u64>(1), None);
        assert_eq!(ctx.arg::<u32>(2), None);
        assert_eq!(ctx.kwarg::<u32>("retries"), Some(&3));
        assert_eq!(ctx.kwarg::<u32>("missing"), None);
        assert_eq!(ctx.args_len(), 2);
    }
}
