//! # Jobs: the envelope the pool runs.
//!
//! - [`Job`] / [`JobBuilder`] wrap an operation with its arguments, name, retry budget and hook
//! - [`JobContext`] is what the operation sees on each attempt
//! - [`JobStatus`] summarizes a finished job for subscribers

mod context;
mod job;
mod status;

pub use context::{ArgValue, JobContext};
pub use job::{Job, JobBuilder};
pub use status::JobStatus;

pub(crate) use job::{Completion, Runnable};
