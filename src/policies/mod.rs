//! Timeout and backoff strategies.
//!
//! This module groups the knobs that control **how long** one attempt may run
//! and **how long** to wait between two attempts.
//!
//! ## Contents
//! - [`Strategy`] stateful duration producer (constant / linear / multiplicative / functional)
//! - [`JitterPolicy`] randomization applied to produced values
//!
//! ## Quick wiring
//! ```text
//! RetryExecutor { timeout: Strategy, backoff: Strategy }
//!      └─► per attempt:
//!           - timeout.next()  bounds the attempt (+inf = unbounded)
//!           - backoff.next()  is slept after a transient failure
//! ```

mod jitter;
mod strategy;

pub use jitter::JitterPolicy;
pub use strategy::{Strategy, StrategyFn, StrategyKind};
