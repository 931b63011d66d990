//! # Duration strategies for timeouts and backoffs.
//!
//! A [`Strategy`] is a stateful producer of non-negative durations. Every call to
//! [`Strategy::next`] hands out one value and advances an internal cursor;
//! [`Strategy::reset`] puts the cursor back where it started.
//!
//! Four variants are available (see [`StrategyKind`]):
//! - **Constant(d)**: always `d`;
//! - **Linear(base, step)**: `base + i × step` for the i-th call (0-based);
//! - **Multiplicative(base, factor)**: `base × factor^i`;
//! - **Functional(f)**: `f(n)` where `n` is the **1-based** call index.
//!
//! Values are configured in milliseconds (`f64`) and produced as [`Duration`],
//! rounded to the nearest nanosecond. `+inf` means "no bound": [`Strategy::unbounded`]
//! produces it, and [`Strategy::next_bound`] turns it into `None`.
//!
//! The produced value may additionally be clamped by [`Strategy::with_cap`] and
//! randomized by [`Strategy::with_jitter`]. Both act on the output only, the
//! cursor never sees them, so a reset always restores the same sequence
//! (modulo jitter).
//!
//! # Example
//! ```rust
//! use std::time::Duration;
//! use taskcore::Strategy;
//!
//! let mut s = Strategy::multiplicative(100.0, 2.0)?.with_cap(1_000.0)?;
//!
//! assert_eq!(s.next(), Duration::from_millis(100));
//! assert_eq!(s.next(), Duration::from_millis(200));
//! assert_eq!(s.next(), Duration::from_millis(400));
//! assert_eq!(s.next(), Duration::from_millis(800));
//! // 1600ms → capped
//! assert_eq!(s.next(), Duration::from_millis(1_000));
//!
//! s.reset();
//! assert_eq!(s.next(), Duration::from_millis(100));
//! # Ok::<(), taskcore::ConfigError>(())
//! ```

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::error::ConfigError;
use crate::policies::jitter::JitterPolicy;

/// User function backing [`StrategyKind::Functional`]; receives the 1-based call index.
pub type StrategyFn = Arc<dyn Fn(u32) -> f64 + Send + Sync>;

/// Closed set of strategy variants.
#[derive(Clone)]
pub enum StrategyKind {
    /// Always the same value.
    Constant {
        /// Produced value (ms).
        ms: f64,
    },
    /// Cursor starts at `base`, grows by `step` after each call.
    Linear {
        /// Initial value (ms).
        base: f64,
        /// Increment per call (ms), may be zero.
        step: f64,
    },
    /// Cursor starts at `base`, multiplied by `factor` after each call.
    Multiplicative {
        /// Initial value (ms).
        base: f64,
        /// Growth factor, any non-negative real.
        factor: f64,
    },
    /// Value computed by a user function of the 1-based call index.
    Functional(StrategyFn),
}

impl fmt::Debug for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrategyKind::Constant { ms } => f.debug_struct("Constant").field("ms", ms).finish(),
            StrategyKind::Linear { base, step } => f
                .debug_struct("Linear")
                .field("base", base)
                .field("step", step)
                .finish(),
            StrategyKind::Multiplicative { base, factor } => f
                .debug_struct("Multiplicative")
                .field("base", base)
                .field("factor", factor)
                .finish(),
            StrategyKind::Functional(_) => f.write_str("Functional(<fn>)"),
        }
    }
}

/// Stateful producer of durations.
///
/// ### Rules
/// - `next()` never fails and never returns a negative value
/// - `reset()` restores the cursor to its initial value (idempotent)
/// - Clones are independent: each carries its own cursor
#[derive(Clone, Debug)]
pub struct Strategy {
    kind: StrategyKind,
    cursor: f64,
    calls: u32,
    cap: Option<f64>,
    jitter: JitterPolicy,
}

impl Strategy {
    /// `next()` always returns `ms`.
    pub fn constant(ms: f64) -> Result<Self, ConfigError> {
        check_non_negative("constant duration", ms)?;
        Ok(Self::from_kind(StrategyKind::Constant { ms }))
    }

    /// `next()` returns `base`, `base + step`, `base + 2 × step`, ...
    pub fn linear(base: f64, step: f64) -> Result<Self, ConfigError> {
        check_non_negative("linear base", base)?;
        check_non_negative("linear step", step)?;
        Ok(Self::from_kind(StrategyKind::Linear { base, step }))
    }

    /// `next()` returns `base`, `base × factor`, `base × factor²`, ...
    pub fn multiplicative(base: f64, factor: f64) -> Result<Self, ConfigError> {
        check_non_negative("multiplicative base", base)?;
        check_non_negative("multiplicative factor", factor)?;
        Ok(Self::from_kind(StrategyKind::Multiplicative { base, factor }))
    }

    /// `next()` returns `f(n)` where `n` is the 1-based number of `next()` calls
    /// since construction or the last reset.
    ///
    /// Negative or NaN results are clamped to zero.
    pub fn functional<F>(f: F) -> Self
    where
        F: Fn(u32) -> f64 + Send + Sync + 'static,
    {
        Self::from_kind(StrategyKind::Functional(Arc::new(f)))
    }

    /// `Constant(0)`: no delay as a backoff, a zero bound as a timeout.
    pub fn zero() -> Self {
        Self::from_kind(StrategyKind::Constant { ms: 0.0 })
    }

    /// `Constant(+inf)`: every attempt runs without a time bound.
    ///
    /// Meant for the timeout side of an executor; as a backoff it saturates.
    pub fn unbounded() -> Self {
        Self::from_kind(StrategyKind::Constant { ms: f64::INFINITY })
    }

    fn from_kind(kind: StrategyKind) -> Self {
        let cursor = initial_cursor(&kind);
        Self {
            kind,
            cursor,
            calls: 0,
            cap: None,
            jitter: JitterPolicy::None,
        }
    }

    /// Clamps every produced value to at most `max_ms`.
    pub fn with_cap(mut self, max_ms: f64) -> Result<Self, ConfigError> {
        check_non_negative("cap", max_ms)?;
        self.cap = Some(max_ms);
        Ok(self)
    }

    /// Randomizes every produced value with the given jitter policy.
    pub fn with_jitter(mut self, jitter: JitterPolicy) -> Self {
        self.jitter = jitter;
        self
    }

    /// Returns the variant and its configuration.
    pub fn kind(&self) -> &StrategyKind {
        &self.kind
    }

    /// Number of `next()` calls since construction or the last reset.
    pub fn calls(&self) -> u32 {
        self.calls
    }

    /// Produces the next value in milliseconds and advances the cursor.
    pub fn next_ms(&mut self) -> f64 {
        self.calls = self.calls.saturating_add(1);

        let raw = match &self.kind {
            StrategyKind::Constant { ms } => *ms,
            StrategyKind::Linear { step, .. } => {
                let v = self.cursor;
                self.cursor += step;
                v
            }
            StrategyKind::Multiplicative { factor, .. } => {
                let v = self.cursor;
                self.cursor *= factor;
                v
            }
            StrategyKind::Functional(f) => f(self.calls),
        };

        let mut ms = sanitize(raw);
        if let Some(cap) = self.cap {
            ms = ms.min(cap);
        }
        if ms.is_infinite() {
            return ms;
        }
        self.jitter.apply_ms(ms)
    }

    /// Produces the next value as an attempt bound; `None` when unbounded.
    pub fn next_bound(&mut self) -> Option<Duration> {
        let ms = self.next_ms();
        ms.is_finite().then(|| ms_to_duration(ms))
    }

    /// Produces the next value and advances the cursor.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Duration {
        ms_to_duration(self.next_ms())
    }

    /// Restores the cursor (and the call counter) to the initial state.
    pub fn reset(&mut self) {
        self.cursor = initial_cursor(&self.kind);
        self.calls = 0;
    }
}

fn initial_cursor(kind: &StrategyKind) -> f64 {
    match kind {
        StrategyKind::Linear { base, .. } | StrategyKind::Multiplicative { base, .. } => *base,
        StrategyKind::Constant { .. } | StrategyKind::Functional(_) => 0.0,
    }
}

fn check_non_negative(what: &str, v: f64) -> Result<(), ConfigError> {
    if !v.is_finite() || v < 0.0 {
        return Err(ConfigError::invalid(format!(
            "{what} must be a finite non-negative number, got {v}"
        )));
    }
    Ok(())
}

/// NaN and negatives collapse to zero; +inf is kept as "no bound".
fn sanitize(ms: f64) -> f64 {
    if ms.is_nan() || ms <= 0.0 { 0.0 } else { ms }
}

/// Converts milliseconds to a [`Duration`], rounding to the nearest nanosecond.
///
/// Saturates at `u64::MAX` nanoseconds (so `+inf` becomes the largest representable delay).
fn ms_to_duration(ms: f64) -> Duration {
    Duration::from_nanos((ms * 1_000_000.0).round() as u64)
}
