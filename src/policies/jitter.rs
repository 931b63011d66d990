//! # Jitter policy for produced durations.
//!
//! [`JitterPolicy`] adds randomness to strategy output to prevent thundering herd effects
//! when many workers back off at the same moment.
//!
//! - [`JitterPolicy::None`]: no randomization, deterministic sequences
//! - [`JitterPolicy::Full`]: random value in [0, d]
//! - [`JitterPolicy::Equal`]: d/2 + random[0, d/2]
//!
//! Jitter is applied to the value a [`Strategy`](crate::Strategy) hands out, never to its cursor.

use rand::Rng;

/// Policy controlling randomization of produced durations.
///
/// ## Trade-offs
/// - **None**: Predictable, reproducible in tests
/// - **Full**: Maximum spread, can shrink the delay to zero
/// - **Equal**: Keeps at least half of the delay
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum JitterPolicy {
    /// No jitter: use the exact value.
    #[default]
    None,

    /// Full jitter: random value in [0, d].
    Full,

    /// Equal jitter: d/2 + random[0, d/2].
    Equal,
}

impl JitterPolicy {
    /// Applies jitter to a duration expressed in milliseconds.
    ///
    /// Non-positive input is returned as `0.0`.
    pub fn apply_ms(&self, ms: f64) -> f64 {
        if ms <= 0.0 || !ms.is_finite() {
            return 0.0;
        }
        match self {
            JitterPolicy::None => ms,
            JitterPolicy::Full => rand::rng().random_range(0.0..=ms),
            JitterPolicy::Equal => {
                let half = ms / 2.0;
                half + rand::rng().random_range(0.0..=half)
            }
        }
    }
}
