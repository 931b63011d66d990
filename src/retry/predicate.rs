//! # Transient-vs-fatal classification.
//!
//! A [`TransientPredicate`] decides whether a failed attempt is worth retrying.
//! The default is [`TransientPredicate::never`]: every failure is fatal, so real
//! errors are never silently swallowed. Callers opt in to retries explicitly.

use std::fmt;
use std::sync::Arc;

use crate::retry::Cause;

/// Pluggable classifier: `true` = transient (retry), `false` = fatal (abort).
#[derive(Clone)]
pub struct TransientPredicate(Arc<dyn Fn(&Cause) -> bool + Send + Sync>);

impl TransientPredicate {
    /// Nothing is transient (default).
    pub fn never() -> Self {
        Self::from_fn(|_| false)
    }

    /// Every failure is transient.
    pub fn always() -> Self {
        Self::from_fn(|_| true)
    }

    /// Only attempt timeouts are transient.
    pub fn timeouts() -> Self {
        Self::from_fn(Cause::is_timeout)
    }

    /// Custom classifier.
    ///
    /// # Example
    /// ```
    /// use taskcore::{Cause, TransientPredicate};
    ///
    /// #[derive(Debug, thiserror::Error)]
    /// #[error("connection reset")]
    /// struct Reset;
    ///
    /// let p = TransientPredicate::from_fn(|c: &Cause| c.is_timeout() || c.downcast_ref::<Reset>().is_some());
    /// assert!(p.is_transient(&Cause::Error(Reset.into())));
    /// assert!(!p.is_transient(&Cause::Error(anyhow::anyhow!("bad input"))));
    /// ```
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(&Cause) -> bool + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Classifies one failure.
    pub fn is_transient(&self, cause: &Cause) -> bool {
        (self.0)(cause)
    }
}

impl Default for TransientPredicate {
    fn default() -> Self {
        Self::never()
    }
}

impl fmt::Debug for TransientPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TransientPredicate(<fn>)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn builtins() {
        let timeout = Cause::Timeout {
            timeout: Duration::from_millis(1),
        };
        let error = Cause::Error(anyhow::anyhow!("boom"));

        assert!(!TransientPredicate::default().is_transient(&timeout));
        assert!(!TransientPredicate::never().is_transient(&error));
        assert!(TransientPredicate::always().is_transient(&error));
        assert!(TransientPredicate::timeouts().is_transient(&timeout));
        assert!(!TransientPredicate::timeouts().is_transient(&error));
    }
}
