use crate::retry::{FailureKind, Outcome};

/// Value-free summary of how a pool job ended.
///
/// Carried by `JobCompleted` events so subscribers can observe results without
/// knowing the job's value type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobStatus {
    /// The operation returned a value.
    Succeeded {
        /// Attempts it took.
        attempts_used: u32,
    },
    /// The retry loop gave up.
    Failed {
        /// Failure classification.
        kind: FailureKind,
        /// Attempts it took.
        attempts_used: u32,
    },
    /// Reserved: cancellation layered above the core.
    Cancelled,
    /// The operation or its completion hook panicked.
    Crashed,
}

impl JobStatus {
    pub(crate) fn from_outcome<T>(outcome: &Outcome<T>, attempts: u32) -> Self {
        match outcome {
            Outcome::Success(_) => JobStatus::Succeeded {
                attempts_used: attempts,
            },
            Outcome::Failure(f) => JobStatus::Failed {
                kind: f.kind,
                attempts_used: f.attempts_used,
            },
            Outcome::Cancelled => JobStatus::Cancelled,
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            JobStatus::Succeeded { .. } => "succeeded",
            JobStatus::Failed { kind, .. } => kind.as_label(),
            JobStatus::Cancelled => "cancelled",
            JobStatus::Crashed => "crashed",
        }
    }

    /// Attempts the job used, when it got as far as the retry loop's end.
    pub fn attempts_used(&self) -> Option<u32> {
        match self {
            JobStatus::Succeeded { attempts_used } | JobStatus::Failed { attempts_used, .. } => {
                Some(*attempts_used)
            }
            JobStatus::Cancelled | JobStatus::Crashed => None,
        }
    }

    /// True for [`JobStatus::Succeeded`].
    pub fn is_success(&self) -> bool {
        matches!(self, JobStatus::Succeeded { .. })
    }
}
