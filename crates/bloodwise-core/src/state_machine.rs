//! Submission state machine
//!
//! `Idle → Validating → Submitting → Persisting → Done`, with `Failed`
//! reachable from `Validating` and `Submitting`. A persistence failure still
//! ends in `Done`. Reset returns to `Idle` from anywhere.

use serde::{Deserialize, Serialize};

/// Phase of the current submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SubmissionPhase {
    /// Nothing submitted since the last reset
    #[default]
    Idle,
    /// Checking the form
    Validating,
    /// Waiting for the inference service
    Submitting,
    /// Writing the record
    Persisting,
    /// Prediction shown (possibly with a persistence warning)
    Done,
    /// Submission rejected or prediction failed
    Failed,
}

impl SubmissionPhase {
    /// Check if a remote call may be outstanding
    #[inline]
    #[must_use]
    pub fn is_busy(&self) -> bool {
        matches!(self, Self::Validating | Self::Submitting | Self::Persisting)
    }
}

/// Illegal phase change
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("illegal submission transition: {from:?} -> {to:?}")]
pub struct IllegalTransition {
    /// Phase before
    pub from: SubmissionPhase,
    /// Requested phase
    pub to: SubmissionPhase,
}

/// Phases reachable from `from`
#[must_use]
pub fn allowed_transitions(from: SubmissionPhase) -> Vec<SubmissionPhase> {
    use SubmissionPhase::*;
    match from {
        Idle => vec![Validating, Idle],
        Validating => vec![Submitting, Failed, Idle],
        Submitting => vec![Persisting, Failed, Idle],
        Persisting => vec![Done, Idle],
        Done => vec![Validating, Idle],
        Failed => vec![Validating, Idle],
    }
}

/// Validate a phase change
///
/// # Errors
/// Returns `IllegalTransition` if `to` is not reachable from `from`.
pub fn validate_transition(
    from: SubmissionPhase,
    to: SubmissionPhase,
) -> Result<(), IllegalTransition> {
    if allowed_transitions(from).contains(&to) {
        Ok(())
    } else {
        Err(IllegalTransition { from, to })
    }
}
