//! # Error Types — Workflow Error Taxonomy
//!
//! Defines the error surface of the supervision workflow engine. All errors
//! use `thiserror` for derive-based `Display` and `Error` implementations.
//!
//! ## Design
//!
//! - Invariant and transition violations are expected, user-facing outcomes.
//!   They are detected inside the workflow transaction and returned to the
//!   caller before commit; they are never logged as bugs.
//! - Store-level conflicts (lock timeouts, unique-constraint races) and
//!   infrastructure failures are retryable; callers can distinguish them
//!   via [`WorkflowError::is_retryable`].
//! - Every variant carries a stable string code for the request layer.

use thiserror::Error;

// ─── Transition Errors ──────────────────────────────────────────────

/// Rejection produced by a pure state machine.
///
/// All workflow state machines share the same rejection shape: either the
/// requested transition is not reachable from the current state, or the
/// record has already reached a terminal state and accepts no transition
/// at all.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransitionError {
    /// Attempted transition is not valid from the current state.
    #[error("invalid {entity} transition: {from} -> {to}")]
    Invalid {
        /// Entity kind (e.g. "thesis", "topic_application").
        entity: &'static str,
        /// Current state.
        from: String,
        /// Attempted target state.
        to: String,
    },

    /// The record is in a terminal state and cannot transition.
    #[error("{entity} is in terminal state {state}")]
    Terminal {
        /// Entity kind.
        entity: &'static str,
        /// The terminal state.
        state: String,
    },

    /// The operation is gated on a state the record is not in.
    #[error("{entity} in status {state} does not allow {operation}")]
    NotAvailable {
        /// Entity kind.
        entity: &'static str,
        /// Current state.
        state: String,
        /// The gated operation (e.g. "defense scheduling").
        operation: &'static str,
    },
}

// ─── Workflow Errors ────────────────────────────────────────────────

/// Top-level error type surfaced at the engine boundary.
#[derive(Error, Debug)]
pub enum WorkflowError {
    /// A referenced entity does not exist.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Entity kind.
        entity: &'static str,
        /// The identifier that failed to resolve.
        id: String,
    },

    /// Requested status change is not reachable from the current state.
    #[error(transparent)]
    InvalidTransition(#[from] TransitionError),

    /// A uniqueness invariant would be violated (e.g. a second accepted
    /// commitment for the same student and scope).
    #[error("exclusivity violation: {0}")]
    ExclusivityViolation(String),

    /// Capacity reservation failed: no remaining slots, or the ledger row
    /// is closed for new commitments.
    #[error("capacity exhausted: {0}")]
    CapacityExhausted(String),

    /// The actor lacks the structural relationship the operation requires
    /// (not the assigned evaluator, not the target teacher, not the owning
    /// student).
    #[error("unauthorized action: {0}")]
    Unauthorized(String),

    /// Malformed input: bad date, missing required field, out-of-range
    /// score.
    #[error("validation error: {0}")]
    Validation(String),

    /// Concurrent mutation detected by the store. Always retryable.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Infrastructure failure in the backing store. Retryable; logged for
    /// operational follow-up.
    #[error("storage error: {0}")]
    Storage(String),
}

impl WorkflowError {
    /// Stable machine-readable code for the request layer.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "NOT_FOUND",
            Self::InvalidTransition(_) => "INVALID_TRANSITION",
            Self::ExclusivityViolation(_) => "EXCLUSIVITY_VIOLATION",
            Self::CapacityExhausted(_) => "CAPACITY_EXHAUSTED",
            Self::Unauthorized(_) => "UNAUTHORIZED_ACTION",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Conflict(_) => "CONFLICT",
            Self::Storage(_) => "STORAGE_ERROR",
        }
    }

    /// Whether the caller may retry the operation unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Conflict(_) | Self::Storage(_))
    }

    /// Construct a `NotFound` error for an entity kind and identifier.
    pub fn not_found(entity: &'static str, id: impl std::fmt::Display) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_stable() {
        assert_eq!(WorkflowError::not_found("topic", "x").code(), "NOT_FOUND");
        assert_eq!(
            WorkflowError::ExclusivityViolation("dup".into()).code(),
            "EXCLUSIVITY_VIOLATION"
        );
        assert_eq!(
            WorkflowError::CapacityExhausted("full".into()).code(),
            "CAPACITY_EXHAUSTED"
        );
        assert_eq!(
            WorkflowError::Unauthorized("nope".into()).code(),
            "UNAUTHORIZED_ACTION"
        );
        assert_eq!(
            WorkflowError::Validation("bad".into()).code(),
            "VALIDATION_ERROR"
        );
        assert_eq!(WorkflowError::Conflict("race".into()).code(), "CONFLICT");
        assert_eq!(WorkflowError::Storage("down".into()).code(), "STORAGE_ERROR");
    }

    #[test]
    fn test_transition_error_converts() {
        let err: WorkflowError = TransitionError::Invalid {
            entity: "thesis",
            from: "completed".into(),
            to: "in_progress".into(),
        }
        .into();
        assert_eq!(err.code(), "INVALID_TRANSITION");
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_retryable_kinds() {
        assert!(WorkflowError::Conflict("lock".into()).is_retryable());
        assert!(WorkflowError::Storage("io".into()).is_retryable());
        assert!(!WorkflowError::Validation("bad".into()).is_retryable());
        assert!(!WorkflowError::not_found("thesis", "y").is_retryable());
    }

    #[test]
    fn test_display_includes_context() {
        let err = TransitionError::Invalid {
            entity: "thesis_proposal",
            from: "rejected".into(),
            to: "accepted".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("thesis_proposal"));
        assert!(msg.contains("rejected"));
        assert!(msg.contains("accepted"));
    }
}
