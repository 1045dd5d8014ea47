//! # Topic Application State Machine
//!
//! A student's commitment to a teacher-authored pre-thesis topic.
//!
//! ## States
//!
//! ```text
//! Pending ──▶ Accepted ──▶ Cancelled (withdrawal)
//!    │
//!    ├──▶ Rejected  (terminal)
//!    └──▶ Cancelled (terminal)
//! ```
//!
//! Only a pending application can be decided. A rejected application can
//! never become accepted. Cancelling an *accepted* application is the
//! student's withdrawal path; the engine pairs it with capacity release and
//! pre-thesis cancellation in the same transaction.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use aula_core::{SemesterId, StudentId, TopicId, TransitionError};

/// Reason recorded on pending applications auto-rejected because another
/// application by the same student was accepted.
pub const SUPERSEDED_REASON: &str = "superseded";

// ─── Application Status ─────────────────────────────────────────────

/// Decision status of a topic application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    /// Awaiting the topic owner's decision.
    Pending,
    /// Accepted by the topic owner.
    Accepted,
    /// Rejected by the topic owner (terminal).
    Rejected,
    /// Cancelled by the student (terminal).
    Cancelled,
}

impl ApplicationStatus {
    /// Whether this status is terminal.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Rejected | Self::Cancelled)
    }

    /// Whether the application still blocks a re-application to the same
    /// topic. A cancelled application does not.
    pub fn blocks_reapplication(&self) -> bool {
        matches!(self, Self::Pending | Self::Accepted)
    }
}

impl std::fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
            Self::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

// ─── Topic Application ──────────────────────────────────────────────

/// A student's application to a pre-thesis topic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicApplication {
    /// Row identifier.
    pub id: Uuid,
    /// The topic applied to.
    pub topic_id: TopicId,
    /// The applying student.
    pub student_id: StudentId,
    /// Semester scope, copied from the topic at application time.
    pub semester_id: SemesterId,
    /// Optional motivation message from the student.
    pub message: Option<String>,
    /// Decision status.
    pub status: ApplicationStatus,
    /// When the application was submitted.
    pub applied_at: DateTime<Utc>,
    /// When a decision was made, if any.
    pub decided_at: Option<DateTime<Utc>>,
    /// Reason recorded with a rejection.
    pub decision_reason: Option<String>,
}

impl TopicApplication {
    const ENTITY: &'static str = "topic_application";

    /// Create a new pending application.
    pub fn new(
        topic_id: TopicId,
        student_id: StudentId,
        semester_id: SemesterId,
        message: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            topic_id,
            student_id,
            semester_id,
            message,
            status: ApplicationStatus::Pending,
            applied_at: Utc::now(),
            decided_at: None,
            decision_reason: None,
        }
    }

    /// Accept the application (PENDING → ACCEPTED).
    pub fn accept(&mut self) -> Result<(), TransitionError> {
        self.require_pending(ApplicationStatus::Accepted)?;
        self.status = ApplicationStatus::Accepted;
        self.decided_at = Some(Utc::now());
        Ok(())
    }

    /// Reject the application with a reason (PENDING → REJECTED).
    pub fn reject(&mut self, reason: impl Into<String>) -> Result<(), TransitionError> {
        self.require_pending(ApplicationStatus::Rejected)?;
        self.status = ApplicationStatus::Rejected;
        self.decided_at = Some(Utc::now());
        self.decision_reason = Some(reason.into());
        Ok(())
    }

    /// Cancel the application (PENDING or ACCEPTED → CANCELLED).
    pub fn cancel(&mut self) -> Result<(), TransitionError> {
        match self.status {
            ApplicationStatus::Pending | ApplicationStatus::Accepted => {
                self.status = ApplicationStatus::Cancelled;
                self.decided_at = Some(Utc::now());
                Ok(())
            }
            _ => Err(TransitionError::Terminal {
                entity: Self::ENTITY,
                state: self.status.to_string(),
            }),
        }
    }

    /// Whether the application holds an accepted commitment.
    pub fn is_accepted(&self) -> bool {
        self.status == ApplicationStatus::Accepted
    }

    /// Validate that the application is still pending.
    fn require_pending(&self, target: ApplicationStatus) -> Result<(), TransitionError> {
        if self.status.is_terminal() {
            return Err(TransitionError::Terminal {
                entity: Self::ENTITY,
                state: self.status.to_string(),
            });
        }
        if self.status != ApplicationStatus::Pending {
            return Err(TransitionError::Invalid {
                entity: Self::ENTITY,
                from: self.status.to_string(),
                to: target.to_string(),
            });
        }
        Ok(())
    }
}

// ─── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn make_application() -> TopicApplication {
        TopicApplication::new(TopicId::new(), StudentId::new(), SemesterId::new(), None)
    }

    // ── Decision tests ──────────────────────────────────────────────

    #[test]
    fn test_new_application_is_pending() {
        let a = make_application();
        assert_eq!(a.status, ApplicationStatus::Pending);
        assert!(a.decided_at.is_none());
    }

    #[test]
    fn test_accept_stamps_decided_at() {
        let mut a = make_application();
        a.accept().unwrap();
        assert!(a.is_accepted());
        assert!(a.decided_at.is_some());
    }

    #[test]
    fn test_reject_records_reason() {
        let mut a = make_application();
        a.reject("superseded").unwrap();
        assert_eq!(a.status, ApplicationStatus::Rejected);
        assert_eq!(a.decision_reason.as_deref(), Some("superseded"));
        assert!(a.decided_at.is_some());
    }

    #[test]
    fn test_cancel_pending() {
        let mut a = make_application();
        a.cancel().unwrap();
        assert_eq!(a.status, ApplicationStatus::Cancelled);
    }

    #[test]
    fn test_cancel_accepted_withdrawal() {
        let mut a = make_application();
        a.accept().unwrap();
        a.cancel().unwrap();
        assert_eq!(a.status, ApplicationStatus::Cancelled);
    }

    // ── Monotonic terminal state tests ──────────────────────────────

    #[test]
    fn test_rejected_cannot_be_accepted() {
        let mut a = make_application();
        a.reject("no fit").unwrap();
        let err = a.accept().unwrap_err();
        assert!(matches!(err, TransitionError::Terminal { .. }));
    }

    #[test]
    fn test_cancelled_cannot_be_decided() {
        let mut a = make_application();
        a.cancel().unwrap();
        assert!(a.accept().is_err());
        assert!(a.reject("late").is_err());
        assert!(a.cancel().is_err());
    }

    #[test]
    fn test_accepted_cannot_be_accepted_again() {
        let mut a = make_application();
        a.accept().unwrap();
        let err = a.accept().unwrap_err();
        assert!(matches!(err, TransitionError::Invalid { .. }));
    }

    #[test]
    fn test_accepted_cannot_be_rejected() {
        let mut a = make_application();
        a.accept().unwrap();
        assert!(a.reject("too late").is_err());
    }

    // ── Re-application guard tests ──────────────────────────────────

    #[test]
    fn test_blocks_reapplication() {
        assert!(ApplicationStatus::Pending.blocks_reapplication());
        assert!(ApplicationStatus::Accepted.blocks_reapplication());
        assert!(!ApplicationStatus::Cancelled.blocks_reapplication());
        assert!(!ApplicationStatus::Rejected.blocks_reapplication());
    }

    // ── Serialization tests ─────────────────────────────────────────

    #[test]
    fn test_status_snake_case() {
        let json = serde_json::to_value(ApplicationStatus::Pending).unwrap();
        assert_eq!(json, serde_json::Value::String("pending".to_string()));
        let parsed: ApplicationStatus =
            serde_json::from_value(serde_json::Value::String("cancelled".to_string())).unwrap();
        assert_eq!(parsed, ApplicationStatus::Cancelled);
    }

    #[test]
    fn test_application_serde_roundtrip() {
        let mut a = make_application();
        a.accept().unwrap();
        let json = serde_json::to_string(&a).unwrap();
        let parsed: TopicApplication = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.status, a.status);
        assert_eq!(parsed.id, a.id);
    }
}
