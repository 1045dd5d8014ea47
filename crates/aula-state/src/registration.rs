//! # Thesis Registration State Machine
//!
//! The durable, approvable record converting an accepted proposal into an
//! official thesis commitment.
//!
//! ## States
//!
//! ```text
//! PendingApproval ──▶ Approved   (terminal; spawns the Thesis)
//!        │
//!        ├──▶ Rejected  (terminal)
//!        └──▶ Cancelled (terminal; also the cascade target)
//! ```
//!
//! Approval is the mutual-exclusion point: the engine cancels every sibling
//! pending registration for the same student and semester inside the same
//! transaction that records the approval.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use aula_core::{SemesterId, StudentId, TeacherId, TransitionError, UserId};

/// Reason recorded on registrations cancelled by an approval cascade.
pub const CASCADE_CANCEL_REASON: &str = "another registration was approved";

// ─── Registration Status ────────────────────────────────────────────

/// Approval status of a thesis registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationStatus {
    /// Awaiting approval.
    PendingApproval,
    /// Approved; the thesis record exists.
    Approved,
    /// Rejected by the approver (terminal).
    Rejected,
    /// Cancelled, either by the student or by an approval cascade
    /// (terminal).
    Cancelled,
}

impl RegistrationStatus {
    /// Whether this status is terminal.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Approved | Self::Rejected | Self::Cancelled)
    }

    /// Whether the registration blocks creation of another one for the
    /// same student and semester.
    pub fn blocks_new_registration(&self) -> bool {
        matches!(self, Self::PendingApproval | Self::Approved)
    }
}

impl std::fmt::Display for RegistrationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::PendingApproval => "pending_approval",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

// ─── Thesis Registration ────────────────────────────────────────────

/// A thesis registration derived from an accepted proposal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThesisRegistration {
    /// Row identifier.
    pub id: Uuid,
    /// The accepted proposal this registration was derived from.
    pub proposal_id: Uuid,
    /// The registering student.
    pub student_id: StudentId,
    /// The supervising teacher, carried over from the proposal.
    pub teacher_id: TeacherId,
    /// Semester scope.
    pub semester_id: SemesterId,
    /// Approval status.
    pub status: RegistrationStatus,
    /// The user who decided the registration, once decided.
    pub approved_by: Option<UserId>,
    /// Reason recorded with a rejection or cancellation.
    pub decision_reason: Option<String>,
    /// When the registration was created.
    pub created_at: DateTime<Utc>,
    /// When a decision was made, if any.
    pub decided_at: Option<DateTime<Utc>>,
}

impl ThesisRegistration {
    const ENTITY: &'static str = "thesis_registration";

    /// Create a new registration awaiting approval.
    pub fn new(
        proposal_id: Uuid,
        student_id: StudentId,
        teacher_id: TeacherId,
        semester_id: SemesterId,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            proposal_id,
            student_id,
            teacher_id,
            semester_id,
            status: RegistrationStatus::PendingApproval,
            approved_by: None,
            decision_reason: None,
            created_at: Utc::now(),
            decided_at: None,
        }
    }

    /// Approve the registration (PENDING_APPROVAL → APPROVED).
    pub fn approve(&mut self, approver: UserId) -> Result<(), TransitionError> {
        self.require_pending(RegistrationStatus::Approved)?;
        self.status = RegistrationStatus::Approved;
        self.approved_by = Some(approver);
        self.decided_at = Some(Utc::now());
        Ok(())
    }

    /// Reject the registration with a reason (PENDING_APPROVAL → REJECTED).
    pub fn reject(
        &mut self,
        approver: UserId,
        reason: impl Into<String>,
    ) -> Result<(), TransitionError> {
        self.require_pending(RegistrationStatus::Rejected)?;
        self.status = RegistrationStatus::Rejected;
        self.approved_by = Some(approver);
        self.decision_reason = Some(reason.into());
        self.decided_at = Some(Utc::now());
        Ok(())
    }

    /// Cancel the registration (PENDING_APPROVAL → CANCELLED).
    ///
    /// Used both for student withdrawal and for the approval cascade, which
    /// passes [`CASCADE_CANCEL_REASON`].
    pub fn cancel(&mut self, reason: impl Into<String>) -> Result<(), TransitionError> {
        self.require_pending(RegistrationStatus::Cancelled)?;
        self.status = RegistrationStatus::Cancelled;
        self.decision_reason = Some(reason.into());
        self.decided_at = Some(Utc::now());
        Ok(())
    }

    /// Whether the registration is approved.
    pub fn is_approved(&self) -> bool {
        self.status == RegistrationStatus::Approved
    }

    fn require_pending(&self, target: RegistrationStatus) -> Result<(), TransitionError> {
        if self.status.is_terminal() {
            return Err(TransitionError::Terminal {
                entity: Self::ENTITY,
                state: self.status.to_string(),
            });
        }
        if self.status != RegistrationStatus::PendingApproval {
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

    fn make_registration() -> ThesisRegistration {
        ThesisRegistration::new(
            Uuid::new_v4(),
            StudentId::new(),
            TeacherId::new(),
            SemesterId::new(),
        )
    }

    // ── Decision tests ──────────────────────────────────────────────

    #[test]
    fn test_new_registration_is_pending() {
        let r = make_registration();
        assert_eq!(r.status, RegistrationStatus::PendingApproval);
        assert!(r.status.blocks_new_registration());
    }

    #[test]
    fn test_approve_records_approver() {
        let mut r = make_registration();
        let approver = UserId::new();
        r.approve(approver).unwrap();
        assert!(r.is_approved());
        assert_eq!(r.approved_by, Some(approver));
        assert!(r.decided_at.is_some());
    }

    #[test]
    fn test_reject_records_reason_and_approver() {
        let mut r = make_registration();
        let approver = UserId::new();
        r.reject(approver, "missing prerequisites").unwrap();
        assert_eq!(r.status, RegistrationStatus::Rejected);
        assert_eq!(r.approved_by, Some(approver));
        assert_eq!(r.decision_reason.as_deref(), Some("missing prerequisites"));
    }

    #[test]
    fn test_cascade_cancel_reason() {
        let mut r = make_registration();
        r.cancel(CASCADE_CANCEL_REASON).unwrap();
        assert_eq!(r.status, RegistrationStatus::Cancelled);
        assert_eq!(
            r.decision_reason.as_deref(),
            Some("another registration was approved")
        );
    }

    // ── Monotonic terminal state tests ──────────────────────────────

    #[test]
    fn test_approved_is_terminal() {
        let mut r = make_registration();
        r.approve(UserId::new()).unwrap();
        assert!(r.approve(UserId::new()).is_err());
        assert!(r.reject(UserId::new(), "x").is_err());
        assert!(r.cancel("x").is_err());
    }

    #[test]
    fn test_rejected_cannot_be_approved() {
        let mut r = make_registration();
        r.reject(UserId::new(), "no").unwrap();
        let err = r.approve(UserId::new()).unwrap_err();
        assert!(matches!(err, TransitionError::Terminal { .. }));
    }

    #[test]
    fn test_cancelled_cannot_be_approved() {
        let mut r = make_registration();
        r.cancel("withdrawn").unwrap();
        assert!(r.approve(UserId::new()).is_err());
    }

    // ── Exclusivity guard tests ─────────────────────────────────────

    #[test]
    fn test_blocks_new_registration() {
        assert!(RegistrationStatus::PendingApproval.blocks_new_registration());
        assert!(RegistrationStatus::Approved.blocks_new_registration());
        assert!(!RegistrationStatus::Rejected.blocks_new_registration());
        assert!(!RegistrationStatus::Cancelled.blocks_new_registration());
    }

    // ── Serialization tests ─────────────────────────────────────────

    #[test]
    fn test_status_snake_case() {
        assert_eq!(
            serde_json::to_value(RegistrationStatus::PendingApproval).unwrap(),
            serde_json::Value::String("pending_approval".to_string())
        );
    }
}
