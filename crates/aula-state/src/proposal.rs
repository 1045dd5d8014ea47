//! # Thesis Proposal State Machine
//!
//! A student's request to be supervised by a specific teacher for a full
//! thesis, prior to formal registration.
//!
//! ## States
//!
//! ```text
//! Submitted ──▶ Accepted ──▶ Cancelled (withdrawal)
//!     │
//!     ├──▶ Rejected  (terminal)
//!     └──▶ Cancelled (terminal)
//! ```
//!
//! The decision is only reachable from `Submitted`, which makes a
//! rejected-then-accepted sequence structurally impossible: once a proposal
//! leaves `Submitted` there is no path back.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use aula_core::{SemesterId, StudentId, TeacherId, TransitionError};

// ─── Proposal Status ────────────────────────────────────────────────

/// Decision status of a thesis proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProposalStatus {
    /// Awaiting the target teacher's decision.
    Submitted,
    /// Accepted by the teacher.
    Accepted,
    /// Rejected by the teacher (terminal).
    Rejected,
    /// Cancelled by the student (terminal).
    Cancelled,
}

impl ProposalStatus {
    /// Whether this status is terminal.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Rejected | Self::Cancelled)
    }

    /// Whether the proposal still occupies the student's active slot for
    /// the semester.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Submitted | Self::Accepted)
    }
}

impl std::fmt::Display for ProposalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Submitted => "submitted",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
            Self::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

// ─── Thesis Proposal ────────────────────────────────────────────────

/// A student's thesis supervision proposal to one teacher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThesisProposal {
    /// Row identifier.
    pub id: Uuid,
    /// The proposing student.
    pub student_id: StudentId,
    /// The teacher asked to supervise.
    pub teacher_id: TeacherId,
    /// Semester scope of the proposal.
    pub semester_id: SemesterId,
    /// Working title of the thesis.
    pub title: String,
    /// Abstract of the proposed work.
    pub description: String,
    /// Comma-separated keywords, if provided.
    pub keywords: Option<String>,
    /// Decision status.
    pub status: ProposalStatus,
    /// When the proposal was submitted.
    pub submitted_at: DateTime<Utc>,
    /// When a decision was made, if any.
    pub decided_at: Option<DateTime<Utc>>,
    /// Reason recorded with a rejection.
    pub decision_reason: Option<String>,
}

impl ThesisProposal {
    const ENTITY: &'static str = "thesis_proposal";

    /// Create a new submitted proposal.
    pub fn new(
        student_id: StudentId,
        teacher_id: TeacherId,
        semester_id: SemesterId,
        title: String,
        description: String,
        keywords: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            student_id,
            teacher_id,
            semester_id,
            title,
            description,
            keywords,
            status: ProposalStatus::Submitted,
            submitted_at: Utc::now(),
            decided_at: None,
            decision_reason: None,
        }
    }

    /// Accept the proposal (SUBMITTED → ACCEPTED).
    pub fn accept(&mut self) -> Result<(), TransitionError> {
        self.require_submitted(ProposalStatus::Accepted)?;
        self.status = ProposalStatus::Accepted;
        self.decided_at = Some(Utc::now());
        Ok(())
    }

    /// Reject the proposal with a reason (SUBMITTED → REJECTED).
    pub fn reject(&mut self, reason: impl Into<String>) -> Result<(), TransitionError> {
        self.require_submitted(ProposalStatus::Rejected)?;
        self.status = ProposalStatus::Rejected;
        self.decided_at = Some(Utc::now());
        self.decision_reason = Some(reason.into());
        Ok(())
    }

    /// Cancel the proposal (SUBMITTED or ACCEPTED → CANCELLED).
    pub fn cancel(&mut self) -> Result<(), TransitionError> {
        match self.status {
            ProposalStatus::Submitted | ProposalStatus::Accepted => {
                self.status = ProposalStatus::Cancelled;
                self.decided_at = Some(Utc::now());
                Ok(())
            }
            _ => Err(TransitionError::Terminal {
                entity: Self::ENTITY,
                state: self.status.to_string(),
            }),
        }
    }

    /// Whether the proposal holds an accepted commitment.
    pub fn is_accepted(&self) -> bool {
        self.status == ProposalStatus::Accepted
    }

    fn require_submitted(&self, target: ProposalStatus) -> Result<(), TransitionError> {
        if self.status.is_terminal() {
            return Err(TransitionError::Terminal {
                entity: Self::ENTITY,
                state: self.status.to_string(),
            });
        }
        if self.status != ProposalStatus::Submitted {
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

    fn make_proposal() -> ThesisProposal {
        ThesisProposal::new(
            StudentId::new(),
            TeacherId::new(),
            SemesterId::new(),
            "Adaptive query planning".to_string(),
            "Cost-model-driven plan selection under skew.".to_string(),
            Some("databases,query optimization".to_string()),
        )
    }

    // ── Decision tests ──────────────────────────────────────────────

    #[test]
    fn test_new_proposal_is_submitted() {
        let p = make_proposal();
        assert_eq!(p.status, ProposalStatus::Submitted);
        assert!(p.status.is_active());
    }

    #[test]
    fn test_accept() {
        let mut p = make_proposal();
        p.accept().unwrap();
        assert!(p.is_accepted());
        assert!(p.decided_at.is_some());
    }

    #[test]
    fn test_reject_records_reason() {
        let mut p = make_proposal();
        p.reject("supervision area mismatch").unwrap();
        assert_eq!(p.status, ProposalStatus::Rejected);
        assert_eq!(
            p.decision_reason.as_deref(),
            Some("supervision area mismatch")
        );
    }

    #[test]
    fn test_cancel_submitted() {
        let mut p = make_proposal();
        p.cancel().unwrap();
        assert_eq!(p.status, ProposalStatus::Cancelled);
        assert!(!p.status.is_active());
    }

    #[test]
    fn test_cancel_accepted_withdrawal() {
        let mut p = make_proposal();
        p.accept().unwrap();
        p.cancel().unwrap();
        assert_eq!(p.status, ProposalStatus::Cancelled);
    }

    // ── Monotonic terminal state tests ──────────────────────────────

    #[test]
    fn test_rejected_never_becomes_accepted() {
        let mut p = make_proposal();
        p.reject("not this semester").unwrap();
        let err = p.accept().unwrap_err();
        assert!(matches!(err, TransitionError::Terminal { .. }));
    }

    #[test]
    fn test_cancelled_is_terminal() {
        let mut p = make_proposal();
        p.cancel().unwrap();
        assert!(p.accept().is_err());
        assert!(p.reject("x").is_err());
        assert!(p.cancel().is_err());
    }

    #[test]
    fn test_accepted_cannot_be_rejected() {
        let mut p = make_proposal();
        p.accept().unwrap();
        let err = p.reject("changed my mind").unwrap_err();
        assert!(matches!(err, TransitionError::Invalid { .. }));
    }

    // ── Serialization tests ─────────────────────────────────────────

    #[test]
    fn test_proposal_serde_roundtrip() {
        let p = make_proposal();
        let json = serde_json::to_string(&p).unwrap();
        let parsed: ThesisProposal = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.status, p.status);
        assert_eq!(parsed.title, p.title);
        assert_eq!(parsed.keywords, p.keywords);
    }
}
