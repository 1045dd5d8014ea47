//! # Thesis Lifecycle State Machine
//!
//! The execution record of full thesis supervision, created when a
//! registration is approved and closed by the final grade.
//!
//! ## States
//!
//! ```text
//! Draft ──▶ InProgress ──▶ DefenseScheduled ──▶ DefenseCompleted ──▶ Completed
//!   │            │                │                     │            (terminal)
//!   │            │                │                     │
//!   └────────────┴────────────────┴─────────────────────┴──▶ Cancelled (terminal)
//! ```
//!
//! Status is the only gate for downstream operations: committee assignment
//! requires an in-progress-or-later non-terminal thesis, defense scheduling
//! requires `InProgress`, and evaluation requires `DefenseCompleted`.
//!
//! ## Design Decision
//!
//! The thesis keeps an append-only transition log. Each transition records
//! the from/to status, a timestamp, and a reason, so the path a thesis took
//! to its terminal state stays auditable without reconstructing it from
//! sibling records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use aula_core::{SemesterId, StudentId, TeacherId, ThesisId, TransitionError};

// ─── Thesis Status ──────────────────────────────────────────────────

/// Lifecycle status of a thesis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThesisStatus {
    /// Created but not yet started.
    Draft,
    /// Supervised work is ongoing.
    InProgress,
    /// A defense session has been scheduled.
    DefenseScheduled,
    /// The defense has taken place; evaluations may be submitted.
    DefenseCompleted,
    /// Final grade recorded (terminal).
    Completed,
    /// Cancelled before completion (terminal).
    Cancelled,
}

impl ThesisStatus {
    /// Whether this status is terminal.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

impl std::fmt::Display for ThesisStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Draft => "draft",
            Self::InProgress => "in_progress",
            Self::DefenseScheduled => "defense_scheduled",
            Self::DefenseCompleted => "defense_completed",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

// ─── Transition Log ─────────────────────────────────────────────────

/// Record of a thesis status transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionRecord {
    /// Status before the transition.
    pub from_status: ThesisStatus,
    /// Status after the transition.
    pub to_status: ThesisStatus,
    /// When the transition occurred.
    pub timestamp: DateTime<Utc>,
    /// Reason for the transition.
    pub reason: String,
}

// ─── Thesis ─────────────────────────────────────────────────────────

/// A thesis execution record with its transition history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Thesis {
    /// Unique thesis identifier.
    pub id: ThesisId,
    /// The approved registration that spawned this thesis.
    pub registration_id: Uuid,
    /// The thesis author.
    pub student_id: StudentId,
    /// The supervising teacher.
    pub supervisor_id: TeacherId,
    /// Semester scope.
    pub semester_id: SemesterId,
    /// Thesis title, carried over from the proposal.
    pub title: String,
    /// Current lifecycle status.
    pub status: ThesisStatus,
    /// Ordered log of all status transitions.
    pub transitions: Vec<TransitionRecord>,
    /// When the thesis was created.
    pub created_at: DateTime<Utc>,
    /// When the thesis was last mutated.
    pub updated_at: DateTime<Utc>,
}

impl Thesis {
    const ENTITY: &'static str = "thesis";

    /// Create a new thesis in progress.
    ///
    /// Approval is the act that starts the work, so freshly spawned theses
    /// skip `Draft`. The machine still accepts `Draft` as an inbound state
    /// for records migrated from elsewhere; see [`Thesis::start`].
    pub fn new(
        registration_id: Uuid,
        student_id: StudentId,
        supervisor_id: TeacherId,
        semester_id: SemesterId,
        title: String,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: ThesisId::new(),
            registration_id,
            student_id,
            supervisor_id,
            semester_id,
            title,
            status: ThesisStatus::InProgress,
            transitions: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Start a draft thesis (DRAFT → IN_PROGRESS).
    pub fn start(&mut self) -> Result<(), TransitionError> {
        self.require_status(ThesisStatus::Draft, ThesisStatus::InProgress)?;
        self.do_transition(ThesisStatus::InProgress, "supervision started");
        Ok(())
    }

    /// Mark the defense as scheduled (IN_PROGRESS → DEFENSE_SCHEDULED).
    pub fn schedule_defense(&mut self) -> Result<(), TransitionError> {
        self.require_status(ThesisStatus::InProgress, ThesisStatus::DefenseScheduled)?;
        self.do_transition(ThesisStatus::DefenseScheduled, "defense session scheduled");
        Ok(())
    }

    /// Mark the defense as held (DEFENSE_SCHEDULED → DEFENSE_COMPLETED).
    ///
    /// Unlocks evaluation submission.
    pub fn complete_defense(&mut self) -> Result<(), TransitionError> {
        self.require_status(ThesisStatus::DefenseScheduled, ThesisStatus::DefenseCompleted)?;
        self.do_transition(ThesisStatus::DefenseCompleted, "defense session completed");
        Ok(())
    }

    /// Close the thesis once the final grade exists
    /// (DEFENSE_COMPLETED → COMPLETED).
    pub fn complete(&mut self) -> Result<(), TransitionError> {
        self.require_status(ThesisStatus::DefenseCompleted, ThesisStatus::Completed)?;
        self.do_transition(ThesisStatus::Completed, "final grade recorded");
        Ok(())
    }

    /// Cancel the thesis from any non-terminal state.
    pub fn cancel(&mut self, reason: impl Into<String>) -> Result<(), TransitionError> {
        if self.status.is_terminal() {
            return Err(TransitionError::Terminal {
                entity: Self::ENTITY,
                state: self.status.to_string(),
            });
        }
        self.do_transition(ThesisStatus::Cancelled, &reason.into());
        Ok(())
    }

    /// Whether committee roles may be assigned: in progress or later,
    /// not terminal.
    pub fn accepts_assignments(&self) -> bool {
        matches!(
            self.status,
            ThesisStatus::InProgress | ThesisStatus::DefenseScheduled | ThesisStatus::DefenseCompleted
        )
    }

    /// Whether evaluations may be submitted.
    pub fn accepts_evaluations(&self) -> bool {
        self.status == ThesisStatus::DefenseCompleted
    }

    /// Gate check for committee assignment.
    pub fn ensure_accepts_assignments(&self) -> Result<(), TransitionError> {
        if !self.accepts_assignments() {
            return Err(TransitionError::NotAvailable {
                entity: Self::ENTITY,
                state: self.status.to_string(),
                operation: "committee assignment",
            });
        }
        Ok(())
    }

    /// Gate check for evaluation submission.
    pub fn ensure_accepts_evaluations(&self) -> Result<(), TransitionError> {
        if !self.accepts_evaluations() {
            return Err(TransitionError::NotAvailable {
                entity: Self::ENTITY,
                state: self.status.to_string(),
                operation: "evaluation submission",
            });
        }
        Ok(())
    }

    /// Validate that the thesis is in the expected state.
    fn require_status(
        &self,
        expected: ThesisStatus,
        target: ThesisStatus,
    ) -> Result<(), TransitionError> {
        if self.status.is_terminal() {
            return Err(TransitionError::Terminal {
                entity: Self::ENTITY,
                state: self.status.to_string(),
            });
        }
        if self.status != expected {
            return Err(TransitionError::Invalid {
                entity: Self::ENTITY,
                from: self.status.to_string(),
                to: target.to_string(),
            });
        }
        Ok(())
    }

    /// Record a status transition.
    fn do_transition(&mut self, to: ThesisStatus, reason: &str) {
        let now = Utc::now();
        self.transitions.push(TransitionRecord {
            from_status: self.status,
            to_status: to,
            timestamp: now,
            reason: reason.to_string(),
        });
        self.status = to;
        self.updated_at = now;
    }
}

// ─── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn make_thesis() -> Thesis {
        Thesis::new(
            Uuid::new_v4(),
            StudentId::new(),
            TeacherId::new(),
            SemesterId::new(),
            "Incremental view maintenance".to_string(),
        )
    }

    fn make_defense_completed() -> Thesis {
        let mut t = make_thesis();
        t.schedule_defense().unwrap();
        t.complete_defense().unwrap();
        t
    }

    // ── Lifecycle tests ─────────────────────────────────────────────

    #[test]
    fn test_new_thesis_is_in_progress() {
        let t = make_thesis();
        assert_eq!(t.status, ThesisStatus::InProgress);
        assert!(t.accepts_assignments());
        assert!(!t.accepts_evaluations());
    }

    #[test]
    fn test_full_lifecycle() {
        let mut t = make_thesis();
        t.schedule_defense().unwrap();
        assert_eq!(t.status, ThesisStatus::DefenseScheduled);
        t.complete_defense().unwrap();
        assert_eq!(t.status, ThesisStatus::DefenseCompleted);
        assert!(t.accepts_evaluations());
        t.complete().unwrap();
        assert_eq!(t.status, ThesisStatus::Completed);
        assert_eq!(t.transitions.len(), 3);
    }

    #[test]
    fn test_draft_must_start_before_scheduling() {
        let mut t = make_thesis();
        t.status = ThesisStatus::Draft;
        assert!(t.schedule_defense().is_err());
        t.start().unwrap();
        assert!(t.schedule_defense().is_ok());
    }

    // ── Gate tests ──────────────────────────────────────────────────

    #[test]
    fn test_cannot_schedule_defense_twice() {
        let mut t = make_thesis();
        t.schedule_defense().unwrap();
        let err = t.schedule_defense().unwrap_err();
        assert!(matches!(err, TransitionError::Invalid { .. }));
    }

    #[test]
    fn test_cannot_complete_defense_before_scheduling() {
        let mut t = make_thesis();
        assert!(t.complete_defense().is_err());
    }

    #[test]
    fn test_cannot_complete_before_defense() {
        let mut t = make_thesis();
        assert!(t.complete().is_err());
        t.schedule_defense().unwrap();
        assert!(t.complete().is_err());
    }

    #[test]
    fn test_assignment_gate() {
        let mut t = make_thesis();
        assert!(t.accepts_assignments());
        t.schedule_defense().unwrap();
        assert!(t.accepts_assignments());
        t.complete_defense().unwrap();
        assert!(t.accepts_assignments());
        t.complete().unwrap();
        assert!(!t.accepts_assignments());
    }

    #[test]
    fn test_evaluation_gate_requires_defense_completed() {
        let t = make_defense_completed();
        assert!(t.accepts_evaluations());
    }

    // ── Cancellation tests ──────────────────────────────────────────

    #[test]
    fn test_cancel_from_any_non_terminal_state() {
        let setups: [fn(&mut Thesis); 4] = [
            |t| t.status = ThesisStatus::Draft,
            |_t| {},
            |t| t.schedule_defense().unwrap(),
            |t| {
                t.schedule_defense().unwrap();
                t.complete_defense().unwrap();
            },
        ];
        for setup in setups {
            let mut t = make_thesis();
            setup(&mut t);
            t.cancel("student withdrew").unwrap();
            assert_eq!(t.status, ThesisStatus::Cancelled);
        }
    }

    #[test]
    fn test_cannot_cancel_completed() {
        let mut t = make_defense_completed();
        t.complete().unwrap();
        let err = t.cancel("too late").unwrap_err();
        assert!(matches!(err, TransitionError::Terminal { .. }));
    }

    #[test]
    fn test_cancelled_is_terminal() {
        let mut t = make_thesis();
        t.cancel("withdrawn").unwrap();
        assert!(t.schedule_defense().is_err());
        assert!(t.complete().is_err());
        assert!(t.cancel("again").is_err());
    }

    // ── Transition log tests ────────────────────────────────────────

    #[test]
    fn test_transition_log_records_path() {
        let mut t = make_defense_completed();
        t.complete().unwrap();

        let path: Vec<(ThesisStatus, ThesisStatus)> = t
            .transitions
            .iter()
            .map(|r| (r.from_status, r.to_status))
            .collect();
        assert_eq!(
            path,
            vec![
                (ThesisStatus::InProgress, ThesisStatus::DefenseScheduled),
                (ThesisStatus::DefenseScheduled, ThesisStatus::DefenseCompleted),
                (ThesisStatus::DefenseCompleted, ThesisStatus::Completed),
            ]
        );
    }

    #[test]
    fn test_cancel_reason_is_logged() {
        let mut t = make_thesis();
        t.cancel("registration withdrawn").unwrap();
        assert_eq!(t.transitions.last().unwrap().reason, "registration withdrawn");
    }

    // ── Serialization tests ─────────────────────────────────────────

    #[test]
    fn test_thesis_serde_roundtrip() {
        let mut t = make_thesis();
        t.schedule_defense().unwrap();
        let json = serde_json::to_string(&t).unwrap();
        let parsed: Thesis = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.status, t.status);
        assert_eq!(parsed.transitions.len(), 1);
    }

    #[test]
    fn test_status_snake_case() {
        assert_eq!(
            serde_json::to_value(ThesisStatus::DefenseScheduled).unwrap(),
            serde_json::Value::String("defense_scheduled".to_string())
        );
    }
}
