//! # Pre-Thesis Lifecycle
//!
//! The execution record of supervised pre-thesis work, created exactly once
//! per accepted topic application.
//!
//! ## States
//!
//! ```text
//! InProgress ──▶ Completed  (terminal; grading at or above threshold)
//!      │
//!      └──▶ Cancelled (terminal)
//! ```
//!
//! Grading below the passing threshold records the score but leaves the
//! record in progress; resubmission policy is outside this crate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use aula_core::{GradingScale, SemesterId, StudentId, TeacherId, TopicId, TransitionError};

// ─── Pre-Thesis Status ──────────────────────────────────────────────

/// Lifecycle status of a pre-thesis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreThesisStatus {
    /// Supervised work is ongoing.
    InProgress,
    /// Passed and closed (terminal).
    Completed,
    /// Cancelled before completion (terminal).
    Cancelled,
}

impl PreThesisStatus {
    /// Whether this status is terminal.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

impl std::fmt::Display for PreThesisStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

// ─── Pre-Thesis ─────────────────────────────────────────────────────

/// A pre-thesis execution record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreThesis {
    /// Row identifier.
    pub id: Uuid,
    /// The accepted application that spawned this record.
    pub application_id: Uuid,
    /// The originating topic.
    pub topic_id: TopicId,
    /// The supervised student.
    pub student_id: StudentId,
    /// The supervising teacher.
    pub teacher_id: TeacherId,
    /// Semester scope.
    pub semester_id: SemesterId,
    /// Working title, copied from the topic.
    pub title: String,
    /// Lifecycle status.
    pub status: PreThesisStatus,
    /// Latest recorded score, if graded.
    pub final_score: Option<f64>,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
    /// When the record reached a terminal state, if it has.
    pub closed_at: Option<DateTime<Utc>>,
    /// Reason recorded with a cancellation.
    pub cancel_reason: Option<String>,
}

impl PreThesis {
    const ENTITY: &'static str = "pre_thesis";

    /// Create a new in-progress pre-thesis for an accepted application.
    pub fn new(
        application_id: Uuid,
        topic_id: TopicId,
        student_id: StudentId,
        teacher_id: TeacherId,
        semester_id: SemesterId,
        title: String,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            application_id,
            topic_id,
            student_id,
            teacher_id,
            semester_id,
            title,
            status: PreThesisStatus::InProgress,
            final_score: None,
            created_at: Utc::now(),
            closed_at: None,
            cancel_reason: None,
        }
    }

    /// Record a grade. Completes the record when the score meets the
    /// scale's passing threshold; otherwise the score is stored and the
    /// record stays in progress.
    ///
    /// The score must already be validated against the scale bounds.
    /// Returns whether the record transitioned to `Completed`.
    pub fn grade(&mut self, score: f64, scale: &GradingScale) -> Result<bool, TransitionError> {
        self.require_in_progress(PreThesisStatus::Completed)?;
        self.final_score = Some(score);
        if scale.is_passing(score) {
            self.status = PreThesisStatus::Completed;
            self.closed_at = Some(Utc::now());
            return Ok(true);
        }
        Ok(false)
    }

    /// Cancel the record (IN_PROGRESS → CANCELLED).
    pub fn cancel(&mut self, reason: impl Into<String>) -> Result<(), TransitionError> {
        self.require_in_progress(PreThesisStatus::Cancelled)?;
        self.status = PreThesisStatus::Cancelled;
        self.cancel_reason = Some(reason.into());
        self.closed_at = Some(Utc::now());
        Ok(())
    }

    fn require_in_progress(&self, target: PreThesisStatus) -> Result<(), TransitionError> {
        if self.status.is_terminal() {
            return Err(TransitionError::Terminal {
                entity: Self::ENTITY,
                state: self.status.to_string(),
            });
        }
        if self.status != PreThesisStatus::InProgress {
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

    fn make_prethesis() -> PreThesis {
        PreThesis::new(
            Uuid::new_v4(),
            TopicId::new(),
            StudentId::new(),
            TeacherId::new(),
            SemesterId::new(),
            "Stream processing survey".to_string(),
        )
    }

    // ── Grading tests ───────────────────────────────────────────────

    #[test]
    fn test_passing_grade_completes() {
        let mut p = make_prethesis();
        let completed = p.grade(7.5, &GradingScale::default()).unwrap();
        assert!(completed);
        assert_eq!(p.status, PreThesisStatus::Completed);
        assert_eq!(p.final_score, Some(7.5));
        assert!(p.closed_at.is_some());
    }

    #[test]
    fn test_threshold_grade_completes() {
        let mut p = make_prethesis();
        assert!(p.grade(5.0, &GradingScale::default()).unwrap());
        assert_eq!(p.status, PreThesisStatus::Completed);
    }

    #[test]
    fn test_failing_grade_stays_in_progress() {
        let mut p = make_prethesis();
        let completed = p.grade(4.0, &GradingScale::default()).unwrap();
        assert!(!completed);
        assert_eq!(p.status, PreThesisStatus::InProgress);
        assert_eq!(p.final_score, Some(4.0));
        assert!(p.closed_at.is_none());
    }

    #[test]
    fn test_failed_grade_can_be_regraded() {
        let mut p = make_prethesis();
        p.grade(3.0, &GradingScale::default()).unwrap();
        assert!(p.grade(6.0, &GradingScale::default()).unwrap());
        assert_eq!(p.final_score, Some(6.0));
    }

    #[test]
    fn test_alternate_scale_threshold() {
        let scale = GradingScale::new(0.0, 100.0, 50.0).unwrap();
        let mut p = make_prethesis();
        assert!(!p.grade(49.9, &scale).unwrap());
        assert!(p.grade(50.0, &scale).unwrap());
    }

    // ── Terminal state tests ────────────────────────────────────────

    #[test]
    fn test_completed_cannot_be_regraded() {
        let mut p = make_prethesis();
        p.grade(8.0, &GradingScale::default()).unwrap();
        let err = p.grade(9.0, &GradingScale::default()).unwrap_err();
        assert!(matches!(err, TransitionError::Terminal { .. }));
    }

    #[test]
    fn test_cancel_records_reason() {
        let mut p = make_prethesis();
        p.cancel("application withdrawn").unwrap();
        assert_eq!(p.status, PreThesisStatus::Cancelled);
        assert_eq!(p.cancel_reason.as_deref(), Some("application withdrawn"));
    }

    #[test]
    fn test_cancelled_cannot_be_graded() {
        let mut p = make_prethesis();
        p.cancel("withdrawn").unwrap();
        assert!(p.grade(8.0, &GradingScale::default()).is_err());
    }

    #[test]
    fn test_completed_cannot_be_cancelled() {
        let mut p = make_prethesis();
        p.grade(9.0, &GradingScale::default()).unwrap();
        assert!(p.cancel("too late").is_err());
    }
}
