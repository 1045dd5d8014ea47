//! # Thesis Committee Assignments
//!
//! A teacher's bound role on a specific thesis. Assignments are
//! soft-deleted with an explicit `active` flag and can be reactivated;
//! reassigning the same (thesis, teacher, role) restores the prior row
//! instead of duplicating it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use aula_core::{TeacherId, ThesisId, TransitionError, UserId};

// ─── Assignment Role ────────────────────────────────────────────────

/// A teacher's role on a thesis committee.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentRole {
    /// The supervising teacher.
    Supervisor,
    /// The appointed reviewer.
    Reviewer,
    /// A general committee member.
    CommitteeMember,
    /// The committee chair.
    Chair,
    /// The committee secretary.
    Secretary,
    /// An additional examining member.
    Member,
}

impl std::fmt::Display for AssignmentRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Supervisor => "supervisor",
            Self::Reviewer => "reviewer",
            Self::CommitteeMember => "committee_member",
            Self::Chair => "chair",
            Self::Secretary => "secretary",
            Self::Member => "member",
        };
        f.write_str(s)
    }
}

// ─── Thesis Assignment ──────────────────────────────────────────────

/// A teacher's committee assignment on a thesis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThesisAssignment {
    /// Row identifier.
    pub id: Uuid,
    /// The thesis.
    pub thesis_id: ThesisId,
    /// The assigned teacher.
    pub teacher_id: TeacherId,
    /// The assigned role. One row per (thesis, teacher, role).
    pub role: AssignmentRole,
    /// The user who made or last refreshed the assignment.
    pub assigned_by: UserId,
    /// When the assignment was made or last refreshed.
    pub assigned_at: DateTime<Utc>,
    /// Whether the assignment is currently in force.
    pub active: bool,
}

impl ThesisAssignment {
    const ENTITY: &'static str = "thesis_assignment";

    /// Create a new active assignment.
    pub fn new(
        thesis_id: ThesisId,
        teacher_id: TeacherId,
        role: AssignmentRole,
        assigned_by: UserId,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            thesis_id,
            teacher_id,
            role,
            assigned_by,
            assigned_at: Utc::now(),
            active: true,
        }
    }

    /// Refresh an active assignment with a new assigner and timestamp.
    ///
    /// This is the idempotent-reassignment path: assigning an already
    /// assigned (thesis, teacher, role) updates the bookkeeping fields
    /// rather than creating a duplicate.
    pub fn touch(&mut self, assigned_by: UserId) {
        self.assigned_by = assigned_by;
        self.assigned_at = Utc::now();
    }

    /// Remove the assignment from force (soft delete).
    pub fn deactivate(&mut self) -> Result<(), TransitionError> {
        if !self.active {
            return Err(TransitionError::Invalid {
                entity: Self::ENTITY,
                from: "inactive".to_string(),
                to: "inactive".to_string(),
            });
        }
        self.active = false;
        Ok(())
    }

    /// Restore a soft-deleted assignment.
    pub fn reactivate(&mut self, assigned_by: UserId) -> Result<(), TransitionError> {
        if self.active {
            return Err(TransitionError::Invalid {
                entity: Self::ENTITY,
                from: "active".to_string(),
                to: "active".to_string(),
            });
        }
        self.active = true;
        self.touch(assigned_by);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_assignment() -> ThesisAssignment {
        ThesisAssignment::new(
            ThesisId::new(),
            TeacherId::new(),
            AssignmentRole::Reviewer,
            UserId::new(),
        )
    }

    #[test]
    fn test_new_assignment_is_active() {
        let a = make_assignment();
        assert!(a.active);
    }

    #[test]
    fn test_deactivate_and_reactivate() {
        let mut a = make_assignment();
        a.deactivate().unwrap();
        assert!(!a.active);

        let reassigner = UserId::new();
        a.reactivate(reassigner).unwrap();
        assert!(a.active);
        assert_eq!(a.assigned_by, reassigner);
    }

    #[test]
    fn test_double_deactivate_rejected() {
        let mut a = make_assignment();
        a.deactivate().unwrap();
        assert!(a.deactivate().is_err());
    }

    #[test]
    fn test_reactivate_active_rejected() {
        let mut a = make_assignment();
        assert!(a.reactivate(UserId::new()).is_err());
    }

    #[test]
    fn test_touch_updates_assigner() {
        let mut a = make_assignment();
        let other = UserId::new();
        a.touch(other);
        assert_eq!(a.assigned_by, other);
        assert!(a.active);
    }

    #[test]
    fn test_role_display() {
        assert_eq!(AssignmentRole::Supervisor.to_string(), "supervisor");
        assert_eq!(AssignmentRole::CommitteeMember.to_string(), "committee_member");
    }

    #[test]
    fn test_role_snake_case_serde() {
        let parsed: AssignmentRole =
            serde_json::from_value(serde_json::Value::String("committee_member".into())).unwrap();
        assert_eq!(parsed, AssignmentRole::CommitteeMember);
    }
}
