//! # Thesis Evaluations and the Grading Quorum
//!
//! A single evaluator's score and comments for a thesis, tied to their
//! assignment role, plus the completeness rule deciding when the set of
//! evaluations yields a final grade.
//!
//! ## Quorum Rule
//!
//! The required evaluator roles are exactly the roles present among the
//! thesis's *active* assignments. A final grade exists if and only if every
//! required role has at least one submitted evaluation; its value is the
//! arithmetic mean of all submitted scores, rounded to two decimals.
//! Removing an assignment therefore shrinks the quorum, and assigning a
//! new role grows it.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use aula_core::{mean_score, TeacherId, ThesisId};

use crate::assignment::{AssignmentRole, ThesisAssignment};

/// One evaluator's scored evaluation of a thesis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThesisEvaluation {
    /// Row identifier.
    pub id: Uuid,
    /// The evaluated thesis.
    pub thesis_id: ThesisId,
    /// The evaluating teacher.
    pub evaluator_id: TeacherId,
    /// The role the evaluation was submitted under.
    pub role: AssignmentRole,
    /// The awarded score.
    pub score: f64,
    /// Free-form comments.
    pub comments: Option<String>,
    /// When the evaluation was (last) submitted.
    pub submitted_at: DateTime<Utc>,
}

impl ThesisEvaluation {
    /// Create a new evaluation.
    pub fn new(
        thesis_id: ThesisId,
        evaluator_id: TeacherId,
        role: AssignmentRole,
        score: f64,
        comments: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            thesis_id,
            evaluator_id,
            role,
            score,
            comments,
            submitted_at: Utc::now(),
        }
    }
}

/// The computed terminal grade of a thesis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThesisFinalGrade {
    /// The graded thesis. One grade per thesis.
    pub thesis_id: ThesisId,
    /// Mean of all submitted evaluation scores, two decimals.
    pub final_score: f64,
    /// When the grade was computed.
    pub computed_at: DateTime<Utc>,
}

/// The set of roles that must evaluate: every role present among the
/// active assignments.
pub fn required_roles(assignments: &[ThesisAssignment]) -> BTreeSet<AssignmentRole> {
    assignments
        .iter()
        .filter(|a| a.active)
        .map(|a| a.role)
        .collect()
}

/// Required roles that have no submitted evaluation yet.
pub fn missing_roles(
    assignments: &[ThesisAssignment],
    evaluations: &[ThesisEvaluation],
) -> Vec<AssignmentRole> {
    let evaluated: BTreeSet<AssignmentRole> = evaluations.iter().map(|e| e.role).collect();
    required_roles(assignments)
        .into_iter()
        .filter(|r| !evaluated.contains(r))
        .collect()
}

/// Compute the final grade once the quorum is complete.
///
/// Returns `None` while any required role is missing an evaluation, or
/// when there are no active assignments at all (a thesis with no committee
/// cannot be graded).
pub fn final_grade(
    assignments: &[ThesisAssignment],
    evaluations: &[ThesisEvaluation],
) -> Option<f64> {
    let required = required_roles(assignments);
    if required.is_empty() {
        return None;
    }
    if !missing_roles(assignments, evaluations).is_empty() {
        return None;
    }
    let scores: Vec<f64> = evaluations.iter().map(|e| e.score).collect();
    mean_score(&scores)
}

// ─── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use aula_core::UserId;

    fn assignment(thesis: ThesisId, teacher: TeacherId, role: AssignmentRole) -> ThesisAssignment {
        ThesisAssignment::new(thesis, teacher, role, UserId::new())
    }

    fn evaluation(
        thesis: ThesisId,
        teacher: TeacherId,
        role: AssignmentRole,
        score: f64,
    ) -> ThesisEvaluation {
        ThesisEvaluation::new(thesis, teacher, role, score, None)
    }

    // ── Quorum tests ────────────────────────────────────────────────

    #[test]
    fn test_no_assignments_means_no_grade() {
        assert_eq!(final_grade(&[], &[]), None);
    }

    #[test]
    fn test_incomplete_quorum_has_no_grade() {
        let thesis = ThesisId::new();
        let t1 = TeacherId::new();
        let t2 = TeacherId::new();
        let assignments = vec![
            assignment(thesis, t1, AssignmentRole::Supervisor),
            assignment(thesis, t2, AssignmentRole::Reviewer),
        ];
        let evaluations = vec![evaluation(thesis, t1, AssignmentRole::Supervisor, 8.0)];

        assert_eq!(final_grade(&assignments, &evaluations), None);
        assert_eq!(
            missing_roles(&assignments, &evaluations),
            vec![AssignmentRole::Reviewer]
        );
    }

    #[test]
    fn test_complete_quorum_yields_mean() {
        let thesis = ThesisId::new();
        let t1 = TeacherId::new();
        let t2 = TeacherId::new();
        let assignments = vec![
            assignment(thesis, t1, AssignmentRole::Supervisor),
            assignment(thesis, t2, AssignmentRole::Reviewer),
        ];
        let evaluations = vec![
            evaluation(thesis, t1, AssignmentRole::Supervisor, 8.0),
            evaluation(thesis, t2, AssignmentRole::Reviewer, 7.0),
        ];

        assert_eq!(final_grade(&assignments, &evaluations), Some(7.5));
    }

    #[test]
    fn test_mean_rounds_to_two_decimals() {
        let thesis = ThesisId::new();
        let teachers: Vec<TeacherId> = (0..3).map(|_| TeacherId::new()).collect();
        let roles = [
            AssignmentRole::Supervisor,
            AssignmentRole::Reviewer,
            AssignmentRole::Chair,
        ];
        let assignments: Vec<_> = teachers
            .iter()
            .zip(roles)
            .map(|(t, r)| assignment(thesis, *t, r))
            .collect();
        let evaluations: Vec<_> = teachers
            .iter()
            .zip(roles)
            .zip([10.0, 10.0, 5.0])
            .map(|((t, r), s)| evaluation(thesis, *t, r, s))
            .collect();

        assert_eq!(final_grade(&assignments, &evaluations), Some(8.33));
    }

    #[test]
    fn test_inactive_assignments_do_not_require_evaluation() {
        let thesis = ThesisId::new();
        let t1 = TeacherId::new();
        let t2 = TeacherId::new();
        let mut removed = assignment(thesis, t2, AssignmentRole::Reviewer);
        removed.deactivate().unwrap();
        let assignments = vec![assignment(thesis, t1, AssignmentRole::Supervisor), removed];
        let evaluations = vec![evaluation(thesis, t1, AssignmentRole::Supervisor, 9.0)];

        // The reviewer role was removed from the committee, so the
        // supervisor evaluation alone completes the quorum.
        assert_eq!(final_grade(&assignments, &evaluations), Some(9.0));
    }

    #[test]
    fn test_shared_role_requires_single_evaluation() {
        // Two committee members share one role; one evaluation under the
        // role satisfies it, and both scores count if both evaluate.
        let thesis = ThesisId::new();
        let t1 = TeacherId::new();
        let t2 = TeacherId::new();
        let assignments = vec![
            assignment(thesis, t1, AssignmentRole::Member),
            assignment(thesis, t2, AssignmentRole::Member),
        ];

        let one = vec![evaluation(thesis, t1, AssignmentRole::Member, 6.0)];
        assert_eq!(final_grade(&assignments, &one), Some(6.0));

        let both = vec![
            evaluation(thesis, t1, AssignmentRole::Member, 6.0),
            evaluation(thesis, t2, AssignmentRole::Member, 8.0),
        ];
        assert_eq!(final_grade(&assignments, &both), Some(7.0));
    }

    #[test]
    fn test_required_roles_deduplicates() {
        let thesis = ThesisId::new();
        let assignments = vec![
            assignment(thesis, TeacherId::new(), AssignmentRole::Member),
            assignment(thesis, TeacherId::new(), AssignmentRole::Member),
            assignment(thesis, TeacherId::new(), AssignmentRole::Chair),
        ];
        let roles = required_roles(&assignments);
        assert_eq!(roles.len(), 2);
        assert!(roles.contains(&AssignmentRole::Member));
        assert!(roles.contains(&AssignmentRole::Chair));
    }
}
