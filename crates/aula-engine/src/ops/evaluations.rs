//! Evaluation workflow: submission and transactional grade finalization.
//!
//! After every submission the engine recomputes completeness against the
//! thesis's active committee inside the same transaction as the
//! evaluation write, so a thesis can never be flagged complete while a
//! concurrent evaluation is in flight.

use chrono::Utc;

use aula_core::{EntityRef, TeacherId, ThesisId, WorkflowError};
use aula_state::{final_grade, AssignmentRole, ThesisEvaluation, ThesisFinalGrade};

use crate::db;
use crate::error::map_db_err;
use crate::notify::{Notification, NotificationKind, Recipient};
use crate::SupervisionEngine;

impl SupervisionEngine {
    /// Submit (or resubmit) an evaluation for a defense-completed thesis.
    ///
    /// The evaluator must hold an active assignment with the given role on
    /// the thesis. When the submission completes the quorum, the final
    /// grade is recorded and the thesis transitions to completed in the
    /// same transaction; the computed grade is returned alongside the
    /// evaluation.
    pub async fn submit_evaluation(
        &self,
        evaluator: TeacherId,
        thesis_id: ThesisId,
        role: AssignmentRole,
        score: f64,
        comments: Option<String>,
    ) -> Result<(ThesisEvaluation, Option<ThesisFinalGrade>), WorkflowError> {
        self.scale().validate(score)?;

        let mut tx = self.pool().begin().await.map_err(map_db_err)?;

        let mut thesis = db::theses::get_by_id_for_update(&mut tx, thesis_id)
            .await
            .map_err(map_db_err)?
            .ok_or_else(|| WorkflowError::not_found("thesis", thesis_id))?;
        thesis.ensure_accepts_evaluations()?;

        let holds_role = db::assignments::find_for_update(&mut tx, thesis_id, evaluator, role)
            .await
            .map_err(map_db_err)?
            .map(|a| a.active)
            .unwrap_or(false);
        if !holds_role {
            return Err(WorkflowError::Unauthorized(format!(
                "{evaluator} holds no active {role} assignment on {thesis_id}"
            )));
        }

        let evaluation = ThesisEvaluation::new(thesis_id, evaluator, role, score, comments);
        db::evaluations::upsert(&mut tx, &evaluation)
            .await
            .map_err(map_db_err)?;

        // Completeness check against the committee as it stands now.
        let assignments = db::assignments::list_active(&mut tx, thesis_id)
            .await
            .map_err(map_db_err)?;
        let evaluations = db::evaluations::list_by_thesis(&mut tx, thesis_id)
            .await
            .map_err(map_db_err)?;

        let grade = match final_grade(&assignments, &evaluations) {
            Some(score) => {
                let grade = ThesisFinalGrade {
                    thesis_id,
                    final_score: score,
                    computed_at: Utc::now(),
                };
                db::evaluations::upsert_final_grade(&mut tx, &grade)
                    .await
                    .map_err(map_db_err)?;

                thesis.complete()?;
                db::theses::update_status(&mut tx, &thesis)
                    .await
                    .map_err(map_db_err)?;
                Some(grade)
            }
            None => None,
        };

        tx.commit().await.map_err(map_db_err)?;

        if let Some(grade) = &grade {
            tracing::info!(
                thesis = %thesis_id,
                final_score = grade.final_score,
                evaluations = evaluations.len(),
                "thesis grading completed"
            );
            self.dispatch(vec![Notification {
                recipient: Recipient::Student(thesis.student_id),
                kind: NotificationKind::ThesisCompleted,
                title: "Thesis completed".to_string(),
                body: format!(
                    "All evaluations are in; your final grade is {}.",
                    grade.final_score
                ),
                entity: EntityRef::Thesis(thesis_id),
            }])
            .await;
        }

        Ok((evaluation, grade))
    }
}
