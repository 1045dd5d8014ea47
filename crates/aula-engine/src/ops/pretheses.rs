//! Pre-thesis workflow: grading and cancellation.

use uuid::Uuid;

use aula_core::{EntityRef, TeacherId, WorkflowError};
use aula_state::PreThesis;

use crate::capacity::{self, Track};
use crate::db;
use crate::error::map_db_err;
use crate::notify::{Notification, NotificationKind, Recipient};
use crate::SupervisionEngine;

use super::require_field;

impl SupervisionEngine {
    /// Grade a pre-thesis as its supervising teacher.
    ///
    /// A score at or above the passing threshold completes the record; a
    /// lower score is stored and the record stays in progress for
    /// resubmission.
    pub async fn grade_pre_thesis(
        &self,
        actor: TeacherId,
        pre_thesis_id: Uuid,
        score: f64,
    ) -> Result<PreThesis, WorkflowError> {
        self.scale().validate(score)?;

        let mut tx = self.pool().begin().await.map_err(map_db_err)?;

        let mut pre = db::pretheses::get_by_id_for_update(&mut tx, pre_thesis_id)
            .await
            .map_err(map_db_err)?
            .ok_or_else(|| WorkflowError::not_found("pre_thesis", pre_thesis_id))?;

        if pre.teacher_id != actor {
            return Err(WorkflowError::Unauthorized(format!(
                "{actor} does not supervise pre-thesis {pre_thesis_id}"
            )));
        }

        let completed = pre.grade(score, &self.scale())?;
        db::pretheses::update(&mut tx, &pre)
            .await
            .map_err(map_db_err)?;

        tx.commit().await.map_err(map_db_err)?;

        let body = if completed {
            format!("Your pre-thesis passed with {score}.")
        } else {
            format!("Your pre-thesis was graded {score}; a resubmission is required.")
        };
        self.dispatch(vec![Notification {
            recipient: Recipient::Student(pre.student_id),
            kind: NotificationKind::PreThesisGraded,
            title: "Pre-thesis graded".to_string(),
            body,
            entity: EntityRef::PreThesis(pre.id),
        }])
        .await;

        Ok(pre)
    }

    /// Cancel a pre-thesis as its supervising teacher.
    ///
    /// Ends the engagement: the linked accepted application is cancelled
    /// and the teacher's pre-thesis capacity slot is restored in the same
    /// transaction.
    pub async fn cancel_pre_thesis(
        &self,
        actor: TeacherId,
        pre_thesis_id: Uuid,
        reason: String,
    ) -> Result<PreThesis, WorkflowError> {
        require_field(&reason, "reason")?;
        let mut tx = self.pool().begin().await.map_err(map_db_err)?;

        let mut pre = db::pretheses::get_by_id_for_update(&mut tx, pre_thesis_id)
            .await
            .map_err(map_db_err)?
            .ok_or_else(|| WorkflowError::not_found("pre_thesis", pre_thesis_id))?;

        if pre.teacher_id != actor {
            return Err(WorkflowError::Unauthorized(format!(
                "{actor} does not supervise pre-thesis {pre_thesis_id}"
            )));
        }

        pre.cancel(reason)?;
        db::pretheses::update(&mut tx, &pre)
            .await
            .map_err(map_db_err)?;

        if let Some(mut app) =
            db::applications::get_by_id_for_update(&mut tx, pre.application_id)
                .await
                .map_err(map_db_err)?
        {
            if app.is_accepted() {
                app.cancel()?;
                db::applications::update_decision(&mut tx, &app)
                    .await
                    .map_err(map_db_err)?;
            }
        }
        capacity::release(&mut tx, pre.teacher_id, pre.semester_id, Track::PreThesis)
            .await
            .map_err(map_db_err)?;

        tx.commit().await.map_err(map_db_err)?;

        self.dispatch(vec![Notification {
            recipient: Recipient::Student(pre.student_id),
            kind: NotificationKind::PreThesisGraded,
            title: "Pre-thesis cancelled".to_string(),
            body: format!("Your pre-thesis \"{}\" was cancelled.", pre.title),
            entity: EntityRef::PreThesis(pre.id),
        }])
        .await;

        Ok(pre)
    }
}
