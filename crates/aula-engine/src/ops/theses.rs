//! Thesis lifecycle operations outside defense and evaluation:
//! cancellation.

use aula_core::{EntityRef, ThesisId, WorkflowError};
use aula_state::Thesis;

use crate::capacity::{self, Track};
use crate::db;
use crate::error::map_db_err;
use crate::notify::{Notification, NotificationKind, Recipient};
use crate::SupervisionEngine;

use super::require_field;

impl SupervisionEngine {
    /// Cancel a thesis from any non-terminal state.
    ///
    /// The scheduled defense session (if any) is cancelled alongside, and
    /// the supervisor's thesis capacity slot is restored. A completed
    /// thesis cannot be cancelled.
    pub async fn cancel_thesis(
        &self,
        thesis_id: ThesisId,
        reason: String,
    ) -> Result<Thesis, WorkflowError> {
        require_field(&reason, "reason")?;
        let mut tx = self.pool().begin().await.map_err(map_db_err)?;

        let mut thesis = db::theses::get_by_id_for_update(&mut tx, thesis_id)
            .await
            .map_err(map_db_err)?
            .ok_or_else(|| WorkflowError::not_found("thesis", thesis_id))?;

        thesis.cancel(reason)?;
        db::theses::update_status(&mut tx, &thesis)
            .await
            .map_err(map_db_err)?;

        if let Some(mut session) =
            db::defense::find_by_thesis_for_update(&mut tx, thesis.id)
                .await
                .map_err(map_db_err)?
        {
            if !session.status.is_terminal() {
                session.cancel()?;
                db::defense::update(&mut tx, &session)
                    .await
                    .map_err(map_db_err)?;
            }
        }

        capacity::release(&mut tx, thesis.supervisor_id, thesis.semester_id, Track::Thesis)
            .await
            .map_err(map_db_err)?;

        tx.commit().await.map_err(map_db_err)?;

        self.dispatch(vec![Notification {
            recipient: Recipient::Student(thesis.student_id),
            kind: NotificationKind::ThesisCancelled,
            title: "Thesis cancelled".to_string(),
            body: format!("Your thesis \"{}\" was cancelled.", thesis.title),
            entity: EntityRef::Thesis(thesis.id),
        }])
        .await;

        Ok(thesis)
    }
}
