//! Defense session workflow: schedule, reschedule, complete.
//!
//! One session per thesis, ever: a second scheduling attempt fails with a
//! conflict regardless of the first session's status. Scheduling and
//! completion move the thesis status in the same transaction as the
//! session write.

use chrono::{DateTime, Utc};

use aula_core::{EntityRef, ThesisId, UserId, WorkflowError};
use aula_state::DefenseSession;

use crate::db;
use crate::error::map_db_err;
use crate::notify::{Notification, NotificationKind, Recipient};
use crate::SupervisionEngine;

use super::ensure_future;

impl SupervisionEngine {
    /// Schedule the defense of an in-progress thesis.
    pub async fn schedule_defense(
        &self,
        scheduler: UserId,
        thesis_id: ThesisId,
        scheduled_at: DateTime<Utc>,
        room: Option<String>,
        notes: Option<String>,
    ) -> Result<DefenseSession, WorkflowError> {
        ensure_future(scheduled_at, Utc::now())?;

        let mut tx = self.pool().begin().await.map_err(map_db_err)?;

        let mut thesis = db::theses::get_by_id_for_update(&mut tx, thesis_id)
            .await
            .map_err(map_db_err)?
            .ok_or_else(|| WorkflowError::not_found("thesis", thesis_id))?;

        if db::defense::find_by_thesis(&mut tx, thesis_id)
            .await
            .map_err(map_db_err)?
            .is_some()
        {
            return Err(WorkflowError::Conflict(format!(
                "a defense session already exists for {thesis_id}"
            )));
        }

        thesis.schedule_defense()?;
        db::theses::update_status(&mut tx, &thesis)
            .await
            .map_err(map_db_err)?;

        let session = DefenseSession::new(thesis_id, scheduled_at, room, notes);
        db::defense::insert(&mut tx, &session)
            .await
            .map_err(map_db_err)?;

        tx.commit().await.map_err(map_db_err)?;

        tracing::info!(
            thesis = %thesis_id,
            session = %session.id,
            scheduled_at = %scheduled_at,
            scheduler = %scheduler,
            "defense session scheduled"
        );

        self.dispatch(vec![Notification {
            recipient: Recipient::Student(thesis.student_id),
            kind: NotificationKind::DefenseScheduled,
            title: "Defense scheduled".to_string(),
            body: format!("Your defense is scheduled for {scheduled_at}."),
            entity: EntityRef::DefenseSession(session.id),
        }])
        .await;

        Ok(session)
    }

    /// Move a scheduled defense to a new time.
    pub async fn reschedule_defense(
        &self,
        thesis_id: ThesisId,
        scheduled_at: DateTime<Utc>,
        room: Option<String>,
        notes: Option<String>,
    ) -> Result<DefenseSession, WorkflowError> {
        ensure_future(scheduled_at, Utc::now())?;

        let mut tx = self.pool().begin().await.map_err(map_db_err)?;

        let mut session = db::defense::find_by_thesis_for_update(&mut tx, thesis_id)
            .await
            .map_err(map_db_err)?
            .ok_or_else(|| WorkflowError::not_found("defense_session", thesis_id))?;

        session.reschedule(scheduled_at, room, notes)?;
        db::defense::update(&mut tx, &session)
            .await
            .map_err(map_db_err)?;

        let thesis = db::theses::get_by_id(&mut tx, thesis_id)
            .await
            .map_err(map_db_err)?
            .ok_or_else(|| WorkflowError::not_found("thesis", thesis_id))?;

        tx.commit().await.map_err(map_db_err)?;

        self.dispatch(vec![Notification {
            recipient: Recipient::Student(thesis.student_id),
            kind: NotificationKind::DefenseScheduled,
            title: "Defense rescheduled".to_string(),
            body: format!("Your defense was moved to {scheduled_at}."),
            entity: EntityRef::DefenseSession(session.id),
        }])
        .await;

        Ok(session)
    }

    /// Mark a defense as held, unlocking evaluation.
    pub async fn complete_defense(
        &self,
        thesis_id: ThesisId,
    ) -> Result<DefenseSession, WorkflowError> {
        let mut tx = self.pool().begin().await.map_err(map_db_err)?;

        let mut session = db::defense::find_by_thesis_for_update(&mut tx, thesis_id)
            .await
            .map_err(map_db_err)?
            .ok_or_else(|| WorkflowError::not_found("defense_session", thesis_id))?;

        let mut thesis = db::theses::get_by_id_for_update(&mut tx, thesis_id)
            .await
            .map_err(map_db_err)?
            .ok_or_else(|| WorkflowError::not_found("thesis", thesis_id))?;

        session.complete()?;
        thesis.complete_defense()?;
        db::defense::update(&mut tx, &session)
            .await
            .map_err(map_db_err)?;
        db::theses::update_status(&mut tx, &thesis)
            .await
            .map_err(map_db_err)?;

        tx.commit().await.map_err(map_db_err)?;

        self.dispatch(vec![Notification {
            recipient: Recipient::Student(thesis.student_id),
            kind: NotificationKind::DefenseCompleted,
            title: "Defense completed".to_string(),
            body: "Your defense was held; evaluations are now being collected.".to_string(),
            entity: EntityRef::DefenseSession(session.id),
        }])
        .await;

        Ok(session)
    }
}
