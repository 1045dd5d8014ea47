//! Topic application workflow: apply, accept, reject, cancel.
//!
//! Accepting is the heavy operation: under one transaction it checks the
//! student's system-wide exclusivity, the topic's slot budget, and the
//! teacher's capacity ledger, then auto-rejects the student's other
//! pending applications and spawns the pre-thesis record.

use uuid::Uuid;

use aula_core::{EntityRef, StudentId, TeacherId, TopicId, WorkflowError};
use aula_state::{PreThesis, TopicApplication, SUPERSEDED_REASON};

use crate::capacity::{self, Track};
use crate::db;
use crate::error::map_db_err;
use crate::notify::{Notification, NotificationKind, Recipient};
use crate::SupervisionEngine;

use super::{require_active_semester, require_field};

impl SupervisionEngine {
    /// Submit a new application to an open topic.
    pub async fn apply_to_topic(
        &self,
        student: StudentId,
        topic_id: TopicId,
        message: Option<String>,
    ) -> Result<TopicApplication, WorkflowError> {
        let mut tx = self.pool().begin().await.map_err(map_db_err)?;

        let topic = db::topics::get_by_id(&mut tx, topic_id)
            .await
            .map_err(map_db_err)?
            .ok_or_else(|| WorkflowError::not_found("topic", topic_id))?;

        if !topic.is_open() {
            return Err(WorkflowError::Validation(format!(
                "topic {topic_id} is closed to applications"
            )));
        }
        require_active_semester(&mut tx, topic.semester_id).await?;

        if let Some(existing) = db::applications::find_blocking(&mut tx, topic_id, student)
            .await
            .map_err(map_db_err)?
        {
            return Err(WorkflowError::ExclusivityViolation(format!(
                "application {existing} to this topic is still pending or accepted"
            )));
        }

        let app = TopicApplication::new(topic_id, student, topic.semester_id, message);
        db::applications::insert(&mut tx, &app)
            .await
            .map_err(map_db_err)?;

        tx.commit().await.map_err(map_db_err)?;

        self.dispatch(vec![Notification {
            recipient: Recipient::Teacher(topic.teacher_id),
            kind: NotificationKind::ApplicationSubmitted,
            title: "New topic application".to_string(),
            body: format!("A student applied to \"{}\".", topic.title),
            entity: EntityRef::TopicApplication(app.id),
        }])
        .await;

        Ok(app)
    }

    /// Accept a pending application.
    ///
    /// In the same transaction: verifies the actor owns the topic, that the
    /// student holds no other accepted application, that the topic has a
    /// free slot, and that the teacher's pre-thesis capacity can be
    /// reserved; then auto-rejects the student's other pending applications
    /// and creates the pre-thesis.
    pub async fn accept_application(
        &self,
        actor: TeacherId,
        application_id: Uuid,
    ) -> Result<TopicApplication, WorkflowError> {
        let mut tx = self.pool().begin().await.map_err(map_db_err)?;

        let mut app = db::applications::get_by_id_for_update(&mut tx, application_id)
            .await
            .map_err(map_db_err)?
            .ok_or_else(|| WorkflowError::not_found("topic_application", application_id))?;

        let topic = db::topics::get_by_id_for_update(&mut tx, app.topic_id)
            .await
            .map_err(map_db_err)?
            .ok_or_else(|| WorkflowError::not_found("topic", app.topic_id))?;

        if topic.teacher_id != actor {
            return Err(WorkflowError::Unauthorized(format!(
                "{actor} does not own {}",
                topic.id
            )));
        }

        if let Some(other) =
            db::applications::find_accepted_by_student(&mut tx, app.student_id)
                .await
                .map_err(map_db_err)?
        {
            return Err(WorkflowError::ExclusivityViolation(format!(
                "student already holds accepted application {other}"
            )));
        }

        let accepted = db::applications::count_accepted_for_topic(&mut tx, topic.id)
            .await
            .map_err(map_db_err)?;
        if accepted >= i64::from(topic.max_slots) {
            return Err(WorkflowError::CapacityExhausted(format!(
                "{} has no remaining slots",
                topic.id
            )));
        }

        let reserved = capacity::reserve(
            &mut tx,
            topic.teacher_id,
            topic.semester_id,
            Track::PreThesis,
        )
        .await
        .map_err(map_db_err)?;
        if !reserved {
            return Err(WorkflowError::CapacityExhausted(format!(
                "{} has no remaining pre-thesis capacity in {}",
                topic.teacher_id, topic.semester_id
            )));
        }

        app.accept()?;
        db::applications::update_decision(&mut tx, &app)
            .await
            .map_err(map_db_err)?;

        let decided_at = app.decided_at.unwrap_or_else(chrono::Utc::now);
        let superseded = db::applications::reject_other_pending(
            &mut tx,
            app.student_id,
            app.id,
            SUPERSEDED_REASON,
            decided_at,
        )
        .await
        .map_err(map_db_err)?;

        let pre = PreThesis::new(
            app.id,
            topic.id,
            app.student_id,
            topic.teacher_id,
            topic.semester_id,
            topic.title.clone(),
        );
        db::pretheses::insert(&mut tx, &pre)
            .await
            .map_err(map_db_err)?;

        tx.commit().await.map_err(map_db_err)?;

        tracing::info!(
            application = %app.id,
            student = %app.student_id,
            topic = %topic.id,
            superseded = superseded.len(),
            "topic application accepted"
        );

        self.dispatch(vec![Notification {
            recipient: Recipient::Student(app.student_id),
            kind: NotificationKind::ApplicationDecision,
            title: "Application accepted".to_string(),
            body: format!("Your application to \"{}\" was accepted.", topic.title),
            entity: EntityRef::TopicApplication(app.id),
        }])
        .await;

        Ok(app)
    }

    /// Reject a pending application with a reason.
    pub async fn reject_application(
        &self,
        actor: TeacherId,
        application_id: Uuid,
        reason: String,
    ) -> Result<TopicApplication, WorkflowError> {
        require_field(&reason, "reason")?;
        let mut tx = self.pool().begin().await.map_err(map_db_err)?;

        let mut app = db::applications::get_by_id_for_update(&mut tx, application_id)
            .await
            .map_err(map_db_err)?
            .ok_or_else(|| WorkflowError::not_found("topic_application", application_id))?;

        let topic = db::topics::get_by_id(&mut tx, app.topic_id)
            .await
            .map_err(map_db_err)?
            .ok_or_else(|| WorkflowError::not_found("topic", app.topic_id))?;
        if topic.teacher_id != actor {
            return Err(WorkflowError::Unauthorized(format!(
                "{actor} does not own {}",
                topic.id
            )));
        }

        app.reject(reason)?;
        db::applications::update_decision(&mut tx, &app)
            .await
            .map_err(map_db_err)?;

        tx.commit().await.map_err(map_db_err)?;

        self.dispatch(vec![Notification {
            recipient: Recipient::Student(app.student_id),
            kind: NotificationKind::ApplicationDecision,
            title: "Application rejected".to_string(),
            body: format!("Your application to \"{}\" was rejected.", topic.title),
            entity: EntityRef::TopicApplication(app.id),
        }])
        .await;

        Ok(app)
    }

    /// Cancel an application as the owning student.
    ///
    /// Withdrawing an accepted application restores the teacher's
    /// pre-thesis capacity slot and cancels the linked pre-thesis if it is
    /// still in progress, all in the same transaction.
    pub async fn cancel_application(
        &self,
        student: StudentId,
        application_id: Uuid,
    ) -> Result<TopicApplication, WorkflowError> {
        let mut tx = self.pool().begin().await.map_err(map_db_err)?;

        let mut app = db::applications::get_by_id_for_update(&mut tx, application_id)
            .await
            .map_err(map_db_err)?
            .ok_or_else(|| WorkflowError::not_found("topic_application", application_id))?;

        if app.student_id != student {
            return Err(WorkflowError::Unauthorized(format!(
                "{student} does not own application {application_id}"
            )));
        }

        let was_accepted = app.is_accepted();
        app.cancel()?;
        db::applications::update_decision(&mut tx, &app)
            .await
            .map_err(map_db_err)?;

        let topic = db::topics::get_by_id(&mut tx, app.topic_id)
            .await
            .map_err(map_db_err)?
            .ok_or_else(|| WorkflowError::not_found("topic", app.topic_id))?;

        if was_accepted {
            if let Some(mut pre) =
                db::pretheses::find_by_application_for_update(&mut tx, app.id)
                    .await
                    .map_err(map_db_err)?
            {
                if !pre.status.is_terminal() {
                    pre.cancel("application withdrawn")?;
                    db::pretheses::update(&mut tx, &pre)
                        .await
                        .map_err(map_db_err)?;
                }
            }
            capacity::release(&mut tx, topic.teacher_id, topic.semester_id, Track::PreThesis)
                .await
                .map_err(map_db_err)?;
        }

        tx.commit().await.map_err(map_db_err)?;

        self.dispatch(vec![Notification {
            recipient: Recipient::Teacher(topic.teacher_id),
            kind: NotificationKind::ApplicationDecision,
            title: "Application withdrawn".to_string(),
            body: format!("An application to \"{}\" was withdrawn.", topic.title),
            entity: EntityRef::TopicApplication(app.id),
        }])
        .await;

        Ok(app)
    }
}
