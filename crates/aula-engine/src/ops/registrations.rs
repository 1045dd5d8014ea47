//! Thesis registration workflow: create, approve (with cascade), reject,
//! cancel.
//!
//! Approval is the mutual-exclusion point of the thesis track. Inside one
//! transaction it records the approval, cancels every sibling pending
//! registration for the same student and semester, and creates the thesis
//! record. Readers can never observe the cascade without the approval or
//! the approval without the thesis.

use uuid::Uuid;

use aula_core::{EntityRef, StudentId, UserId, WorkflowError};
use aula_state::{Thesis, ThesisRegistration, CASCADE_CANCEL_REASON};

use crate::db;
use crate::error::map_db_err;
use crate::notify::{Notification, NotificationKind, Recipient};
use crate::SupervisionEngine;

use super::{require_active_semester, require_field};

impl SupervisionEngine {
    /// Create a registration from the student's accepted proposal.
    pub async fn create_registration(
        &self,
        student: StudentId,
        proposal_id: Uuid,
    ) -> Result<ThesisRegistration, WorkflowError> {
        let mut tx = self.pool().begin().await.map_err(map_db_err)?;

        let proposal = db::proposals::get_by_id_for_update(&mut tx, proposal_id)
            .await
            .map_err(map_db_err)?
            .ok_or_else(|| WorkflowError::not_found("thesis_proposal", proposal_id))?;

        if proposal.student_id != student {
            return Err(WorkflowError::Unauthorized(format!(
                "{student} does not own proposal {proposal_id}"
            )));
        }
        if !proposal.is_accepted() {
            return Err(WorkflowError::Validation(format!(
                "proposal {proposal_id} is {}; only an accepted proposal can be registered",
                proposal.status
            )));
        }
        require_active_semester(&mut tx, proposal.semester_id).await?;

        if db::registrations::exists_blocking(&mut tx, student, proposal.semester_id)
            .await
            .map_err(map_db_err)?
        {
            return Err(WorkflowError::ExclusivityViolation(format!(
                "{student} already has a pending or approved registration in {}",
                proposal.semester_id
            )));
        }

        let reg = ThesisRegistration::new(
            proposal.id,
            proposal.student_id,
            proposal.teacher_id,
            proposal.semester_id,
        );
        db::registrations::insert(&mut tx, &reg)
            .await
            .map_err(map_db_err)?;

        tx.commit().await.map_err(map_db_err)?;

        self.dispatch(vec![Notification {
            recipient: Recipient::Teacher(reg.teacher_id),
            kind: NotificationKind::RegistrationSubmitted,
            title: "New thesis registration".to_string(),
            body: format!("A registration for \"{}\" awaits approval.", proposal.title),
            entity: EntityRef::ThesisRegistration(reg.id),
        }])
        .await;

        Ok(reg)
    }

    /// Approve a pending registration.
    ///
    /// Records the approver, cascade-cancels the student's other pending
    /// registrations for the semester, and creates the thesis, all in one
    /// transaction. Returns the approved registration and the new thesis.
    pub async fn approve_registration(
        &self,
        approver: UserId,
        registration_id: Uuid,
    ) -> Result<(ThesisRegistration, Thesis), WorkflowError> {
        let mut tx = self.pool().begin().await.map_err(map_db_err)?;

        let mut reg = db::registrations::get_by_id_for_update(&mut tx, registration_id)
            .await
            .map_err(map_db_err)?
            .ok_or_else(|| WorkflowError::not_found("thesis_registration", registration_id))?;

        if let Some(other) =
            db::registrations::find_approved(&mut tx, reg.student_id, reg.semester_id)
                .await
                .map_err(map_db_err)?
        {
            return Err(WorkflowError::ExclusivityViolation(format!(
                "student already holds approved registration {other} this semester"
            )));
        }

        reg.approve(approver)?;
        db::registrations::update_decision(&mut tx, &reg)
            .await
            .map_err(map_db_err)?;

        let decided_at = reg.decided_at.unwrap_or_else(chrono::Utc::now);
        let cancelled = db::registrations::cancel_other_pending(
            &mut tx,
            reg.student_id,
            reg.semester_id,
            reg.id,
            CASCADE_CANCEL_REASON,
            decided_at,
        )
        .await
        .map_err(map_db_err)?;

        let proposal = db::proposals::get_by_id(&mut tx, reg.proposal_id)
            .await
            .map_err(map_db_err)?
            .ok_or_else(|| WorkflowError::not_found("thesis_proposal", reg.proposal_id))?;

        let thesis = Thesis::new(
            reg.id,
            reg.student_id,
            reg.teacher_id,
            reg.semester_id,
            proposal.title.clone(),
        );
        db::theses::insert(&mut tx, &thesis)
            .await
            .map_err(map_db_err)?;

        tx.commit().await.map_err(map_db_err)?;

        tracing::info!(
            registration = %reg.id,
            thesis = %thesis.id,
            student = %reg.student_id,
            cascade_cancelled = cancelled.len(),
            "thesis registration approved"
        );

        self.dispatch(vec![Notification {
            recipient: Recipient::Student(reg.student_id),
            kind: NotificationKind::RegistrationDecision,
            title: "Registration approved".to_string(),
            body: format!("Your thesis \"{}\" is now in progress.", thesis.title),
            entity: EntityRef::ThesisRegistration(reg.id),
        }])
        .await;

        Ok((reg, thesis))
    }

    /// Reject a pending registration with a reason.
    pub async fn reject_registration(
        &self,
        approver: UserId,
        registration_id: Uuid,
        reason: String,
    ) -> Result<ThesisRegistration, WorkflowError> {
        require_field(&reason, "reason")?;
        let mut tx = self.pool().begin().await.map_err(map_db_err)?;

        let mut reg = db::registrations::get_by_id_for_update(&mut tx, registration_id)
            .await
            .map_err(map_db_err)?
            .ok_or_else(|| WorkflowError::not_found("thesis_registration", registration_id))?;

        reg.reject(approver, reason)?;
        db::registrations::update_decision(&mut tx, &reg)
            .await
            .map_err(map_db_err)?;

        tx.commit().await.map_err(map_db_err)?;

        self.dispatch(vec![Notification {
            recipient: Recipient::Student(reg.student_id),
            kind: NotificationKind::RegistrationDecision,
            title: "Registration rejected".to_string(),
            body: "Your thesis registration was rejected.".to_string(),
            entity: EntityRef::ThesisRegistration(reg.id),
        }])
        .await;

        Ok(reg)
    }

    /// Cancel a pending registration as the owning student.
    pub async fn cancel_registration(
        &self,
        student: StudentId,
        registration_id: Uuid,
    ) -> Result<ThesisRegistration, WorkflowError> {
        let mut tx = self.pool().begin().await.map_err(map_db_err)?;

        let mut reg = db::registrations::get_by_id_for_update(&mut tx, registration_id)
            .await
            .map_err(map_db_err)?
            .ok_or_else(|| WorkflowError::not_found("thesis_registration", registration_id))?;

        if reg.student_id != student {
            return Err(WorkflowError::Unauthorized(format!(
                "{student} does not own registration {registration_id}"
            )));
        }

        reg.cancel("withdrawn by student")?;
        db::registrations::update_decision(&mut tx, &reg)
            .await
            .map_err(map_db_err)?;

        tx.commit().await.map_err(map_db_err)?;

        self.dispatch(vec![Notification {
            recipient: Recipient::Teacher(reg.teacher_id),
            kind: NotificationKind::RegistrationDecision,
            title: "Registration withdrawn".to_string(),
            body: "A pending thesis registration was withdrawn.".to_string(),
            entity: EntityRef::ThesisRegistration(reg.id),
        }])
        .await;

        Ok(reg)
    }
}
