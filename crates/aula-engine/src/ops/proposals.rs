//! Thesis proposal workflow: submit, accept, reject, cancel.
//!
//! Acceptance reserves one slot on the teacher's thesis track; withdrawal
//! of an accepted proposal restores it, unless a registration has already
//! been derived from the proposal.

use uuid::Uuid;

use aula_core::{EntityRef, SemesterId, StudentId, TeacherId, WorkflowError};
use aula_state::ThesisProposal;

use crate::capacity::{self, Track};
use crate::db;
use crate::error::map_db_err;
use crate::notify::{Notification, NotificationKind, Recipient};
use crate::SupervisionEngine;

use super::{require_active_semester, require_field};

impl SupervisionEngine {
    /// Submit a thesis supervision proposal to a teacher.
    pub async fn submit_proposal(
        &self,
        student: StudentId,
        teacher: TeacherId,
        semester: SemesterId,
        title: String,
        description: String,
        keywords: Option<String>,
    ) -> Result<ThesisProposal, WorkflowError> {
        require_field(&title, "title")?;
        require_field(&description, "description")?;

        let mut tx = self.pool().begin().await.map_err(map_db_err)?;

        require_active_semester(&mut tx, semester).await?;

        if db::proposals::exists_active(&mut tx, student, semester)
            .await
            .map_err(map_db_err)?
        {
            return Err(WorkflowError::ExclusivityViolation(format!(
                "{student} already has an active proposal in {semester}"
            )));
        }

        let proposal =
            ThesisProposal::new(student, teacher, semester, title, description, keywords);
        db::proposals::insert(&mut tx, &proposal)
            .await
            .map_err(map_db_err)?;

        tx.commit().await.map_err(map_db_err)?;

        self.dispatch(vec![Notification {
            recipient: Recipient::Teacher(teacher),
            kind: NotificationKind::ProposalSubmitted,
            title: "New thesis proposal".to_string(),
            body: format!("A student proposed \"{}\".", proposal.title),
            entity: EntityRef::ThesisProposal(proposal.id),
        }])
        .await;

        Ok(proposal)
    }

    /// Accept a submitted proposal as the target teacher.
    ///
    /// Fails with `EXCLUSIVITY_VIOLATION` if the student already holds an
    /// accepted proposal for the semester, and with `CAPACITY_EXHAUSTED`
    /// if the teacher's thesis track has no remaining slot.
    pub async fn accept_proposal(
        &self,
        actor: TeacherId,
        proposal_id: Uuid,
    ) -> Result<ThesisProposal, WorkflowError> {
        let mut tx = self.pool().begin().await.map_err(map_db_err)?;

        let mut proposal = db::proposals::get_by_id_for_update(&mut tx, proposal_id)
            .await
            .map_err(map_db_err)?
            .ok_or_else(|| WorkflowError::not_found("thesis_proposal", proposal_id))?;

        if proposal.teacher_id != actor {
            return Err(WorkflowError::Unauthorized(format!(
                "{actor} is not the target of proposal {proposal_id}"
            )));
        }

        if let Some(other) =
            db::proposals::find_accepted(&mut tx, proposal.student_id, proposal.semester_id)
                .await
                .map_err(map_db_err)?
        {
            return Err(WorkflowError::ExclusivityViolation(format!(
                "student already holds accepted proposal {other} this semester"
            )));
        }

        let reserved = capacity::reserve(&mut tx, actor, proposal.semester_id, Track::Thesis)
            .await
            .map_err(map_db_err)?;
        if !reserved {
            return Err(WorkflowError::CapacityExhausted(format!(
                "{actor} has no remaining thesis capacity in {}",
                proposal.semester_id
            )));
        }

        proposal.accept()?;
        db::proposals::update_decision(&mut tx, &proposal)
            .await
            .map_err(map_db_err)?;

        tx.commit().await.map_err(map_db_err)?;

        tracing::info!(
            proposal = %proposal.id,
            student = %proposal.student_id,
            teacher = %actor,
            "thesis proposal accepted"
        );

        self.dispatch(vec![Notification {
            recipient: Recipient::Student(proposal.student_id),
            kind: NotificationKind::ProposalDecision,
            title: "Proposal accepted".to_string(),
            body: format!("Your proposal \"{}\" was accepted.", proposal.title),
            entity: EntityRef::ThesisProposal(proposal.id),
        }])
        .await;

        Ok(proposal)
    }

    /// Reject a submitted proposal with a reason.
    pub async fn reject_proposal(
        &self,
        actor: TeacherId,
        proposal_id: Uuid,
        reason: String,
    ) -> Result<ThesisProposal, WorkflowError> {
        require_field(&reason, "reason")?;
        let mut tx = self.pool().begin().await.map_err(map_db_err)?;

        let mut proposal = db::proposals::get_by_id_for_update(&mut tx, proposal_id)
            .await
            .map_err(map_db_err)?
            .ok_or_else(|| WorkflowError::not_found("thesis_proposal", proposal_id))?;

        if proposal.teacher_id != actor {
            return Err(WorkflowError::Unauthorized(format!(
                "{actor} is not the target of proposal {proposal_id}"
            )));
        }

        proposal.reject(reason)?;
        db::proposals::update_decision(&mut tx, &proposal)
            .await
            .map_err(map_db_err)?;

        tx.commit().await.map_err(map_db_err)?;

        self.dispatch(vec![Notification {
            recipient: Recipient::Student(proposal.student_id),
            kind: NotificationKind::ProposalDecision,
            title: "Proposal rejected".to_string(),
            body: format!("Your proposal \"{}\" was rejected.", proposal.title),
            entity: EntityRef::ThesisProposal(proposal.id),
        }])
        .await;

        Ok(proposal)
    }

    /// Cancel a proposal as the owning student.
    ///
    /// An accepted proposal can be withdrawn only while no live
    /// registration has been derived from it; withdrawal restores the
    /// teacher's thesis capacity slot.
    pub async fn cancel_proposal(
        &self,
        student: StudentId,
        proposal_id: Uuid,
    ) -> Result<ThesisProposal, WorkflowError> {
        let mut tx = self.pool().begin().await.map_err(map_db_err)?;

        let mut proposal = db::proposals::get_by_id_for_update(&mut tx, proposal_id)
            .await
            .map_err(map_db_err)?
            .ok_or_else(|| WorkflowError::not_found("thesis_proposal", proposal_id))?;

        if proposal.student_id != student {
            return Err(WorkflowError::Unauthorized(format!(
                "{student} does not own proposal {proposal_id}"
            )));
        }

        if db::registrations::exists_for_proposal(&mut tx, proposal.id)
            .await
            .map_err(map_db_err)?
        {
            return Err(WorkflowError::Conflict(format!(
                "a registration derived from proposal {proposal_id} is still live; cancel it first"
            )));
        }

        let was_accepted = proposal.is_accepted();
        proposal.cancel()?;
        db::proposals::update_decision(&mut tx, &proposal)
            .await
            .map_err(map_db_err)?;

        if was_accepted {
            capacity::release(&mut tx, proposal.teacher_id, proposal.semester_id, Track::Thesis)
                .await
                .map_err(map_db_err)?;
        }

        tx.commit().await.map_err(map_db_err)?;

        self.dispatch(vec![Notification {
            recipient: Recipient::Teacher(proposal.teacher_id),
            kind: NotificationKind::ProposalDecision,
            title: "Proposal withdrawn".to_string(),
            body: format!("The proposal \"{}\" was withdrawn.", proposal.title),
            entity: EntityRef::ThesisProposal(proposal.id),
        }])
        .await;

        Ok(proposal)
    }
}
