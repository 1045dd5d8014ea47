//! Committee assignment workflow: assign, remove.
//!
//! Assignment is idempotent on (thesis, teacher, role): a repeat
//! assignment refreshes the bookkeeping fields, and a previously removed
//! assignment is reactivated rather than duplicated.

use aula_core::{EntityRef, TeacherId, ThesisId, UserId, WorkflowError};
use aula_state::{AssignmentRole, ThesisAssignment};

use crate::capacity;
use crate::db;
use crate::error::map_db_err;
use crate::notify::{Notification, NotificationKind, Recipient};
use crate::SupervisionEngine;

impl SupervisionEngine {
    /// Assign a teacher to a committee role on a thesis.
    ///
    /// Requires the thesis to accept assignments (in progress or later,
    /// not terminal) and the teacher's ledger row to be open for the
    /// thesis's semester.
    pub async fn assign_teacher(
        &self,
        assigner: UserId,
        thesis_id: ThesisId,
        teacher: TeacherId,
        role: AssignmentRole,
    ) -> Result<ThesisAssignment, WorkflowError> {
        let mut tx = self.pool().begin().await.map_err(map_db_err)?;

        let thesis = db::theses::get_by_id_for_update(&mut tx, thesis_id)
            .await
            .map_err(map_db_err)?
            .ok_or_else(|| WorkflowError::not_found("thesis", thesis_id))?;
        thesis.ensure_accepts_assignments()?;

        if !capacity::is_open(&mut tx, teacher, thesis.semester_id)
            .await
            .map_err(map_db_err)?
        {
            return Err(WorkflowError::CapacityExhausted(format!(
                "{teacher} is not open for assignments in {}",
                thesis.semester_id
            )));
        }

        let assignment = match db::assignments::find_for_update(&mut tx, thesis_id, teacher, role)
            .await
            .map_err(map_db_err)?
        {
            Some(mut existing) => {
                if existing.active {
                    existing.touch(assigner);
                } else {
                    existing.reactivate(assigner)?;
                }
                db::assignments::update(&mut tx, &existing)
                    .await
                    .map_err(map_db_err)?;
                existing
            }
            None => {
                let fresh = ThesisAssignment::new(thesis_id, teacher, role, assigner);
                db::assignments::insert(&mut tx, &fresh)
                    .await
                    .map_err(map_db_err)?;
                fresh
            }
        };

        tx.commit().await.map_err(map_db_err)?;

        self.dispatch(vec![Notification {
            recipient: Recipient::Teacher(teacher),
            kind: NotificationKind::AssignmentChanged,
            title: "Committee assignment".to_string(),
            body: format!("You were assigned as {role} on \"{}\".", thesis.title),
            entity: EntityRef::Thesis(thesis.id),
        }])
        .await;

        Ok(assignment)
    }

    /// Remove a committee assignment (soft delete).
    pub async fn remove_assignment(
        &self,
        thesis_id: ThesisId,
        teacher: TeacherId,
        role: AssignmentRole,
    ) -> Result<ThesisAssignment, WorkflowError> {
        let mut tx = self.pool().begin().await.map_err(map_db_err)?;

        let mut assignment = db::assignments::find_for_update(&mut tx, thesis_id, teacher, role)
            .await
            .map_err(map_db_err)?
            .filter(|a| a.active)
            .ok_or_else(|| {
                WorkflowError::not_found("thesis_assignment", format!("{thesis_id}/{teacher}/{role}"))
            })?;

        assignment.deactivate()?;
        db::assignments::update(&mut tx, &assignment)
            .await
            .map_err(map_db_err)?;

        tx.commit().await.map_err(map_db_err)?;

        self.dispatch(vec![Notification {
            recipient: Recipient::Teacher(teacher),
            kind: NotificationKind::AssignmentChanged,
            title: "Committee assignment removed".to_string(),
            body: format!("Your {role} assignment on thesis {thesis_id} was removed."),
            entity: EntityRef::Thesis(thesis_id),
        }])
        .await;

        Ok(assignment)
    }
}
