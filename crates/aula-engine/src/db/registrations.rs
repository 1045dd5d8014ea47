//! Thesis registration persistence operations.
//!
//! Registrations are the second contended resource: the approval cascade
//! runs as a single guarded UPDATE returning the cancelled ids, inside
//! the approving transaction.

use chrono::{DateTime, Utc};
use sqlx::PgConnection;
use uuid::Uuid;

use aula_core::{SemesterId, StudentId, TeacherId, UserId};
use aula_state::{RegistrationStatus, ThesisRegistration};

use super::parse_status;

const COLUMNS: &str = "id, proposal_id, student_id, teacher_id, semester_id, status, \
                       approved_by, decision_reason, created_at, decided_at";

/// Insert a new registration.
pub async fn insert(
    conn: &mut PgConnection,
    reg: &ThesisRegistration,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO thesis_registrations
         (id, proposal_id, student_id, teacher_id, semester_id, status,
          approved_by, decision_reason, created_at, decided_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
    )
    .bind(reg.id)
    .bind(reg.proposal_id)
    .bind(reg.student_id.0)
    .bind(reg.teacher_id.0)
    .bind(reg.semester_id.0)
    .bind(reg.status.to_string())
    .bind(reg.approved_by.map(|u| u.0))
    .bind(&reg.decision_reason)
    .bind(reg.created_at)
    .bind(reg.decided_at)
    .execute(conn)
    .await?;

    Ok(())
}

/// Fetch a registration by ID.
pub async fn get_by_id(
    conn: &mut PgConnection,
    id: Uuid,
) -> Result<Option<ThesisRegistration>, sqlx::Error> {
    let row = sqlx::query_as::<_, RegistrationRow>(&format!(
        "SELECT {COLUMNS} FROM thesis_registrations WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(conn)
    .await?;

    row.map(RegistrationRow::into_record).transpose()
}

/// Fetch a registration by ID, locking the row for the transaction.
pub async fn get_by_id_for_update(
    conn: &mut PgConnection,
    id: Uuid,
) -> Result<Option<ThesisRegistration>, sqlx::Error> {
    let row = sqlx::query_as::<_, RegistrationRow>(&format!(
        "SELECT {COLUMNS} FROM thesis_registrations WHERE id = $1 FOR UPDATE"
    ))
    .bind(id)
    .fetch_optional(conn)
    .await?;

    row.map(RegistrationRow::into_record).transpose()
}

/// Persist a decision (status, approver, decided_at, decision_reason).
pub async fn update_decision(
    conn: &mut PgConnection,
    reg: &ThesisRegistration,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE thesis_registrations
         SET status = $1, approved_by = $2, decision_reason = $3, decided_at = $4
         WHERE id = $5",
    )
    .bind(reg.status.to_string())
    .bind(reg.approved_by.map(|u| u.0))
    .bind(&reg.decision_reason)
    .bind(reg.decided_at)
    .bind(reg.id)
    .execute(conn)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Whether the student already holds a pending or approved registration
/// for the semester.
pub async fn exists_blocking(
    conn: &mut PgConnection,
    student: StudentId,
    semester: SemesterId,
) -> Result<bool, sqlx::Error> {
    let id: Option<Uuid> = sqlx::query_scalar(
        "SELECT id FROM thesis_registrations
         WHERE student_id = $1 AND semester_id = $2
           AND status IN ('pending_approval', 'approved')
         LIMIT 1",
    )
    .bind(student.0)
    .bind(semester.0)
    .fetch_optional(conn)
    .await?;

    Ok(id.is_some())
}

/// The student's approved registration for the semester, locked.
pub async fn find_approved(
    conn: &mut PgConnection,
    student: StudentId,
    semester: SemesterId,
) -> Result<Option<Uuid>, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT id FROM thesis_registrations
         WHERE student_id = $1 AND semester_id = $2 AND status = 'approved' FOR UPDATE",
    )
    .bind(student.0)
    .bind(semester.0)
    .fetch_optional(conn)
    .await
}

/// Whether a live registration was derived from the given proposal.
pub async fn exists_for_proposal(
    conn: &mut PgConnection,
    proposal_id: Uuid,
) -> Result<bool, sqlx::Error> {
    let id: Option<Uuid> = sqlx::query_scalar(
        "SELECT id FROM thesis_registrations
         WHERE proposal_id = $1 AND status IN ('pending_approval', 'approved')
         LIMIT 1",
    )
    .bind(proposal_id)
    .fetch_optional(conn)
    .await?;

    Ok(id.is_some())
}

/// Cascade-cancel the student's other pending registrations for the
/// semester, returning the cancelled ids.
pub async fn cancel_other_pending(
    conn: &mut PgConnection,
    student: StudentId,
    semester: SemesterId,
    except: Uuid,
    reason: &str,
    decided_at: DateTime<Utc>,
) -> Result<Vec<Uuid>, sqlx::Error> {
    let ids = sqlx::query_scalar(
        "UPDATE thesis_registrations
         SET status = 'cancelled', decision_reason = $1, decided_at = $2
         WHERE student_id = $3 AND semester_id = $4
           AND status = 'pending_approval' AND id <> $5
         RETURNING id",
    )
    .bind(reason)
    .bind(decided_at)
    .bind(student.0)
    .bind(semester.0)
    .bind(except)
    .fetch_all(conn)
    .await?;

    Ok(ids)
}

/// List pending registrations for a semester, oldest first (approval
/// queue order).
pub async fn list_pending(
    conn: &mut PgConnection,
    semester: SemesterId,
    limit: i64,
    offset: i64,
) -> Result<Vec<ThesisRegistration>, sqlx::Error> {
    let rows = sqlx::query_as::<_, RegistrationRow>(&format!(
        "SELECT {COLUMNS} FROM thesis_registrations
         WHERE semester_id = $1 AND status = 'pending_approval'
         ORDER BY created_at LIMIT $2 OFFSET $3"
    ))
    .bind(semester.0)
    .bind(limit)
    .bind(offset)
    .fetch_all(conn)
    .await?;

    rows.into_iter().map(RegistrationRow::into_record).collect()
}

/// Internal row type for SQLx mapping.
#[derive(sqlx::FromRow)]
struct RegistrationRow {
    id: Uuid,
    proposal_id: Uuid,
    student_id: Uuid,
    teacher_id: Uuid,
    semester_id: Uuid,
    status: String,
    approved_by: Option<Uuid>,
    decision_reason: Option<String>,
    created_at: DateTime<Utc>,
    decided_at: Option<DateTime<Utc>>,
}

impl RegistrationRow {
    fn into_record(self) -> Result<ThesisRegistration, sqlx::Error> {
        let status: RegistrationStatus = parse_status("thesis_registration", &self.status)?;
        Ok(ThesisRegistration {
            id: self.id,
            proposal_id: self.proposal_id,
            student_id: StudentId(self.student_id),
            teacher_id: TeacherId(self.teacher_id),
            semester_id: SemesterId(self.semester_id),
            status,
            approved_by: self.approved_by.map(UserId),
            decision_reason: self.decision_reason,
            created_at: self.created_at,
            decided_at: self.decided_at,
        })
    }
}
