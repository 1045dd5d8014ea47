//! Committee assignment persistence operations.
//!
//! One row per (thesis, teacher, role), kept across soft deletion so a
//! reassignment restores the prior row instead of duplicating it.

use chrono::{DateTime, Utc};
use sqlx::PgConnection;
use uuid::Uuid;

use aula_core::{TeacherId, ThesisId, UserId};
use aula_state::{AssignmentRole, ThesisAssignment};

use super::parse_status;

const COLUMNS: &str = "id, thesis_id, teacher_id, role, assigned_by, assigned_at, active";

/// Insert a new assignment.
pub async fn insert(conn: &mut PgConnection, a: &ThesisAssignment) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO thesis_assignments
         (id, thesis_id, teacher_id, role, assigned_by, assigned_at, active)
         VALUES ($1, $2, $3, $4, $5, $6, $7)",
    )
    .bind(a.id)
    .bind(a.thesis_id.0)
    .bind(a.teacher_id.0)
    .bind(a.role.to_string())
    .bind(a.assigned_by.0)
    .bind(a.assigned_at)
    .bind(a.active)
    .execute(conn)
    .await?;

    Ok(())
}

/// Fetch the (thesis, teacher, role) row regardless of active state,
/// locking it for the transaction.
pub async fn find_for_update(
    conn: &mut PgConnection,
    thesis: ThesisId,
    teacher: TeacherId,
    role: AssignmentRole,
) -> Result<Option<ThesisAssignment>, sqlx::Error> {
    let row = sqlx::query_as::<_, AssignmentRow>(&format!(
        "SELECT {COLUMNS} FROM thesis_assignments
         WHERE thesis_id = $1 AND teacher_id = $2 AND role = $3 FOR UPDATE"
    ))
    .bind(thesis.0)
    .bind(teacher.0)
    .bind(role.to_string())
    .fetch_optional(conn)
    .await?;

    row.map(AssignmentRow::into_record).transpose()
}

/// Persist the mutable assignment fields.
pub async fn update(conn: &mut PgConnection, a: &ThesisAssignment) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE thesis_assignments
         SET assigned_by = $1, assigned_at = $2, active = $3 WHERE id = $4",
    )
    .bind(a.assigned_by.0)
    .bind(a.assigned_at)
    .bind(a.active)
    .bind(a.id)
    .execute(conn)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// List the active committee of a thesis.
pub async fn list_active(
    conn: &mut PgConnection,
    thesis: ThesisId,
) -> Result<Vec<ThesisAssignment>, sqlx::Error> {
    let rows = sqlx::query_as::<_, AssignmentRow>(&format!(
        "SELECT {COLUMNS} FROM thesis_assignments
         WHERE thesis_id = $1 AND active ORDER BY assigned_at"
    ))
    .bind(thesis.0)
    .fetch_all(conn)
    .await?;

    rows.into_iter().map(AssignmentRow::into_record).collect()
}

/// Internal row type for SQLx mapping.
#[derive(sqlx::FromRow)]
struct AssignmentRow {
    id: Uuid,
    thesis_id: Uuid,
    teacher_id: Uuid,
    role: String,
    assigned_by: Uuid,
    assigned_at: DateTime<Utc>,
    active: bool,
}

impl AssignmentRow {
    fn into_record(self) -> Result<ThesisAssignment, sqlx::Error> {
        let role: AssignmentRole = parse_status("thesis_assignment", &self.role)?;
        Ok(ThesisAssignment {
            id: self.id,
            thesis_id: ThesisId(self.thesis_id),
            teacher_id: TeacherId(self.teacher_id),
            role,
            assigned_by: UserId(self.assigned_by),
            assigned_at: self.assigned_at,
            active: self.active,
        })
    }
}
