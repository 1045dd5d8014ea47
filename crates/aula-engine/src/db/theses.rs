//! Thesis persistence operations.
//!
//! The transition log is stored as JSONB alongside the status column;
//! state machine constraints are enforced at the application layer, not
//! in SQL.

use chrono::{DateTime, Utc};
use sqlx::PgConnection;
use uuid::Uuid;

use aula_core::{SemesterId, StudentId, TeacherId, ThesisId};
use aula_state::{Thesis, ThesisStatus, TransitionRecord};

use super::parse_status;

const COLUMNS: &str = "id, registration_id, student_id, supervisor_id, semester_id, title, \
                       status, transition_log, created_at, updated_at";

/// Insert a new thesis.
pub async fn insert(conn: &mut PgConnection, thesis: &Thesis) -> Result<(), sqlx::Error> {
    let log = serde_json::to_value(&thesis.transitions)
        .map_err(|e| sqlx::Error::Protocol(format!("failed to serialize transition_log: {e}")))?;

    sqlx::query(
        "INSERT INTO theses
         (id, registration_id, student_id, supervisor_id, semester_id, title,
          status, transition_log, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
    )
    .bind(thesis.id.0)
    .bind(thesis.registration_id)
    .bind(thesis.student_id.0)
    .bind(thesis.supervisor_id.0)
    .bind(thesis.semester_id.0)
    .bind(&thesis.title)
    .bind(thesis.status.to_string())
    .bind(&log)
    .bind(thesis.created_at)
    .bind(thesis.updated_at)
    .execute(conn)
    .await?;

    Ok(())
}

/// Fetch a thesis by ID.
pub async fn get_by_id(
    conn: &mut PgConnection,
    id: ThesisId,
) -> Result<Option<Thesis>, sqlx::Error> {
    let row = sqlx::query_as::<_, ThesisRow>(&format!(
        "SELECT {COLUMNS} FROM theses WHERE id = $1"
    ))
    .bind(id.0)
    .fetch_optional(conn)
    .await?;

    row.map(ThesisRow::into_record).transpose()
}

/// Fetch a thesis by ID, locking the row for the transaction.
pub async fn get_by_id_for_update(
    conn: &mut PgConnection,
    id: ThesisId,
) -> Result<Option<Thesis>, sqlx::Error> {
    let row = sqlx::query_as::<_, ThesisRow>(&format!(
        "SELECT {COLUMNS} FROM theses WHERE id = $1 FOR UPDATE"
    ))
    .bind(id.0)
    .fetch_optional(conn)
    .await?;

    row.map(ThesisRow::into_record).transpose()
}

/// Persist status, transition log, and updated_at.
pub async fn update_status(conn: &mut PgConnection, thesis: &Thesis) -> Result<bool, sqlx::Error> {
    let log = serde_json::to_value(&thesis.transitions)
        .map_err(|e| sqlx::Error::Protocol(format!("failed to serialize transition_log: {e}")))?;

    let result = sqlx::query(
        "UPDATE theses SET status = $1, transition_log = $2, updated_at = $3 WHERE id = $4",
    )
    .bind(thesis.status.to_string())
    .bind(&log)
    .bind(thesis.updated_at)
    .bind(thesis.id.0)
    .execute(conn)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// List theses supervised by a teacher for a semester, newest first.
pub async fn list_by_supervisor(
    conn: &mut PgConnection,
    supervisor: TeacherId,
    semester: SemesterId,
    limit: i64,
    offset: i64,
) -> Result<Vec<Thesis>, sqlx::Error> {
    let rows = sqlx::query_as::<_, ThesisRow>(&format!(
        "SELECT {COLUMNS} FROM theses
         WHERE supervisor_id = $1 AND semester_id = $2
         ORDER BY created_at DESC LIMIT $3 OFFSET $4"
    ))
    .bind(supervisor.0)
    .bind(semester.0)
    .bind(limit)
    .bind(offset)
    .fetch_all(conn)
    .await?;

    rows.into_iter().map(ThesisRow::into_record).collect()
}

/// Internal row type for SQLx mapping.
#[derive(sqlx::FromRow)]
struct ThesisRow {
    id: Uuid,
    registration_id: Uuid,
    student_id: Uuid,
    supervisor_id: Uuid,
    semester_id: Uuid,
    title: String,
    status: String,
    transition_log: serde_json::Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ThesisRow {
    fn into_record(self) -> Result<Thesis, sqlx::Error> {
        let status: ThesisStatus = parse_status("thesis", &self.status)?;
        let transitions: Vec<TransitionRecord> = serde_json::from_value(self.transition_log)
            .map_err(|e| {
                sqlx::Error::Protocol(format!("failed to deserialize transition_log: {e}"))
            })?;

        Ok(Thesis {
            id: ThesisId(self.id),
            registration_id: self.registration_id,
            student_id: StudentId(self.student_id),
            supervisor_id: TeacherId(self.supervisor_id),
            semester_id: SemesterId(self.semester_id),
            title: self.title,
            status,
            transitions,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}
