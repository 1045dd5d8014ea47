//! Defense session persistence operations.
//!
//! At most one session per thesis; the uniqueness is backed by a unique
//! index on `thesis_id` and checked before insert inside the scheduling
//! transaction.

use chrono::{DateTime, Utc};
use sqlx::PgConnection;
use uuid::Uuid;

use aula_core::ThesisId;
use aula_state::{DefenseSession, DefenseStatus};

use super::parse_status;

const COLUMNS: &str = "id, thesis_id, scheduled_at, room, notes, status, created_at, updated_at";

/// Insert a new session.
pub async fn insert(conn: &mut PgConnection, s: &DefenseSession) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO defense_sessions
         (id, thesis_id, scheduled_at, room, notes, status, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
    )
    .bind(s.id)
    .bind(s.thesis_id.0)
    .bind(s.scheduled_at)
    .bind(&s.room)
    .bind(&s.notes)
    .bind(s.status.to_string())
    .bind(s.created_at)
    .bind(s.updated_at)
    .execute(conn)
    .await?;

    Ok(())
}

/// Fetch the session for a thesis, if any.
pub async fn find_by_thesis(
    conn: &mut PgConnection,
    thesis: ThesisId,
) -> Result<Option<DefenseSession>, sqlx::Error> {
    let row = sqlx::query_as::<_, SessionRow>(&format!(
        "SELECT {COLUMNS} FROM defense_sessions WHERE thesis_id = $1"
    ))
    .bind(thesis.0)
    .fetch_optional(conn)
    .await?;

    row.map(SessionRow::into_record).transpose()
}

/// Fetch the session for a thesis, locking it for the transaction.
pub async fn find_by_thesis_for_update(
    conn: &mut PgConnection,
    thesis: ThesisId,
) -> Result<Option<DefenseSession>, sqlx::Error> {
    let row = sqlx::query_as::<_, SessionRow>(&format!(
        "SELECT {COLUMNS} FROM defense_sessions WHERE thesis_id = $1 FOR UPDATE"
    ))
    .bind(thesis.0)
    .fetch_optional(conn)
    .await?;

    row.map(SessionRow::into_record).transpose()
}

/// Persist the mutable session fields.
pub async fn update(conn: &mut PgConnection, s: &DefenseSession) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE defense_sessions
         SET scheduled_at = $1, room = $2, notes = $3, status = $4, updated_at = $5
         WHERE id = $6",
    )
    .bind(s.scheduled_at)
    .bind(&s.room)
    .bind(&s.notes)
    .bind(s.status.to_string())
    .bind(s.updated_at)
    .bind(s.id)
    .execute(conn)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Internal row type for SQLx mapping.
#[derive(sqlx::FromRow)]
struct SessionRow {
    id: Uuid,
    thesis_id: Uuid,
    scheduled_at: DateTime<Utc>,
    room: Option<String>,
    notes: Option<String>,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl SessionRow {
    fn into_record(self) -> Result<DefenseSession, sqlx::Error> {
        let status: DefenseStatus = parse_status("defense_session", &self.status)?;
        Ok(DefenseSession {
            id: self.id,
            thesis_id: ThesisId(self.thesis_id),
            scheduled_at: self.scheduled_at,
            room: self.room,
            notes: self.notes,
            status,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}
