//! Semester lookups.
//!
//! Semesters are administered outside the workflow engine; the engine only
//! reads them to scope eligibility. The semester in scope is always an
//! explicit parameter of the workflow call, never an ambient lookup.

use chrono::NaiveDate;
use sqlx::PgConnection;
use uuid::Uuid;

use aula_core::SemesterId;

/// An academic semester, as provisioned by administration.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Semester {
    /// Row identifier.
    pub id: Uuid,
    /// Human-readable code (e.g. "2026A").
    pub code: String,
    /// First day of the semester.
    pub starts_on: NaiveDate,
    /// Last day of the semester.
    pub ends_on: NaiveDate,
    /// Whether the semester currently accepts workflow intake.
    pub is_active: bool,
}

/// Fetch a semester by ID.
pub async fn get_by_id(
    conn: &mut PgConnection,
    id: SemesterId,
) -> Result<Option<Semester>, sqlx::Error> {
    sqlx::query_as::<_, Semester>(
        "SELECT id, code, starts_on, ends_on, is_active FROM semesters WHERE id = $1",
    )
    .bind(id.0)
    .fetch_optional(conn)
    .await
}
