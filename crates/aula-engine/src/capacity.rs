//! # Capacity Ledger
//!
//! Per-teacher, per-semester remaining supervision slots, one row per
//! (teacher, semester) in `teacher_availability`. The workflow only ever
//! decrements and restores slots; ledger rows themselves are provisioned
//! by semester administration, outside this engine.
//!
//! ## Atomicity
//!
//! `reserve` is a single conditional UPDATE: the row lock it takes
//! serializes concurrent reservations, and the `> 0` guard in the WHERE
//! clause makes it impossible for two racing accepts to both succeed on a
//! last slot. A zero rows-affected result means no slot was available (or
//! the ledger is closed); nothing was mutated.

use serde::{Deserialize, Serialize};
use sqlx::PgConnection;

use aula_core::{SemesterId, TeacherId};

/// The two supervision tracks a ledger row accounts for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Track {
    /// Pre-thesis topic supervision.
    PreThesis,
    /// Full thesis supervision.
    Thesis,
}

impl Track {
    /// The ledger column holding the remaining slots for this track.
    fn column(&self) -> &'static str {
        match self {
            Self::PreThesis => "max_pre_thesis",
            Self::Thesis => "max_thesis",
        }
    }
}

impl std::fmt::Display for Track {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::PreThesis => "pre_thesis",
            Self::Thesis => "thesis",
        };
        f.write_str(s)
    }
}

/// A non-locking view of one ledger row, for display and statistics.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CapacitySnapshot {
    /// The teacher.
    pub teacher_id: uuid::Uuid,
    /// The semester.
    pub semester_id: uuid::Uuid,
    /// Remaining pre-thesis slots.
    pub max_pre_thesis: i32,
    /// Remaining thesis slots.
    pub max_thesis: i32,
    /// Whether the teacher accepts new commitments this semester.
    pub is_open: bool,
}

/// Atomically reserve one slot on a track.
///
/// Returns `false` without mutating anything when the ledger row is
/// missing, closed, or out of slots.
pub async fn reserve(
    conn: &mut PgConnection,
    teacher: TeacherId,
    semester: SemesterId,
    track: Track,
) -> Result<bool, sqlx::Error> {
    let col = track.column();
    let result = sqlx::query(&format!(
        "UPDATE teacher_availability SET {col} = {col} - 1
         WHERE teacher_id = $1 AND semester_id = $2 AND is_open AND {col} > 0"
    ))
    .bind(teacher.0)
    .bind(semester.0)
    .execute(conn)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Restore one slot on a track, unconditionally.
///
/// Used when a previously accepted commitment is rejected or withdrawn.
/// A missing ledger row is logged and ignored; restoration must never
/// fail a cancellation.
pub async fn release(
    conn: &mut PgConnection,
    teacher: TeacherId,
    semester: SemesterId,
    track: Track,
) -> Result<(), sqlx::Error> {
    let col = track.column();
    let result = sqlx::query(&format!(
        "UPDATE teacher_availability SET {col} = {col} + 1
         WHERE teacher_id = $1 AND semester_id = $2"
    ))
    .bind(teacher.0)
    .bind(semester.0)
    .execute(conn)
    .await?;

    if result.rows_affected() == 0 {
        tracing::warn!(
            teacher = %teacher,
            semester = %semester,
            track = %track,
            "capacity release found no ledger row"
        );
    }
    Ok(())
}

/// Whether the teacher's ledger row exists and is open for new
/// commitments this semester.
pub async fn is_open(
    conn: &mut PgConnection,
    teacher: TeacherId,
    semester: SemesterId,
) -> Result<bool, sqlx::Error> {
    let open: Option<bool> = sqlx::query_scalar(
        "SELECT is_open FROM teacher_availability
         WHERE teacher_id = $1 AND semester_id = $2",
    )
    .bind(teacher.0)
    .bind(semester.0)
    .fetch_optional(conn)
    .await?;

    Ok(open.unwrap_or(false))
}

/// Fetch the ledger row for display. Non-locking.
pub async fn snapshot(
    conn: &mut PgConnection,
    teacher: TeacherId,
    semester: SemesterId,
) -> Result<Option<CapacitySnapshot>, sqlx::Error> {
    sqlx::query_as::<_, CapacitySnapshot>(
        "SELECT teacher_id, semester_id, max_pre_thesis, max_thesis, is_open
         FROM teacher_availability
         WHERE teacher_id = $1 AND semester_id = $2",
    )
    .bind(teacher.0)
    .bind(semester.0)
    .fetch_optional(conn)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_track_columns() {
        assert_eq!(Track::PreThesis.column(), "max_pre_thesis");
        assert_eq!(Track::Thesis.column(), "max_thesis");
    }

    #[test]
    fn test_track_display() {
        assert_eq!(Track::PreThesis.to_string(), "pre_thesis");
        assert_eq!(Track::Thesis.to_string(), "thesis");
    }
}
