//! # Workflow Operations
//!
//! The engine's public surface, one module per workflow area. Every
//! operation that checks an invariant across more than one entity, or
//! writes to more than one entity, runs inside a single transaction with
//! full rollback on any failure; no partial cascade is ever observable.
//!
//! Shared eligibility helpers live here.

pub mod applications;
pub mod assignments;
pub mod defense;
pub mod evaluations;
pub mod pretheses;
pub mod proposals;
pub mod queries;
pub mod registrations;
pub mod theses;
pub mod topics;

use chrono::{DateTime, Utc};
use sqlx::PgConnection;

use aula_core::{SemesterId, WorkflowError};

use crate::db;
use crate::error::map_db_err;

/// Resolve a semester and require that it is active for workflow intake.
pub(crate) async fn require_active_semester(
    conn: &mut PgConnection,
    semester: SemesterId,
) -> Result<db::semesters::Semester, WorkflowError> {
    let sem = db::semesters::get_by_id(conn, semester)
        .await
        .map_err(map_db_err)?
        .ok_or_else(|| WorkflowError::not_found("semester", semester))?;

    if !sem.is_active {
        return Err(WorkflowError::Validation(format!(
            "semester {} is not active",
            sem.code
        )));
    }
    Ok(sem)
}

/// Require that a defense time lies strictly in the future.
pub(crate) fn ensure_future(
    scheduled_at: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Result<(), WorkflowError> {
    if scheduled_at <= now {
        return Err(WorkflowError::Validation(format!(
            "scheduled_at {scheduled_at} is not in the future"
        )));
    }
    Ok(())
}

/// Require a non-empty trimmed field.
pub(crate) fn require_field(value: &str, field: &'static str) -> Result<(), WorkflowError> {
    if value.trim().is_empty() {
        return Err(WorkflowError::Validation(format!("{field} is required")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_ensure_future_rejects_past() {
        let now = Utc::now();
        let err = ensure_future(now - Duration::hours(1), now).unwrap_err();
        assert_eq!(err.code(), "VALIDATION_ERROR");
    }

    #[test]
    fn test_ensure_future_rejects_now() {
        let now = Utc::now();
        assert!(ensure_future(now, now).is_err());
    }

    #[test]
    fn test_ensure_future_accepts_future() {
        let now = Utc::now();
        assert!(ensure_future(now + Duration::minutes(1), now).is_ok());
    }

    #[test]
    fn test_require_field() {
        assert!(require_field("thesis title", "title").is_ok());
        assert!(require_field("   ", "title").is_err());
        assert!(require_field("", "title").is_err());
    }
}
