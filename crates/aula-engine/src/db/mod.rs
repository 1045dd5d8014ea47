//! # Database Persistence Layer
//!
//! Postgres persistence for the supervision workflow via SQLx.
//!
//! ## Architecture
//!
//! One module per entity. All helpers take a `&mut PgConnection` so the
//! same functions compose inside multi-statement transactions; workflow
//! operations open the transaction, the helpers never do. Status enums are
//! stored as snake_case TEXT and decoded back through serde, so the column
//! values match the wire form of the types in `aula-state`.
//!
//! Rows that carry workflow decisions (applications, proposals,
//! registrations, theses, defense sessions) have `FOR UPDATE` fetch
//! variants; operations lock the row before checking invariants against
//! its siblings.

pub mod applications;
pub mod assignments;
pub mod defense;
pub mod evaluations;
pub mod pretheses;
pub mod proposals;
pub mod registrations;
pub mod semesters;
pub mod theses;
pub mod topics;

use serde::de::DeserializeOwned;
use sqlx::postgres::{PgPool, PgPoolOptions};

/// Initialize the database connection pool and run embedded migrations.
pub async fn init_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(20)
        .min_connections(2)
        .acquire_timeout(std::time::Duration::from_secs(5))
        .connect(database_url)
        .await?;

    tracing::info!("Connected to PostgreSQL");

    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("Database migrations applied");

    Ok(pool)
}

/// Decode a snake_case status column back into its enum.
///
/// An unknown value is a corrupt row, not a default: the workflow must
/// never invent a state, so decode failures surface as protocol errors.
pub(crate) fn parse_status<T: DeserializeOwned>(
    entity: &'static str,
    raw: &str,
) -> Result<T, sqlx::Error> {
    serde_json::from_value(serde_json::Value::String(raw.to_string()))
        .map_err(|e| sqlx::Error::Protocol(format!("unknown {entity} status {raw:?}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use aula_state::{ApplicationStatus, RegistrationStatus, ThesisStatus};

    #[test]
    fn test_parse_status_known_values() {
        let s: ApplicationStatus = parse_status("topic_application", "pending").unwrap();
        assert_eq!(s, ApplicationStatus::Pending);
        let s: RegistrationStatus = parse_status("thesis_registration", "pending_approval").unwrap();
        assert_eq!(s, RegistrationStatus::PendingApproval);
        let s: ThesisStatus = parse_status("thesis", "defense_completed").unwrap();
        assert_eq!(s, ThesisStatus::DefenseCompleted);
    }

    #[test]
    fn test_parse_status_rejects_unknown() {
        let result: Result<ThesisStatus, _> = parse_status("thesis", "exploded");
        assert!(result.is_err());
    }

    #[test]
    fn test_status_display_roundtrips_through_parse() {
        for status in [
            ThesisStatus::Draft,
            ThesisStatus::InProgress,
            ThesisStatus::DefenseScheduled,
            ThesisStatus::DefenseCompleted,
            ThesisStatus::Completed,
            ThesisStatus::Cancelled,
        ] {
            let parsed: ThesisStatus = parse_status("thesis", &status.to_string()).unwrap();
            assert_eq!(parsed, status);
        }
    }
}
