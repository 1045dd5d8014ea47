//! Mapping from store errors to the workflow error taxonomy.
//!
//! Concurrency symptoms (unique-constraint races, lock timeouts,
//! serialization failures, deadlocks) become the retryable `CONFLICT`
//! kind; everything else from the store is an infrastructure `STORAGE`
//! failure that callers may also retry, and that operators should see in
//! the logs.

use aula_core::WorkflowError;

// Postgres SQLSTATE codes the engine treats as concurrency conflicts.
const UNIQUE_VIOLATION: &str = "23505";
const SERIALIZATION_FAILURE: &str = "40001";
const DEADLOCK_DETECTED: &str = "40P01";
const LOCK_NOT_AVAILABLE: &str = "55P03";

/// Convert a store error into a `WorkflowError`.
pub(crate) fn map_db_err(err: sqlx::Error) -> WorkflowError {
    match &err {
        sqlx::Error::Database(db) => match db.code().as_deref() {
            Some(UNIQUE_VIOLATION) => WorkflowError::Conflict(format!(
                "concurrent write violated a uniqueness constraint: {db}"
            )),
            Some(SERIALIZATION_FAILURE) | Some(DEADLOCK_DETECTED) | Some(LOCK_NOT_AVAILABLE) => {
                WorkflowError::Conflict(format!("transaction could not acquire row locks: {db}"))
            }
            _ => WorkflowError::Storage(db.to_string()),
        },
        sqlx::Error::PoolTimedOut => {
            WorkflowError::Storage("timed out waiting for a database connection".to_string())
        }
        _ => WorkflowError::Storage(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_timeout_is_retryable_storage() {
        let err = map_db_err(sqlx::Error::PoolTimedOut);
        assert_eq!(err.code(), "STORAGE_ERROR");
        assert!(err.is_retryable());
    }

    #[test]
    fn test_row_not_found_is_storage() {
        // Lookups use fetch_optional; a bare RowNotFound leaking through
        // means a query bug, which is an infrastructure symptom.
        let err = map_db_err(sqlx::Error::RowNotFound);
        assert_eq!(err.code(), "STORAGE_ERROR");
    }
}
