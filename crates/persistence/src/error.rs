//! Translation of sqlx errors into port errors.

use domain::StoreError;

/// Postgres SQLSTATE for unique_violation.
const UNIQUE_VIOLATION: &str = "23505";

pub(crate) fn map_sqlx(err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::RowNotFound => StoreError::NotFound,
        sqlx::Error::Database(db) if db.code().as_deref() == Some(UNIQUE_VIOLATION) => {
            StoreError::Conflict(db.message().to_string())
        }
        other => StoreError::Backend(other.to_string()),
    }
}

/// A failed commit leaves the write's fate unknown to the caller.
pub(crate) fn map_commit(err: sqlx::Error) -> StoreError {
    tracing::error!(error = %err, "Transaction commit failed");
    StoreError::Unacknowledged
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_not_found_maps_to_not_found() {
        assert!(matches!(
            map_sqlx(sqlx::Error::RowNotFound),
            StoreError::NotFound
        ));
    }

    #[test]
    fn test_commit_failure_is_unacknowledged() {
        assert!(matches!(
            map_commit(sqlx::Error::PoolTimedOut),
            StoreError::Unacknowledged
        ));
    }

    #[test]
    fn test_other_errors_are_backend() {
        assert!(matches!(
            map_sqlx(sqlx::Error::PoolClosed),
            StoreError::Backend(_)
        ));
    }
}
