//! Database repository for CRUD operations.
//!
//! Uses prepared statements and transactions for data integrity. The
//! aggregate-specific operations live in sibling modules, each adding an
//! `impl Repository` block.

use chrono::{DateTime, Duration, Utc};
use sqlx::SqlitePool;

use super::TRASH_RETENTION_DAYS;
use crate::errors::AppError;

/// Database repository for all data operations.
#[derive(Clone)]
pub struct Repository {
    pub(super) pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

/// Parse a JSON-encoded string array column.
pub(super) fn parse_json_array(s: &str) -> Vec<String> {
    serde_json::from_str(s).unwrap_or_default()
}

/// Parse a JSON document column.
pub(super) fn parse_json_value(s: &str) -> serde_json::Value {
    serde_json::from_str(s).unwrap_or(serde_json::Value::Null)
}

/// Compute when a trashed row leaves the recovery window.
pub fn recovery_deadline(deleted_at: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(deleted_at)
        .ok()
        .map(|t| t.with_timezone(&Utc) + Duration::days(TRASH_RETENTION_DAYS))
}

/// Refuse restores once the recovery window has elapsed.
pub(super) fn ensure_recoverable(deleted_at: &str) -> Result<(), AppError> {
    match recovery_deadline(deleted_at) {
        Some(deadline) if Utc::now() <= deadline => Ok(()),
        Some(_) => Err(AppError::Conflict(format!(
            "Recovery window of {} days has elapsed",
            TRASH_RETENTION_DAYS
        ))),
        None => Err(AppError::Internal(format!(
            "Unparseable deletion timestamp: {}",
            deleted_at
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_recoverable_within_window() {
        let deleted_at = Utc::now().to_rfc3339();
        assert!(ensure_recoverable(&deleted_at).is_ok());
    }

    #[test]
    fn test_ensure_recoverable_expired() {
        let deleted_at = (Utc::now() - Duration::days(TRASH_RETENTION_DAYS + 1)).to_rfc3339();
        assert!(matches!(
            ensure_recoverable(&deleted_at),
            Err(AppError::Conflict(_))
        ));
    }

    #[test]
    fn test_ensure_recoverable_garbage_timestamp() {
        assert!(ensure_recoverable("not-a-timestamp").is_err());
    }
}
