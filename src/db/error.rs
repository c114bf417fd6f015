//! Storage error taxonomy
//!
//! Commit failures are classified into the two integrity errors callers care
//! about. A primary-key lookup miss is not an error at all: lookups return
//! `Ok(None)`.

use sqlx::error::ErrorKind;

/// Error returned when staged work cannot be flushed to storage
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A unique column (name, title, one-to-one back-reference) already holds the value
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    /// A foreign key points at a row that doesn't exist
    #[error("Referential integrity violation: {0}")]
    ReferentialIntegrity(String),

    /// A handle whose staged row was discarded before it reached storage
    #[error("Handle refers to a row that was never stored")]
    UnknownHandle,

    /// Any other database failure
    #[error("Database error: {0}")]
    Database(sqlx::Error),
}

impl StoreError {
    pub fn is_constraint_violation(&self) -> bool {
        matches!(self, StoreError::ConstraintViolation(_))
    }

    pub fn is_referential_integrity(&self) -> bool {
        matches!(self, StoreError::ReferentialIntegrity(_))
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        let classified = err.as_database_error().and_then(|db_err| {
            let message = db_err.message().to_string();
            match db_err.kind() {
                ErrorKind::UniqueViolation => Some(StoreError::ConstraintViolation(message)),
                ErrorKind::ForeignKeyViolation => Some(StoreError::ReferentialIntegrity(message)),
                // Primary result codes carry no kind; fall back on SQLite's wording
                _ if message.contains("UNIQUE constraint failed") => {
                    Some(StoreError::ConstraintViolation(message))
                }
                _ if message.contains("FOREIGN KEY constraint failed") => {
                    Some(StoreError::ReferentialIntegrity(message))
                }
                _ => None,
            }
        });

        classified.unwrap_or(StoreError::Database(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_database_error_is_passed_through() {
        let err = StoreError::from(sqlx::Error::RowNotFound);

        assert!(matches!(err, StoreError::Database(sqlx::Error::RowNotFound)));
        assert!(!err.is_constraint_violation());
        assert!(!err.is_referential_integrity());
    }

    #[test]
    fn test_display() {
        let err = StoreError::ConstraintViolation("UNIQUE constraint failed: users.name".into());
        assert_eq!(
            err.to_string(),
            "Constraint violation: UNIQUE constraint failed: users.name"
        );
    }
}
