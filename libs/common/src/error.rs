//! Custom error types for the common library
//!
//! This module defines the persistence error types shared by the services.

use sqlx::Error as SqlxError;
use thiserror::Error;

/// Custom error type for database operations
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Error occurred during database connection
    #[error("Database connection error: {0}")]
    Connection(#[source] SqlxError),

    /// Error occurred during database query execution
    #[error("Database query error: {0}")]
    Query(#[source] SqlxError),

    /// Error occurred during database migration
    #[error("Database migration error: {0}")]
    Migration(String),

    /// Configuration error
    #[error("Database configuration error: {0}")]
    Configuration(String),
}

impl DatabaseError {
    /// Whether the error is a unique constraint violation (SQLSTATE 23505)
    pub fn is_unique_violation(&self) -> bool {
        match self {
            DatabaseError::Query(SqlxError::Database(db_err)) => {
                db_err.code().is_some_and(|code| code.as_ref() == "23505")
            }
            _ => false,
        }
    }
}

/// Type alias for Result with DatabaseError
pub type DatabaseResult<T> = Result<T, DatabaseError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configuration_error_is_not_a_unique_violation() {
        let err = DatabaseError::Configuration("bad url".to_string());
        assert!(!err.is_unique_violation());
        assert_eq!(err.to_string(), "Database configuration error: bad url");
    }

    #[test]
    fn row_not_found_is_not_a_unique_violation() {
        let err = DatabaseError::Query(SqlxError::RowNotFound);
        assert!(!err.is_unique_violation());
    }
}
