//! Error types for rv-db

use rv_core::{ExecutorError, StateError};
use thiserror::Error;

/// Database operation errors
#[derive(Error, Debug)]
pub enum DbError {
    /// Connection error (D001)
    #[error("[D001] Database connection failed: {0}")]
    ConnectionError(String),

    /// Query execution error (D002)
    #[error("[D002] SQL execution failed: {0}")]
    ExecutionError(String),

    /// Table not found (D003)
    #[error("[D003] Table or view not found: {0}")]
    TableNotFound(String),

    /// Transaction management error (D004)
    #[error("[D004] Transaction failed: {0}")]
    TransactionError(String),
}

/// Result type alias for DbError
pub type DbResult<T> = Result<T, DbError>;

impl From<duckdb::Error> for DbError {
    fn from(err: duckdb::Error) -> Self {
        // duckdb::Error does not expose structured variants, so the message
        // is the only thing to classify on.
        let msg = err.to_string();
        if msg.contains("Table with name")
            || msg.contains("Table or view with name")
            || (msg.contains("Catalog Error") && msg.contains("Table") && msg.contains("not found"))
        {
            DbError::TableNotFound(msg)
        } else {
            DbError::ExecutionError(msg)
        }
    }
}

impl From<DbError> for ExecutorError {
    fn from(err: DbError) -> Self {
        ExecutorError::Backend {
            message: "DuckDB rejected the edit".to_string(),
            source: Box::new(err),
        }
    }
}

impl DbError {
    /// Convert into a chain-state read failure
    pub(crate) fn into_read(self) -> StateError {
        StateError::Read(self.to_string())
    }

    /// Convert into a chain-state write failure
    pub(crate) fn into_write(self) -> StateError {
        StateError::Write(self.to_string())
    }
}
