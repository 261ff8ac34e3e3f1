use crate::identifier::IdentifierError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error in {table} during {operation}: {message}")]
    DatabaseError {
        table: String,
        operation: String,
        message: String,
    },

    #[error("Query failed on {table}: {message} (sql: {sql})")]
    QueryError {
        table: String,
        sql: String,
        message: String,
    },

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate key {key} in {table}")]
    DuplicateKey { table: String, key: String },

    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(#[from] IdentifierError),

    #[error("Transaction error: {0}")]
    TransactionError(String),
}

impl StoreError {
    pub fn database_operation(
        table: &str,
        operation: &str,
        error: impl std::fmt::Display,
    ) -> Self {
        Self::DatabaseError {
            table: table.to_string(),
            operation: operation.to_string(),
            message: error.to_string(),
        }
    }

    pub fn query_execution(table: &str, sql: &str, error: impl std::fmt::Display) -> Self {
        Self::QueryError {
            table: table.to_string(),
            sql: sql.to_string(),
            message: error.to_string(),
        }
    }

    pub fn not_found(table: &str, key: impl std::fmt::Display) -> Self {
        Self::NotFound(format!("{} with key {}", table, key))
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(error: serde_json::Error) -> Self {
        Self::SerializationError(error.to_string())
    }
}
