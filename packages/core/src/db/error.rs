//! Store Error Types
//!
//! Errors raised by [`ContentStore`](crate::db::ContentStore) implementations.
//! The engine never inspects these beyond wrapping them into
//! `QueryError::DataFetching`; absence of a node or property is not an error and
//! is reported as `Ok(None)` instead.

use thiserror::Error;

/// Content store failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Backend could not be reached or refused the operation
    #[error("Content store unavailable during {operation}: {reason}")]
    Unavailable { operation: String, reason: String },

    /// Structured query could not be parsed by the backend
    #[error("Invalid {dialect} query: {message}")]
    InvalidQuery { dialect: String, message: String },

    /// Store content violates a structural constraint
    #[error("Repository constraint violated: {0}")]
    ConstraintViolation(String),
}

impl StoreError {
    /// Create an unavailable error
    pub fn unavailable(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Unavailable {
            operation: operation.into(),
            reason: reason.into(),
        }
    }

    /// Create an invalid query error
    pub fn invalid_query(dialect: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidQuery {
            dialect: dialect.into(),
            message: message.into(),
        }
    }

    /// Create a constraint violation error
    pub fn constraint_violation(msg: impl Into<String>) -> Self {
        Self::ConstraintViolation(msg.into())
    }
}
