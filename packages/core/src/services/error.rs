//! Service Layer Error Types
//!
//! This module defines the error taxonomy of the query engine. Caller mistakes
//! (`WrongInput`, `InvalidIdentifier`, `InvalidCursor`, `UnresolvedReference`,
//! `NotFound`) are distinguished from store failures (`DataFetching`), which are
//! logged once at the service boundary and re-surfaced unchanged.

use crate::db::StoreError;
use crate::models::ValidationError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Client-facing error classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorType {
    /// Caller supplied something the engine cannot use
    ValidationError,
    /// The content store failed
    DataFetchingException,
}

/// Query engine errors
#[derive(Error, Debug)]
pub enum QueryError {
    /// Malformed filter, path argument or pagination parameters
    #[error("Wrong input: {0}")]
    WrongInput(String),

    /// Reference-typed value that cannot be followed
    #[error("Unresolved reference: {0}")]
    UnresolvedReference(String),

    /// Malformed global identifier or cursor
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    /// Well-formed cursor whose key is not part of the sequence
    #[error("Cursor does not match any item: {cursor}")]
    InvalidCursor { cursor: String },

    /// Lookup by identifier or path found nothing
    #[error("{kind} not found: {key}")]
    NotFound { kind: String, key: String },

    /// Content store failure
    #[error("Data fetching failed: {0}")]
    DataFetching(#[from] StoreError),
}

impl QueryError {
    /// Create a wrong input error
    pub fn wrong_input(msg: impl Into<String>) -> Self {
        Self::WrongInput(msg.into())
    }

    /// Create an unresolved reference error
    pub fn unresolved_reference(msg: impl Into<String>) -> Self {
        Self::UnresolvedReference(msg.into())
    }

    /// Create an invalid identifier error
    pub fn invalid_identifier(msg: impl Into<String>) -> Self {
        Self::InvalidIdentifier(msg.into())
    }

    /// Create an invalid cursor error
    pub fn invalid_cursor(cursor: impl Into<String>) -> Self {
        Self::InvalidCursor {
            cursor: cursor.into(),
        }
    }

    /// Create a node not found error
    pub fn node_not_found(key: impl Into<String>) -> Self {
        Self::NotFound {
            kind: "Node".to_string(),
            key: key.into(),
        }
    }

    /// Create a node type not found error
    pub fn node_type_not_found(name: impl Into<String>) -> Self {
        Self::NotFound {
            kind: "Node type".to_string(),
            key: name.into(),
        }
    }

    /// Classification exposed to clients
    pub fn error_type(&self) -> ErrorType {
        match self {
            Self::DataFetching(_) => ErrorType::DataFetchingException,
            _ => ErrorType::ValidationError,
        }
    }

    /// Whether the caller caused this error
    pub fn is_client_error(&self) -> bool {
        self.error_type() == ErrorType::ValidationError
    }
}

impl From<ValidationError> for QueryError {
    fn from(err: ValidationError) -> Self {
        Self::WrongInput(err.to_string())
    }
}

/// Convenience alias used throughout the services
pub type QueryResult<T> = Result<T, QueryError>;
