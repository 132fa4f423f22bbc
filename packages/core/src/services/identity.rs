//! Global Identifier Codec
//!
//! Global ids are opaque to clients: standard base64 of
//! `<prefix>:<workspace>:<node id>`. The prefix keeps node ids apart from any
//! other id family a host may expose through the same surface.

use crate::config::DEFAULT_GLOBAL_ID_PREFIX;
use crate::models::Workspace;
use crate::services::error::{QueryError, QueryResult};
use base64::{engine::general_purpose, Engine as _};

/// Encodes and decodes opaque global identifiers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityCodec {
    prefix: String,
}

impl Default for IdentityCodec {
    fn default() -> Self {
        Self::new(DEFAULT_GLOBAL_ID_PREFIX)
    }
}

impl IdentityCodec {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Encode a (workspace, node id) pair
    ///
    /// Infallible: workspace names never contain `:` and node ids may contain
    /// anything, because decoding splits at most twice.
    pub fn encode(&self, workspace: &Workspace, node_id: &str) -> String {
        general_purpose::STANDARD.encode(format!("{}:{}:{}", self.prefix, workspace, node_id))
    }

    /// Decode an opaque id back into its (workspace, node id) pair
    ///
    /// # Errors
    ///
    /// Returns `QueryError::InvalidIdentifier` if the input is not base64, not
    /// UTF-8, carries another prefix, or lacks a workspace or node id.
    pub fn decode(&self, opaque: &str) -> QueryResult<(Workspace, String)> {
        let bytes = general_purpose::STANDARD
            .decode(opaque)
            .map_err(|e| QueryError::invalid_identifier(format!("'{}': {}", opaque, e)))?;
        let payload = String::from_utf8(bytes)
            .map_err(|_| QueryError::invalid_identifier(format!("'{}': not UTF-8", opaque)))?;

        let mut parts = payload.splitn(3, ':');
        let (prefix, workspace, id) = match (parts.next(), parts.next(), parts.next()) {
            (Some(prefix), Some(workspace), Some(id)) => (prefix, workspace, id),
            _ => {
                return Err(QueryError::invalid_identifier(format!(
                    "'{}': expected <prefix>:<workspace>:<id>",
                    opaque
                )))
            }
        };

        if prefix != self.prefix {
            return Err(QueryError::invalid_identifier(format!(
                "'{}': unknown id prefix '{}'",
                opaque, prefix
            )));
        }
        if id.is_empty() {
            return Err(QueryError::invalid_identifier(format!(
                "'{}': empty node id",
                opaque
            )));
        }

        let workspace = Workspace::new(workspace)
            .map_err(|e| QueryError::invalid_identifier(format!("'{}': {}", opaque, e)))?;
        Ok((workspace, id.to_string()))
    }

    /// Whether `opaque` looks like an id produced by this codec
    pub fn recognizes(&self, opaque: &str) -> bool {
        self.decode(opaque).is_ok()
    }
}
