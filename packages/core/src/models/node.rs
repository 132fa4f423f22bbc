//! Node Data Structures
//!
//! This module defines the `Node` struct, the transient per-request projection of
//! an entry in the external content tree.
//!
//! # Architecture
//!
//! - **Stable Identity**: `id` never changes across workspaces or languages
//! - **Explicit Context**: every node carries the workspace (and optional language)
//!   it was read in, so re-projection never depends on ambient state
//! - **Lazy Children**: children and properties are fetched from the
//!   [`ContentStore`](crate::db::ContentStore) on demand, never owned by the node
//!
//! # Examples
//!
//! ```rust
//! use treeql_core::models::{Node, Workspace};
//!
//! let site = Node::new(Workspace::edit(), "/sites/acme", "jnt:virtualsite");
//! assert_eq!(site.name, "acme");
//! assert!(site.is_root_level());
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Validation errors for model construction
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid workspace name: {0}")]
    InvalidWorkspace(String),

    #[error("Invalid node path: {0}")]
    InvalidPath(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Named partition of the content tree (e.g. draft vs. live)
///
/// Workspace names are non-empty and never contain `:`, which is the separator
/// used inside global identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Workspace(String);

impl Workspace {
    /// Name of the editing workspace
    pub const EDIT: &'static str = "default";

    /// Name of the published workspace
    pub const LIVE: &'static str = "live";

    /// Create a validated workspace name
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::InvalidWorkspace` if the name is empty or contains `:`.
    pub fn new(name: impl Into<String>) -> Result<Self, ValidationError> {
        let name = name.into();
        if name.is_empty() || name.contains(':') {
            return Err(ValidationError::InvalidWorkspace(name));
        }
        Ok(Self(name))
    }

    /// The editing workspace (`default`)
    pub fn edit() -> Self {
        Self(Self::EDIT.to_string())
    }

    /// The published workspace (`live`)
    pub fn live() -> Self {
        Self(Self::LIVE.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Workspace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Workspace {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Workspace> for String {
    fn from(value: Workspace) -> Self {
        value.0
    }
}

/// Explicit (workspace, language) pair a node is read through
///
/// Replaces session-scoped locale state: every store read names its context.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessContext {
    pub workspace: Workspace,

    /// Language used to project internationalized properties (`None` = untranslated view)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

impl AccessContext {
    pub fn new(workspace: Workspace) -> Self {
        Self {
            workspace,
            language: None,
        }
    }

    pub fn with_language(mut self, language: Option<String>) -> Self {
        self.language = language;
        self
    }
}

/// Transient projection of a content tree entry.
///
/// # Fields
///
/// - `id`: Stable identifier, shared by every projection of the same logical node
/// - `workspace`: Workspace this projection was read in
/// - `language`: Language this projection was read in (`None` = untranslated)
/// - `name`: Last path segment (empty for the root node)
/// - `path`: Absolute path (`/` for the root node)
/// - `node_type`: Declared primary type name (e.g. `jnt:page`)
/// - `mixins`: Additional mixin types, in declaration order
/// - `parent_id`: Parent identifier (navigation only, not ownership)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: String,

    pub workspace: Workspace,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,

    pub name: String,

    pub path: String,

    pub node_type: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mixins: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
}

impl Node {
    /// Create a new Node with auto-generated UUID
    ///
    /// The name is derived from the last segment of `path`; the parent is left
    /// unset (stores fill it in when they link the node into the tree).
    pub fn new(workspace: Workspace, path: impl Into<String>, node_type: impl Into<String>) -> Self {
        Self::new_with_id(Uuid::new_v4().to_string(), workspace, path, node_type)
    }

    /// Create a new Node with specified ID
    pub fn new_with_id(
        id: impl Into<String>,
        workspace: Workspace,
        path: impl Into<String>,
        node_type: impl Into<String>,
    ) -> Self {
        let path = path.into();
        let name = name_from_path(&path).to_string();

        Self {
            id: id.into(),
            workspace,
            language: None,
            name,
            path,
            node_type: node_type.into(),
            mixins: Vec::new(),
            parent_id: None,
        }
    }

    /// Add mixin types (builder style)
    pub fn with_mixins<I, S>(mut self, mixins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.mixins = mixins.into_iter().map(Into::into).collect();
        self
    }

    /// Context this projection was read through
    pub fn context(&self) -> AccessContext {
        AccessContext {
            workspace: self.workspace.clone(),
            language: self.language.clone(),
        }
    }

    /// Whether this is the tree root (`/`)
    pub fn is_root(&self) -> bool {
        self.path == "/"
    }

    /// Whether this node sits directly under the root
    pub fn is_root_level(&self) -> bool {
        parent_path(&self.path).map(|p| p == "/").unwrap_or(false)
    }

    /// Declared primary type followed by mixins
    pub fn declared_types(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.node_type.as_str()).chain(self.mixins.iter().map(String::as_str))
    }

    /// Validate structural fields
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if:
    /// - `id` or `node_type` is empty
    /// - `path` is not absolute
    /// - `name` does not match the last path segment
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.id.is_empty() {
            return Err(ValidationError::MissingField("id".to_string()));
        }

        if self.node_type.is_empty() {
            return Err(ValidationError::MissingField("node_type".to_string()));
        }

        if !self.path.starts_with('/') {
            return Err(ValidationError::InvalidPath(format!(
                "path must be absolute: {}",
                self.path
            )));
        }

        if self.name != name_from_path(&self.path) {
            return Err(ValidationError::InvalidPath(format!(
                "name '{}' does not match path '{}'",
                self.name, self.path
            )));
        }

        Ok(())
    }
}

/// Last segment of an absolute path (empty for `/`)
pub fn name_from_path(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    match trimmed.rfind('/') {
        Some(idx) => &trimmed[idx + 1..],
        None => trimmed,
    }
}

/// Parent path of an absolute path, `None` for the root
pub fn parent_path(path: &str) -> Option<&str> {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        return None;
    }
    match trimmed.rfind('/') {
        Some(0) => Some("/"),
        Some(idx) => Some(&trimmed[..idx]),
        None => None,
    }
}

/// Join a relative path onto an absolute one
pub fn join_path(base: &str, relative: &str) -> String {
    let relative = relative.trim_start_matches('/');
    if base.ends_with('/') {
        format!("{}{}", base, relative)
    } else {
        format!("{}/{}", base, relative)
    }
}
