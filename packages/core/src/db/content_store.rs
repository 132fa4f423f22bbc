//! ContentStore Trait - Store Abstraction Layer
//!
//! This module defines the `ContentStore` trait: the contract the engine
//! requires from the externally-owned content tree. The engine is read-only over
//! the store; persistence, transactions and writes belong to the implementation.
//!
//! # Design Decisions
//!
//! 1. **Synchronous**: each query runs on the caller's thread; hosts that need
//!    async wrap the whole engine call, not individual store reads
//! 2. **Explicit Context**: lookups take an [`AccessContext`] (workspace + language)
//!    instead of relying on session state
//! 3. **Absence vs. failure**: a missing node or property is `Ok(None)`; `Err` is
//!    reserved for store failures, which the engine wraps as `DataFetching`
//!
//! # Examples
//!
//! ```rust
//! use treeql_core::db::{ContentStore, InMemoryStore, StoredNode};
//! use treeql_core::models::{AccessContext, Workspace};
//!
//! let mut store = InMemoryStore::new();
//! store.insert(&Workspace::edit(), StoredNode::new("sites", "/sites", "jnt:virtualsitesFolder")).unwrap();
//!
//! let ctx = AccessContext::new(Workspace::edit());
//! let sites = store.get_by_path(&ctx, "/sites").unwrap().unwrap();
//! assert_eq!(sites.id, "sites");
//! ```

use crate::db::StoreError;
use crate::models::{AccessContext, Node, NodeTypeDefinition, Property, Workspace};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Structured query languages a store must understand
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum QueryDialect {
    /// SQL-like dialect
    #[default]
    Sql2,
    /// Path-oriented dialect
    #[serde(rename = "XPATH")]
    XPath,
}

impl fmt::Display for QueryDialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sql2 => f.write_str("JCR-SQL2"),
            Self::XPath => f.write_str("xpath"),
        }
    }
}

/// Read contract over the external content tree
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`: one store instance is shared by every
/// request thread through the query service.
///
/// # Ordering
///
/// `children` returns the store's native child order and `ancestors` returns
/// root-to-parent order; the engine preserves both.
pub trait ContentStore: Send + Sync {
    /// Get node by identifier in the given context
    ///
    /// # Returns
    ///
    /// - `Ok(Some(node))` if the node exists in `ctx.workspace`
    /// - `Ok(None)` if it doesn't (not an error)
    /// - `Err(_)` if the store fails
    fn get_by_id(&self, ctx: &AccessContext, id: &str) -> Result<Option<Node>, StoreError>;

    /// Get node by absolute path in the given context
    fn get_by_path(&self, ctx: &AccessContext, path: &str) -> Result<Option<Node>, StoreError>;

    /// Direct children in native order, projected in the parent's context
    fn children(&self, node: &Node) -> Result<Vec<Node>, StoreError>;

    /// Ancestors from the root down to the direct parent
    fn ancestors(&self, node: &Node) -> Result<Vec<Node>, StoreError>;

    /// Single property lookup
    ///
    /// `language` overrides the node's own language context when supplied.
    fn property(
        &self,
        node: &Node,
        name: &str,
        language: Option<&str>,
    ) -> Result<Option<Property>, StoreError>;

    /// All properties visible under the node's (or the supplied) language
    fn properties(&self, node: &Node, language: Option<&str>) -> Result<Vec<Property>, StoreError>;

    /// Execute a structured query in the given context
    fn structured_query(
        &self,
        ctx: &AccessContext,
        query: &str,
        dialect: QueryDialect,
    ) -> Result<Vec<Node>, StoreError>;

    /// Same logical node (by identifier) in another workspace
    fn in_workspace(&self, node: &Node, workspace: &Workspace) -> Result<Option<Node>, StoreError>;

    /// Reference and weak-reference properties pointing at `node`
    fn references(&self, node: &Node) -> Result<Vec<Property>, StoreError>;

    /// Content type definition by name
    fn node_type(&self, name: &str) -> Result<Option<NodeTypeDefinition>, StoreError>;

    /// Every registered content type definition
    fn node_types(&self) -> Result<Vec<NodeTypeDefinition>, StoreError>;
}
