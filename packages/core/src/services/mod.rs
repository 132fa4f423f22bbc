//! Query Services
//!
//! This module contains the engine components and the query surface built on
//! them:
//!
//! - `IdentityCodec` - Opaque global identifiers
//! - `PaginationCodec` - Cursor pagination over materialized sequences
//! - `FilterEngine` - Name, type and property predicates
//! - `TreeWalker` - Children and descendant traversal
//! - `PropertyProjector` - Language projection and reference resolution
//! - `TypeResolver` - Runtime registry of node representations
//! - `NodeQueryService` - Entry points and per-node fields
//!
//! Components borrow the store and the evaluation table from the service; the
//! type registry is the only shared mutable state.

pub mod error;
pub mod filter;
pub mod identity;
pub mod pagination;
pub mod projector;
pub mod query_service;
pub mod tree_walker;
pub mod type_resolver;

#[cfg(test)]
mod filter_test;

pub use error::{ErrorType, QueryError, QueryResult};
pub use filter::{EvaluationTable, FilterEngine, NodePredicate, PropertyCriterion};
pub use identity::IdentityCodec;
pub use pagination::{PaginationArguments, PaginationCodec};
pub use projector::PropertyProjector;
pub use query_service::{NodeFilter, NodeQueryService, TITLE_PROPERTY};
pub use tree_walker::TreeWalker;
pub use type_resolver::{
    GenericRepresentation, NodeRepresentation, ResolvedNode, SpecializedRepresentation,
    TypeResolver,
};
