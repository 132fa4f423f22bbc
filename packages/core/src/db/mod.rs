//! Store Layer
//!
//! This module holds the contract between the engine and the external content
//! store:
//!
//! - [`ContentStore`] - read-only trait every backend implements
//! - [`StoreError`] - backend failures (absence is never an error)
//! - [`InMemoryStore`] - reference implementation used by tests, benches and tools
//!
//! The engine never writes through this layer.

mod content_store;
mod error;
mod memory_store;

pub use content_store::{ContentStore, QueryDialect};
pub use error::StoreError;
pub use memory_store::{InMemoryStore, StoredNode, StoredProperty, ROOT_ID, ROOT_TYPE};
