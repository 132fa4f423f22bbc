//! Data Models
//!
//! This module contains the core data structures used throughout TreeQL:
//!
//! - `Node` - Transient projection of a content tree entry
//! - `Property` - Typed, possibly multi-valued, possibly translated value
//! - `NodeTypeDefinition` - Content type with its supertypes
//! - Filter inputs (`NodeTypesInput`, `NodePropertiesInput`)
//! - Pagination (`PageWindow`, `Page`)

mod filter;
pub mod node;
mod node_type;
mod page;
mod property;

pub use filter::{
    MulticriteriaEvaluation, NodePropertiesInput, NodePropertyInput, NodeTypesInput,
    PropertyEvaluation,
};
pub use node::{AccessContext, Node, ValidationError, Workspace};
pub use node_type::{NodeTypeDefinition, NodeTypesListInput};
pub use page::{Edge, Page, PageDirection, PageInfo, PageWindow};
pub use property::{Property, PropertyType, PropertyValue};
