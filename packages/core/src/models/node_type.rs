//! Content type definitions
//!
//! Type definitions are owned by the store; the engine reads them to answer
//! `is_node_type` questions and to walk supertypes during type resolution.

use serde::{Deserialize, Serialize};

/// Declared content type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeTypeDefinition {
    pub name: String,

    /// Direct supertypes, in declaration order
    #[serde(default)]
    pub supertypes: Vec<String>,

    #[serde(default)]
    pub is_mixin: bool,

    #[serde(default)]
    pub is_abstract: bool,

    #[serde(default)]
    pub has_orderable_child_nodes: bool,

    #[serde(default = "default_queryable")]
    pub is_queryable: bool,
}

fn default_queryable() -> bool {
    true
}

impl NodeTypeDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            supertypes: Vec::new(),
            is_mixin: false,
            is_abstract: false,
            has_orderable_child_nodes: false,
            is_queryable: true,
        }
    }

    /// Create a mixin type definition
    pub fn mixin(name: impl Into<String>) -> Self {
        Self {
            is_mixin: true,
            ..Self::new(name)
        }
    }

    pub fn with_supertypes<I, S>(mut self, supertypes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.supertypes = supertypes.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_abstract(mut self, is_abstract: bool) -> Self {
        self.is_abstract = is_abstract;
        self
    }

    pub fn with_orderable_child_nodes(mut self, orderable: bool) -> Self {
        self.has_orderable_child_nodes = orderable;
        self
    }
}

/// Filter for listing node types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeTypesListInput {
    #[serde(default = "default_true")]
    pub include_mixins: bool,

    #[serde(default = "default_true")]
    pub include_non_mixins: bool,
}

fn default_true() -> bool {
    true
}

impl Default for NodeTypesListInput {
    fn default() -> Self {
        Self {
            include_mixins: true,
            include_non_mixins: true,
        }
    }
}

impl NodeTypesListInput {
    pub fn accepts(&self, definition: &NodeTypeDefinition) -> bool {
        if definition.is_mixin {
            self.include_mixins
        } else {
            self.include_non_mixins
        }
    }
}
