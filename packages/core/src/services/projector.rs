//! Property Projector
//!
//! Re-projects nodes under another language and follows reference-typed
//! property values to their target nodes.

use crate::db::ContentStore;
use crate::models::{AccessContext, Node, Property, PropertyValue};
use crate::services::error::{QueryError, QueryResult};
use crate::services::type_resolver::{ResolvedNode, TypeResolver};

pub struct PropertyProjector<'a> {
    store: &'a dyn ContentStore,
    resolver: &'a TypeResolver,
}

impl<'a> PropertyProjector<'a> {
    pub fn new(store: &'a dyn ContentStore, resolver: &'a TypeResolver) -> Self {
        Self { store, resolver }
    }

    /// Same node, read under `language` in its own workspace
    ///
    /// Without a language (or when already in it) the node is returned as is.
    /// The identifier never changes; internationalized property values may.
    pub fn project(&self, node: &Node, language: Option<&str>) -> QueryResult<Node> {
        let Some(language) = language else {
            return Ok(node.clone());
        };
        if node.language.as_deref() == Some(language) {
            return Ok(node.clone());
        }

        let ctx = AccessContext::new(node.workspace.clone()).with_language(Some(language.to_string()));
        self.store
            .get_by_id(&ctx, &node.id)?
            .ok_or_else(|| QueryError::node_not_found(node.id.clone()))
    }

    /// Follow one value of a reference-capable property
    ///
    /// The target is looked up by identifier in the owning node's workspace.
    ///
    /// # Errors
    ///
    /// Returns `QueryError::UnresolvedReference` if the property type cannot
    /// hold references or the target does not exist.
    pub fn resolve_reference(&self, property: &Property, value: &str) -> QueryResult<ResolvedNode> {
        if !property.property_type.can_reference() {
            return Err(QueryError::unresolved_reference(format!(
                "The '{}' property is not of a reference type",
                property.name
            )));
        }

        let ctx = AccessContext::new(property.owner_workspace.clone())
            .with_language(property.language.clone());
        let target = self.store.get_by_id(&ctx, value)?.ok_or_else(|| {
            QueryError::unresolved_reference(format!(
                "The value of the '{}' property does not reference an existing node",
                property.name
            ))
        })?;

        self.resolver.resolve(target)
    }

    /// Target of a single-valued property; `None` for multi-valued ones
    pub fn ref_node(&self, property: &Property) -> QueryResult<Option<ResolvedNode>> {
        match &property.value {
            PropertyValue::Single(value) => self.resolve_reference(property, value).map(Some),
            PropertyValue::Multiple(_) => Ok(None),
        }
    }

    /// Targets of a multi-valued property, in value order; `None` for
    /// single-valued ones
    pub fn ref_nodes(&self, property: &Property) -> QueryResult<Option<Vec<ResolvedNode>>> {
        match &property.value {
            PropertyValue::Single(_) => Ok(None),
            PropertyValue::Multiple(values) => values
                .iter()
                .map(|value| self.resolve_reference(property, value))
                .collect::<QueryResult<Vec<_>>>()
                .map(Some),
        }
    }
}
