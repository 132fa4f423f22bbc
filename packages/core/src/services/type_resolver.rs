//! Type Resolver - Polymorphic Node Representations
//!
//! Maps a node's primary content type to the most specific registered
//! [`NodeRepresentation`]. Content-type modules register representations at any
//! time; the registry is open-ended.
//!
//! # Resolution order
//!
//! 1. Exact match on the primary type name
//! 2. Breadth-first walk of its supertypes, in declaration order
//! 3. [`GenericRepresentation`] under the node's raw type name
//!
//! Results are cached per type name and the cache is cleared on every
//! registration. A lookup that overlaps a registration is returned but not
//! cached, so a completed registration is always visible to later lookups.

use crate::db::ContentStore;
use crate::models::{AccessContext, Node, Property, PropertyValue};
use crate::services::error::{QueryError, QueryResult};
use crate::services::filter::walk_type_hierarchy;
use crate::services::identity::IdentityCodec;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

/// Shape a resolved node exposes to clients
pub trait NodeRepresentation: fmt::Debug + Send + Sync {
    /// Representation name (e.g. `JntPage`)
    fn name(&self) -> &str;

    /// Field map for `node`
    fn fields(&self, node: &Node, store: &dyn ContentStore) -> QueryResult<Map<String, Value>>;
}

/// Universal node fields: id, name, path, type, mixins, workspace, properties
#[derive(Debug, Clone, Copy, Default)]
pub struct GenericRepresentation;

impl GenericRepresentation {
    pub const NAME: &'static str = "GenericNode";
}

impl NodeRepresentation for GenericRepresentation {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn fields(&self, node: &Node, store: &dyn ContentStore) -> QueryResult<Map<String, Value>> {
        let mut fields = Map::new();
        fields.insert("id".to_string(), Value::from(node.id.clone()));
        fields.insert("name".to_string(), Value::from(node.name.clone()));
        fields.insert("path".to_string(), Value::from(node.path.clone()));
        fields.insert("type".to_string(), Value::from(node.node_type.clone()));
        fields.insert("mixins".to_string(), Value::from(node.mixins.clone()));
        fields.insert(
            "workspace".to_string(),
            Value::from(node.workspace.as_str()),
        );
        if let Some(language) = &node.language {
            fields.insert("language".to_string(), Value::from(language.clone()));
        }

        let properties: Map<String, Value> = store
            .properties(node, None)?
            .iter()
            .map(|p| (p.name.clone(), property_json(p)))
            .collect();
        fields.insert("properties".to_string(), Value::Object(properties));

        Ok(fields)
    }
}

/// Generic fields plus selected properties promoted to top-level fields
///
/// Promoted properties that are absent on a node are `null`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecializedRepresentation {
    name: String,
    exposed_properties: Vec<String>,
}

impl SpecializedRepresentation {
    pub fn new<I, S>(name: impl Into<String>, exposed_properties: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            exposed_properties: exposed_properties.into_iter().map(Into::into).collect(),
        }
    }
}

impl NodeRepresentation for SpecializedRepresentation {
    fn name(&self) -> &str {
        &self.name
    }

    fn fields(&self, node: &Node, store: &dyn ContentStore) -> QueryResult<Map<String, Value>> {
        let mut fields = GenericRepresentation.fields(node, store)?;
        for name in &self.exposed_properties {
            let value = store
                .property(node, name, None)?
                .map(|p| property_json(&p))
                .unwrap_or(Value::Null);
            fields.insert(name.clone(), value);
        }
        Ok(fields)
    }
}

fn property_json(property: &Property) -> Value {
    match &property.value {
        PropertyValue::Single(v) => Value::from(v.clone()),
        PropertyValue::Multiple(vs) => Value::from(vs.clone()),
    }
}

/// A node together with the representation it resolved to
#[derive(Debug, Clone)]
pub struct ResolvedNode {
    pub node: Node,

    /// Client-visible type name: the representation's name, or the node's raw
    /// type for the generic fallback
    pub type_name: String,

    representation: Arc<dyn NodeRepresentation>,
    generic: bool,
}

impl ResolvedNode {
    pub fn representation(&self) -> &Arc<dyn NodeRepresentation> {
        &self.representation
    }

    pub fn is_generic(&self) -> bool {
        self.generic
    }

    /// Representation-specific field map
    pub fn fields(&self, store: &dyn ContentStore) -> QueryResult<Map<String, Value>> {
        self.representation.fields(&self.node, store)
    }
}

type Registration = Option<Arc<dyn NodeRepresentation>>;

/// Registry of representations with a per-type resolution cache
pub struct TypeResolver {
    store: Arc<dyn ContentStore>,
    identity: IdentityCodec,
    registry: RwLock<HashMap<String, Arc<dyn NodeRepresentation>>>,
    cache: RwLock<HashMap<String, Registration>>,
    /// Bumped by every registration
    generation: AtomicU64,
    generic: Arc<dyn NodeRepresentation>,
}

impl TypeResolver {
    pub fn new(store: Arc<dyn ContentStore>, identity: IdentityCodec) -> Self {
        Self {
            store,
            identity,
            registry: RwLock::new(HashMap::new()),
            cache: RwLock::new(HashMap::new()),
            generation: AtomicU64::new(0),
            generic: Arc::new(GenericRepresentation),
        }
    }

    /// Register (or replace) the representation for a content type
    pub fn register(&self, type_name: impl Into<String>, representation: Arc<dyn NodeRepresentation>) {
        let type_name = type_name.into();
        tracing::info!(
            "Registering representation {} for {}",
            representation.name(),
            type_name
        );

        self.registry
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(type_name, representation);
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Content types with a registered representation, sorted
    pub fn registered_types(&self) -> Vec<String> {
        let mut types: Vec<String> = self
            .registry
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        types.sort();
        types
    }

    /// Wrap `node` in its most specific representation
    ///
    /// Never fails for an unregistered type; errors are store failures while
    /// reading type definitions.
    pub fn resolve(&self, node: Node) -> QueryResult<ResolvedNode> {
        let registration = self.lookup(&node.node_type)?;
        Ok(match registration {
            Some(representation) => ResolvedNode {
                type_name: representation.name().to_string(),
                node,
                representation,
                generic: false,
            },
            None => ResolvedNode {
                type_name: node.node_type.clone(),
                node,
                representation: self.generic.clone(),
                generic: true,
            },
        })
    }

    /// Decode a global id, fetch the node in its workspace, and resolve it
    ///
    /// # Errors
    ///
    /// - `InvalidIdentifier` if the id is malformed
    /// - `NotFound` if no node carries that id in that workspace
    pub fn resolve_global_id(&self, global_id: &str) -> QueryResult<ResolvedNode> {
        let (workspace, id) = self.identity.decode(global_id)?;
        let node = self
            .store
            .get_by_id(&AccessContext::new(workspace), &id)?
            .ok_or_else(|| QueryError::node_not_found(id))?;
        self.resolve(node)
    }

    fn lookup(&self, type_name: &str) -> QueryResult<Registration> {
        if let Some(cached) = self
            .cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(type_name)
        {
            return Ok(cached.clone());
        }

        let generation = self.generation.load(Ordering::SeqCst);
        let registry = self
            .registry
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        let resolved = walk_type_hierarchy(self.store.as_ref(), [type_name], |t| {
            registry.contains_key(t)
        })?
        .and_then(|matched| registry.get(&matched).cloned());

        tracing::debug!(
            "Resolved type {} to {}",
            type_name,
            resolved.as_ref().map(|r| r.name()).unwrap_or(GenericRepresentation::NAME)
        );

        let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        if self.generation.load(Ordering::SeqCst) == generation {
            cache.insert(type_name.to_string(), resolved.clone());
        }
        Ok(resolved)
    }
}
