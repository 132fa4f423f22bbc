//! In-Memory Reference Store
//!
//! A complete [`ContentStore`] implementation over plain maps, one tree per
//! workspace. It backs the test suites, the benchmarks and the dev tool, and
//! documents the exact semantics the engine expects from a real backend.
//!
//! # Structured queries
//!
//! Only the subset the engine exercises is understood:
//!
//! - SQL2: `SELECT * FROM [type] [AS alias] [WHERE ISDESCENDANTNODE([alias,] '/path')]`
//! - XPath: `/jcr:root[/path]//element(*, type)`
//!
//! Results come back in document order (pre-order, native child order).
//!
//! # Fixtures
//!
//! ```json
//! {
//!   "types": [{ "name": "jnt:page", "supertypes": ["jnt:content"] }],
//!   "workspaces": {
//!     "default": [
//!       { "id": "home", "path": "/home", "type": "jnt:page",
//!         "properties": [{ "name": "jcr:title", "type": "STRING",
//!                          "value": "Home", "translations": { "fr": "Accueil" } }] }
//!     ]
//!   }
//! }
//! ```
//!
//! Nodes are listed parent-first; the root `/` exists implicitly.

use crate::db::{ContentStore, QueryDialect, StoreError};
use crate::models::node::{name_from_path, parent_path};
use crate::models::{
    AccessContext, Node, NodeTypeDefinition, Property, PropertyType, PropertyValue, Workspace,
};
use anyhow::Context;
use regex::Regex;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::sync::OnceLock;

/// Identifier of the root node in every workspace
pub const ROOT_ID: &str = "cafebabe-cafe-babe-cafe-babecafebabe";

/// Primary type of the root node
pub const ROOT_TYPE: &str = "rep:root";

fn default_property_type() -> PropertyType {
    PropertyType::String
}

/// Property as persisted: an optional base value plus per-language translations
///
/// A property with at least one translation is internationalized.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredProperty {
    pub name: String,

    #[serde(rename = "type", default = "default_property_type")]
    pub property_type: PropertyType,

    #[serde(default)]
    pub value: Option<PropertyValue>,

    #[serde(default)]
    pub translations: BTreeMap<String, PropertyValue>,
}

impl StoredProperty {
    /// Single-valued, untranslated property
    pub fn new(name: impl Into<String>, property_type: PropertyType, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            property_type,
            value: Some(PropertyValue::Single(value.into())),
            translations: BTreeMap::new(),
        }
    }

    /// Multi-valued, untranslated property
    pub fn multiple<I, S>(name: impl Into<String>, property_type: PropertyType, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            property_type,
            value: Some(PropertyValue::Multiple(
                values.into_iter().map(Into::into).collect(),
            )),
            translations: BTreeMap::new(),
        }
    }

    /// Internationalized property without a base value
    pub fn translated(name: impl Into<String>, property_type: PropertyType) -> Self {
        Self {
            name: name.into(),
            property_type,
            value: None,
            translations: BTreeMap::new(),
        }
    }

    /// Add a translation (builder style)
    pub fn with_translation(mut self, language: impl Into<String>, value: impl Into<String>) -> Self {
        self.translations
            .insert(language.into(), PropertyValue::Single(value.into()));
        self
    }

    pub fn is_internationalized(&self) -> bool {
        !self.translations.is_empty()
    }

    /// Value visible under `language`
    ///
    /// Internationalized properties only expose their translation when a
    /// language is given, and their base value otherwise.
    fn visible_value(&self, language: Option<&str>) -> Option<(PropertyValue, Option<String>)> {
        if !self.is_internationalized() {
            return self.value.clone().map(|v| (v, None));
        }
        match language {
            Some(lang) => self
                .translations
                .get(lang)
                .cloned()
                .map(|v| (v, Some(lang.to_string()))),
            None => self.value.clone().map(|v| (v, None)),
        }
    }
}

/// Node as persisted in one workspace tree
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredNode {
    pub id: String,

    pub path: String,

    #[serde(rename = "type")]
    pub node_type: String,

    #[serde(default)]
    pub mixins: Vec<String>,

    #[serde(default)]
    pub properties: Vec<StoredProperty>,

    #[serde(skip)]
    parent_id: Option<String>,

    #[serde(skip)]
    children: Vec<String>,
}

impl StoredNode {
    pub fn new(id: impl Into<String>, path: impl Into<String>, node_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            path: path.into(),
            node_type: node_type.into(),
            mixins: Vec::new(),
            properties: Vec::new(),
            parent_id: None,
            children: Vec::new(),
        }
    }

    pub fn with_mixins<I, S>(mut self, mixins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.mixins = mixins.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_property(mut self, property: StoredProperty) -> Self {
        self.properties.push(property);
        self
    }

    fn project(&self, workspace: &Workspace, language: Option<&str>) -> Node {
        Node {
            id: self.id.clone(),
            workspace: workspace.clone(),
            language: language.map(str::to_string),
            name: name_from_path(&self.path).to_string(),
            path: self.path.clone(),
            node_type: self.node_type.clone(),
            mixins: self.mixins.clone(),
            parent_id: self.parent_id.clone(),
        }
    }

    fn project_property(
        &self,
        property: &StoredProperty,
        workspace: &Workspace,
        language: Option<&str>,
    ) -> Option<Property> {
        let (value, language) = property.visible_value(language)?;
        Some(Property {
            name: property.name.clone(),
            property_type: property.property_type,
            value,
            owner_id: self.id.clone(),
            owner_workspace: workspace.clone(),
            language,
            internationalized: property.is_internationalized(),
        })
    }
}

#[derive(Debug, Clone, Default)]
struct WorkspaceTree {
    nodes: HashMap<String, StoredNode>,
    by_path: HashMap<String, String>,
}

impl WorkspaceTree {
    fn with_root() -> Self {
        let mut tree = Self::default();
        let root = StoredNode::new(ROOT_ID, "/", ROOT_TYPE);
        tree.by_path.insert("/".to_string(), ROOT_ID.to_string());
        tree.nodes.insert(ROOT_ID.to_string(), root);
        tree
    }

    fn node_at(&self, path: &str) -> Option<&StoredNode> {
        self.by_path.get(path).and_then(|id| self.nodes.get(id))
    }

    /// Node ids in document order (pre-order, native child order)
    fn document_order(&self) -> Vec<&StoredNode> {
        let mut ordered = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![ROOT_ID];
        while let Some(id) = stack.pop() {
            if let Some(node) = self.nodes.get(id) {
                ordered.push(node);
                for child in node.children.iter().rev() {
                    stack.push(child.as_str());
                }
            }
        }
        ordered
    }
}

#[derive(Debug, Deserialize)]
struct StoreFixture {
    #[serde(default)]
    types: Vec<NodeTypeDefinition>,

    #[serde(default)]
    workspaces: BTreeMap<String, Vec<StoredNode>>,
}

/// Parsed subset of a structured query
#[derive(Debug, Clone, PartialEq, Eq)]
struct ParsedQuery {
    node_type: String,
    under: Option<String>,
}

/// In-memory content store
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    types: BTreeMap<String, NodeTypeDefinition>,
    workspaces: HashMap<Workspace, WorkspaceTree>,
    failing: HashSet<String>,
}

impl InMemoryStore {
    /// Create an empty store (roots are created per workspace on first insert)
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a store from a JSON fixture
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        let fixture: StoreFixture =
            serde_json::from_str(json).context("Failed to parse content store fixture")?;

        let mut store = Self::new();
        for definition in fixture.types {
            store.register_type(definition);
        }
        for (workspace, nodes) in fixture.workspaces {
            let workspace = Workspace::new(workspace.clone())
                .with_context(|| format!("Invalid workspace in fixture: {}", workspace))?;
            for node in nodes {
                let path = node.path.clone();
                store
                    .insert(&workspace, node)
                    .with_context(|| format!("Failed to insert fixture node {}", path))?;
            }
        }
        Ok(store)
    }

    /// Register (or replace) a content type definition
    pub fn register_type(&mut self, definition: NodeTypeDefinition) -> &mut Self {
        self.types.insert(definition.name.clone(), definition);
        self
    }

    /// Insert a node under its parent path, appended after existing siblings
    ///
    /// # Errors
    ///
    /// Returns `StoreError::ConstraintViolation` if the path is not absolute, is
    /// the root, is already taken, has no parent node, or the id is already used
    /// in this workspace.
    pub fn insert(&mut self, workspace: &Workspace, mut node: StoredNode) -> Result<(), StoreError> {
        if !node.path.starts_with('/') || node.path == "/" {
            return Err(StoreError::constraint_violation(format!(
                "cannot insert node at '{}'",
                node.path
            )));
        }

        let tree = self
            .workspaces
            .entry(workspace.clone())
            .or_insert_with(WorkspaceTree::with_root);

        if tree.nodes.contains_key(&node.id) {
            return Err(StoreError::constraint_violation(format!(
                "identifier '{}' already exists in workspace '{}'",
                node.id, workspace
            )));
        }
        if tree.by_path.contains_key(&node.path) {
            return Err(StoreError::constraint_violation(format!(
                "path '{}' already exists in workspace '{}'",
                node.path, workspace
            )));
        }

        let parent_path = parent_path(&node.path).unwrap_or("/");
        let parent_id = tree.by_path.get(parent_path).cloned().ok_or_else(|| {
            StoreError::constraint_violation(format!(
                "parent '{}' of '{}' does not exist",
                parent_path, node.path
            ))
        })?;

        node.parent_id = Some(parent_id.clone());
        node.children.clear();
        if let Some(parent) = tree.nodes.get_mut(&parent_id) {
            parent.children.push(node.id.clone());
        }
        tree.by_path.insert(node.path.clone(), node.id.clone());
        tree.nodes.insert(node.id.clone(), node);
        Ok(())
    }

    /// Remove a node and its whole subtree; returns whether it existed
    pub fn remove(&mut self, workspace: &Workspace, id: &str) -> bool {
        let Some(tree) = self.workspaces.get_mut(workspace) else {
            return false;
        };
        let Some(node) = tree.nodes.get(id) else {
            return false;
        };

        if let Some(parent_id) = node.parent_id.clone() {
            if let Some(parent) = tree.nodes.get_mut(&parent_id) {
                parent.children.retain(|c| c != id);
            }
        }

        let mut stack = vec![id.to_string()];
        while let Some(current) = stack.pop() {
            if let Some(removed) = tree.nodes.remove(&current) {
                tree.by_path.remove(&removed.path);
                stack.extend(removed.children);
            }
        }
        true
    }

    /// Make every call of `operation` (a trait method name) fail
    pub fn fail_on(&mut self, operation: impl Into<String>) -> &mut Self {
        self.failing.insert(operation.into());
        self
    }

    fn check(&self, operation: &str) -> Result<(), StoreError> {
        if self.failing.contains(operation) {
            return Err(StoreError::unavailable(operation, "injected failure"));
        }
        Ok(())
    }

    fn tree(&self, workspace: &Workspace) -> Option<&WorkspaceTree> {
        self.workspaces.get(workspace)
    }

    fn stored(&self, node: &Node) -> Option<&StoredNode> {
        self.tree(&node.workspace).and_then(|t| t.nodes.get(&node.id))
    }

    /// Declared types or any transitive supertype equal `target`
    fn is_node_type(&self, node: &StoredNode, target: &str) -> bool {
        let mut seen = HashSet::new();
        let mut queue: VecDeque<&str> = std::iter::once(node.node_type.as_str())
            .chain(node.mixins.iter().map(String::as_str))
            .collect();

        while let Some(name) = queue.pop_front() {
            if name == target {
                return true;
            }
            if !seen.insert(name) {
                continue;
            }
            if let Some(definition) = self.types.get(name) {
                queue.extend(definition.supertypes.iter().map(String::as_str));
            }
        }
        false
    }

    fn parse_query(query: &str, dialect: QueryDialect) -> Result<ParsedQuery, StoreError> {
        static SQL2: OnceLock<Regex> = OnceLock::new();
        static XPATH: OnceLock<Regex> = OnceLock::new();

        match dialect {
            QueryDialect::Sql2 => {
                let regex = SQL2.get_or_init(|| {
                    Regex::new(
                        r"(?i)^\s*SELECT\s+\*\s+FROM\s+\[([^\]]+)\](?:\s+AS\s+\w+)?(?:\s+WHERE\s+ISDESCENDANTNODE\(\s*(?:\w+\s*,\s*)?'([^']+)'\s*\))?\s*$",
                    )
                    .expect("SQL2 pattern is valid")
                });
                let captures = regex.captures(query).ok_or_else(|| {
                    StoreError::invalid_query(dialect.to_string(), format!("unsupported query: {}", query))
                })?;
                Ok(ParsedQuery {
                    node_type: captures[1].trim().to_string(),
                    under: captures.get(2).map(|m| m.as_str().to_string()),
                })
            }
            QueryDialect::XPath => {
                let regex = XPATH.get_or_init(|| {
                    Regex::new(r"^\s*/jcr:root((?:/[^/()]+)*)//element\(\s*\*\s*,\s*([^)\s]+)\s*\)\s*$")
                        .expect("XPath pattern is valid")
                });
                let captures = regex.captures(query).ok_or_else(|| {
                    StoreError::invalid_query(dialect.to_string(), format!("unsupported query: {}", query))
                })?;
                let under = captures
                    .get(1)
                    .map(|m| m.as_str())
                    .filter(|p| !p.is_empty())
                    .map(str::to_string);
                Ok(ParsedQuery {
                    node_type: captures[2].to_string(),
                    under,
                })
            }
        }
    }
}

impl ContentStore for InMemoryStore {
    fn get_by_id(&self, ctx: &AccessContext, id: &str) -> Result<Option<Node>, StoreError> {
        self.check("get_by_id")?;
        Ok(self
            .tree(&ctx.workspace)
            .and_then(|t| t.nodes.get(id))
            .map(|n| n.project(&ctx.workspace, ctx.language.as_deref())))
    }

    fn get_by_path(&self, ctx: &AccessContext, path: &str) -> Result<Option<Node>, StoreError> {
        self.check("get_by_path")?;
        let normalized = if path.len() > 1 {
            path.trim_end_matches('/')
        } else {
            path
        };
        Ok(self
            .tree(&ctx.workspace)
            .and_then(|t| t.node_at(normalized))
            .map(|n| n.project(&ctx.workspace, ctx.language.as_deref())))
    }

    fn children(&self, node: &Node) -> Result<Vec<Node>, StoreError> {
        self.check("children")?;
        let Some(tree) = self.tree(&node.workspace) else {
            return Ok(Vec::new());
        };
        let Some(stored) = tree.nodes.get(&node.id) else {
            return Ok(Vec::new());
        };
        Ok(stored
            .children
            .iter()
            .filter_map(|id| tree.nodes.get(id))
            .map(|c| c.project(&node.workspace, node.language.as_deref()))
            .collect())
    }

    fn ancestors(&self, node: &Node) -> Result<Vec<Node>, StoreError> {
        self.check("ancestors")?;
        let Some(tree) = self.tree(&node.workspace) else {
            return Ok(Vec::new());
        };

        let mut ancestors = Vec::new();
        let mut current = tree.nodes.get(&node.id).and_then(|n| n.parent_id.clone());
        while let Some(id) = current {
            match tree.nodes.get(&id) {
                Some(parent) => {
                    ancestors.push(parent.project(&node.workspace, node.language.as_deref()));
                    current = parent.parent_id.clone();
                }
                None => break,
            }
        }
        ancestors.reverse();
        Ok(ancestors)
    }

    fn property(
        &self,
        node: &Node,
        name: &str,
        language: Option<&str>,
    ) -> Result<Option<Property>, StoreError> {
        self.check("property")?;
        let language = language.or(node.language.as_deref());
        Ok(self.stored(node).and_then(|stored| {
            stored
                .properties
                .iter()
                .find(|p| p.name == name)
                .and_then(|p| stored.project_property(p, &node.workspace, language))
        }))
    }

    fn properties(&self, node: &Node, language: Option<&str>) -> Result<Vec<Property>, StoreError> {
        self.check("properties")?;
        let language = language.or(node.language.as_deref());
        Ok(self
            .stored(node)
            .map(|stored| {
                stored
                    .properties
                    .iter()
                    .filter_map(|p| stored.project_property(p, &node.workspace, language))
                    .collect()
            })
            .unwrap_or_default())
    }

    fn structured_query(
        &self,
        ctx: &AccessContext,
        query: &str,
        dialect: QueryDialect,
    ) -> Result<Vec<Node>, StoreError> {
        self.check("structured_query")?;
        let parsed = Self::parse_query(query, dialect)?;
        let Some(tree) = self.tree(&ctx.workspace) else {
            return Ok(Vec::new());
        };

        let prefix = parsed.under.as_deref().map(|p| {
            if p.ends_with('/') {
                p.to_string()
            } else {
                format!("{}/", p)
            }
        });

        Ok(tree
            .document_order()
            .into_iter()
            .filter(|n| match &prefix {
                Some(prefix) => n.path.starts_with(prefix.as_str()) && n.path != "/",
                None => true,
            })
            .filter(|n| self.is_node_type(n, &parsed.node_type))
            .map(|n| n.project(&ctx.workspace, ctx.language.as_deref()))
            .collect())
    }

    fn in_workspace(&self, node: &Node, workspace: &Workspace) -> Result<Option<Node>, StoreError> {
        self.check("in_workspace")?;
        Ok(self
            .tree(workspace)
            .and_then(|t| t.nodes.get(&node.id))
            .map(|n| n.project(workspace, node.language.as_deref())))
    }

    fn references(&self, node: &Node) -> Result<Vec<Property>, StoreError> {
        self.check("references")?;
        let Some(tree) = self.tree(&node.workspace) else {
            return Ok(Vec::new());
        };

        let mut references = Vec::new();
        for stored in tree.document_order() {
            for property in stored.properties.iter().filter(|p| p.property_type.is_reference()) {
                let points_here = match &property.value {
                    Some(PropertyValue::Single(v)) => v == &node.id,
                    Some(PropertyValue::Multiple(vs)) => vs.iter().any(|v| v == &node.id),
                    None => false,
                };
                if points_here {
                    if let Some(projected) = stored.project_property(property, &node.workspace, None) {
                        references.push(projected);
                    }
                }
            }
        }
        Ok(references)
    }

    fn node_type(&self, name: &str) -> Result<Option<NodeTypeDefinition>, StoreError> {
        self.check("node_type")?;
        Ok(self.types.get(name).cloned())
    }

    fn node_types(&self) -> Result<Vec<NodeTypeDefinition>, StoreError> {
        self.check("node_types")?;
        Ok(self.types.values().cloned().collect())
    }
}
