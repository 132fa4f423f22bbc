//! Node Query Service - Query Surface
//!
//! This module provides the single entry point hosts call into:
//!
//! - Node lookups by identifier, path, global id and structured query
//! - Per-node fields (parent, children, descendants, ancestors, properties,
//!   references, display name, cross-workspace lookup)
//! - Content type listing
//! - Representation registration (forwarded to the [`TypeResolver`])
//!
//! # Errors
//!
//! Every method returns [`QueryResult`]. Store failures surface as
//! `QueryError::DataFetching` and are logged once here, at the boundary; caller
//! mistakes are returned without logging.
//!
//! # Examples
//!
//! ```rust
//! use std::sync::Arc;
//! use treeql_core::db::{InMemoryStore, StoredNode};
//! use treeql_core::models::{PageWindow, Workspace};
//! use treeql_core::services::{NodeFilter, NodeQueryService};
//!
//! let mut store = InMemoryStore::new();
//! store.insert(&Workspace::edit(), StoredNode::new("home", "/home", "jnt:page")).unwrap();
//!
//! let service = NodeQueryService::with_defaults(Arc::new(store));
//! let root = service.get_node_by_path(None, "/", None).unwrap();
//! let page = service.children(&root, &NodeFilter::default(), &PageWindow::all()).unwrap();
//! assert_eq!(page.len(), 1);
//! ```

use crate::config::EngineConfig;
use crate::db::{ContentStore, QueryDialect};
use crate::models::node::join_path;
use crate::models::{
    AccessContext, Edge, Node, NodePropertiesInput, NodeTypeDefinition, NodeTypesInput,
    NodeTypesListInput, Page, PageWindow, Property, Workspace,
};
use crate::services::error::{QueryError, QueryResult};
use crate::services::filter::{walk_type_hierarchy, EvaluationTable, FilterEngine, NodePredicate};
use crate::services::identity::IdentityCodec;
use crate::services::pagination::PaginationCodec;
use crate::services::projector::PropertyProjector;
use crate::services::tree_walker::TreeWalker;
use crate::services::type_resolver::{NodeRepresentation, ResolvedNode, TypeResolver};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::sync::Arc;

/// Property holding a node's human-readable title
pub const TITLE_PROPERTY: &str = "jcr:title";

/// Caller filter for children and descendants
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeFilter {
    /// Accepted node names (`None` = any name)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub names: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub types: Option<NodeTypesInput>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<NodePropertiesInput>,
}

impl NodeFilter {
    pub fn with_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.names = Some(names.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_types(mut self, types: NodeTypesInput) -> Self {
        self.types = Some(types);
        self
    }

    pub fn with_properties(mut self, properties: NodePropertiesInput) -> Self {
        self.properties = Some(properties);
        self
    }
}

/// Query surface over a [`ContentStore`]
///
/// `Send + Sync`; share one instance behind an `Arc`.
pub struct NodeQueryService {
    store: Arc<dyn ContentStore>,
    config: EngineConfig,
    identity: IdentityCodec,
    pagination: PaginationCodec,
    evaluations: EvaluationTable,
    resolver: TypeResolver,
}

impl NodeQueryService {
    /// Create a service over `store`
    ///
    /// # Errors
    ///
    /// Returns `QueryError::WrongInput` if the configuration is invalid.
    pub fn new(store: Arc<dyn ContentStore>, config: EngineConfig) -> QueryResult<Self> {
        config.validate()?;

        tracing::info!(
            "NodeQueryService initialized (default workspace: {}, excluded child types: {:?})",
            config.default_workspace,
            config.excluded_child_types
        );

        Ok(Self::build(store, config))
    }

    /// Create a service with [`EngineConfig::default`]
    pub fn with_defaults(store: Arc<dyn ContentStore>) -> Self {
        Self::build(store, EngineConfig::default())
    }

    fn build(store: Arc<dyn ContentStore>, config: EngineConfig) -> Self {
        let identity = IdentityCodec::new(config.global_id_prefix.clone());
        Self {
            pagination: PaginationCodec::new(config.cursor_prefix.clone()),
            resolver: TypeResolver::new(store.clone(), identity.clone()),
            evaluations: EvaluationTable::new(),
            identity,
            config,
            store,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn ContentStore> {
        &self.store
    }

    pub fn identity(&self) -> &IdentityCodec {
        &self.identity
    }

    pub fn pagination(&self) -> &PaginationCodec {
        &self.pagination
    }

    pub fn resolver(&self) -> &TypeResolver {
        &self.resolver
    }

    /// Register a representation for a content type
    pub fn register_representation(
        &self,
        type_name: impl Into<String>,
        representation: Arc<dyn NodeRepresentation>,
    ) {
        self.resolver.register(type_name, representation);
    }

    // Entry points

    /// Node by identifier
    ///
    /// `workspace` defaults to the configured workspace.
    pub fn get_node_by_id(
        &self,
        workspace: Option<&Workspace>,
        id: &str,
        language: Option<&str>,
    ) -> QueryResult<ResolvedNode> {
        self.observe("get_node_by_id", || {
            let ctx = self.context(workspace, language);
            let node = self
                .store
                .get_by_id(&ctx, id)?
                .ok_or_else(|| QueryError::node_not_found(id))?;
            self.resolver.resolve(node)
        })
    }

    /// Node by absolute path
    pub fn get_node_by_path(
        &self,
        workspace: Option<&Workspace>,
        path: &str,
        language: Option<&str>,
    ) -> QueryResult<ResolvedNode> {
        self.observe("get_node_by_path", || {
            let ctx = self.context(workspace, language);
            let node = self
                .store
                .get_by_path(&ctx, path)?
                .ok_or_else(|| QueryError::node_not_found(path))?;
            self.resolver.resolve(node)
        })
    }

    /// Nodes by identifier, in argument order; fails on the first missing one
    pub fn get_nodes_by_id(
        &self,
        workspace: Option<&Workspace>,
        ids: &[String],
        language: Option<&str>,
    ) -> QueryResult<Vec<ResolvedNode>> {
        self.observe("get_nodes_by_id", || {
            let ctx = self.context(workspace, language);
            ids.iter()
                .map(|id| {
                    let node = self
                        .store
                        .get_by_id(&ctx, id)?
                        .ok_or_else(|| QueryError::node_not_found(id.as_str()))?;
                    self.resolver.resolve(node)
                })
                .collect()
        })
    }

    /// Nodes by path, in argument order; fails on the first missing one
    pub fn get_nodes_by_path(
        &self,
        workspace: Option<&Workspace>,
        paths: &[String],
        language: Option<&str>,
    ) -> QueryResult<Vec<ResolvedNode>> {
        self.observe("get_nodes_by_path", || {
            let ctx = self.context(workspace, language);
            paths
                .iter()
                .map(|path| {
                    let node = self
                        .store
                        .get_by_path(&ctx, path)?
                        .ok_or_else(|| QueryError::node_not_found(path.as_str()))?;
                    self.resolver.resolve(node)
                })
                .collect()
        })
    }

    /// Page of nodes returned by a structured query; cursor key is the node id
    pub fn get_nodes_by_query(
        &self,
        workspace: Option<&Workspace>,
        query: &str,
        language: Option<&str>,
        dialect: QueryDialect,
        window: &PageWindow,
    ) -> QueryResult<Page<ResolvedNode>> {
        self.observe("get_nodes_by_query", || {
            let ctx = self.context(workspace, language);
            tracing::debug!("Executing {} query in {}: {}", dialect, ctx.workspace, query);

            let nodes = self.store.structured_query(&ctx, query, dialect)?;
            self.resolve_page(nodes, window)
        })
    }

    /// Node behind an opaque global id
    pub fn resolve_global_id(&self, global_id: &str) -> QueryResult<ResolvedNode> {
        self.observe("resolve_global_id", || self.resolver.resolve_global_id(global_id))
    }

    // Per-node fields

    /// Opaque global id of a node
    pub fn global_id(&self, view: &ResolvedNode) -> String {
        self.identity.encode(&view.node.workspace, &view.node.id)
    }

    /// Representation-specific field map
    pub fn fields(&self, view: &ResolvedNode) -> QueryResult<Map<String, Value>> {
        self.observe("fields", || view.fields(self.store.as_ref()))
    }

    /// Parent node, `None` for the root
    pub fn parent(&self, view: &ResolvedNode) -> QueryResult<Option<ResolvedNode>> {
        self.observe("parent", || {
            let Some(parent_id) = view.node.parent_id.as_deref() else {
                return Ok(None);
            };
            self.store
                .get_by_id(&view.node.context(), parent_id)?
                .map(|p| self.resolver.resolve(p))
                .transpose()
        })
    }

    /// Named child (relative path) or `None`
    pub fn child(&self, view: &ResolvedNode, relative_path: &str) -> QueryResult<Option<ResolvedNode>> {
        self.observe("child", || {
            let path = join_path(&view.node.path, relative_path);
            self.store
                .get_by_path(&view.node.context(), &path)?
                .map(|c| self.resolver.resolve(c))
                .transpose()
        })
    }

    /// Direct children matching `filter`, paged; cursor key is the node id
    ///
    /// Configured excluded child types are always filtered out.
    pub fn children(
        &self,
        view: &ResolvedNode,
        filter: &NodeFilter,
        window: &PageWindow,
    ) -> QueryResult<Page<ResolvedNode>> {
        self.observe("children", || {
            let predicate = self.compile(filter)?;
            let nodes = self.walker().children(&view.node, &predicate)?;
            self.resolve_page(nodes, window)
        })
    }

    /// All descendants matching `filter`, depth-first pre-order, paged
    pub fn descendants(
        &self,
        view: &ResolvedNode,
        filter: &NodeFilter,
        window: &PageWindow,
    ) -> QueryResult<Page<ResolvedNode>> {
        self.observe("descendants", || {
            let predicate = self.compile(filter)?;
            let nodes = self.walker().descendants(&view.node, &predicate)?;
            self.resolve_page(nodes, window)
        })
    }

    /// Ancestors from the root down to the parent
    ///
    /// With `up_to_path`, only ancestors at or below that path are returned.
    ///
    /// # Errors
    ///
    /// Returns `QueryError::WrongInput` if `up_to_path` is empty, is the node's
    /// own path, or is not a path prefix of it.
    pub fn ancestors(&self, view: &ResolvedNode, up_to_path: Option<&str>) -> QueryResult<Vec<ResolvedNode>> {
        self.observe("ancestors", || {
            let upper = match up_to_path {
                None => None,
                Some("") => {
                    return Err(QueryError::wrong_input("'upToPath' value must not be empty"))
                }
                Some(path) => {
                    let normalized = with_trailing_slash(path);
                    if view.node.path == path || !view.node.path.starts_with(&normalized) {
                        return Err(QueryError::wrong_input(format!(
                            "'{}' does not reference an ancestor node of '{}'",
                            path, view.node.path
                        )));
                    }
                    Some(normalized)
                }
            };

            self.store
                .ancestors(&view.node)?
                .into_iter()
                .filter(|a| match &upper {
                    Some(upper) => with_trailing_slash(&a.path).starts_with(upper.as_str()),
                    None => true,
                })
                .map(|a| self.resolver.resolve(a))
                .collect()
        })
    }

    /// Properties visible under `language`, optionally limited to `names`
    pub fn properties(
        &self,
        view: &ResolvedNode,
        names: Option<&[String]>,
        language: Option<&str>,
    ) -> QueryResult<Vec<Property>> {
        self.observe("properties", || {
            let properties = self.store.properties(&view.node, language)?;
            Ok(match names {
                Some(names) => {
                    let wanted: HashSet<&str> = names.iter().map(String::as_str).collect();
                    properties
                        .into_iter()
                        .filter(|p| wanted.contains(p.name.as_str()))
                        .collect()
                }
                None => properties,
            })
        })
    }

    /// Single property or `None`
    pub fn property(
        &self,
        view: &ResolvedNode,
        name: &str,
        language: Option<&str>,
    ) -> QueryResult<Option<Property>> {
        self.observe("property", || Ok(self.store.property(&view.node, name, language)?))
    }

    /// Properties referencing this node, paged; cursor key is `<owner id>/<name>`
    pub fn references(&self, view: &ResolvedNode, window: &PageWindow) -> QueryResult<Page<Property>> {
        self.observe("references", || {
            let references = self.store.references(&view.node)?;
            self.pagination.paginate(
                references,
                |p| format!("{}/{}", p.owner_id, p.name),
                window,
            )
        })
    }

    /// Same node in another workspace, or `None` if it doesn't exist there
    pub fn node_in_workspace(
        &self,
        view: &ResolvedNode,
        workspace: &Workspace,
    ) -> QueryResult<Option<ResolvedNode>> {
        self.observe("node_in_workspace", || {
            self.store
                .in_workspace(&view.node, workspace)?
                .map(|n| self.resolver.resolve(n))
                .transpose()
        })
    }

    /// Title under `language`, falling back to the node name
    pub fn display_name(&self, view: &ResolvedNode, language: Option<&str>) -> QueryResult<String> {
        self.observe("display_name", || {
            let projected = self.projector().project(&view.node, language)?;
            let title = self.store.property(&projected, TITLE_PROPERTY, None)?;
            Ok(title
                .as_ref()
                .and_then(Property::value)
                .map(str::to_string)
                .unwrap_or_else(|| view.node.name.clone()))
        })
    }

    /// Same node re-read under `language`
    pub fn project(&self, view: &ResolvedNode, language: Option<&str>) -> QueryResult<ResolvedNode> {
        self.observe("project", || {
            let projected = self.projector().project(&view.node, language)?;
            self.resolver.resolve(projected)
        })
    }

    /// Target of a single-valued reference property (`None` if multi-valued)
    pub fn ref_node(&self, property: &Property) -> QueryResult<Option<ResolvedNode>> {
        self.observe("ref_node", || self.projector().ref_node(property))
    }

    /// Targets of a multi-valued reference property (`None` if single-valued)
    pub fn ref_nodes(&self, property: &Property) -> QueryResult<Option<Vec<ResolvedNode>>> {
        self.observe("ref_nodes", || self.projector().ref_nodes(property))
    }

    /// Node owning `property`, read in the property's workspace
    pub fn property_node(&self, property: &Property) -> QueryResult<ResolvedNode> {
        self.observe("property_node", || {
            let ctx = AccessContext::new(property.owner_workspace.clone());
            let owner = self
                .store
                .get_by_id(&ctx, &property.owner_id)?
                .ok_or_else(|| QueryError::node_not_found(property.owner_id.clone()))?;
            self.resolver.resolve(owner)
        })
    }

    /// `<owner path>/<property name>`
    pub fn property_path(&self, property: &Property) -> QueryResult<String> {
        let owner = self.property_node(property)?;
        Ok(property.path_under(&owner.node.path))
    }

    /// Whether the node is of `type_name` (directly, by mixin, or by supertype)
    pub fn is_node_type(&self, view: &ResolvedNode, type_name: &str) -> QueryResult<bool> {
        self.observe("is_node_type", || self.filter().is_node_type(&view.node, type_name))
    }

    // Content types

    /// Content type definition by name
    pub fn node_type_by_name(&self, name: &str) -> QueryResult<NodeTypeDefinition> {
        self.observe("node_type_by_name", || {
            self.store
                .node_type(name)?
                .ok_or_else(|| QueryError::node_type_not_found(name))
        })
    }

    /// Content types passing `filter`, paged; cursor key is the type name
    pub fn node_types(
        &self,
        filter: &NodeTypesListInput,
        window: &PageWindow,
    ) -> QueryResult<Page<NodeTypeDefinition>> {
        self.observe("node_types", || {
            let types: Vec<NodeTypeDefinition> = self
                .store
                .node_types()?
                .into_iter()
                .filter(|t| filter.accepts(t))
                .collect();
            self.pagination.paginate(types, |t| t.name.clone(), window)
        })
    }

    /// Types having `name` as a transitive supertype, paged; cursor key is the
    /// type name
    pub fn subtypes(&self, name: &str, window: &PageWindow) -> QueryResult<Page<NodeTypeDefinition>> {
        self.observe("subtypes", || {
            self.store
                .node_type(name)?
                .ok_or_else(|| QueryError::node_type_not_found(name))?;

            let mut subtypes = Vec::new();
            for definition in self.store.node_types()? {
                let inherits = walk_type_hierarchy(
                    self.store.as_ref(),
                    definition.supertypes.iter().map(String::as_str),
                    |t| t == name,
                )?;
                if inherits.is_some() && definition.name != name {
                    subtypes.push(definition);
                }
            }
            self.pagination.paginate(subtypes, |t| t.name.clone(), window)
        })
    }

    /// Transitive supertypes, breadth-first in declaration order
    ///
    /// Supertypes the store has no definition for are skipped.
    pub fn supertypes(&self, name: &str) -> QueryResult<Vec<NodeTypeDefinition>> {
        self.observe("supertypes", || {
            let definition = self
                .store
                .node_type(name)?
                .ok_or_else(|| QueryError::node_type_not_found(name))?;

            let mut names = Vec::new();
            walk_type_hierarchy(
                self.store.as_ref(),
                definition.supertypes.iter().map(String::as_str),
                |t| {
                    if t != name {
                        names.push(t.to_string());
                    }
                    false
                },
            )?;

            let mut supertypes = Vec::with_capacity(names.len());
            for supertype in names {
                if let Some(definition) = self.store.node_type(&supertype)? {
                    supertypes.push(definition);
                }
            }
            Ok(supertypes)
        })
    }

    // Internals

    fn context(&self, workspace: Option<&Workspace>, language: Option<&str>) -> AccessContext {
        AccessContext::new(
            workspace
                .cloned()
                .unwrap_or_else(|| self.config.default_workspace.clone()),
        )
        .with_language(language.map(str::to_string))
    }

    fn filter(&self) -> FilterEngine<'_> {
        FilterEngine::new(self.store.as_ref(), &self.evaluations)
    }

    fn walker(&self) -> TreeWalker<'_> {
        TreeWalker::new(self.store.as_ref(), self.filter())
    }

    fn projector(&self) -> PropertyProjector<'_> {
        PropertyProjector::new(self.store.as_ref(), &self.resolver)
    }

    fn compile(&self, filter: &NodeFilter) -> QueryResult<NodePredicate> {
        NodePredicate::compile(
            filter.names.as_deref(),
            filter.types.as_ref(),
            filter.properties.as_ref(),
            &self.config.excluded_child_types,
        )
    }

    /// Paginate raw nodes, then resolve only the nodes on the page
    fn resolve_page(&self, nodes: Vec<Node>, window: &PageWindow) -> QueryResult<Page<ResolvedNode>> {
        let page = self.pagination.paginate(nodes, |n| n.id.clone(), window)?;
        let edges = page
            .edges
            .into_iter()
            .map(|edge| {
                Ok(Edge {
                    node: self.resolver.resolve(edge.node)?,
                    cursor: edge.cursor,
                })
            })
            .collect::<QueryResult<Vec<_>>>()?;
        Ok(Page {
            edges,
            page_info: page.page_info,
        })
    }

    /// Log store failures once, at the boundary
    fn observe<T, F>(&self, operation: &str, f: F) -> QueryResult<T>
    where
        F: FnOnce() -> QueryResult<T>,
    {
        let result = f();
        if let Err(QueryError::DataFetching(e)) = &result {
            tracing::warn!("{} failed: {}", operation, e);
        }
        result
    }
}

fn with_trailing_slash(path: &str) -> String {
    if path.ends_with('/') {
        path.to_string()
    } else {
        format!("{}/", path)
    }
}
