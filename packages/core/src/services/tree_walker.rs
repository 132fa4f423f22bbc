//! Tree Walker
//!
//! Children and descendant traversal gated by a [`NodePredicate`]. The
//! predicate decides inclusion only: a non-matching node is still descended
//! into, so matches below it are found.

use crate::db::ContentStore;
use crate::models::Node;
use crate::services::error::QueryResult;
use crate::services::filter::{FilterEngine, NodePredicate};

pub struct TreeWalker<'a> {
    store: &'a dyn ContentStore,
    filter: FilterEngine<'a>,
}

impl<'a> TreeWalker<'a> {
    pub fn new(store: &'a dyn ContentStore, filter: FilterEngine<'a>) -> Self {
        Self { store, filter }
    }

    /// Direct children matching `predicate`, in store order
    pub fn children(&self, node: &Node, predicate: &NodePredicate) -> QueryResult<Vec<Node>> {
        let mut matched = Vec::new();
        for child in self.store.children(node)? {
            if self.filter.matches(&child, predicate)? {
                matched.push(child);
            }
        }
        Ok(matched)
    }

    /// Every node below `node` matching `predicate`, depth-first pre-order
    pub fn descendants(&self, node: &Node, predicate: &NodePredicate) -> QueryResult<Vec<Node>> {
        let mut matched = Vec::new();
        let mut stack: Vec<Node> = self.store.children(node)?.into_iter().rev().collect();

        while let Some(current) = stack.pop() {
            let children = self.store.children(&current)?;
            stack.extend(children.into_iter().rev());

            if self.filter.matches(&current, predicate)? {
                matched.push(current);
            }
        }

        tracing::debug!(
            "Descendants of {} in {}: {} matching",
            node.path,
            node.workspace,
            matched.len()
        );
        Ok(matched)
    }
}
