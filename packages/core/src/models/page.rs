//! Cursor pagination models
//!
//! A [`PageWindow`] describes which slice of an ordered result the caller wants;
//! a [`Page`] is what comes back. Cursors are opaque strings produced by
//! [`PaginationCodec`](crate::services::PaginationCodec).

use serde::{Deserialize, Serialize};

/// Paging direction relative to the cursor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageDirection {
    /// Items after the cursor (or from the start)
    #[default]
    Forward,
    /// Items before the cursor (or up to the end)
    Backward,
}

/// Requested slice of an ordered sequence
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageWindow {
    /// Anchor cursor (`None` = start or end, depending on direction)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,

    /// Requested item count (`None` = everything remaining)
    ///
    /// Signed so that negative input can be rejected instead of wrapping.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<i64>,

    #[serde(default)]
    pub direction: PageDirection,
}

impl PageWindow {
    /// Everything, in one page
    pub fn all() -> Self {
        Self::default()
    }

    /// First `count` items
    pub fn first(count: i64) -> Self {
        Self {
            cursor: None,
            count: Some(count),
            direction: PageDirection::Forward,
        }
    }

    /// Last `count` items
    pub fn last(count: i64) -> Self {
        Self {
            cursor: None,
            count: Some(count),
            direction: PageDirection::Backward,
        }
    }

    /// `count` items following `cursor`
    pub fn after(cursor: impl Into<String>, count: Option<i64>) -> Self {
        Self {
            cursor: Some(cursor.into()),
            count,
            direction: PageDirection::Forward,
        }
    }

    /// `count` items preceding `cursor`
    pub fn before(cursor: impl Into<String>, count: Option<i64>) -> Self {
        Self {
            cursor: Some(cursor.into()),
            count,
            direction: PageDirection::Backward,
        }
    }
}

/// One item of a page with its cursor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge<T> {
    pub node: T,
    pub cursor: String,
}

/// Page-level navigation info
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub has_next_page: bool,
    pub has_previous_page: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_cursor: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_cursor: Option<String>,

    /// Size of the full materialized sequence
    pub total_count: usize,

    /// Number of edges in this page
    pub nodes_count: usize,
}

/// Cursor-based page of items
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub edges: Vec<Edge<T>>,
    pub page_info: PageInfo,
}

impl<T> Page<T> {
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Items without their cursors
    pub fn nodes(&self) -> impl Iterator<Item = &T> {
        self.edges.iter().map(|e| &e.node)
    }

    pub fn into_nodes(self) -> Vec<T> {
        self.edges.into_iter().map(|e| e.node).collect()
    }

    /// Transform every item, keeping cursors and page info
    pub fn map<U, F>(self, mut f: F) -> Page<U>
    where
        F: FnMut(T) -> U,
    {
        Page {
            edges: self
                .edges
                .into_iter()
                .map(|e| Edge {
                    node: f(e.node),
                    cursor: e.cursor,
                })
                .collect(),
            page_info: self.page_info,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_constructors() {
        assert_eq!(PageWindow::all().count, None);
        assert_eq!(PageWindow::first(3).direction, PageDirection::Forward);
        assert_eq!(PageWindow::last(3).direction, PageDirection::Backward);
        assert_eq!(PageWindow::after("c", Some(2)).cursor.as_deref(), Some("c"));
        assert_eq!(PageWindow::before("c", None).direction, PageDirection::Backward);
    }

    #[test]
    fn test_page_map_keeps_cursors() {
        let page = Page {
            edges: vec![Edge {
                node: 1,
                cursor: "a".to_string(),
            }],
            page_info: PageInfo::default(),
        };
        let mapped = page.map(|n| n * 10);
        assert_eq!(mapped.edges[0].node, 10);
        assert_eq!(mapped.edges[0].cursor, "a");
    }
}
