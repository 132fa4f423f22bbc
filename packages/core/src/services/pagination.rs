//! Cursor Pagination
//!
//! Turns a fully materialized, ordered sequence plus a [`PageWindow`] into a
//! [`Page`]. Cursors encode the item's key (node id, type name, ...), never its
//! position, so a cursor stays meaningful when items are inserted before it.

use crate::config::DEFAULT_CURSOR_PREFIX;
use crate::models::{Edge, Page, PageDirection, PageInfo, PageWindow};
use crate::services::error::{QueryError, QueryResult};
use base64::{engine::general_purpose, Engine as _};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Relay-style connection arguments as received from a client
///
/// `first`/`after` page forward, `last`/`before` page backward. Mixing the two
/// directions is rejected by [`PaginationArguments::into_window`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationArguments {
    #[serde(default)]
    pub first: Option<i64>,
    #[serde(default)]
    pub last: Option<i64>,
    #[serde(default)]
    pub after: Option<String>,
    #[serde(default)]
    pub before: Option<String>,
}

impl PaginationArguments {
    /// Validate and convert into a [`PageWindow`]
    ///
    /// # Errors
    ///
    /// Returns `QueryError::WrongInput` for negative counts or contradictory
    /// combinations (`first`+`last`, `after`+`before`, `first`+`before`,
    /// `last`+`after`).
    pub fn into_window(self) -> QueryResult<PageWindow> {
        for (name, count) in [("first", self.first), ("last", self.last)] {
            if let Some(count) = count {
                if count < 0 {
                    return Err(QueryError::wrong_input(format!(
                        "'{}' must not be negative (got {})",
                        name, count
                    )));
                }
            }
        }

        let conflict = match (&self.first, &self.last, &self.after, &self.before) {
            (Some(_), Some(_), _, _) => Some("first and last"),
            (_, _, Some(_), Some(_)) => Some("after and before"),
            (Some(_), _, _, Some(_)) => Some("first and before"),
            (_, Some(_), Some(_), _) => Some("last and after"),
            _ => None,
        };
        if let Some(pair) = conflict {
            return Err(QueryError::wrong_input(format!(
                "pagination arguments {} cannot be combined",
                pair
            )));
        }

        let window = if self.last.is_some() || self.before.is_some() {
            PageWindow {
                cursor: self.before,
                count: self.last,
                direction: PageDirection::Backward,
            }
        } else {
            PageWindow {
                cursor: self.after,
                count: self.first,
                direction: PageDirection::Forward,
            }
        };
        Ok(window)
    }
}

/// Encodes cursors and slices sequences into pages
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationCodec {
    prefix: String,
}

impl Default for PaginationCodec {
    fn default() -> Self {
        Self::new(DEFAULT_CURSOR_PREFIX)
    }
}

impl PaginationCodec {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Opaque cursor for an item key
    pub fn encode_cursor(&self, key: &str) -> String {
        general_purpose::STANDARD.encode(format!("{}:{}", self.prefix, key))
    }

    /// Item key carried by a cursor
    ///
    /// # Errors
    ///
    /// Returns `QueryError::InvalidIdentifier` if the cursor was not produced by
    /// [`encode_cursor`](Self::encode_cursor) with this prefix.
    pub fn decode_cursor(&self, cursor: &str) -> QueryResult<String> {
        let malformed = || QueryError::invalid_identifier(format!("malformed cursor '{}'", cursor));

        let bytes = general_purpose::STANDARD
            .decode(cursor)
            .map_err(|_| malformed())?;
        let payload = String::from_utf8(bytes).map_err(|_| malformed())?;

        match payload.split_once(':') {
            Some((prefix, key)) if prefix == self.prefix => Ok(key.to_string()),
            _ => Err(malformed()),
        }
    }

    /// Slice `items` according to `window`
    ///
    /// `key_of` must yield a key unique within `items`; the key is what the
    /// cursors carry.
    ///
    /// # Errors
    ///
    /// - `WrongInput` for a negative count
    /// - `InvalidIdentifier` for a malformed cursor
    /// - `InvalidCursor` for a cursor whose key is not in `items`
    pub fn paginate<T, F>(&self, items: Vec<T>, key_of: F, window: &PageWindow) -> QueryResult<Page<T>>
    where
        F: Fn(&T) -> String,
    {
        if let Some(count) = window.count {
            if count < 0 {
                return Err(QueryError::wrong_input(format!(
                    "page size must not be negative (got {})",
                    count
                )));
            }
        }

        let total = items.len();
        let keys: Vec<String> = items.iter().map(&key_of).collect();

        let anchor = match &window.cursor {
            Some(cursor) => {
                let key = self.decode_cursor(cursor)?;
                let index: HashMap<&str, usize> = keys
                    .iter()
                    .enumerate()
                    .map(|(position, key)| (key.as_str(), position))
                    .collect();
                let position = index
                    .get(key.as_str())
                    .copied()
                    .ok_or_else(|| QueryError::invalid_cursor(cursor.clone()))?;
                Some(position)
            }
            None => None,
        };

        let count = window.count.map(|c| c as usize);
        let (start, end) = match window.direction {
            PageDirection::Forward => {
                let start = anchor.map(|p| p + 1).unwrap_or(0);
                let end = match count {
                    Some(count) => start.saturating_add(count).min(total),
                    None => total,
                };
                (start, end)
            }
            PageDirection::Backward => {
                let end = anchor.unwrap_or(total);
                let start = match count {
                    Some(count) => end.saturating_sub(count),
                    None => 0,
                };
                (start, end)
            }
        };

        let edges: Vec<Edge<T>> = items
            .into_iter()
            .zip(keys)
            .skip(start)
            .take(end - start)
            .map(|(node, key)| Edge {
                cursor: self.encode_cursor(&key),
                node,
            })
            .collect();

        let page_info = PageInfo {
            has_next_page: end < total,
            has_previous_page: start > 0,
            start_cursor: edges.first().map(|e| e.cursor.clone()),
            end_cursor: edges.last().map(|e| e.cursor.clone()),
            total_count: total,
            nodes_count: edges.len(),
        };

        Ok(Page { edges, page_info })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn letters(n: usize) -> Vec<String> {
        (0..n).map(|i| ((b'a' + i as u8) as char).to_string()).collect()
    }

    fn keys(page: &Page<String>) -> Vec<&str> {
        page.nodes().map(String::as_str).collect()
    }

    #[test]
    fn test_cursor_round_trip() {
        let codec = PaginationCodec::default();
        let cursor = codec.encode_cursor("owner-1/jcr:title");
        assert_eq!(codec.decode_cursor(&cursor).unwrap(), "owner-1/jcr:title");
    }

    #[test]
    fn test_first_k_size_law() {
        let codec = PaginationCodec::default();
        for n in [0usize, 1, 3, 5] {
            for k in [0i64, 1, 3, 5, 8] {
                let page = codec
                    .paginate(letters(n), String::clone, &PageWindow::first(k))
                    .unwrap();
                assert_eq!(page.len(), (k as usize).min(n));
                assert_eq!(page.page_info.has_next_page, (k as usize) < n);
                assert!(!page.page_info.has_previous_page);
                assert_eq!(page.page_info.total_count, n);
            }
        }
    }

    #[test]
    fn test_forward_after_cursor() {
        let codec = PaginationCodec::default();
        let first = codec
            .paginate(letters(5), String::clone, &PageWindow::first(2))
            .unwrap();
        let end = first.page_info.end_cursor.clone().unwrap();

        let next = codec
            .paginate(letters(5), String::clone, &PageWindow::after(end, Some(2)))
            .unwrap();
        assert_eq!(keys(&next), vec!["c", "d"]);
        assert!(next.page_info.has_previous_page);
        assert!(next.page_info.has_next_page);
    }

    #[test]
    fn test_backward() {
        let codec = PaginationCodec::default();
        let last = codec
            .paginate(letters(5), String::clone, &PageWindow::last(2))
            .unwrap();
        assert_eq!(keys(&last), vec!["d", "e"]);
        assert!(last.page_info.has_previous_page);
        assert!(!last.page_info.has_next_page);

        let cursor = codec.encode_cursor("d");
        let before = codec
            .paginate(letters(5), String::clone, &PageWindow::before(cursor, None))
            .unwrap();
        assert_eq!(keys(&before), vec!["a", "b", "c"]);
        assert!(before.page_info.has_next_page);
    }

    #[test]
    fn test_no_count_returns_remaining() {
        let codec = PaginationCodec::default();
        let page = codec
            .paginate(letters(4), String::clone, &PageWindow::all())
            .unwrap();
        assert_eq!(page.len(), 4);
        assert_eq!(page.page_info.nodes_count, 4);
        assert!(!page.page_info.has_next_page);
    }

    #[test]
    fn test_bad_cursors() {
        let codec = PaginationCodec::default();

        let malformed = codec.paginate(letters(3), String::clone, &PageWindow::after("%%%", None));
        assert!(matches!(malformed, Err(QueryError::InvalidIdentifier(_))));

        let unknown = codec.encode_cursor("zz");
        let missing = codec.paginate(letters(3), String::clone, &PageWindow::after(unknown, None));
        assert!(matches!(missing, Err(QueryError::InvalidCursor { .. })));
    }

    #[test]
    fn test_negative_count() {
        let codec = PaginationCodec::default();
        let result = codec.paginate(letters(3), String::clone, &PageWindow::first(-1));
        assert!(matches!(result, Err(QueryError::WrongInput(_))));
    }

    #[test]
    fn test_arguments_into_window() {
        let window = PaginationArguments {
            last: Some(3),
            before: Some("c".to_string()),
            ..Default::default()
        }
        .into_window()
        .unwrap();
        assert_eq!(window.direction, PageDirection::Backward);
        assert_eq!(window.count, Some(3));

        let window = PaginationArguments::default().into_window().unwrap();
        assert_eq!(window, PageWindow::all());
    }

    #[test]
    fn test_contradictory_arguments() {
        let cases = [
            PaginationArguments {
                first: Some(1),
                last: Some(1),
                ..Default::default()
            },
            PaginationArguments {
                after: Some("a".to_string()),
                before: Some("b".to_string()),
                ..Default::default()
            },
            PaginationArguments {
                first: Some(1),
                before: Some("b".to_string()),
                ..Default::default()
            },
            PaginationArguments {
                last: Some(1),
                after: Some("a".to_string()),
                ..Default::default()
            },
            PaginationArguments {
                first: Some(-2),
                ..Default::default()
            },
        ];

        for args in cases {
            assert!(matches!(args.into_window(), Err(QueryError::WrongInput(_))));
        }
    }
}
