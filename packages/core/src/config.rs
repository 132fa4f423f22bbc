//! Engine configuration

use crate::models::{ValidationError, Workspace};
use serde::{Deserialize, Serialize};
use std::env;

/// Child types hidden from every children/descendants listing
pub const DEFAULT_EXCLUDED_CHILD_TYPES: &[&str] = &["jnt:translation"];

/// Prefix tagging node global ids
pub const DEFAULT_GLOBAL_ID_PREFIX: &str = "node";

/// Prefix tagging pagination cursors
pub const DEFAULT_CURSOR_PREFIX: &str = "cursor";

/// Configuration for the query engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    /// Workspace used by entry points when the caller names none
    pub default_workspace: Workspace,

    /// Types excluded from children/descendants regardless of caller filters
    pub excluded_child_types: Vec<String>,

    /// Prefix inside encoded global ids; distinguishes this id family from others
    pub global_id_prefix: String,

    /// Prefix inside encoded cursors
    pub cursor_prefix: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_workspace: Workspace::edit(),
            excluded_child_types: DEFAULT_EXCLUDED_CHILD_TYPES
                .iter()
                .map(|t| t.to_string())
                .collect(),
            global_id_prefix: DEFAULT_GLOBAL_ID_PREFIX.to_string(),
            cursor_prefix: DEFAULT_CURSOR_PREFIX.to_string(),
        }
    }
}

impl EngineConfig {
    /// Defaults overlaid with `TREEQL_*` environment variables
    ///
    /// - `TREEQL_WORKSPACE`: default workspace name
    /// - `TREEQL_EXCLUDED_CHILD_TYPES`: comma-separated type names
    /// - `TREEQL_ID_PREFIX`: global id prefix
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if a variable holds an unusable value.
    pub fn from_env() -> Result<Self, ValidationError> {
        let mut config = Self::default();

        if let Ok(workspace) = env::var("TREEQL_WORKSPACE") {
            config.default_workspace = Workspace::new(workspace)?;
        }

        if let Ok(types) = env::var("TREEQL_EXCLUDED_CHILD_TYPES") {
            config.excluded_child_types = types
                .split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect();
        }

        if let Ok(prefix) = env::var("TREEQL_ID_PREFIX") {
            config.global_id_prefix = prefix;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate prefixes
    ///
    /// Prefixes are the first segment of `:`-separated payloads, so they must be
    /// non-empty and free of `:`.
    pub fn validate(&self) -> Result<(), ValidationError> {
        for (field, prefix) in [
            ("globalIdPrefix", &self.global_id_prefix),
            ("cursorPrefix", &self.cursor_prefix),
        ] {
            if prefix.is_empty() || prefix.contains(':') {
                return Err(ValidationError::InvalidConfig(format!(
                    "{} must be non-empty and contain no ':' (got '{}')",
                    field, prefix
                )));
            }
        }
        Ok(())
    }
}
