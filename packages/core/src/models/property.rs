//! Property Data Structures
//!
//! A `Property` is a named, typed value attached to a node. Multiplicity is
//! encoded in [`PropertyValue`]: a property carries either exactly one scalar
//! value or an ordered list of values, never both.
//!
//! # Examples
//!
//! ```rust
//! use treeql_core::models::{Property, PropertyType, Workspace};
//!
//! let title = Property::single("jcr:title", PropertyType::String, "Home")
//!     .owned_by("node-1", Workspace::edit())
//!     .in_language("en");
//! assert_eq!(title.value(), Some("Home"));
//! assert!(title.values().is_none());
//! ```

use crate::models::Workspace;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Property type tags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PropertyType {
    String,
    Binary,
    Long,
    Double,
    Decimal,
    Date,
    Boolean,
    Name,
    Path,
    Reference,
    WeakReference,
    Uri,
}

impl PropertyType {
    /// Whether values of this type are node identifiers by declaration
    pub fn is_reference(self) -> bool {
        matches!(self, Self::Reference | Self::WeakReference)
    }

    /// Whether values of this type can be interpreted as node identifiers
    ///
    /// Plain strings are accepted as identifier-encoded references.
    pub fn can_reference(self) -> bool {
        self.is_reference() || self == Self::String
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::String => "STRING",
            Self::Binary => "BINARY",
            Self::Long => "LONG",
            Self::Double => "DOUBLE",
            Self::Decimal => "DECIMAL",
            Self::Date => "DATE",
            Self::Boolean => "BOOLEAN",
            Self::Name => "NAME",
            Self::Path => "PATH",
            Self::Reference => "REFERENCE",
            Self::WeakReference => "WEAK_REFERENCE",
            Self::Uri => "URI",
        };
        f.write_str(name)
    }
}

impl FromStr for PropertyType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "STRING" => Ok(Self::String),
            "BINARY" => Ok(Self::Binary),
            "LONG" => Ok(Self::Long),
            "DOUBLE" => Ok(Self::Double),
            "DECIMAL" => Ok(Self::Decimal),
            "DATE" => Ok(Self::Date),
            "BOOLEAN" => Ok(Self::Boolean),
            "NAME" => Ok(Self::Name),
            "PATH" => Ok(Self::Path),
            "REFERENCE" => Ok(Self::Reference),
            "WEAK_REFERENCE" | "WEAKREFERENCE" => Ok(Self::WeakReference),
            "URI" => Ok(Self::Uri),
            _ => Err(format!("Invalid property type: {}", s)),
        }
    }
}

/// Scalar or multi-valued property content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Single(String),
    Multiple(Vec<String>),
}

impl PropertyValue {
    pub fn is_multiple(&self) -> bool {
        matches!(self, Self::Multiple(_))
    }
}

/// Named, typed value attached to a node.
///
/// `owner_id` and `owner_workspace` form the back-reference to the owning node;
/// they are identifiers, not ownership.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    pub name: String,

    pub property_type: PropertyType,

    pub value: PropertyValue,

    pub owner_id: String,

    pub owner_workspace: Workspace,

    /// Language of the value (present only for internationalized properties)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,

    #[serde(default)]
    pub internationalized: bool,
}

impl Property {
    /// Create a single-valued property with no owner yet
    pub fn single(name: impl Into<String>, property_type: PropertyType, value: impl Into<String>) -> Self {
        Self::with_value(name, property_type, PropertyValue::Single(value.into()))
    }

    /// Create a multi-valued property with no owner yet
    pub fn multiple<I, S>(name: impl Into<String>, property_type: PropertyType, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_value(
            name,
            property_type,
            PropertyValue::Multiple(values.into_iter().map(Into::into).collect()),
        )
    }

    pub fn with_value(name: impl Into<String>, property_type: PropertyType, value: PropertyValue) -> Self {
        Self {
            name: name.into(),
            property_type,
            value,
            owner_id: String::new(),
            owner_workspace: Workspace::edit(),
            language: None,
            internationalized: false,
        }
    }

    /// Attach the owning node back-reference
    pub fn owned_by(mut self, owner_id: impl Into<String>, workspace: Workspace) -> Self {
        self.owner_id = owner_id.into();
        self.owner_workspace = workspace;
        self
    }

    /// Mark as internationalized and tag with a language
    pub fn in_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self.internationalized = true;
        self
    }

    pub fn is_multiple(&self) -> bool {
        self.value.is_multiple()
    }

    /// Scalar value, `None` for multi-valued properties
    pub fn value(&self) -> Option<&str> {
        match &self.value {
            PropertyValue::Single(v) => Some(v),
            PropertyValue::Multiple(_) => None,
        }
    }

    /// Ordered values, `None` for single-valued properties
    pub fn values(&self) -> Option<&[String]> {
        match &self.value {
            PropertyValue::Single(_) => None,
            PropertyValue::Multiple(v) => Some(v),
        }
    }

    /// `<owner path>/<name>` given the owner's path
    pub fn path_under(&self, owner_path: &str) -> String {
        crate::models::node::join_path(owner_path, &self.name)
    }
}
