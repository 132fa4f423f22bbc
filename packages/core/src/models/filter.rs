//! Filter inputs
//!
//! Caller-facing, serde-deserializable filter criteria. These are plain data;
//! [`NodePredicate::compile`](crate::services::NodePredicate::compile) validates
//! them and turns them into an evaluable predicate.
//!
//! # Wire format
//!
//! ```json
//! { "multi": "ANY", "types": ["jnt:page", "jnt:content"] }
//! { "multi": "ALL", "filters": [
//!     { "language": "fr", "evaluation": "EQUAL", "property": "jcr:title", "value": "Accueil" }
//! ] }
//! ```

use serde::{Deserialize, Serialize};

/// How several criteria are combined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MulticriteriaEvaluation {
    /// Every criterion must match
    All,
    /// At least one criterion must match
    Any,
    /// No criterion may match
    None,
}

/// How a single property criterion is evaluated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PropertyEvaluation {
    Present,
    Absent,
    Equal,
    Different,
}

impl PropertyEvaluation {
    /// Whether this evaluation compares against a supplied value
    pub fn requires_value(self) -> bool {
        matches!(self, Self::Equal | Self::Different)
    }
}

/// Type criteria: combinator (default ANY) over type names
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeTypesInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multi: Option<MulticriteriaEvaluation>,

    pub types: Vec<String>,
}

impl NodeTypesInput {
    pub fn new<I, S>(multi: Option<MulticriteriaEvaluation>, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            multi,
            types: types.into_iter().map(Into::into).collect(),
        }
    }

    /// Match nodes of any of the given types
    pub fn any<I, S>(types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(Some(MulticriteriaEvaluation::Any), types)
    }

    /// Match nodes of none of the given types
    pub fn none<I, S>(types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(Some(MulticriteriaEvaluation::None), types)
    }

    /// Effective combinator
    pub fn evaluation(&self) -> MulticriteriaEvaluation {
        self.multi.unwrap_or(MulticriteriaEvaluation::Any)
    }
}

/// One property criterion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodePropertyInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evaluation: Option<PropertyEvaluation>,

    pub property: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl NodePropertyInput {
    /// `EQUAL` criterion
    pub fn equal(property: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            language: None,
            evaluation: Some(PropertyEvaluation::Equal),
            property: property.into(),
            value: Some(value.into()),
        }
    }

    /// `DIFFERENT` criterion
    pub fn different(property: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            evaluation: Some(PropertyEvaluation::Different),
            ..Self::equal(property, value)
        }
    }

    /// `PRESENT` criterion
    pub fn present(property: impl Into<String>) -> Self {
        Self {
            language: None,
            evaluation: Some(PropertyEvaluation::Present),
            property: property.into(),
            value: None,
        }
    }

    /// `ABSENT` criterion
    pub fn absent(property: impl Into<String>) -> Self {
        Self {
            evaluation: Some(PropertyEvaluation::Absent),
            ..Self::present(property)
        }
    }

    pub fn in_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// Effective evaluation
    pub fn evaluation(&self) -> PropertyEvaluation {
        self.evaluation.unwrap_or(PropertyEvaluation::Equal)
    }
}

/// Property criteria: combinator (default ALL) over property filters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodePropertiesInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multi: Option<MulticriteriaEvaluation>,

    pub filters: Vec<NodePropertyInput>,
}

impl NodePropertiesInput {
    pub fn new(multi: Option<MulticriteriaEvaluation>, filters: Vec<NodePropertyInput>) -> Self {
        Self { multi, filters }
    }

    /// Match nodes passing every filter
    pub fn all(filters: Vec<NodePropertyInput>) -> Self {
        Self::new(Some(MulticriteriaEvaluation::All), filters)
    }

    /// Effective combinator
    pub fn evaluation(&self) -> MulticriteriaEvaluation {
        self.multi.unwrap_or(MulticriteriaEvaluation::All)
    }
}
