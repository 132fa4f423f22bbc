//! Filter Engine - Composable Node Predicates
//!
//! Caller filter inputs ([`NodeTypesInput`], [`NodePropertiesInput`], a name
//! list) are validated once by [`NodePredicate::compile`] and then evaluated per
//! node by [`FilterEngine::matches`].
//!
//! # Evaluation
//!
//! - Combinators short-circuit in declaration order
//! - Empty `All` and `None` accept, empty `Any` rejects
//! - A node "is" a type when its primary type, a mixin, or any transitive
//!   supertype of those carries that name
//! - Property algorithms come from an immutable [`EvaluationTable`] built once
//!   per service and borrowed by every engine

use crate::db::{ContentStore, StoreError};
use crate::models::{
    MulticriteriaEvaluation, Node, NodePropertiesInput, NodePropertyInput, NodeTypesInput,
    Property, PropertyEvaluation,
};
use crate::services::error::{QueryError, QueryResult};
use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;

/// Validated single-property criterion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyCriterion {
    pub property: String,
    pub language: Option<String>,
    pub evaluation: PropertyEvaluation,
    pub value: Option<String>,
}

impl TryFrom<&NodePropertyInput> for PropertyCriterion {
    type Error = QueryError;

    fn try_from(input: &NodePropertyInput) -> Result<Self, Self::Error> {
        let evaluation = input.evaluation();
        if evaluation.requires_value() && input.value.is_none() {
            return Err(QueryError::wrong_input(format!(
                "Property value is required for {:?} evaluation on '{}'",
                evaluation, input.property
            )));
        }
        if input.property.is_empty() {
            return Err(QueryError::wrong_input("Property name must not be empty"));
        }

        Ok(Self {
            property: input.property.clone(),
            language: input.language.clone(),
            evaluation,
            value: input.value.clone(),
        })
    }
}

/// Evaluable node predicate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodePredicate {
    /// Accepts every node
    True,
    /// Node name is one of the set
    Names(HashSet<String>),
    /// Combinator over `is_node_type` tests
    Types {
        evaluation: MulticriteriaEvaluation,
        types: Vec<String>,
    },
    Property(PropertyCriterion),
    All(Vec<NodePredicate>),
    Any(Vec<NodePredicate>),
    None(Vec<NodePredicate>),
}

impl NodePredicate {
    /// Build the composite predicate `ALL(exclusions, names, types, properties)`
    ///
    /// `excluded_types` become a NONE type term applied regardless of caller
    /// input; absent caller inputs contribute nothing.
    ///
    /// # Errors
    ///
    /// Returns `QueryError::WrongInput` if a property criterion is unusable
    /// (EQUAL/DIFFERENT without a value, empty property name).
    pub fn compile(
        names: Option<&[String]>,
        types: Option<&NodeTypesInput>,
        properties: Option<&NodePropertiesInput>,
        excluded_types: &[String],
    ) -> QueryResult<Self> {
        let mut terms = Vec::with_capacity(4);

        if !excluded_types.is_empty() {
            terms.push(Self::Types {
                evaluation: MulticriteriaEvaluation::None,
                types: excluded_types.to_vec(),
            });
        }

        if let Some(names) = names {
            terms.push(Self::Names(names.iter().cloned().collect()));
        }

        if let Some(types) = types {
            terms.push(Self::Types {
                evaluation: types.evaluation(),
                types: types.types.clone(),
            });
        }

        if let Some(properties) = properties {
            let criteria = properties
                .filters
                .iter()
                .map(|f| PropertyCriterion::try_from(f).map(Self::Property))
                .collect::<QueryResult<Vec<_>>>()?;
            terms.push(Self::combine(properties.evaluation(), criteria));
        }

        Ok(match terms.len() {
            0 => Self::True,
            _ => Self::All(terms),
        })
    }

    /// Wrap predicates in the given combinator
    pub fn combine(evaluation: MulticriteriaEvaluation, predicates: Vec<NodePredicate>) -> Self {
        match evaluation {
            MulticriteriaEvaluation::All => Self::All(predicates),
            MulticriteriaEvaluation::Any => Self::Any(predicates),
            MulticriteriaEvaluation::None => Self::None(predicates),
        }
    }
}

/// Property evaluation algorithm: (property as seen, comparison value) -> match
pub type PropertyAlgorithm = fn(Option<&Property>, Option<&str>) -> bool;

/// Immutable table of property evaluation algorithms
#[derive(Clone)]
pub struct EvaluationTable {
    algorithms: HashMap<PropertyEvaluation, PropertyAlgorithm>,
}

impl fmt::Debug for EvaluationTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.algorithms.keys()).finish()
    }
}

impl Default for EvaluationTable {
    fn default() -> Self {
        let mut algorithms: HashMap<PropertyEvaluation, PropertyAlgorithm> = HashMap::new();
        algorithms.insert(PropertyEvaluation::Present, |p, _| p.is_some());
        algorithms.insert(PropertyEvaluation::Absent, |p, _| p.is_none());
        algorithms.insert(PropertyEvaluation::Equal, has_value);
        algorithms.insert(PropertyEvaluation::Different, |p, v| !has_value(p, v));
        Self { algorithms }
    }
}

impl EvaluationTable {
    /// Table with the standard algorithms
    pub fn new() -> Self {
        Self::default()
    }

    pub fn algorithm(&self, evaluation: PropertyEvaluation) -> Option<PropertyAlgorithm> {
        self.algorithms.get(&evaluation).copied()
    }
}

/// Single-valued property equal to `expected`; missing or multi-valued never is
fn has_value(property: Option<&Property>, expected: Option<&str>) -> bool {
    match (property.and_then(Property::value), expected) {
        (Some(actual), Some(expected)) => actual == expected,
        _ => false,
    }
}

/// Breadth-first walk over `roots` and their transitive supertypes
///
/// Visits each type name once, in declaration order, and returns the first one
/// `stop` accepts. Types the store doesn't know are visited but not expanded.
pub fn walk_type_hierarchy<'r, I, F>(
    store: &dyn ContentStore,
    roots: I,
    mut stop: F,
) -> Result<Option<String>, StoreError>
where
    I: IntoIterator<Item = &'r str>,
    F: FnMut(&str) -> bool,
{
    let mut queue: VecDeque<String> = roots.into_iter().map(str::to_string).collect();
    let mut seen: HashSet<String> = queue.iter().cloned().collect();

    while let Some(name) = queue.pop_front() {
        if stop(&name) {
            return Ok(Some(name));
        }
        if let Some(definition) = store.node_type(&name)? {
            for supertype in definition.supertypes {
                if seen.insert(supertype.clone()) {
                    queue.push_back(supertype);
                }
            }
        }
    }

    Ok(None)
}

/// Evaluates [`NodePredicate`]s against nodes
///
/// Side-effect free; the only errors are store failures raised while reading
/// properties or type definitions.
pub struct FilterEngine<'a> {
    store: &'a dyn ContentStore,
    table: &'a EvaluationTable,
}

impl<'a> FilterEngine<'a> {
    pub fn new(store: &'a dyn ContentStore, table: &'a EvaluationTable) -> Self {
        Self { store, table }
    }

    /// Evaluate `predicate` against `node`
    pub fn matches(&self, node: &Node, predicate: &NodePredicate) -> QueryResult<bool> {
        match predicate {
            NodePredicate::True => Ok(true),
            NodePredicate::Names(names) => Ok(names.contains(&node.name)),
            NodePredicate::Types { evaluation, types } => {
                let tests = types.iter().map(|t| self.is_node_type(node, t));
                combine_results(*evaluation, tests)
            }
            NodePredicate::Property(criterion) => self.matches_property(node, criterion),
            NodePredicate::All(terms) => combine_results(
                MulticriteriaEvaluation::All,
                terms.iter().map(|t| self.matches(node, t)),
            ),
            NodePredicate::Any(terms) => combine_results(
                MulticriteriaEvaluation::Any,
                terms.iter().map(|t| self.matches(node, t)),
            ),
            NodePredicate::None(terms) => combine_results(
                MulticriteriaEvaluation::None,
                terms.iter().map(|t| self.matches(node, t)),
            ),
        }
    }

    /// Whether `node` is of `type_name`, directly, through a mixin, or through
    /// any transitive supertype
    pub fn is_node_type(&self, node: &Node, type_name: &str) -> QueryResult<bool> {
        let found = walk_type_hierarchy(self.store, node.declared_types(), |t| t == type_name)?;
        Ok(found.is_some())
    }

    fn matches_property(&self, node: &Node, criterion: &PropertyCriterion) -> QueryResult<bool> {
        let algorithm = self.table.algorithm(criterion.evaluation).ok_or_else(|| {
            QueryError::wrong_input(format!(
                "Unsupported property evaluation {:?}",
                criterion.evaluation
            ))
        })?;

        let property = self
            .store
            .property(node, &criterion.property, criterion.language.as_deref())?;
        Ok(algorithm(property.as_ref(), criterion.value.as_deref()))
    }
}

/// Short-circuiting combinator over lazily evaluated tests
fn combine_results<I>(evaluation: MulticriteriaEvaluation, tests: I) -> QueryResult<bool>
where
    I: IntoIterator<Item = QueryResult<bool>>,
{
    for test in tests {
        let matched = test?;
        match evaluation {
            MulticriteriaEvaluation::All if !matched => return Ok(false),
            MulticriteriaEvaluation::Any if matched => return Ok(true),
            MulticriteriaEvaluation::None if matched => return Ok(false),
            _ => {}
        }
    }

    Ok(match evaluation {
        MulticriteriaEvaluation::All | MulticriteriaEvaluation::None => true,
        MulticriteriaEvaluation::Any => false,
    })
}
