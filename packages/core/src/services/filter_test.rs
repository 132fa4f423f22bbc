//! Tests for FilterEngine and NodePredicate compilation

#[cfg(test)]
mod tests {
    use crate::db::{ContentStore, InMemoryStore, StoredNode, StoredProperty};
    use crate::models::{
        AccessContext, MulticriteriaEvaluation, Node, NodePropertiesInput, NodePropertyInput,
        NodeTypeDefinition, NodeTypesInput, PropertyType, Workspace,
    };
    use crate::services::error::QueryError;
    use crate::services::filter::{EvaluationTable, FilterEngine, NodePredicate};

    fn store() -> InMemoryStore {
        let mut store = InMemoryStore::new();
        store
            .register_type(NodeTypeDefinition::new("nt:base"))
            .register_type(NodeTypeDefinition::new("jnt:content").with_supertypes(["nt:base"]))
            .register_type(NodeTypeDefinition::new("jnt:page").with_supertypes(["jnt:content"]))
            .register_type(NodeTypeDefinition::new("jnt:text").with_supertypes(["jnt:content"]))
            .register_type(NodeTypeDefinition::mixin("jmix:tagged").with_supertypes(["jmix:meta"]))
            .register_type(NodeTypeDefinition::new("jnt:translation"));

        let ws = Workspace::edit();
        store
            .insert(
                &ws,
                StoredNode::new("home", "/home", "jnt:page")
                    .with_property(
                        StoredProperty::translated("jcr:title", PropertyType::String)
                            .with_translation("en", "Home")
                            .with_translation("fr", "Accueil"),
                    )
                    .with_property(StoredProperty::new("j:priority", PropertyType::Long, "3"))
                    .with_property(StoredProperty::multiple(
                        "j:tags",
                        PropertyType::String,
                        ["a", "b"],
                    )),
            )
            .unwrap();
        store
            .insert(
                &ws,
                StoredNode::new("news", "/home/news", "jnt:text").with_mixins(["jmix:tagged"]),
            )
            .unwrap();
        store
            .insert(
                &ws,
                StoredNode::new("tr-fr", "/home/j:translation_fr", "jnt:translation"),
            )
            .unwrap();
        store
    }

    fn node(store: &InMemoryStore, path: &str) -> Node {
        store
            .get_by_path(&AccessContext::new(Workspace::edit()), path)
            .unwrap()
            .unwrap()
    }

    fn matches(store: &InMemoryStore, path: &str, predicate: &NodePredicate) -> bool {
        let table = EvaluationTable::new();
        let engine = FilterEngine::new(store, &table);
        engine.matches(&node(store, path), predicate).unwrap()
    }

    #[test]
    fn test_is_node_type_through_supertypes_and_mixins() {
        let store = store();
        let table = EvaluationTable::new();
        let engine = FilterEngine::new(&store, &table);

        let home = node(&store, "/home");
        assert!(engine.is_node_type(&home, "jnt:page").unwrap());
        assert!(engine.is_node_type(&home, "jnt:content").unwrap());
        assert!(engine.is_node_type(&home, "nt:base").unwrap());
        assert!(!engine.is_node_type(&home, "jnt:text").unwrap());

        let news = node(&store, "/home/news");
        assert!(engine.is_node_type(&news, "jmix:tagged").unwrap());
        // supertype of a mixin; not itself registered
        assert!(engine.is_node_type(&news, "jmix:meta").unwrap());
    }

    #[test]
    fn test_empty_none_types_matches_everything() {
        let store = store();
        let predicate = NodePredicate::Types {
            evaluation: MulticriteriaEvaluation::None,
            types: vec![],
        };
        for path in ["/home", "/home/news", "/home/j:translation_fr"] {
            assert!(matches(&store, path, &predicate));
        }
    }

    #[test]
    fn test_empty_combinators() {
        let store = store();
        assert!(matches(&store, "/home", &NodePredicate::All(vec![])));
        assert!(!matches(&store, "/home", &NodePredicate::Any(vec![])));
        assert!(matches(&store, "/home", &NodePredicate::None(vec![])));
    }

    #[test]
    fn test_type_combinators() {
        let store = store();
        let any = NodeTypesInput::any(["jnt:text", "jnt:page"]);
        let all = NodeTypesInput::new(Some(MulticriteriaEvaluation::All), ["jnt:text", "jnt:page"]);
        let none = NodeTypesInput::none(["jnt:page"]);

        let compile = |input: &NodeTypesInput| NodePredicate::compile(None, Some(input), None, &[]).unwrap();

        assert!(matches(&store, "/home", &compile(&any)));
        assert!(!matches(&store, "/home", &compile(&all)));
        assert!(!matches(&store, "/home", &compile(&none)));
        assert!(matches(&store, "/home/news", &compile(&none)));
    }

    #[test]
    fn test_default_exclusions() {
        let store = store();
        let excluded = vec!["jnt:translation".to_string()];
        let predicate = NodePredicate::compile(None, None, None, &excluded).unwrap();

        assert!(matches(&store, "/home", &predicate));
        assert!(!matches(&store, "/home/j:translation_fr", &predicate));
    }

    #[test]
    fn test_name_filter() {
        let store = store();
        let names = vec!["news".to_string()];
        let predicate = NodePredicate::compile(Some(&names), None, None, &[]).unwrap();

        assert!(matches(&store, "/home/news", &predicate));
        assert!(!matches(&store, "/home", &predicate));
    }

    #[test]
    fn test_property_evaluations() {
        let store = store();
        let compile = |filters: Vec<NodePropertyInput>| {
            NodePredicate::compile(None, None, Some(&NodePropertiesInput::all(filters)), &[]).unwrap()
        };

        assert!(matches(&store, "/home", &compile(vec![NodePropertyInput::present("j:priority")])));
        assert!(matches(&store, "/home/news", &compile(vec![NodePropertyInput::absent("j:priority")])));
        assert!(matches(&store, "/home", &compile(vec![NodePropertyInput::equal("j:priority", "3")])));
        assert!(!matches(&store, "/home", &compile(vec![NodePropertyInput::equal("j:priority", "4")])));
        assert!(matches(&store, "/home", &compile(vec![NodePropertyInput::different("j:priority", "4")])));
    }

    #[test]
    fn test_missing_property_is_different() {
        let store = store();
        let predicate = NodePredicate::compile(
            None,
            None,
            Some(&NodePropertiesInput::all(vec![NodePropertyInput::different("j:priority", "3")])),
            &[],
        )
        .unwrap();
        assert!(matches(&store, "/home/news", &predicate));
    }

    #[test]
    fn test_multi_valued_property_never_equals() {
        let store = store();
        let predicate = NodePredicate::compile(
            None,
            None,
            Some(&NodePropertiesInput::all(vec![NodePropertyInput::equal("j:tags", "a")])),
            &[],
        )
        .unwrap();
        assert!(!matches(&store, "/home", &predicate));
    }

    #[test]
    fn test_language_specific_property() {
        let store = store();
        let compile = |filter: NodePropertyInput| {
            NodePredicate::compile(None, None, Some(&NodePropertiesInput::all(vec![filter])), &[])
                .unwrap()
        };

        let french = NodePropertyInput::equal("jcr:title", "Accueil").in_language("fr");
        let english = NodePropertyInput::equal("jcr:title", "Accueil").in_language("en");
        let german = NodePropertyInput::present("jcr:title").in_language("de");

        assert!(matches(&store, "/home", &compile(french)));
        assert!(!matches(&store, "/home", &compile(english)));
        assert!(!matches(&store, "/home", &compile(german)));
    }

    #[test]
    fn test_property_combinators() {
        let store = store();
        let filters = vec![
            NodePropertyInput::equal("j:priority", "9"),
            NodePropertyInput::present("j:tags"),
        ];

        let any = NodePropertiesInput::new(Some(MulticriteriaEvaluation::Any), filters.clone());
        let none = NodePropertiesInput::new(Some(MulticriteriaEvaluation::None), filters.clone());
        let all = NodePropertiesInput::all(filters);

        let compile = |input: &NodePropertiesInput| NodePredicate::compile(None, None, Some(input), &[]).unwrap();

        assert!(matches(&store, "/home", &compile(&any)));
        assert!(!matches(&store, "/home", &compile(&none)));
        assert!(!matches(&store, "/home", &compile(&all)));
    }

    #[test]
    fn test_equal_without_value_is_wrong_input() {
        let input = NodePropertiesInput::all(vec![NodePropertyInput {
            language: None,
            evaluation: None,
            property: "jcr:title".to_string(),
            value: None,
        }]);

        let result = NodePredicate::compile(None, None, Some(&input), &[]);
        assert!(matches!(result, Err(QueryError::WrongInput(_))));
    }

    #[test]
    fn test_store_failure_propagates() {
        let mut store = store();
        let home = node(&store, "/home");
        store.fail_on("property");

        let table = EvaluationTable::new();
        let engine = FilterEngine::new(&store, &table);
        let predicate = NodePredicate::Property(
            crate::services::filter::PropertyCriterion::try_from(&NodePropertyInput::present("j:priority"))
                .unwrap(),
        );

        assert!(matches!(
            engine.matches(&home, &predicate),
            Err(QueryError::DataFetching(_))
        ));
    }
}
