//! Integration Tests for NodeQueryService
//!
//! These tests run the full query surface against the in-memory reference
//! store loaded from `fixtures/site.json`:
//!
//! ```text
//! /sites/acme (jnt:virtualsite)
//!   home (jnt:page)
//!     j:translation_fr (jnt:translation)
//!     about (jnt:page)
//!       intro (jnt:text + jmix:tagged)
//!     news (jnt:news)
//!     contact (jnt:page)
//! ```

use std::sync::Arc;
use treeql_core::db::{InMemoryStore, QueryDialect};
use treeql_core::models::{
    MulticriteriaEvaluation, NodePropertiesInput, NodePropertyInput, NodeTypeDefinition,
    NodeTypesInput, NodeTypesListInput, Page, PageWindow, Workspace,
};
use treeql_core::services::{
    ErrorType, NodeFilter, NodeQueryService, PaginationArguments, QueryError, ResolvedNode,
};
use treeql_core::EngineConfig;

const FIXTURE: &str = include_str!("fixtures/site.json");

fn fixture_store() -> InMemoryStore {
    InMemoryStore::from_json(FIXTURE).unwrap()
}

fn create_test_service() -> NodeQueryService {
    NodeQueryService::with_defaults(Arc::new(fixture_store()))
}

fn ids(nodes: &[ResolvedNode]) -> Vec<&str> {
    nodes.iter().map(|n| n.node.id.as_str()).collect()
}

fn node(service: &NodeQueryService, path: &str) -> ResolvedNode {
    service.get_node_by_path(None, path, None).unwrap()
}

#[test]
fn test_get_node_by_path_and_id() {
    let service = create_test_service();

    let home = node(&service, "/sites/acme/home");
    assert_eq!(home.node.id, "home");
    assert_eq!(home.node.workspace, Workspace::edit());

    let by_id = service.get_node_by_id(Some(&Workspace::live()), "home", None).unwrap();
    assert_eq!(by_id.node.workspace, Workspace::live());
    assert_eq!(by_id.node.path, "/sites/acme/home");
}

#[test]
fn test_missing_node_is_not_found() {
    let service = create_test_service();

    let result = service.get_node_by_path(None, "/sites/nowhere", None);
    assert!(matches!(result, Err(QueryError::NotFound { .. })));

    let result = service.get_node_by_id(Some(&Workspace::live()), "about", None);
    assert!(matches!(result, Err(QueryError::NotFound { .. })));
}

#[test]
fn test_get_nodes_keep_argument_order() {
    let service = create_test_service();

    let nodes = service
        .get_nodes_by_id(None, &["news".to_string(), "home".to_string()], None)
        .unwrap();
    assert_eq!(ids(&nodes), vec!["news", "home"]);

    let nodes = service
        .get_nodes_by_path(
            None,
            &["/sites/acme/home/about".to_string(), "/sites".to_string()],
            None,
        )
        .unwrap();
    assert_eq!(ids(&nodes), vec!["about", "sites"]);

    let missing = service.get_nodes_by_id(None, &["home".to_string(), "ghost".to_string()], None);
    assert!(matches!(missing, Err(QueryError::NotFound { .. })));
}

#[test]
fn test_children_exclude_translations_by_default() {
    let service = create_test_service();
    let home = node(&service, "/sites/acme/home");

    let page = service
        .children(&home, &NodeFilter::default(), &PageWindow::all())
        .unwrap();
    let nodes = page.into_nodes();
    assert_eq!(ids(&nodes), vec!["about", "news", "contact"]);
}

#[test]
fn test_with_defaults_matches_default_config() {
    let defaults = create_test_service();
    let explicit =
        NodeQueryService::new(Arc::new(fixture_store()), EngineConfig::default()).unwrap();

    let a = node(&defaults, "/sites/acme/home");
    let b = node(&explicit, "/sites/acme/home");
    assert_eq!(defaults.global_id(&a), explicit.global_id(&b));

    let children = |service: &NodeQueryService, view: &ResolvedNode| {
        let page = service
            .children(view, &NodeFilter::default(), &PageWindow::first(1))
            .unwrap();
        (page.page_info.total_count, page.page_info.end_cursor)
    };
    assert_eq!(children(&defaults, &a), children(&explicit, &b));
}

#[test]
fn test_excluded_child_types_are_configurable() {
    let config = EngineConfig {
        excluded_child_types: vec![],
        ..Default::default()
    };
    let service = NodeQueryService::new(Arc::new(fixture_store()), config).unwrap();
    let home = node(&service, "/sites/acme/home");

    let page = service
        .children(&home, &NodeFilter::default(), &PageWindow::all())
        .unwrap();
    assert_eq!(page.page_info.total_count, 4);
}

#[test]
fn test_children_filtered_by_name_and_type() {
    let service = create_test_service();
    let home = node(&service, "/sites/acme/home");

    let by_name = service
        .children(&home, &NodeFilter::default().with_names(["news", "contact"]), &PageWindow::all())
        .unwrap()
        .into_nodes();
    assert_eq!(ids(&by_name), vec!["news", "contact"]);

    let pages = service
        .children(
            &home,
            &NodeFilter::default().with_types(NodeTypesInput::any(["jnt:page"])),
            &PageWindow::all(),
        )
        .unwrap()
        .into_nodes();
    assert_eq!(ids(&pages), vec!["about", "contact"]);
}

#[test]
fn test_descendants_pre_order_with_filters() {
    let service = create_test_service();
    let home = node(&service, "/sites/acme/home");

    let all = service
        .descendants(&home, &NodeFilter::default(), &PageWindow::all())
        .unwrap()
        .into_nodes();
    assert_eq!(ids(&all), vec!["about", "intro", "news", "contact"]);

    let content = service
        .descendants(
            &home,
            &NodeFilter::default().with_types(NodeTypesInput::none(["jnt:page"])),
            &PageWindow::all(),
        )
        .unwrap()
        .into_nodes();
    assert_eq!(ids(&content), vec!["intro", "news"]);

    let priority_two = service
        .descendants(
            &home,
            &NodeFilter::default().with_properties(NodePropertiesInput::all(vec![
                NodePropertyInput::equal("j:priority", "2"),
            ])),
            &PageWindow::all(),
        )
        .unwrap()
        .into_nodes();
    assert_eq!(ids(&priority_two), vec!["about", "news"]);
}

#[test]
fn test_descendants_mixin_and_language_filters() {
    let service = create_test_service();
    let acme = node(&service, "/sites/acme");

    let tagged = service
        .descendants(
            &acme,
            &NodeFilter::default().with_types(NodeTypesInput::any(["jmix:tagged"])),
            &PageWindow::all(),
        )
        .unwrap()
        .into_nodes();
    assert_eq!(ids(&tagged), vec!["intro"]);

    let filter = NodeFilter::default().with_properties(NodePropertiesInput::new(
        Some(MulticriteriaEvaluation::Any),
        vec![
            NodePropertyInput::equal("jcr:title", "Accueil").in_language("fr"),
            NodePropertyInput::equal("jcr:title", "About").in_language("en"),
        ],
    ));
    let titled = service
        .descendants(&acme, &filter, &PageWindow::all())
        .unwrap()
        .into_nodes();
    assert_eq!(ids(&titled), vec!["home", "about"]);
}

#[test]
fn test_paging_through_descendants() {
    let service = create_test_service();
    let home = node(&service, "/sites/acme/home");

    let first = service
        .descendants(&home, &NodeFilter::default(), &PageWindow::first(2))
        .unwrap();
    assert_eq!(first.len(), 2);
    assert!(first.page_info.has_next_page);
    assert!(!first.page_info.has_previous_page);
    assert_eq!(first.page_info.total_count, 4);

    let window = PaginationArguments {
        first: Some(2),
        after: first.page_info.end_cursor.clone(),
        ..Default::default()
    }
    .into_window()
    .unwrap();
    let second = service
        .descendants(&home, &NodeFilter::default(), &window)
        .unwrap();
    let nodes = second.into_nodes();
    assert_eq!(ids(&nodes), vec!["news", "contact"]);
}

#[test]
fn test_foreign_cursor_is_rejected() {
    let service = create_test_service();
    let home = node(&service, "/sites/acme/home");

    let cursor = service.pagination().encode_cursor("sites");
    let result = service.children(&home, &NodeFilter::default(), &PageWindow::after(cursor, None));
    assert!(matches!(result, Err(QueryError::InvalidCursor { .. })));
}

#[test]
fn test_equal_without_value_is_wrong_input() {
    let service = create_test_service();
    let home = node(&service, "/sites/acme/home");

    let filter = NodeFilter::default().with_properties(NodePropertiesInput::all(vec![
        NodePropertyInput {
            language: None,
            evaluation: None,
            property: "jcr:title".to_string(),
            value: None,
        },
    ]));
    let result = service.children(&home, &filter, &PageWindow::all());
    assert!(matches!(result, Err(QueryError::WrongInput(_))));
}

#[test]
fn test_ancestors() {
    let service = create_test_service();
    let intro = node(&service, "/sites/acme/home/about/intro");

    let all = service.ancestors(&intro, None).unwrap();
    let paths: Vec<&str> = all.iter().map(|a| a.node.path.as_str()).collect();
    assert_eq!(
        paths,
        vec!["/", "/sites", "/sites/acme", "/sites/acme/home", "/sites/acme/home/about"]
    );

    for up_to in ["/sites/acme", "/sites/acme/"] {
        let limited = service.ancestors(&intro, Some(up_to)).unwrap();
        assert_eq!(ids(&limited), vec!["acme", "home", "about"]);
    }

    assert_eq!(service.ancestors(&intro, Some("/")).unwrap().len(), 5);
}

#[test]
fn test_ancestors_invalid_upper_bound() {
    let service = create_test_service();
    let intro = node(&service, "/sites/acme/home/about/intro");

    for up_to in ["", "/sites/acme/home/about/intro", "/sites/other", "/sites/ac"] {
        let result = service.ancestors(&intro, Some(up_to));
        assert!(
            matches!(result, Err(QueryError::WrongInput(_))),
            "expected WrongInput for '{}'",
            up_to
        );
    }
}

#[test]
fn test_parent_and_child() {
    let service = create_test_service();
    let about = node(&service, "/sites/acme/home/about");

    let parent = service.parent(&about).unwrap().unwrap();
    assert_eq!(parent.node.id, "home");

    let root = node(&service, "/");
    assert!(service.parent(&root).unwrap().is_none());

    let child = service.child(&parent, "news").unwrap().unwrap();
    assert_eq!(child.node.id, "news");
    assert!(service.child(&parent, "missing").unwrap().is_none());
}

#[test]
fn test_properties_and_language_projection() {
    let service = create_test_service();
    let home = node(&service, "/sites/acme/home");

    let title = service.property(&home, "jcr:title", Some("fr")).unwrap().unwrap();
    assert_eq!(title.value(), Some("Accueil"));
    assert_eq!(title.language.as_deref(), Some("fr"));
    assert!(service.property(&home, "j:missing", None).unwrap().is_none());

    let names = vec!["j:priority".to_string()];
    let only_priority = service.properties(&home, Some(&names), None).unwrap();
    assert_eq!(only_priority.len(), 1);
    assert_eq!(only_priority[0].value(), Some("1"));

    let french = service.project(&home, Some("fr")).unwrap();
    assert_eq!(french.node.id, home.node.id);
    assert_eq!(french.node.language.as_deref(), Some("fr"));
}

#[test]
fn test_display_name() {
    let service = create_test_service();
    let home = node(&service, "/sites/acme/home");
    let contact = node(&service, "/sites/acme/home/contact");

    assert_eq!(service.display_name(&home, Some("fr")).unwrap(), "Accueil");
    assert_eq!(service.display_name(&home, Some("en")).unwrap(), "Home");
    assert_eq!(service.display_name(&home, Some("de")).unwrap(), "home");
    assert_eq!(service.display_name(&contact, Some("en")).unwrap(), "contact");
}

#[test]
fn test_references_and_reference_resolution() {
    let service = create_test_service();
    let about = node(&service, "/sites/acme/home/about");

    let references = service.references(&about, &PageWindow::all()).unwrap();
    let owners: Vec<(&str, &str)> = references
        .nodes()
        .map(|p| (p.owner_id.as_str(), p.name.as_str()))
        .collect();
    assert_eq!(owners, vec![("intro", "j:related"), ("news", "j:link")]);

    let owning: Vec<String> = references
        .nodes()
        .map(|p| service.property_node(p).unwrap().node.path)
        .collect();
    assert_eq!(
        owning,
        vec!["/sites/acme/home/about/intro", "/sites/acme/home/news"]
    );
    let paths: Vec<String> = references
        .nodes()
        .map(|p| service.property_path(p).unwrap())
        .collect();
    assert_eq!(
        paths,
        vec![
            "/sites/acme/home/about/intro/j:related",
            "/sites/acme/home/news/j:link"
        ]
    );

    let news = node(&service, "/sites/acme/home/news");
    let link = service.property(&news, "j:link", None).unwrap().unwrap();
    let target = service.ref_node(&link).unwrap().unwrap();
    assert_eq!(target.node.id, "about");

    let broken = service.property(&news, "j:broken", None).unwrap().unwrap();
    assert!(matches!(
        service.ref_node(&broken),
        Err(QueryError::UnresolvedReference(_))
    ));

    let priority = service.property(&news, "j:priority", None).unwrap().unwrap();
    assert!(matches!(
        service.ref_node(&priority),
        Err(QueryError::UnresolvedReference(_))
    ));

    let intro = node(&service, "/sites/acme/home/about/intro");
    let related = service.property(&intro, "j:related", None).unwrap().unwrap();
    let targets = service.ref_nodes(&related).unwrap().unwrap();
    assert_eq!(ids(&targets), vec!["home", "about"]);
}

#[test]
fn test_node_in_workspace() {
    let service = create_test_service();
    let home = node(&service, "/sites/acme/home");
    let about = node(&service, "/sites/acme/home/about");

    let live = service.node_in_workspace(&home, &Workspace::live()).unwrap().unwrap();
    assert_eq!(live.node.id, "home");
    assert_eq!(live.node.workspace, Workspace::live());

    assert!(service
        .node_in_workspace(&about, &Workspace::live())
        .unwrap()
        .is_none());
}

#[test]
fn test_global_id_round_trip() {
    let service = create_test_service();
    let live_home = service.get_node_by_id(Some(&Workspace::live()), "home", None).unwrap();

    let global_id = service.global_id(&live_home);
    let resolved = service.resolve_global_id(&global_id).unwrap();
    assert_eq!(resolved.node.id, "home");
    assert_eq!(resolved.node.workspace, Workspace::live());

    assert!(matches!(
        service.resolve_global_id("bm90LWEtbm9kZQ=="),
        Err(QueryError::InvalidIdentifier(_))
    ));
}

#[test]
fn test_structured_queries() {
    let service = create_test_service();

    let sql2 = service
        .get_nodes_by_query(
            None,
            "SELECT * FROM [jnt:page] AS p WHERE ISDESCENDANTNODE(p, '/sites/acme')",
            None,
            QueryDialect::Sql2,
            &PageWindow::all(),
        )
        .unwrap()
        .into_nodes();
    assert_eq!(ids(&sql2), vec!["home", "about", "contact"]);

    let xpath = service
        .get_nodes_by_query(
            None,
            "/jcr:root/sites/acme//element(*, jnt:content)",
            Some("fr"),
            QueryDialect::XPath,
            &PageWindow::first(2),
        )
        .unwrap();
    assert!(xpath.page_info.has_next_page);
    assert_eq!(xpath.page_info.total_count, 5);
    let nodes = xpath.into_nodes();
    assert_eq!(ids(&nodes), vec!["home", "about"]);
    assert_eq!(nodes[0].node.language.as_deref(), Some("fr"));
}

#[test]
fn test_invalid_query_is_a_data_fetching_error() {
    let service = create_test_service();

    let err = service
        .get_nodes_by_query(None, "DELETE everything", None, QueryDialect::Sql2, &PageWindow::all())
        .unwrap_err();
    assert_eq!(err.error_type(), ErrorType::DataFetchingException);
}

#[test]
fn test_store_failure_surfaces_as_data_fetching() {
    let mut store = fixture_store();
    store.fail_on("children");
    let service = NodeQueryService::with_defaults(Arc::new(store));
    let home = node(&service, "/sites/acme/home");

    let err = service
        .children(&home, &NodeFilter::default(), &PageWindow::all())
        .unwrap_err();
    assert!(matches!(err, QueryError::DataFetching(_)));
    assert!(!err.is_client_error());
}

#[test]
fn test_node_types() {
    let service = create_test_service();

    let page = service.node_type_by_name("jnt:page").unwrap();
    assert!(page.has_orderable_child_nodes);
    assert!(matches!(
        service.node_type_by_name("jnt:unknown"),
        Err(QueryError::NotFound { .. })
    ));

    let everything = service
        .node_types(&NodeTypesListInput::default(), &PageWindow::all())
        .unwrap();
    assert_eq!(everything.page_info.total_count, 9);

    let mixins_only = NodeTypesListInput {
        include_mixins: true,
        include_non_mixins: false,
    };
    let mixins = service
        .node_types(&mixins_only, &PageWindow::all())
        .unwrap()
        .into_nodes();
    assert_eq!(mixins.len(), 1);
    assert_eq!(mixins[0].name, "jmix:tagged");

    let first = service
        .node_types(&NodeTypesListInput::default(), &PageWindow::first(3))
        .unwrap();
    assert_eq!(first.len(), 3);
    assert!(first.page_info.has_next_page);
}

#[test]
fn test_subtypes() {
    let service = create_test_service();

    let names = |page: Page<NodeTypeDefinition>| {
        page.into_nodes().into_iter().map(|t| t.name).collect::<Vec<_>>()
    };

    let content = service.subtypes("jnt:content", &PageWindow::all()).unwrap();
    assert_eq!(names(content), vec!["jnt:news", "jnt:page", "jnt:text"]);

    let base = service.subtypes("nt:base", &PageWindow::all()).unwrap();
    assert_eq!(base.page_info.total_count, 7);
    assert!(names(base).contains(&"jnt:page".to_string()));

    let first = service.subtypes("nt:base", &PageWindow::first(2)).unwrap();
    assert_eq!(first.len(), 2);
    assert!(first.page_info.has_next_page);
    let cursor = first.page_info.end_cursor.clone().unwrap();
    let rest = service
        .subtypes("nt:base", &PageWindow::after(cursor, None))
        .unwrap();
    assert_eq!(rest.len(), 5);

    assert!(service
        .subtypes("jmix:tagged", &PageWindow::all())
        .unwrap()
        .is_empty());
    assert!(matches!(
        service.subtypes("jnt:unknown", &PageWindow::all()),
        Err(QueryError::NotFound { .. })
    ));
}

#[test]
fn test_supertypes_and_is_node_type() {
    let service = create_test_service();

    let supertypes: Vec<String> = service
        .supertypes("jnt:page")
        .unwrap()
        .into_iter()
        .map(|t| t.name)
        .collect();
    assert_eq!(supertypes, vec!["jnt:content", "nt:base"]);

    let intro = node(&service, "/sites/acme/home/about/intro");
    assert!(service.is_node_type(&intro, "nt:base").unwrap());
    assert!(service.is_node_type(&intro, "jmix:tagged").unwrap());
    assert!(!service.is_node_type(&intro, "jnt:page").unwrap());
}
