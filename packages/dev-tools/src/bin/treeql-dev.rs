//! Development Query Runner
//!
//! Loads a JSON fixture into the in-memory reference store, looks up a node by
//! path and prints a filtered page of its descendants as JSON. Useful for
//! checking fixture shapes and filter behavior without a host application.
//!
//! # Usage
//!
//! ```bash
//! # All descendants of /sites/acme
//! cargo run --bin treeql-dev -- packages/core/tests/fixtures/site.json /sites/acme
//!
//! # Only pages, first 2, in French
//! TREEQL_LANGUAGE=fr TREEQL_PAGE_SIZE=2 \
//!   cargo run --bin treeql-dev -- packages/core/tests/fixtures/site.json /sites/acme jnt:page
//! ```
//!
//! # Environment
//!
//! - `TREEQL_WORKSPACE`, `TREEQL_EXCLUDED_CHILD_TYPES`, `TREEQL_ID_PREFIX`: engine config
//! - `TREEQL_LANGUAGE`: language used for lookups and display names
//! - `TREEQL_PAGE_SIZE`: page size (default: everything)
//! - `RUST_LOG`: log filter (default `treeql_dev=info,treeql_core=info`)

use anyhow::{bail, Context};
use serde_json::{json, Value};
use std::env;
use std::fs;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use treeql_core::db::InMemoryStore;
use treeql_core::models::{NodeTypesInput, PageWindow};
use treeql_core::services::{NodeFilter, NodeQueryService};
use treeql_core::EngineConfig;

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("treeql_dev=info,treeql_core=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().skip(1).collect();
    if args.len() < 2 {
        bail!("usage: treeql-dev <fixture.json> <node path> [type filter]");
    }
    let (fixture_path, node_path, type_filter) = (&args[0], &args[1], args.get(2));

    let fixture = fs::read_to_string(fixture_path)
        .with_context(|| format!("Failed to read fixture {}", fixture_path))?;
    let store = InMemoryStore::from_json(&fixture)?;
    tracing::info!("Loaded fixture {}", fixture_path);

    let config = EngineConfig::from_env().context("Invalid TREEQL_* configuration")?;
    let service = NodeQueryService::new(Arc::new(store), config)?;

    let language = env::var("TREEQL_LANGUAGE").ok();
    let window = match env::var("TREEQL_PAGE_SIZE") {
        Ok(size) => PageWindow::first(
            size.parse()
                .with_context(|| format!("TREEQL_PAGE_SIZE is not a number: {}", size))?,
        ),
        Err(_) => PageWindow::all(),
    };

    let mut filter = NodeFilter::default();
    if let Some(node_type) = type_filter {
        filter = filter.with_types(NodeTypesInput::any([node_type.as_str()]));
    }

    let start = service.get_node_by_path(None, node_path, language.as_deref())?;
    let page = service.descendants(&start, &filter, &window)?;

    let mut edges = Vec::with_capacity(page.len());
    for edge in &page.edges {
        edges.push(json!({
            "cursor": edge.cursor,
            "globalId": service.global_id(&edge.node),
            "typeName": edge.node.type_name,
            "displayName": service.display_name(&edge.node, language.as_deref())?,
            "fields": Value::Object(service.fields(&edge.node)?),
        }));
    }

    let output = json!({
        "node": {
            "path": start.node.path,
            "globalId": service.global_id(&start),
            "typeName": start.type_name,
        },
        "edges": edges,
        "pageInfo": serde_json::to_value(&page.page_info)?,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}
