//! TreeQL Core Query Engine
//!
//! This crate provides the query, filtering, type-resolution and pagination
//! engine that exposes a hierarchical content store through one polymorphic,
//! filterable, paginated query surface.
//!
//! # Architecture
//!
//! - **External Store**: the content tree lives behind the [`db::ContentStore`]
//!   trait; the engine only reads
//! - **Explicit Context**: workspace and language travel with every read
//! - **Open Type Registry**: representations are registered at runtime and
//!   resolved through the supertype chain
//! - **Opaque Identity**: global ids and cursors are base64 tokens
//!
//! # Modules
//!
//! - [`models`] - Data structures (Node, Property, filters, pages)
//! - [`services`] - Query components and the [`NodeQueryService`] surface
//! - [`db`] - Store contract and the in-memory reference store
//! - [`config`] - Engine configuration

pub mod config;
pub mod db;
pub mod models;
pub mod services;

// Re-export commonly used types
pub use config::EngineConfig;
pub use models::*;
pub use services::*;
