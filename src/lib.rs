//! # Investigation Knowledge Graph Service
//!
//! A REST service that stores structured argumentation artifacts -
//! investigations, definitions, claims, counterarguments, and evidence -
//! cross-referenced through inline links embedded in rich-text bodies.
//!
//! ## Features
//!
//! - **Entity Store**: durable records with server-assigned ids, timestamps,
//!   and cascading deletes over SQLite
//! - **Slug Index**: human-chosen, scope-unique slugs with deterministic
//!   collision suffixing and tombstoned history
//! - **Link Resolver**: inline definition/claim references validated on
//!   write (warnings, never failures) and annotated live/dangling on read
//! - **Ordering Engine**: dense 0-based sibling positions with single-step
//!   promote/demote as an atomic transposition
//! - **Graph Search**: field-weighted, relevance-ranked lookup across
//!   definitions and claims
//!
//! ## Architecture
//!
//! ```text
//! HTTP client → axum handlers → GraphService / SearchEngine
//!                                      ↓
//!                                SQLite (state)
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use investigation_graph::{api, AppState, Config, GraphService, SearchEngine, SqliteStorage};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_env()?;
//!     let storage = SqliteStorage::new(&config.database).await?;
//!     let graph = GraphService::new(storage.clone(), None);
//!     let search = SearchEngine::new(storage);
//!     let state = Arc::new(AppState::new(config, graph, search));
//!     let app = api::router(state);
//!     let listener = tokio::net::TcpListener::bind("127.0.0.1:8080").await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]

/// REST boundary: router, handlers, and error mapping.
pub mod api;
/// Configuration management for the service.
pub mod config;
/// Error types and result aliases for the application.
pub mod error;
/// Graph service orchestrating entity lifecycle and cross-references.
pub mod graph;
/// Knowledge-base collaborator client.
pub mod kb;
/// Inline reference extraction and resolution types.
pub mod links;
/// Sibling ordering rules.
pub mod ordering;
/// Relevance-ranked search over the graph.
pub mod search;
/// Slug derivation for the slug index.
pub mod slugs;
/// SQLite storage layer for persistence.
pub mod storage;

pub use api::{AppState, SharedState};
pub use config::Config;
pub use error::{AppError, AppResult};
pub use graph::GraphService;
pub use search::SearchEngine;
pub use storage::SqliteStorage;
