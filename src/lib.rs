//! Leads API Library
//!
//! Lead tracking for real-estate agents: validated CRUD over buyer leads,
//! filtered and paginated listing, pipeline status changes, and bulk CSV/JSON
//! import and export.
//!
//! # Modules
//!
//! - `api`: API-layer namespace (handlers, router, OpenAPI).
//! - `core`: Domain-layer namespace (models, validation, query building, import).
//! - `data`: Data access layer (store trait, PostgreSQL and in-memory stores).
//! - `config`: Configuration management.
//! - `csv_transfer`: CSV export rendering and import parsing.
//! - `db`: Database connection, pool and migrations.
//! - `db_storage`: PostgreSQL lead store.
//! - `errors`: Error handling types.
//! - `handlers`: HTTP request handlers.
//! - `import`: Bulk import pipeline.
//! - `memory_store`: In-memory lead store.
//! - `models`: Core data models.
//! - `openapi`: OpenAPI document and Swagger UI.
//! - `query_builder`: Listing parameters to filter predicate and page window.
//! - `router`: Route table and middleware stack.
//! - `store`: The lead persistence trait.
//! - `validation`: Field validation rules and schemas.

pub mod api;
pub mod core;
pub mod data;

// Re-export primary modules for shared use in tests and other binaries
pub mod config;
pub mod csv_transfer;
pub mod db;
pub mod db_storage;
pub mod errors;
pub mod handlers;
pub mod import;
pub mod memory_store;
pub mod models;
pub mod openapi;
pub mod query_builder;
pub mod router;
pub mod store;
pub mod validation;
