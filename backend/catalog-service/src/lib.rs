/// Catalog Service Library
///
/// Species catalog for the gardening backend: bulk ingestion of the
/// upstream dataset, filtered listing/detail reads, and token-based
/// authentication wiring.
///
/// ## Modules
///
/// - `auth`: Token service wiring (Postgres user store + Redis ledger)
/// - `config`: Service configuration
/// - `db`: Database repositories (schema, species, users)
/// - `error`: Error types
/// - `ingest`: Species ingestion pipeline
/// - `models`: Data models
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod ingest;
pub mod models;

// Re-export commonly used types
pub use error::{CatalogError, Result};
pub use ingest::{IngestOutcome, IngestStats};
