//! `PostgreSQL` data layer for the Reel catalog.
//!
//! Implements the storage-agnostic [`CatalogStore`](reel_catalog::CatalogStore)
//! traits over a `sqlx` pool. Every catalog operation runs inside one
//! database transaction, and composite-key and foreign-key constraints are
//! declared in the schema so concurrent writers cannot slip duplicates past
//! the uniqueness guard.
//!
//! # Modules
//!
//! - [`postgres`] -- Database settings, pool and migrations
//! - [`catalog`] -- [`PgCatalog`] / [`PgTx`] store implementation
//! - [`person_store`] -- `persons` table operations
//! - [`record_store`] -- `records` table operations and analytics
//! - [`import_store`] -- `import_history` table operations
//! - [`sql`] -- Rendering of composed record queries
//! - [`rows`] -- Row types and domain conversion
//! - [`error`] -- Error types and constraint translation

pub mod catalog;
pub mod error;
pub mod import_store;
pub mod person_store;
pub mod postgres;
pub mod record_store;
pub mod rows;
pub mod sql;

pub use catalog::{PgCatalog, PgTx};
pub use error::{DbError, store_error};
pub use postgres::{DatabaseConfig, PostgresPool};
