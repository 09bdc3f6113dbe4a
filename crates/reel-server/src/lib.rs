//! Catalog API server for Reel.
//!
//! This crate provides an Axum HTTP server that exposes:
//!
//! - **REST endpoints** for record and person CRUD, record listings with
//!   filters, sorting and pagination, and rating/genre analytics
//! - **Import endpoints** that run all-or-nothing XML imports and expose the
//!   import audit trail
//! - **`WebSocket` endpoint** (`/ws/events`) streaming record change events
//!   via [`tokio::sync::broadcast`]
//!
//! Handlers are generic over [`CatalogStore`](reel_catalog::CatalogStore);
//! the binary wires them to `PostgreSQL`, the tests to the in-memory store.

pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod imports;
pub mod router;
pub mod server;
pub mod state;
pub mod ws;

// Re-export primary types for convenience.
pub use config::{ConfigError, LogFormat, ReelConfig};
pub use error::ApiError;
pub use router::build_router;
pub use server::{ServerConfig, ServerError, start_server};
pub use state::{AppState, BroadcastNotifier};
