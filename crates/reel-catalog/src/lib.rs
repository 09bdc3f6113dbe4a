//! Core of the Reel catalog: validation, uniqueness, query composition,
//! bulk import and the import audit trail.
//!
//! The crate is storage-agnostic. All persistence goes through the
//! [`CatalogStore`] / [`CatalogTx`] traits; `reel-db` implements them for
//! `PostgreSQL` and [`MemoryStore`] implements them in process.
//!
//! # Modules
//!
//! - [`validator`] -- Pure, fail-fast draft validation
//! - [`guard`] -- Composite-key uniqueness checks
//! - [`resolve`] -- Operator/director/screenwriter resolution and record staging
//! - [`query`] -- Filter/sort/paginate query composition
//! - [`payload`] -- XML import documents
//! - [`audit`] -- Import attempt lifecycle and message truncation
//! - [`import`] -- The all-or-nothing import pipeline
//! - [`service`] -- [`Catalog`]: CRUD, analytics and import history
//! - [`store`] -- Store traits and errors
//! - [`memory`] -- In-memory store
//! - [`notify`] -- Change notification hook

pub mod audit;
pub mod error;
pub mod guard;
pub mod import;
pub mod memory;
pub mod notify;
pub mod payload;
pub mod query;
pub mod resolve;
pub mod service;
pub mod store;
pub mod validator;

pub use audit::{AuditTrail, UNKNOWN_IMPORT_ERROR, truncate_message};
pub use error::{CatalogError, ValidationError};
pub use memory::MemoryStore;
pub use notify::{ChangeNotifier, NoopNotifier};
pub use query::{
    ListParams, PageWindow, RecordFilters, RecordQuery, SortDirection, SortField,
    compose_record_query, like_pattern,
};
pub use service::{Catalog, DEFAULT_ERROR_MESSAGE_LIMIT, ImportSettings, MAX_ERROR_MESSAGE_LIMIT};
pub use store::{CatalogStore, CatalogTx, ImportOutcome, PersonKey, RecordKey, StoreError};
pub use validator::{RecordFields, ResolvedPeople, validate_person, validate_record};
