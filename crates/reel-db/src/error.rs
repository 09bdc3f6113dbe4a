//! Error types for the data layer.
//!
//! Pool and migration failures surface as [`DbError`]. Failures inside a
//! catalog transaction are translated into the storage-agnostic
//! [`StoreError`] by [`store_error`], which recognizes the constraint
//! violations the catalog core handles specially.

use reel_catalog::StoreError;

/// Errors that can occur while setting up the data layer.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// A `PostgreSQL` operation failed.
    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] sqlx::Error),

    /// A `PostgreSQL` migration failed.
    #[error("PostgreSQL migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Translate a `sqlx` error raised inside a catalog transaction.
///
/// Unique violations (`23505`) and foreign-key violations (`23503`) keep
/// the violated constraint's name; everything else becomes
/// [`StoreError::Backend`].
pub fn store_error(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db) = &err {
        let constraint = || db.constraint().unwrap_or("unnamed").to_owned();
        if db.is_unique_violation() {
            return StoreError::UniqueViolation(constraint());
        }
        if db.is_foreign_key_violation() {
            return StoreError::ForeignKeyViolation(constraint());
        }
    }
    StoreError::Backend(err.to_string())
}
