//! Store abstraction for the catalog.
//!
//! A [`CatalogStore`] opens transactions; every read and write goes through
//! a [`CatalogTx`] and becomes visible to other transactions only after
//! [`CatalogTx::commit`]. Dropping a transaction without committing discards
//! its writes.
//!
//! Implementations must enforce the same constraints the uniqueness guard
//! checks, so a lost check-then-insert race surfaces as
//! [`StoreError::UniqueViolation`] instead of a duplicate row:
//!
//! - `(record.name, record.operator_id, record.director_id)` is unique, with
//!   an absent director matching another absent director.
//! - `(person.name, person.birthday)` is unique, with an absent birthday
//!   matching another absent birthday.
//! - record person references must resolve, and a referenced person cannot
//!   be deleted.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reel_types::{
    Genre, ImportAttempt, ImportId, ImportStatus, MpaaRating, NewImportAttempt, NewPerson,
    NewRecord, Person, PersonId, Record, RecordId,
};

use crate::query::RecordQuery;

/// Errors raised by store implementations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write.
    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),

    /// A foreign-key constraint rejected the write or delete.
    #[error("foreign key constraint violated: {0}")]
    ForeignKeyViolation(String),

    /// Any other backend failure.
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Composite uniqueness key of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordKey<'a> {
    /// Record name, compared exactly.
    pub name: &'a str,
    /// Operator identity.
    pub operator_id: PersonId,
    /// Director identity; `None` matches only records without a director.
    pub director_id: Option<PersonId>,
    /// Record to ignore (the one being updated).
    pub exclude: Option<RecordId>,
}

/// Composite uniqueness key of a person.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PersonKey<'a> {
    /// Person name, compared exactly.
    pub name: &'a str,
    /// Birthday; `None` matches only persons without a birthday.
    pub birthday: Option<DateTime<Utc>>,
    /// Person to ignore (the one being updated).
    pub exclude: Option<PersonId>,
}

/// Terminal values written to an import attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportOutcome {
    /// Terminal status.
    pub status: ImportStatus,
    /// Number of committed objects.
    pub objects_count: i32,
    /// Truncated failure description.
    pub error_message: Option<String>,
    /// Replacement submission timestamp, if the outcome refreshes it.
    pub import_date: Option<DateTime<Utc>>,
}

/// Opens transactions against a backing store.
#[async_trait]
pub trait CatalogStore: Send + Sync + 'static {
    /// The transaction type produced by [`begin`](Self::begin).
    type Tx: CatalogTx;

    /// Start a new transaction.
    async fn begin(&self) -> Result<Self::Tx, StoreError>;
}

/// One open transaction against the catalog store.
#[async_trait]
pub trait CatalogTx: Send {
    /// Insert a person and return it with its assigned identity.
    async fn insert_person(&mut self, person: &NewPerson) -> Result<Person, StoreError>;

    /// Overwrite an existing person. Returns `None` if no such person exists.
    async fn update_person(
        &mut self,
        id: PersonId,
        person: &NewPerson,
    ) -> Result<Option<Person>, StoreError>;

    /// Delete a person. Returns `false` if no such person exists.
    async fn delete_person(&mut self, id: PersonId) -> Result<bool, StoreError>;

    /// Fetch a person by identity.
    async fn get_person(&mut self, id: PersonId) -> Result<Option<Person>, StoreError>;

    /// All persons ordered by identity.
    async fn list_persons(&mut self) -> Result<Vec<Person>, StoreError>;

    /// Whether a person with the given key exists.
    async fn person_exists(&mut self, key: &PersonKey<'_>) -> Result<bool, StoreError>;

    /// Insert a record and return it with its assigned identity.
    async fn insert_record(&mut self, record: &NewRecord) -> Result<Record, StoreError>;

    /// Overwrite an existing record. Returns `None` if no such record exists.
    async fn update_record(
        &mut self,
        id: RecordId,
        record: &NewRecord,
    ) -> Result<Option<Record>, StoreError>;

    /// Delete a record. Returns `false` if no such record exists.
    async fn delete_record(&mut self, id: RecordId) -> Result<bool, StoreError>;

    /// Fetch a record by identity.
    async fn get_record(&mut self, id: RecordId) -> Result<Option<Record>, StoreError>;

    /// Whether a record with the given key exists.
    async fn record_exists(&mut self, key: &RecordKey<'_>) -> Result<bool, StoreError>;

    /// Run a composed filter/sort/paginate query.
    async fn query_records(&mut self, query: &RecordQuery) -> Result<Vec<Record>, StoreError>;

    /// Number of records per rating, for ratings that have any.
    async fn count_records_by_rating(&mut self) -> Result<Vec<(MpaaRating, i64)>, StoreError>;

    /// Number of records whose genre text sorts after `genre`.
    async fn count_records_genre_above(&mut self, genre: Genre) -> Result<i64, StoreError>;

    /// Records whose genre text sorts before `genre`, ordered by identity.
    async fn records_genre_below(&mut self, genre: Genre) -> Result<Vec<Record>, StoreError>;

    /// Insert an import attempt with status `IN_PROGRESS`.
    async fn insert_import(
        &mut self,
        attempt: &NewImportAttempt,
    ) -> Result<ImportAttempt, StoreError>;

    /// Write terminal values to an `IN_PROGRESS` import attempt. Returns
    /// `false` if no such attempt exists or it is already terminal; a
    /// terminal status is never overwritten.
    async fn finish_import(
        &mut self,
        id: ImportId,
        outcome: &ImportOutcome,
    ) -> Result<bool, StoreError>;

    /// Fetch an import attempt by identity.
    async fn get_import(&mut self, id: ImportId) -> Result<Option<ImportAttempt>, StoreError>;

    /// Import attempts, newest first, optionally restricted to one user.
    async fn list_imports(
        &mut self,
        username: Option<&str>,
    ) -> Result<Vec<ImportAttempt>, StoreError>;

    /// Make every write of this transaction durable and visible.
    async fn commit(self) -> Result<(), StoreError>;

    /// Discard every write of this transaction.
    async fn rollback(self) -> Result<(), StoreError>;
}
