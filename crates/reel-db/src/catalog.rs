//! `PostgreSQL` implementation of the catalog store traits.
//!
//! Each [`PgTx`] owns one database transaction. The table stores borrow its
//! connection for the duration of a single call, so every read and write of
//! an import batch runs inside the same transaction and a rollback discards
//! all of them.

use async_trait::async_trait;
use reel_catalog::{
    CatalogStore, CatalogTx, ImportOutcome, PersonKey, RecordKey, RecordQuery, StoreError,
};
use reel_types::{
    Genre, ImportAttempt, ImportId, MpaaRating, NewImportAttempt, NewPerson, NewRecord, Person,
    PersonId, Record, RecordId,
};
use sqlx::{PgPool, Postgres, Transaction};

use crate::error::store_error;
use crate::import_store::ImportStore;
use crate::person_store::PersonStore;
use crate::record_store::RecordStore;

/// Catalog store over a `PostgreSQL` pool.
#[derive(Debug, Clone)]
pub struct PgCatalog {
    pool: PgPool,
}

impl PgCatalog {
    /// Wrap an existing pool.
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CatalogStore for PgCatalog {
    type Tx = PgTx;

    async fn begin(&self) -> Result<PgTx, StoreError> {
        let tx = self.pool.begin().await.map_err(store_error)?;
        Ok(PgTx { tx })
    }
}

/// An open `PostgreSQL` transaction.
pub struct PgTx {
    tx: Transaction<'static, Postgres>,
}

impl PgTx {
    fn persons(&mut self) -> PersonStore<'_> {
        PersonStore::new(&mut self.tx)
    }

    fn records(&mut self) -> RecordStore<'_> {
        RecordStore::new(&mut self.tx)
    }

    fn imports(&mut self) -> ImportStore<'_> {
        ImportStore::new(&mut self.tx)
    }
}

#[async_trait]
impl CatalogTx for PgTx {
    async fn insert_person(&mut self, person: &NewPerson) -> Result<Person, StoreError> {
        self.persons().insert(person).await
    }

    async fn update_person(
        &mut self,
        id: PersonId,
        person: &NewPerson,
    ) -> Result<Option<Person>, StoreError> {
        self.persons().update(id, person).await
    }

    async fn delete_person(&mut self, id: PersonId) -> Result<bool, StoreError> {
        self.persons().delete(id).await
    }

    async fn get_person(&mut self, id: PersonId) -> Result<Option<Person>, StoreError> {
        self.persons().get(id).await
    }

    async fn list_persons(&mut self) -> Result<Vec<Person>, StoreError> {
        self.persons().list().await
    }

    async fn person_exists(&mut self, key: &PersonKey<'_>) -> Result<bool, StoreError> {
        self.persons().exists(key).await
    }

    async fn insert_record(&mut self, record: &NewRecord) -> Result<Record, StoreError> {
        self.records().insert(record).await
    }

    async fn update_record(
        &mut self,
        id: RecordId,
        record: &NewRecord,
    ) -> Result<Option<Record>, StoreError> {
        self.records().update(id, record).await
    }

    async fn delete_record(&mut self, id: RecordId) -> Result<bool, StoreError> {
        self.records().delete(id).await
    }

    async fn get_record(&mut self, id: RecordId) -> Result<Option<Record>, StoreError> {
        self.records().get(id).await
    }

    async fn record_exists(&mut self, key: &RecordKey<'_>) -> Result<bool, StoreError> {
        self.records().exists(key).await
    }

    async fn query_records(&mut self, query: &RecordQuery) -> Result<Vec<Record>, StoreError> {
        self.records().query(query).await
    }

    async fn count_records_by_rating(&mut self) -> Result<Vec<(MpaaRating, i64)>, StoreError> {
        self.records().count_by_rating().await
    }

    async fn count_records_genre_above(&mut self, genre: Genre) -> Result<i64, StoreError> {
        self.records().count_genre_above(genre).await
    }

    async fn records_genre_below(&mut self, genre: Genre) -> Result<Vec<Record>, StoreError> {
        self.records().genre_below(genre).await
    }

    async fn insert_import(
        &mut self,
        attempt: &NewImportAttempt,
    ) -> Result<ImportAttempt, StoreError> {
        self.imports().insert(attempt).await
    }

    async fn finish_import(
        &mut self,
        id: ImportId,
        outcome: &ImportOutcome,
    ) -> Result<bool, StoreError> {
        self.imports().finish(id, outcome).await
    }

    async fn get_import(&mut self, id: ImportId) -> Result<Option<ImportAttempt>, StoreError> {
        self.imports().get(id).await
    }

    async fn list_imports(
        &mut self,
        username: Option<&str>,
    ) -> Result<Vec<ImportAttempt>, StoreError> {
        self.imports().list(username).await
    }

    async fn commit(self) -> Result<(), StoreError> {
        self.tx.commit().await.map_err(store_error)
    }

    async fn rollback(self) -> Result<(), StoreError> {
        self.tx.rollback().await.map_err(store_error)
    }
}
