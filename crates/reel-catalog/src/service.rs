//! Catalog operations over a [`CatalogStore`].
//!
//! Every write runs in one transaction: validate, resolve dependents, check
//! uniqueness, write, commit, and only then notify. A transaction that is
//! dropped on an error path is rolled back by the store.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use reel_types::{
    ChangeEvent, Genre, ImportAttempt, ImportId, MpaaRating, Person, PersonDraft, PersonId,
    Record, RecordDraft, RecordId,
};

use crate::audit::AuditTrail;
use crate::error::CatalogError;
use crate::guard::ensure_person_unique;
use crate::notify::{ChangeNotifier, NoopNotifier};
use crate::query::{ListParams, compose_record_query};
use crate::resolve::stage_record;
use crate::store::{CatalogStore, CatalogTx, StoreError};
use crate::validator::validate_person;

/// Default bound on stored import error messages, in characters.
pub const DEFAULT_ERROR_MESSAGE_LIMIT: usize = 5000;

/// Width of the `import_history.error_message` column. Larger limits are
/// clamped to it.
pub const MAX_ERROR_MESSAGE_LIMIT: usize = 5000;

/// Tunables for the import pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportSettings {
    /// Maximum characters of an error message written to the audit trail.
    pub error_message_limit: usize,
}

impl Default for ImportSettings {
    fn default() -> Self {
        Self {
            error_message_limit: DEFAULT_ERROR_MESSAGE_LIMIT,
        }
    }
}

/// The catalog: CRUD, analytics, bulk import and import history.
pub struct Catalog<S> {
    pub(crate) store: S,
    pub(crate) notifier: Arc<dyn ChangeNotifier>,
    pub(crate) settings: ImportSettings,
}

impl<S: CatalogStore> Catalog<S> {
    /// A catalog over `store` that drops change events.
    pub fn new(store: S) -> Self {
        Self {
            store,
            notifier: Arc::new(NoopNotifier),
            settings: ImportSettings::default(),
        }
    }

    /// Deliver change events to `notifier`.
    #[must_use]
    pub fn with_notifier(mut self, notifier: Arc<dyn ChangeNotifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Replace the import settings.
    #[must_use]
    pub fn with_settings(mut self, settings: ImportSettings) -> Self {
        self.settings = settings;
        self
    }

    /// The import audit trail.
    pub const fn audit(&self) -> AuditTrail<'_, S> {
        AuditTrail::new(&self.store, self.settings.error_message_limit)
    }

    // =========================================================================
    // Records
    // =========================================================================

    /// Create a record, creating any new dependent people with it.
    pub async fn create_record(&self, draft: &RecordDraft) -> Result<Record, CatalogError> {
        let mut tx = self.store.begin().await?;
        let record = stage_record(&mut tx, draft, None, Utc::now()).await?;
        let stored = tx.insert_record(&record).await?;
        tx.commit().await?;

        tracing::info!(record_id = %stored.id, name = %stored.name, "record created");
        self.notifier.notify(ChangeEvent::created(stored.id));
        Ok(stored)
    }

    /// Fetch a record.
    pub async fn get_record(&self, id: RecordId) -> Result<Record, CatalogError> {
        let mut tx = self.store.begin().await?;
        let record = tx.get_record(id).await?;
        tx.rollback().await?;
        record.ok_or_else(|| record_not_found(id))
    }

    /// Filtered, sorted, and optionally paginated records.
    pub async fn list_records(&self, params: &ListParams) -> Result<Vec<Record>, CatalogError> {
        let query = compose_record_query(params);
        let mut tx = self.store.begin().await?;
        let records = tx.query_records(&query).await?;
        tx.rollback().await?;
        Ok(records)
    }

    /// Replace a record's fields. The creation timestamp is kept unless the
    /// draft supplies one.
    pub async fn update_record(
        &self,
        id: RecordId,
        draft: &RecordDraft,
    ) -> Result<Record, CatalogError> {
        let mut tx = self.store.begin().await?;
        let existing = tx.get_record(id).await?.ok_or_else(|| record_not_found(id))?;
        let record = stage_record(&mut tx, draft, Some(&existing), Utc::now()).await?;
        let stored = tx
            .update_record(id, &record)
            .await?
            .ok_or_else(|| record_not_found(id))?;
        tx.commit().await?;

        tracing::info!(record_id = %id, "record updated");
        self.notifier.notify(ChangeEvent::updated(id));
        Ok(stored)
    }

    /// Delete a record.
    pub async fn delete_record(&self, id: RecordId) -> Result<(), CatalogError> {
        let mut tx = self.store.begin().await?;
        if !tx.delete_record(id).await? {
            return Err(record_not_found(id));
        }
        tx.commit().await?;

        tracing::info!(record_id = %id, "record deleted");
        self.notifier.notify(ChangeEvent::deleted(id));
        Ok(())
    }

    // =========================================================================
    // Persons
    // =========================================================================

    /// Create a person.
    pub async fn create_person(&self, draft: &PersonDraft) -> Result<Person, CatalogError> {
        let person = validate_person(draft)?;
        let mut tx = self.store.begin().await?;
        ensure_person_unique(&mut tx, &person, None).await?;
        let stored = tx.insert_person(&person).await?;
        tx.commit().await?;

        tracing::info!(person_id = %stored.id, "person created");
        Ok(stored)
    }

    /// Fetch a person.
    pub async fn get_person(&self, id: PersonId) -> Result<Person, CatalogError> {
        let mut tx = self.store.begin().await?;
        let person = tx.get_person(id).await?;
        tx.rollback().await?;
        person.ok_or_else(|| person_not_found(id))
    }

    /// All persons ordered by identity.
    pub async fn list_persons(&self) -> Result<Vec<Person>, CatalogError> {
        let mut tx = self.store.begin().await?;
        let persons = tx.list_persons().await?;
        tx.rollback().await?;
        Ok(persons)
    }

    /// Replace a person's fields, or create the person under a fresh
    /// identity when `id` does not exist.
    pub async fn update_person(
        &self,
        id: PersonId,
        draft: &PersonDraft,
    ) -> Result<Person, CatalogError> {
        let person = validate_person(draft)?;
        let mut tx = self.store.begin().await?;

        let stored = if tx.get_person(id).await?.is_some() {
            ensure_person_unique(&mut tx, &person, Some(id)).await?;
            tx.update_person(id, &person)
                .await?
                .ok_or_else(|| person_not_found(id))?
        } else {
            ensure_person_unique(&mut tx, &person, None).await?;
            let created = tx.insert_person(&person).await?;
            tracing::info!(requested_id = %id, person_id = %created.id, "person created by update");
            created
        };
        tx.commit().await?;
        Ok(stored)
    }

    /// Delete a person that no record references.
    pub async fn delete_person(&self, id: PersonId) -> Result<(), CatalogError> {
        let mut tx = self.store.begin().await?;
        match tx.delete_person(id).await {
            Ok(true) => {}
            Ok(false) => return Err(person_not_found(id)),
            Err(StoreError::ForeignKeyViolation(_)) => {
                return Err(CatalogError::Reference(format!(
                    "person {id} is still referenced by records"
                )));
            }
            Err(err) => return Err(err.into()),
        }
        tx.commit().await?;

        tracing::info!(person_id = %id, "person deleted");
        Ok(())
    }

    // =========================================================================
    // Analytics
    // =========================================================================

    /// Number of records per rating. Ratings without records are absent.
    pub async fn count_records_by_rating(
        &self,
    ) -> Result<BTreeMap<MpaaRating, i64>, CatalogError> {
        let mut tx = self.store.begin().await?;
        let counts = tx.count_records_by_rating().await?;
        tx.rollback().await?;
        Ok(counts.into_iter().collect())
    }

    /// Number of records whose genre name sorts after `genre`.
    pub async fn count_records_genre_above(&self, genre: Genre) -> Result<i64, CatalogError> {
        let mut tx = self.store.begin().await?;
        let count = tx.count_records_genre_above(genre).await?;
        tx.rollback().await?;
        Ok(count)
    }

    /// Records whose genre name sorts before `genre`.
    pub async fn records_genre_below(&self, genre: Genre) -> Result<Vec<Record>, CatalogError> {
        let mut tx = self.store.begin().await?;
        let records = tx.records_genre_below(genre).await?;
        tx.rollback().await?;
        Ok(records)
    }

    // =========================================================================
    // Import history
    // =========================================================================

    /// Import attempts, newest first. See [`AuditTrail::history`].
    pub async fn import_history(
        &self,
        username: Option<&str>,
        admin: bool,
    ) -> Result<Vec<ImportAttempt>, CatalogError> {
        self.audit().history(username, admin).await
    }

    /// One import attempt.
    pub async fn import_attempt(&self, id: ImportId) -> Result<ImportAttempt, CatalogError> {
        self.audit().get(id).await
    }
}

fn record_not_found(id: RecordId) -> CatalogError {
    CatalogError::NotFound(format!("record {id} not found"))
}

fn person_not_found(id: PersonId) -> CatalogError {
    CatalogError::NotFound(format!("person {id} not found"))
}
