//! Bulk XML import.
//!
//! An import call is all-or-nothing:
//!
//! 1. open an `IN_PROGRESS` audit row in its own committed transaction
//! 2. parse the payload
//! 3. stage and insert every descriptor, in document order, in one batch
//!    transaction; the first error aborts the batch
//! 4. mark the row `SUCCESS` inside the batch and commit
//! 5. on any error: roll back the batch, then mark the row `FAILED` in a
//!    fresh transaction and return [`CatalogError::ImportFailed`]
//!
//! Change events for imported records are sent only after step 4 commits.

use chrono::Utc;
use reel_types::{ChangeEvent, ImportAttempt, ImportId, ImportStatus, RecordId};
use tracing::Instrument;

use crate::audit::AuditTrail;
use crate::error::CatalogError;
use crate::guard::ensure_person_unique;
use crate::payload::{parse_persons, parse_records};
use crate::resolve::stage_record;
use crate::service::Catalog;
use crate::store::{CatalogStore, CatalogTx};
use crate::validator::validate_person;

/// Which kind of document an import call carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ImportKind {
    Records,
    Persons,
}

/// What a batch wrote before it committed.
struct BatchOutcome {
    objects_count: i32,
    created_records: Vec<RecordId>,
}

fn count_of(len: usize) -> Result<i32, CatalogError> {
    i32::try_from(len)
        .map_err(|err| CatalogError::Payload(format!("too many descriptors ({len}): {err}")))
}

impl<S: CatalogStore> Catalog<S> {
    /// Import a `<movies>` document on behalf of `username`.
    ///
    /// Returns the finalized `SUCCESS` audit row.
    pub async fn import_records(
        &self,
        xml: &str,
        username: &str,
        file_name: Option<&str>,
    ) -> Result<ImportAttempt, CatalogError> {
        let span = tracing::info_span!(
            "import_records",
            user = username,
            file_name,
            attempt_id = tracing::field::Empty
        );
        self.run_import(ImportKind::Records, xml, username, file_name)
            .instrument(span)
            .await
    }

    /// Import a `<persons>` document on behalf of `username`.
    ///
    /// Returns the finalized `SUCCESS` audit row.
    pub async fn import_persons(
        &self,
        xml: &str,
        username: &str,
        file_name: Option<&str>,
    ) -> Result<ImportAttempt, CatalogError> {
        let span = tracing::info_span!(
            "import_persons",
            user = username,
            file_name,
            attempt_id = tracing::field::Empty
        );
        self.run_import(ImportKind::Persons, xml, username, file_name)
            .instrument(span)
            .await
    }

    async fn run_import(
        &self,
        kind: ImportKind,
        xml: &str,
        username: &str,
        file_name: Option<&str>,
    ) -> Result<ImportAttempt, CatalogError> {
        let audit = self.audit();
        let attempt = audit.open(username, file_name).await?;
        tracing::Span::current().record("attempt_id", attempt.id.into_inner());
        tracing::info!("import started");

        let result = async {
            let mut tx = self.store.begin().await?;
            let staged = match kind {
                ImportKind::Records => Self::record_batch(&mut tx, xml, attempt.id).await,
                ImportKind::Persons => Self::person_batch(&mut tx, xml, attempt.id).await,
            };
            match staged {
                Ok(outcome) => {
                    tx.commit().await?;
                    Ok(outcome)
                }
                Err(err) => {
                    if let Err(rollback_err) = tx.rollback().await {
                        tracing::warn!(error = %rollback_err, "batch rollback failed");
                    }
                    Err(err)
                }
            }
        }
        .await;

        match result {
            Ok(outcome) => {
                tracing::info!(objects_count = outcome.objects_count, "import succeeded");
                for id in outcome.created_records {
                    self.notifier.notify(ChangeEvent::created(id));
                }
                Ok(ImportAttempt {
                    status: ImportStatus::Success,
                    objects_count: Some(outcome.objects_count),
                    ..attempt
                })
            }
            Err(err) => {
                tracing::warn!(error = %err, "import failed");
                audit.mark_failed(attempt.id, &err.to_string()).await;
                Err(CatalogError::ImportFailed {
                    attempt_id: attempt.id,
                    source: Box::new(err),
                })
            }
        }
    }

    async fn record_batch(
        tx: &mut S::Tx,
        xml: &str,
        attempt_id: ImportId,
    ) -> Result<BatchOutcome, CatalogError> {
        let drafts = parse_records(xml)?;
        let objects_count = count_of(drafts.len())?;
        let now = Utc::now();

        let mut created_records = Vec::with_capacity(drafts.len());
        for (index, draft) in drafts.iter().enumerate() {
            let position = index.saturating_add(1);
            let record = stage_record(tx, draft, None, now)
                .await
                .map_err(|e| e.at_position("record", position))?;
            let stored = tx
                .insert_record(&record)
                .await
                .map_err(|e| CatalogError::from(e).at_position("record", position))?;
            created_records.push(stored.id);
        }

        AuditTrail::<S>::mark_succeeded(tx, attempt_id, objects_count).await?;
        Ok(BatchOutcome {
            objects_count,
            created_records,
        })
    }

    async fn person_batch(
        tx: &mut S::Tx,
        xml: &str,
        attempt_id: ImportId,
    ) -> Result<BatchOutcome, CatalogError> {
        let drafts = parse_persons(xml)?;
        let objects_count = count_of(drafts.len())?;

        for (index, draft) in drafts.iter().enumerate() {
            let position = index.saturating_add(1);
            let person = validate_person(draft)
                .map_err(|e| CatalogError::from(e).at_position("person", position))?;
            ensure_person_unique(tx, &person, None)
                .await
                .map_err(|e| e.at_position("person", position))?;
            tx.insert_person(&person)
                .await
                .map_err(|e| CatalogError::from(e).at_position("person", position))?;
        }

        AuditTrail::<S>::mark_succeeded(tx, attempt_id, objects_count).await?;
        Ok(BatchOutcome {
            objects_count,
            created_records: Vec::new(),
        })
    }
}
