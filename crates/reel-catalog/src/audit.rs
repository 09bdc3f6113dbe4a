//! Import audit trail.
//!
//! Every import call produces exactly one attempt row. The row is opened in
//! its own committed transaction so it survives a rolled-back batch. A
//! successful batch finalizes it inside the batch transaction; a failed one
//! finalizes it afterwards in a fresh transaction.
//!
//! # Lifecycle
//!
//! | Step | Transaction | Status |
//! |------|-------------|--------|
//! | [`AuditTrail::open`] | own, committed | `IN_PROGRESS` |
//! | [`AuditTrail::mark_succeeded`] | the batch | `SUCCESS` |
//! | [`AuditTrail::mark_failed`] | own, best effort | `FAILED` |

use chrono::Utc;
use reel_types::{ImportAttempt, ImportId, ImportStatus, NewImportAttempt};

use crate::error::CatalogError;
use crate::service::MAX_ERROR_MESSAGE_LIMIT;
use crate::store::{CatalogStore, CatalogTx, ImportOutcome};

/// Stored when a failure carries no description.
pub const UNKNOWN_IMPORT_ERROR: &str = "Unknown error occurred during import.";

/// Clip `message` to at most `limit` characters, cutting on a `char`
/// boundary. Blank messages become [`UNKNOWN_IMPORT_ERROR`].
pub fn truncate_message(message: &str, limit: usize) -> String {
    if message.trim().is_empty() {
        return UNKNOWN_IMPORT_ERROR.to_owned();
    }
    match message.char_indices().nth(limit) {
        Some((cut, _)) => message.get(..cut).unwrap_or(message).to_owned(),
        None => message.to_owned(),
    }
}

/// Reads and writes import attempt rows.
#[derive(Debug)]
pub struct AuditTrail<'a, S> {
    store: &'a S,
    error_message_limit: usize,
}

impl<'a, S: CatalogStore> AuditTrail<'a, S> {
    /// Create an audit trail over `store`, clipping stored errors to
    /// `error_message_limit` characters, never more than
    /// [`MAX_ERROR_MESSAGE_LIMIT`].
    pub const fn new(store: &'a S, error_message_limit: usize) -> Self {
        let error_message_limit = if error_message_limit > MAX_ERROR_MESSAGE_LIMIT {
            MAX_ERROR_MESSAGE_LIMIT
        } else {
            error_message_limit
        };
        Self {
            store,
            error_message_limit,
        }
    }

    /// Persist a new `IN_PROGRESS` attempt and commit it immediately.
    pub async fn open(
        &self,
        username: &str,
        file_name: Option<&str>,
    ) -> Result<ImportAttempt, CatalogError> {
        let mut tx = self.store.begin().await?;
        let attempt = tx
            .insert_import(&NewImportAttempt {
                username: username.to_owned(),
                import_date: Utc::now(),
                file_name: file_name.map(str::to_owned),
            })
            .await?;
        tx.commit().await?;

        tracing::debug!(attempt_id = %attempt.id, user = username, "import attempt opened");
        Ok(attempt)
    }

    /// Mark the attempt successful inside the batch transaction, so the
    /// status and the imported rows commit together.
    pub async fn mark_succeeded(
        tx: &mut S::Tx,
        id: ImportId,
        objects_count: i32,
    ) -> Result<(), CatalogError> {
        let outcome = ImportOutcome {
            status: ImportStatus::Success,
            objects_count,
            error_message: None,
            import_date: None,
        };
        if tx.finish_import(id, &outcome).await? {
            Ok(())
        } else {
            Err(CatalogError::NotFound(format!(
                "import attempt {id} not found or already finished"
            )))
        }
    }

    /// Mark the attempt failed in a fresh transaction.
    ///
    /// Called after the batch has been rolled back. An attempt that already
    /// reached a terminal status keeps it. Any error here is logged
    /// and swallowed so it cannot replace the error that failed the batch.
    pub async fn mark_failed(&self, id: ImportId, error_message: &str) {
        let outcome = ImportOutcome {
            status: ImportStatus::Failed,
            objects_count: 0,
            error_message: Some(truncate_message(error_message, self.error_message_limit)),
            import_date: Some(Utc::now()),
        };

        let result: Result<bool, CatalogError> = async {
            let mut tx = self.store.begin().await?;
            let found = tx.finish_import(id, &outcome).await?;
            tx.commit().await?;
            Ok(found)
        }
        .await;

        match result {
            Ok(true) => {}
            Ok(false) => {
                tracing::error!(
                    attempt_id = %id,
                    "import attempt missing or already finished, not marked failed"
                );
            }
            Err(err) => {
                tracing::error!(attempt_id = %id, error = %err, "failed to mark import attempt as failed");
            }
        }
    }

    /// Attempts newest first. Admins, and callers that name no user, see
    /// every attempt; everyone else sees only their own.
    pub async fn history(
        &self,
        username: Option<&str>,
        admin: bool,
    ) -> Result<Vec<ImportAttempt>, CatalogError> {
        let filter = if admin { None } else { username };
        let mut tx = self.store.begin().await?;
        let rows = tx.list_imports(filter).await?;
        tx.rollback().await?;
        Ok(rows)
    }

    /// A single attempt.
    pub async fn get(&self, id: ImportId) -> Result<ImportAttempt, CatalogError> {
        let mut tx = self.store.begin().await?;
        let row = tx.get_import(id).await?;
        tx.rollback().await?;
        row.ok_or_else(|| CatalogError::NotFound(format!("import attempt {id} not found")))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::memory::MemoryStore;

    #[test]
    fn truncation_respects_char_boundaries() {
        let message = "ошибка импорта";
        let clipped = truncate_message(message, 6);
        assert_eq!(clipped, "ошибка");
        assert_eq!(clipped.chars().count(), 6);
    }

    #[test]
    fn short_messages_are_kept() {
        assert_eq!(truncate_message("bad row", 5000), "bad row");
    }

    #[test]
    fn blank_message_becomes_unknown() {
        assert_eq!(truncate_message("  ", 5000), UNKNOWN_IMPORT_ERROR);
    }

    #[tokio::test]
    async fn failed_attempt_gets_zero_count_and_error() {
        let store = MemoryStore::new();
        let trail = AuditTrail::new(&store, 10);
        let attempt = trail.open("alice", Some("movies.xml")).await.unwrap();
        assert_eq!(attempt.status, ImportStatus::InProgress);

        trail
            .mark_failed(attempt.id, "record #1: name must not be blank")
            .await;

        let row = trail.get(attempt.id).await.unwrap();
        assert_eq!(row.status, ImportStatus::Failed);
        assert_eq!(row.objects_count, Some(0));
        assert_eq!(row.error_message.as_deref(), Some("record #1:"));
        assert!(row.import_date >= attempt.import_date);
    }

    #[tokio::test]
    async fn finished_attempt_is_not_rewritten() {
        let store = MemoryStore::new();
        let trail = AuditTrail::new(&store, 5000);
        let attempt = trail.open("alice", None).await.unwrap();

        let mut tx = store.begin().await.unwrap();
        AuditTrail::<MemoryStore>::mark_succeeded(&mut tx, attempt.id, 3)
            .await
            .unwrap();
        tx.commit().await.unwrap();

        trail.mark_failed(attempt.id, "commit reported an error").await;

        let row = trail.get(attempt.id).await.unwrap();
        assert_eq!(row.status, ImportStatus::Success);
        assert_eq!(row.objects_count, Some(3));
        assert!(row.error_message.is_none());

        let mut tx = store.begin().await.unwrap();
        let err = AuditTrail::<MemoryStore>::mark_succeeded(&mut tx, attempt.id, 1)
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::NotFound(_)));
    }

    #[test]
    fn oversized_limit_is_clamped_to_the_column() {
        let store = MemoryStore::new();
        let trail = AuditTrail::new(&store, 100_000);
        let message = "x".repeat(6000);
        let stored = truncate_message(&message, trail.error_message_limit);
        assert_eq!(stored.chars().count(), MAX_ERROR_MESSAGE_LIMIT);
    }

    #[tokio::test]
    async fn history_filters_by_user_unless_admin() {
        let store = MemoryStore::new();
        let trail = AuditTrail::new(&store, 5000);
        trail.open("alice", None).await.unwrap();
        let latest = trail.open("bob", None).await.unwrap();

        let bobs = trail.history(Some("bob"), false).await.unwrap();
        assert_eq!(bobs.len(), 1);

        let all = trail.history(Some("bob"), true).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all.first().map(|a| a.id), Some(latest.id));

        let anonymous = trail.history(None, false).await.unwrap();
        assert_eq!(anonymous.len(), 2);
    }

    #[tokio::test]
    async fn unknown_attempt_is_not_found() {
        let store = MemoryStore::new();
        let trail = AuditTrail::new(&store, 5000);
        let err = trail.get(ImportId(42)).await.unwrap_err();
        assert!(matches!(err, CatalogError::NotFound(_)));
    }
}
