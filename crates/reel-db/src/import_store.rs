//! Operations on the `import_history` table.

use reel_catalog::{ImportOutcome, StoreError};
use reel_types::{ImportAttempt, ImportId, ImportStatus, NewImportAttempt};
use sqlx::PgConnection;

use crate::error::store_error;
use crate::rows::{IMPORT_COLUMNS, ImportRow, convert_all};

/// Import attempt queries bound to one connection.
pub struct ImportStore<'c> {
    conn: &'c mut PgConnection,
}

impl<'c> ImportStore<'c> {
    /// Create an import store over a connection.
    pub const fn new(conn: &'c mut PgConnection) -> Self {
        Self { conn }
    }

    /// Insert an attempt with status `IN_PROGRESS`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] if the insert fails.
    pub async fn insert(
        &mut self,
        attempt: &NewImportAttempt,
    ) -> Result<ImportAttempt, StoreError> {
        let sql = format!(
            "INSERT INTO import_history (username, import_date, status, file_name) \
             VALUES ($1, $2, $3, $4) RETURNING {IMPORT_COLUMNS}"
        );
        let row = sqlx::query_as::<_, ImportRow>(&sql)
            .bind(&attempt.username)
            .bind(attempt.import_date)
            .bind(ImportStatus::InProgress.as_str())
            .bind(attempt.file_name.as_deref())
            .fetch_one(&mut *self.conn)
            .await
            .map_err(store_error)?;

        ImportAttempt::try_from(row)
    }

    /// Write terminal values to an `IN_PROGRESS` attempt. The import date is
    /// replaced only when the outcome carries one. Returns `false` when the
    /// attempt is missing or already finished.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] if the update fails.
    pub async fn finish(
        &mut self,
        id: ImportId,
        outcome: &ImportOutcome,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r"UPDATE import_history
              SET status = $2,
                  objects_count = $3,
                  error_message = $4,
                  import_date = COALESCE($5, import_date)
              WHERE id = $1 AND status = 'IN_PROGRESS'",
        )
        .bind(id.into_inner())
        .bind(outcome.status.as_str())
        .bind(outcome.objects_count)
        .bind(outcome.error_message.as_deref())
        .bind(outcome.import_date)
        .execute(&mut *self.conn)
        .await
        .map_err(store_error)?;

        Ok(result.rows_affected() > 0)
    }

    /// Fetch an attempt by identity.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] if the query fails.
    pub async fn get(&mut self, id: ImportId) -> Result<Option<ImportAttempt>, StoreError> {
        let sql = format!("SELECT {IMPORT_COLUMNS} FROM import_history WHERE id = $1");
        let row = sqlx::query_as::<_, ImportRow>(&sql)
            .bind(id.into_inner())
            .fetch_optional(&mut *self.conn)
            .await
            .map_err(store_error)?;

        row.map(ImportAttempt::try_from).transpose()
    }

    /// Attempts newest first, optionally restricted to one user.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] if the query fails.
    pub async fn list(&mut self, username: Option<&str>) -> Result<Vec<ImportAttempt>, StoreError> {
        let sql = format!(
            "SELECT {IMPORT_COLUMNS} FROM import_history \
             WHERE ($1::TEXT IS NULL OR username = $1) \
             ORDER BY import_date DESC, id DESC"
        );
        let rows = sqlx::query_as::<_, ImportRow>(&sql)
            .bind(username)
            .fetch_all(&mut *self.conn)
            .await
            .map_err(store_error)?;

        convert_all(rows)
    }
}
