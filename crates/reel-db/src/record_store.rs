//! Operations on the `records` table, including composed listings and the
//! rating/genre analytics.
//!
//! Genre comparisons use the `"C"` collation so "above" and "below" follow
//! plain byte order of the stored text regardless of the database locale.

use reel_catalog::{RecordKey, RecordQuery, StoreError};
use reel_types::{Genre, MpaaRating, NewRecord, PersonId, Record, RecordId};
use sqlx::PgConnection;

use crate::error::store_error;
use crate::rows::{RECORD_COLUMNS, RecordRow, convert_all};
use crate::sql::record_query;

/// Record queries bound to one connection (usually an open transaction).
pub struct RecordStore<'c> {
    conn: &'c mut PgConnection,
}

impl<'c> RecordStore<'c> {
    /// Create a record store over a connection.
    pub const fn new(conn: &'c mut PgConnection) -> Self {
        Self { conn }
    }

    /// Insert a record and return it with its assigned identity.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UniqueViolation`] on a composite-key clash and
    /// [`StoreError::ForeignKeyViolation`] on a dangling person reference.
    pub async fn insert(&mut self, record: &NewRecord) -> Result<Record, StoreError> {
        let sql = format!(
            "INSERT INTO records (name, creation_date, coordinates_x, coordinates_y, \
             oscars_count, budget, total_box_office, length, golden_palm_count, mpaa_rating, \
             genre, operator_id, director_id, screenwriter_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14) \
             RETURNING {RECORD_COLUMNS}"
        );
        let row = sqlx::query_as::<_, RecordRow>(&sql)
            .bind(&record.name)
            .bind(record.creation_date)
            .bind(record.coordinates.x)
            .bind(record.coordinates.y)
            .bind(record.oscars_count)
            .bind(record.budget)
            .bind(record.total_box_office)
            .bind(record.length)
            .bind(record.golden_palm_count)
            .bind(record.mpaa_rating.as_str())
            .bind(record.genre.as_str())
            .bind(record.operator_id.into_inner())
            .bind(record.director_id.map(PersonId::into_inner))
            .bind(record.screenwriter_id.map(PersonId::into_inner))
            .fetch_one(&mut *self.conn)
            .await
            .map_err(store_error)?;

        Record::try_from(row)
    }

    /// Overwrite every column of a record, including its creation date.
    ///
    /// # Errors
    ///
    /// Same as [`insert`](Self::insert).
    pub async fn update(
        &mut self,
        id: RecordId,
        record: &NewRecord,
    ) -> Result<Option<Record>, StoreError> {
        let sql = format!(
            "UPDATE records SET name = $2, creation_date = $3, coordinates_x = $4, \
             coordinates_y = $5, oscars_count = $6, budget = $7, total_box_office = $8, \
             length = $9, golden_palm_count = $10, mpaa_rating = $11, genre = $12, \
             operator_id = $13, director_id = $14, screenwriter_id = $15 \
             WHERE id = $1 RETURNING {RECORD_COLUMNS}"
        );
        let row = sqlx::query_as::<_, RecordRow>(&sql)
            .bind(id.into_inner())
            .bind(&record.name)
            .bind(record.creation_date)
            .bind(record.coordinates.x)
            .bind(record.coordinates.y)
            .bind(record.oscars_count)
            .bind(record.budget)
            .bind(record.total_box_office)
            .bind(record.length)
            .bind(record.golden_palm_count)
            .bind(record.mpaa_rating.as_str())
            .bind(record.genre.as_str())
            .bind(record.operator_id.into_inner())
            .bind(record.director_id.map(PersonId::into_inner))
            .bind(record.screenwriter_id.map(PersonId::into_inner))
            .fetch_optional(&mut *self.conn)
            .await
            .map_err(store_error)?;

        row.map(Record::try_from).transpose()
    }

    /// Delete a record.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] if the statement fails.
    pub async fn delete(&mut self, id: RecordId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM records WHERE id = $1")
            .bind(id.into_inner())
            .execute(&mut *self.conn)
            .await
            .map_err(store_error)?;

        Ok(result.rows_affected() > 0)
    }

    /// Fetch a record by identity.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] if the query fails.
    pub async fn get(&mut self, id: RecordId) -> Result<Option<Record>, StoreError> {
        let sql = format!("SELECT {RECORD_COLUMNS} FROM records WHERE id = $1");
        let row = sqlx::query_as::<_, RecordRow>(&sql)
            .bind(id.into_inner())
            .fetch_optional(&mut *self.conn)
            .await
            .map_err(store_error)?;

        row.map(Record::try_from).transpose()
    }

    /// Whether another record already holds the composite key.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] if the query fails.
    pub async fn exists(&mut self, key: &RecordKey<'_>) -> Result<bool, StoreError> {
        let (found,): (bool,) = sqlx::query_as(
            r"SELECT EXISTS (
                SELECT 1 FROM records
                WHERE name = $1
                  AND operator_id = $2
                  AND director_id IS NOT DISTINCT FROM $3
                  AND ($4::BIGINT IS NULL OR id <> $4)
              )",
        )
        .bind(key.name)
        .bind(key.operator_id.into_inner())
        .bind(key.director_id.map(PersonId::into_inner))
        .bind(key.exclude.map(RecordId::into_inner))
        .fetch_one(&mut *self.conn)
        .await
        .map_err(store_error)?;

        Ok(found)
    }

    /// Run a composed filter/sort/paginate query.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] if the query fails.
    pub async fn query(&mut self, query: &RecordQuery) -> Result<Vec<Record>, StoreError> {
        let mut qb = record_query(query);
        let rows = qb
            .build_query_as::<RecordRow>()
            .fetch_all(&mut *self.conn)
            .await
            .map_err(store_error)?;

        convert_all(rows)
    }

    /// Record counts per rating, for ratings that have any.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] if the query fails.
    pub async fn count_by_rating(&mut self) -> Result<Vec<(MpaaRating, i64)>, StoreError> {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            r"SELECT mpaa_rating, COUNT(*) FROM records
              GROUP BY mpaa_rating
              ORDER BY mpaa_rating",
        )
        .fetch_all(&mut *self.conn)
        .await
        .map_err(store_error)?;

        rows.into_iter()
            .map(|(rating, count)| {
                rating
                    .parse::<MpaaRating>()
                    .map(|rating| (rating, count))
                    .map_err(|e| StoreError::Backend(e.to_string()))
            })
            .collect()
    }

    /// Number of records whose genre text sorts after `genre`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] if the query fails.
    pub async fn count_genre_above(&mut self, genre: Genre) -> Result<i64, StoreError> {
        let (count,): (i64,) =
            sqlx::query_as(r#"SELECT COUNT(*) FROM records WHERE genre COLLATE "C" > $1"#)
                .bind(genre.as_str())
                .fetch_one(&mut *self.conn)
                .await
                .map_err(store_error)?;

        Ok(count)
    }

    /// Records whose genre text sorts before `genre`, ordered by identity.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] if the query fails.
    pub async fn genre_below(&mut self, genre: Genre) -> Result<Vec<Record>, StoreError> {
        let sql = format!(
            r#"SELECT {RECORD_COLUMNS} FROM records WHERE genre COLLATE "C" < $1 ORDER BY id"#
        );
        let rows = sqlx::query_as::<_, RecordRow>(&sql)
            .bind(genre.as_str())
            .fetch_all(&mut *self.conn)
            .await
            .map_err(store_error)?;

        convert_all(rows)
    }
}
