//! Operations on the `persons` table.

use reel_catalog::{PersonKey, StoreError};
use reel_types::{Color, Country, NewPerson, Person, PersonId};
use sqlx::PgConnection;

use crate::error::store_error;
use crate::rows::{PERSON_COLUMNS, PersonRow, convert_all};

/// Person queries bound to one connection (usually an open transaction).
pub struct PersonStore<'c> {
    conn: &'c mut PgConnection,
}

impl<'c> PersonStore<'c> {
    /// Create a person store over a connection.
    pub const fn new(conn: &'c mut PgConnection) -> Self {
        Self { conn }
    }

    /// Insert a person and return it with its assigned identity.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UniqueViolation`] if `(name, birthday)` is taken.
    pub async fn insert(&mut self, person: &NewPerson) -> Result<Person, StoreError> {
        let sql = format!(
            "INSERT INTO persons (name, eye_color, hair_color, location_x, location_y, \
             location_z, birthday, nationality) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING {PERSON_COLUMNS}"
        );
        let row = sqlx::query_as::<_, PersonRow>(&sql)
            .bind(&person.name)
            .bind(person.eye_color.map(Color::as_str))
            .bind(person.hair_color.as_str())
            .bind(person.location.x)
            .bind(person.location.y)
            .bind(person.location.z)
            .bind(person.birthday)
            .bind(person.nationality.map(Country::as_str))
            .fetch_one(&mut *self.conn)
            .await
            .map_err(store_error)?;

        Person::try_from(row)
    }

    /// Overwrite every mutable column of a person.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UniqueViolation`] if `(name, birthday)` is taken.
    pub async fn update(
        &mut self,
        id: PersonId,
        person: &NewPerson,
    ) -> Result<Option<Person>, StoreError> {
        let sql = format!(
            "UPDATE persons SET name = $2, eye_color = $3, hair_color = $4, location_x = $5, \
             location_y = $6, location_z = $7, birthday = $8, nationality = $9 \
             WHERE id = $1 RETURNING {PERSON_COLUMNS}"
        );
        let row = sqlx::query_as::<_, PersonRow>(&sql)
            .bind(id.into_inner())
            .bind(&person.name)
            .bind(person.eye_color.map(Color::as_str))
            .bind(person.hair_color.as_str())
            .bind(person.location.x)
            .bind(person.location.y)
            .bind(person.location.z)
            .bind(person.birthday)
            .bind(person.nationality.map(Country::as_str))
            .fetch_optional(&mut *self.conn)
            .await
            .map_err(store_error)?;

        row.map(Person::try_from).transpose()
    }

    /// Delete a person.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ForeignKeyViolation`] if a record references it.
    pub async fn delete(&mut self, id: PersonId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM persons WHERE id = $1")
            .bind(id.into_inner())
            .execute(&mut *self.conn)
            .await
            .map_err(store_error)?;

        Ok(result.rows_affected() > 0)
    }

    /// Fetch a person by identity.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] if the query fails.
    pub async fn get(&mut self, id: PersonId) -> Result<Option<Person>, StoreError> {
        let sql = format!("SELECT {PERSON_COLUMNS} FROM persons WHERE id = $1");
        let row = sqlx::query_as::<_, PersonRow>(&sql)
            .bind(id.into_inner())
            .fetch_optional(&mut *self.conn)
            .await
            .map_err(store_error)?;

        row.map(Person::try_from).transpose()
    }

    /// All persons ordered by identity.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] if the query fails.
    pub async fn list(&mut self) -> Result<Vec<Person>, StoreError> {
        let sql = format!("SELECT {PERSON_COLUMNS} FROM persons ORDER BY id");
        let rows = sqlx::query_as::<_, PersonRow>(&sql)
            .fetch_all(&mut *self.conn)
            .await
            .map_err(store_error)?;

        convert_all(rows)
    }

    /// Whether another person already holds the composite key.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] if the query fails.
    pub async fn exists(&mut self, key: &PersonKey<'_>) -> Result<bool, StoreError> {
        let (found,): (bool,) = sqlx::query_as(
            r"SELECT EXISTS (
                SELECT 1 FROM persons
                WHERE name = $1
                  AND birthday IS NOT DISTINCT FROM $2
                  AND ($3::BIGINT IS NULL OR id <> $3)
              )",
        )
        .bind(key.name)
        .bind(key.birthday)
        .bind(key.exclude.map(PersonId::into_inner))
        .fetch_one(&mut *self.conn)
        .await
        .map_err(store_error)?;

        Ok(found)
    }
}
