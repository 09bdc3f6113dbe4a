//! Row types for the catalog tables and their conversion into domain types.
//!
//! Uses runtime types rather than compile-time checked types to avoid
//! requiring a live database during builds. Enumerations arrive as text and
//! are parsed on conversion; a value the domain does not know means the
//! database was written by something else and is reported as a backend
//! error.

use chrono::{DateTime, Utc};
use reel_catalog::StoreError;
use reel_types::{
    Coordinates, ImportAttempt, ImportId, Location, Person, PersonId, Record, RecordId,
};

/// Columns selected for a person, in [`PersonRow`] order.
pub const PERSON_COLUMNS: &str = "id, name, eye_color, hair_color, location_x, location_y, \
     location_z, birthday, nationality";

/// Columns selected for a record, in [`RecordRow`] order.
pub const RECORD_COLUMNS: &str = "id, name, creation_date, coordinates_x, coordinates_y, \
     oscars_count, budget, total_box_office, length, golden_palm_count, mpaa_rating, genre, \
     operator_id, director_id, screenwriter_id";

/// [`RECORD_COLUMNS`] qualified with the `m` alias used by composed queries.
pub const RECORD_COLUMNS_QUALIFIED: &str = "m.id, m.name, m.creation_date, m.coordinates_x, \
     m.coordinates_y, m.oscars_count, m.budget, m.total_box_office, m.length, \
     m.golden_palm_count, m.mpaa_rating, m.genre, m.operator_id, m.director_id, \
     m.screenwriter_id";

/// Columns selected for an import attempt, in [`ImportRow`] order.
pub const IMPORT_COLUMNS: &str =
    "id, username, import_date, status, objects_count, file_name, error_message";

fn parse_text<T>(value: &str) -> Result<T, StoreError>
where
    T: core::str::FromStr,
    T::Err: core::fmt::Display,
{
    value
        .parse()
        .map_err(|e: T::Err| StoreError::Backend(e.to_string()))
}

fn parse_opt<T>(value: Option<&str>) -> Result<Option<T>, StoreError>
where
    T: core::str::FromStr,
    T::Err: core::fmt::Display,
{
    value.map(parse_text).transpose()
}

/// A row from the `persons` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PersonRow {
    /// Identity.
    pub id: i64,
    /// Name.
    pub name: String,
    /// Eye color text.
    pub eye_color: Option<String>,
    /// Hair color text.
    pub hair_color: String,
    /// Location x.
    pub location_x: i32,
    /// Location y.
    pub location_y: f64,
    /// Location z.
    pub location_z: f32,
    /// Birthday.
    pub birthday: Option<DateTime<Utc>>,
    /// Nationality text.
    pub nationality: Option<String>,
}

impl TryFrom<PersonRow> for Person {
    type Error = StoreError;

    fn try_from(row: PersonRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: PersonId(row.id),
            name: row.name,
            eye_color: parse_opt(row.eye_color.as_deref())?,
            hair_color: parse_text(&row.hair_color)?,
            location: Location {
                x: row.location_x,
                y: row.location_y,
                z: row.location_z,
            },
            birthday: row.birthday,
            nationality: parse_opt(row.nationality.as_deref())?,
        })
    }
}

/// A row from the `records` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RecordRow {
    /// Identity.
    pub id: i64,
    /// Name.
    pub name: String,
    /// Creation timestamp.
    pub creation_date: DateTime<Utc>,
    /// Coordinates x.
    pub coordinates_x: i64,
    /// Coordinates y.
    pub coordinates_y: i64,
    /// Oscar count.
    pub oscars_count: i32,
    /// Budget.
    pub budget: f32,
    /// Total box office.
    pub total_box_office: Option<i64>,
    /// Length.
    pub length: Option<i64>,
    /// Golden palm count.
    pub golden_palm_count: i64,
    /// Rating text.
    pub mpaa_rating: String,
    /// Genre text.
    pub genre: String,
    /// Operator identity.
    pub operator_id: i64,
    /// Director identity.
    pub director_id: Option<i64>,
    /// Screenwriter identity.
    pub screenwriter_id: Option<i64>,
}

impl TryFrom<RecordRow> for Record {
    type Error = StoreError;

    fn try_from(row: RecordRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: RecordId(row.id),
            name: row.name,
            creation_date: row.creation_date,
            coordinates: Coordinates {
                x: row.coordinates_x,
                y: row.coordinates_y,
            },
            oscars_count: row.oscars_count,
            budget: row.budget,
            total_box_office: row.total_box_office,
            length: row.length,
            golden_palm_count: row.golden_palm_count,
            mpaa_rating: parse_text(&row.mpaa_rating)?,
            genre: parse_text(&row.genre)?,
            operator_id: PersonId(row.operator_id),
            director_id: row.director_id.map(PersonId),
            screenwriter_id: row.screenwriter_id.map(PersonId),
        })
    }
}

/// A row from the `import_history` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ImportRow {
    /// Identity.
    pub id: i64,
    /// Acting user.
    pub username: String,
    /// Submission timestamp.
    pub import_date: DateTime<Utc>,
    /// Status text.
    pub status: String,
    /// Committed object count.
    pub objects_count: Option<i32>,
    /// Uploaded file name.
    pub file_name: Option<String>,
    /// Truncated failure description.
    pub error_message: Option<String>,
}

impl TryFrom<ImportRow> for ImportAttempt {
    type Error = StoreError;

    fn try_from(row: ImportRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: ImportId(row.id),
            username: row.username,
            import_date: row.import_date,
            status: parse_text(&row.status)?,
            objects_count: row.objects_count,
            file_name: row.file_name,
            error_message: row.error_message,
        })
    }
}

/// Convert a batch of rows, failing on the first bad one.
pub fn convert_all<R, T>(rows: Vec<R>) -> Result<Vec<T>, StoreError>
where
    T: TryFrom<R, Error = StoreError>,
{
    rows.into_iter().map(T::try_from).collect()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use reel_types::{Genre, ImportStatus, MpaaRating};

    use super::*;

    fn record_row() -> RecordRow {
        RecordRow {
            id: 1,
            name: String::from("Heat"),
            creation_date: Utc::now(),
            coordinates_x: 1,
            coordinates_y: 2,
            oscars_count: 1,
            budget: 1.5,
            total_box_office: None,
            length: Some(170),
            golden_palm_count: 1,
            mpaa_rating: String::from("PG_13"),
            genre: String::from("HORROR"),
            operator_id: 7,
            director_id: None,
            screenwriter_id: Some(8),
        }
    }

    #[test]
    fn record_row_converts() {
        let record = Record::try_from(record_row()).unwrap();
        assert_eq!(record.mpaa_rating, MpaaRating::Pg13);
        assert_eq!(record.genre, Genre::Horror);
        assert_eq!(record.screenwriter_id, Some(PersonId(8)));
    }

    #[test]
    fn unknown_enum_text_is_a_backend_error() {
        let row = RecordRow {
            genre: String::from("MUSICAL"),
            ..record_row()
        };
        assert!(matches!(Record::try_from(row), Err(StoreError::Backend(_))));
    }

    #[test]
    fn import_row_converts() {
        let row = ImportRow {
            id: 3,
            username: String::from("user"),
            import_date: Utc::now(),
            status: String::from("IN_PROGRESS"),
            objects_count: None,
            file_name: None,
            error_message: None,
        };
        let attempt = ImportAttempt::try_from(row).unwrap();
        assert_eq!(attempt.status, ImportStatus::InProgress);
    }
}
