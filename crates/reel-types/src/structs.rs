//! Core entity structs for the Reel catalog.
//!
//! Persisted entities (`Record`, `Person`, `ImportAttempt`) carry their
//! store-assigned identity. The matching `New*` structs are the validated
//! insert shapes handed to the store; they only exist after the validator
//! has accepted a draft.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{ChangeKind, Color, Country, Genre, ImportStatus, MpaaRating};
use crate::ids::{ImportId, PersonId, RecordId};

// ---------------------------------------------------------------------------
// Embedded value objects
// ---------------------------------------------------------------------------

/// Two-dimensional coordinates embedded in a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Coordinates {
    /// Horizontal component.
    pub x: i64,
    /// Vertical component.
    pub y: i64,
}

/// Three-dimensional location embedded in a person.
///
/// `y` and `z` are floating point and must be finite; `x` is integral.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Location {
    /// Integral component.
    pub x: i32,
    /// Double-precision component.
    pub y: f64,
    /// Single-precision component.
    pub z: f32,
}

// ---------------------------------------------------------------------------
// Person
// ---------------------------------------------------------------------------

/// A person that can act as operator, director, or screenwriter of records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct Person {
    /// Store-assigned identity.
    pub id: PersonId,
    /// Display name, never blank.
    pub name: String,
    /// Eye color, if known.
    pub eye_color: Option<Color>,
    /// Hair color.
    pub hair_color: Color,
    /// Where the person is.
    pub location: Location,
    /// Birthday, if known. Part of the person's uniqueness key.
    pub birthday: Option<DateTime<Utc>>,
    /// Nationality, if known.
    pub nationality: Option<Country>,
}

/// A validated person ready to be inserted or written over an existing row.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPerson {
    /// Display name, never blank.
    pub name: String,
    /// Eye color, if known.
    pub eye_color: Option<Color>,
    /// Hair color.
    pub hair_color: Color,
    /// Where the person is.
    pub location: Location,
    /// Birthday, if known.
    pub birthday: Option<DateTime<Utc>>,
    /// Nationality, if known.
    pub nationality: Option<Country>,
}

impl NewPerson {
    /// Attach a store-assigned identity.
    #[must_use]
    pub fn with_id(self, id: PersonId) -> Person {
        Person {
            id,
            name: self.name,
            eye_color: self.eye_color,
            hair_color: self.hair_color,
            location: self.location,
            birthday: self.birthday,
            nationality: self.nationality,
        }
    }
}

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

/// A catalog record (the movie entity).
///
/// People are referenced by identity. The operator is mandatory; the
/// director and screenwriter are optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct Record {
    /// Store-assigned identity.
    pub id: RecordId,
    /// Title, never blank.
    pub name: String,
    /// When the record was created (server-assigned unless supplied).
    pub creation_date: DateTime<Utc>,
    /// Embedded coordinates.
    pub coordinates: Coordinates,
    /// Number of Oscars, always positive.
    pub oscars_count: i32,
    /// Budget, always positive.
    pub budget: f32,
    /// Total box office, positive when present.
    pub total_box_office: Option<i64>,
    /// Running length, positive when present.
    pub length: Option<i64>,
    /// Number of Golden Palms, always positive.
    pub golden_palm_count: i64,
    /// MPAA category rating.
    pub mpaa_rating: MpaaRating,
    /// Genre.
    pub genre: Genre,
    /// Operator (mandatory).
    pub operator_id: PersonId,
    /// Director, if any.
    pub director_id: Option<PersonId>,
    /// Screenwriter, if any.
    pub screenwriter_id: Option<PersonId>,
}

/// A validated record with all dependents resolved to identities.
#[derive(Debug, Clone, PartialEq)]
pub struct NewRecord {
    /// Title, never blank.
    pub name: String,
    /// Creation timestamp to store.
    pub creation_date: DateTime<Utc>,
    /// Embedded coordinates.
    pub coordinates: Coordinates,
    /// Number of Oscars.
    pub oscars_count: i32,
    /// Budget.
    pub budget: f32,
    /// Total box office.
    pub total_box_office: Option<i64>,
    /// Running length.
    pub length: Option<i64>,
    /// Number of Golden Palms.
    pub golden_palm_count: i64,
    /// MPAA category rating.
    pub mpaa_rating: MpaaRating,
    /// Genre.
    pub genre: Genre,
    /// Operator.
    pub operator_id: PersonId,
    /// Director.
    pub director_id: Option<PersonId>,
    /// Screenwriter.
    pub screenwriter_id: Option<PersonId>,
}

impl NewRecord {
    /// Attach a store-assigned identity.
    #[must_use]
    pub fn with_id(self, id: RecordId) -> Record {
        Record {
            id,
            name: self.name,
            creation_date: self.creation_date,
            coordinates: self.coordinates,
            oscars_count: self.oscars_count,
            budget: self.budget,
            total_box_office: self.total_box_office,
            length: self.length,
            golden_palm_count: self.golden_palm_count,
            mpaa_rating: self.mpaa_rating,
            genre: self.genre,
            operator_id: self.operator_id,
            director_id: self.director_id,
            screenwriter_id: self.screenwriter_id,
        }
    }
}

// ---------------------------------------------------------------------------
// Import audit
// ---------------------------------------------------------------------------

/// One audited invocation of the bulk-import pipeline.
///
/// Rows are append-only: created `InProgress`, finalized once, never
/// deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct ImportAttempt {
    /// Store-assigned identity.
    pub id: ImportId,
    /// The acting user.
    pub username: String,
    /// Submission time; refreshed when the attempt is marked failed.
    pub import_date: DateTime<Utc>,
    /// Current status.
    pub status: ImportStatus,
    /// Number of objects committed (0 for failed attempts).
    pub objects_count: Option<i32>,
    /// Name of the uploaded file.
    pub file_name: Option<String>,
    /// Truncated description of the failure.
    pub error_message: Option<String>,
}

/// Insert shape for a new, in-progress import attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewImportAttempt {
    /// The acting user.
    pub username: String,
    /// Submission time.
    pub import_date: DateTime<Utc>,
    /// Name of the uploaded file.
    pub file_name: Option<String>,
}

// ---------------------------------------------------------------------------
// Change notification
// ---------------------------------------------------------------------------

/// A change announced to subscribers after a successful commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ChangeEvent {
    /// What happened.
    pub kind: ChangeKind,
    /// The affected record.
    pub id: RecordId,
}

impl ChangeEvent {
    /// A record was created.
    pub const fn created(id: RecordId) -> Self {
        Self {
            kind: ChangeKind::RecordCreated,
            id,
        }
    }

    /// A record was updated.
    pub const fn updated(id: RecordId) -> Self {
        Self {
            kind: ChangeKind::RecordUpdated,
            id,
        }
    }

    /// A record was deleted.
    pub const fn deleted(id: RecordId) -> Self {
        Self {
            kind: ChangeKind::RecordDeleted,
            id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_serializes_camel_case() {
        let record = NewRecord {
            name: String::from("Heat"),
            creation_date: Utc::now(),
            coordinates: Coordinates { x: 1, y: 2 },
            oscars_count: 1,
            budget: 60.0,
            total_box_office: None,
            length: Some(170),
            golden_palm_count: 1,
            mpaa_rating: MpaaRating::Pg13,
            genre: Genre::Thriller,
            operator_id: PersonId(3),
            director_id: None,
            screenwriter_id: None,
        }
        .with_id(RecordId(10));

        let json = serde_json::to_value(&record).ok();
        let json = json.as_ref();
        assert_eq!(json.and_then(|j| j.get("oscarsCount")), Some(&serde_json::json!(1)));
        assert_eq!(json.and_then(|j| j.get("mpaaRating")), Some(&serde_json::json!("PG_13")));
        assert_eq!(json.and_then(|j| j.get("operatorId")), Some(&serde_json::json!(3)));
    }

    #[test]
    fn change_event_wire_shape() {
        let json = serde_json::to_string(&ChangeEvent::deleted(RecordId(5))).ok();
        assert_eq!(
            json.as_deref(),
            Some(r#"{"kind":"record-deleted","id":5}"#)
        );
    }
}
