//! Unvalidated input shapes for records and persons.
//!
//! Drafts are what clients send, either as JSON to the HTTP API or as
//! elements of an XML import payload. Every field is optional so that the
//! validator, not the deserializer, decides which rule was violated first
//! and can report it in words.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::enums::{Color, Country, Genre, MpaaRating};
use crate::ids::PersonId;

/// Draft of the two-dimensional coordinates of a record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct CoordinatesDraft {
    /// Horizontal component.
    pub x: Option<i64>,
    /// Vertical component.
    pub y: Option<i64>,
}

/// Draft of the three-dimensional location of a person.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
pub struct LocationDraft {
    /// Integral component.
    pub x: Option<i32>,
    /// Double-precision component.
    pub y: Option<f64>,
    /// Single-precision component.
    pub z: Option<f32>,
}

/// Draft of a person.
///
/// When `id` is set the draft is a reference to an existing person and the
/// remaining fields are ignored by dependent resolution.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonDraft {
    /// Identity of an existing person.
    pub id: Option<PersonId>,
    /// Display name.
    pub name: Option<String>,
    /// Eye color.
    pub eye_color: Option<Color>,
    /// Hair color.
    pub hair_color: Option<Color>,
    /// Location.
    pub location: Option<LocationDraft>,
    /// Birthday.
    #[serde(default, deserialize_with = "crate::timestamp::deserialize_option")]
    pub birthday: Option<DateTime<Utc>>,
    /// Nationality.
    pub nationality: Option<Country>,
}

impl PersonDraft {
    /// A draft that only references an existing person.
    pub fn reference(id: PersonId) -> Self {
        Self {
            id: Some(id),
            ..Self::default()
        }
    }
}

/// Draft of a record.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordDraft {
    /// Title.
    pub name: Option<String>,
    /// Creation timestamp; assigned by the server when absent.
    #[serde(default, deserialize_with = "crate::timestamp::deserialize_option")]
    pub creation_date: Option<DateTime<Utc>>,
    /// Coordinates.
    pub coordinates: Option<CoordinatesDraft>,
    /// Number of Oscars.
    pub oscars_count: Option<i32>,
    /// Budget.
    pub budget: Option<f32>,
    /// Total box office.
    pub total_box_office: Option<i64>,
    /// Running length.
    pub length: Option<i64>,
    /// Number of Golden Palms.
    pub golden_palm_count: Option<i64>,
    /// MPAA category rating.
    pub mpaa_rating: Option<MpaaRating>,
    /// Genre.
    pub genre: Option<Genre>,
    /// Operator, either a reference or a person to create.
    pub operator: Option<PersonDraft>,
    /// Director, either a reference or a person to create.
    pub director: Option<PersonDraft>,
    /// Screenwriter, either a reference or a person to create.
    pub screenwriter: Option<PersonDraft>,
}
