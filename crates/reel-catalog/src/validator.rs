//! Structural and value validation of drafts.
//!
//! Both validators are pure and fail fast: the first violated rule is
//! reported and later rules are not evaluated. Rule order is fixed, so a
//! draft with several problems always produces the same message.

use chrono::{DateTime, Utc};
use reel_types::{
    Coordinates, Genre, Location, MpaaRating, NewPerson, NewRecord, PersonDraft, PersonId,
    RecordDraft,
};

use crate::error::ValidationError;

/// The scalar part of a record draft after validation.
///
/// Person references are resolved separately; [`into_record`] joins the
/// two once identities are known.
///
/// [`into_record`]: RecordFields::into_record
#[derive(Debug, Clone, PartialEq)]
pub struct RecordFields {
    /// Non-blank name.
    pub name: String,
    /// Creation timestamp from the draft, if any.
    pub creation_date: Option<DateTime<Utc>>,
    /// Both coordinate components.
    pub coordinates: Coordinates,
    /// Positive Oscar count.
    pub oscars_count: i32,
    /// Positive budget.
    pub budget: f32,
    /// Positive box office, if any.
    pub total_box_office: Option<i64>,
    /// Positive length, if any.
    pub length: Option<i64>,
    /// Positive golden palm count.
    pub golden_palm_count: i64,
    /// Rating.
    pub mpaa_rating: MpaaRating,
    /// Genre.
    pub genre: Genre,
}

/// Identities of the people a record points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedPeople {
    /// Operator.
    pub operator_id: PersonId,
    /// Director, if any.
    pub director_id: Option<PersonId>,
    /// Screenwriter, if any.
    pub screenwriter_id: Option<PersonId>,
}

impl RecordFields {
    /// Combine the validated scalars with resolved people. `fallback_date`
    /// is used when the draft carried no creation timestamp.
    pub fn into_record(self, people: ResolvedPeople, fallback_date: DateTime<Utc>) -> NewRecord {
        NewRecord {
            name: self.name,
            creation_date: self.creation_date.unwrap_or(fallback_date),
            coordinates: self.coordinates,
            oscars_count: self.oscars_count,
            budget: self.budget,
            total_box_office: self.total_box_office,
            length: self.length,
            golden_palm_count: self.golden_palm_count,
            mpaa_rating: self.mpaa_rating,
            genre: self.genre,
            operator_id: people.operator_id,
            director_id: people.director_id,
            screenwriter_id: people.screenwriter_id,
        }
    }
}

fn require<T>(value: Option<T>, message: &str) -> Result<T, ValidationError> {
    value.ok_or_else(|| ValidationError::new(message))
}

fn require_name(name: Option<&str>) -> Result<String, ValidationError> {
    match name {
        Some(text) if !text.trim().is_empty() => Ok(text.to_owned()),
        _ => Err(ValidationError::new("name must not be blank")),
    }
}

/// Validate the scalar fields of a record draft.
///
/// Rule order: name, coordinates, presence of oscar count, budget, rating,
/// operator and genre, then the value ranges of oscar count, budget, box
/// office, length and golden palm count.
pub fn validate_record(draft: &RecordDraft) -> Result<RecordFields, ValidationError> {
    let name = require_name(draft.name.as_deref())?;

    let coordinates = match draft.coordinates {
        Some(c) => match (c.x, c.y) {
            (Some(x), Some(y)) => Coordinates { x, y },
            _ => return Err(ValidationError::new("coordinates must have both x and y")),
        },
        None => return Err(ValidationError::new("coordinates must be present")),
    };

    let oscars_count = require(draft.oscars_count, "oscarsCount must be present")?;
    let budget = require(draft.budget, "budget must be present")?;
    let mpaa_rating = require(draft.mpaa_rating, "mpaaRating must be present")?;
    require(draft.operator.as_ref(), "operator must be present")?;
    let genre = require(draft.genre, "genre must be present")?;

    if oscars_count <= 0 {
        return Err(ValidationError::new("oscarsCount must be greater than 0"));
    }
    if budget.is_nan() || budget <= 0.0 {
        return Err(ValidationError::new("budget must be greater than 0"));
    }
    if draft.total_box_office.is_some_and(|v| v <= 0) {
        return Err(ValidationError::new(
            "totalBoxOffice must be absent or greater than 0",
        ));
    }
    if draft.length.is_some_and(|v| v <= 0) {
        return Err(ValidationError::new("length must be absent or greater than 0"));
    }
    let golden_palm_count = match draft.golden_palm_count {
        Some(count) if count > 0 => count,
        _ => {
            return Err(ValidationError::new(
                "goldenPalmCount must be present and greater than 0",
            ));
        }
    };

    Ok(RecordFields {
        name,
        creation_date: draft.creation_date,
        coordinates,
        oscars_count,
        budget,
        total_box_office: draft.total_box_office,
        length: draft.length,
        golden_palm_count,
        mpaa_rating,
        genre,
    })
}

/// Validate a person draft into an insertable person.
///
/// Rule order: name, hair color, location presence, location finiteness.
pub fn validate_person(draft: &PersonDraft) -> Result<NewPerson, ValidationError> {
    let name = require_name(draft.name.as_deref())?;
    let hair_color = require(draft.hair_color, "hairColor must be present")?;

    let location = match draft.location {
        Some(l) => match (l.x, l.y, l.z) {
            (Some(x), Some(y), Some(z)) => Location { x, y, z },
            _ => return Err(ValidationError::new("location must have x, y and z")),
        },
        None => return Err(ValidationError::new("location must be present")),
    };

    if !location.y.is_finite() || !location.z.is_finite() {
        return Err(ValidationError::new(
            "location (x, y, z) must be finite numbers",
        ));
    }

    Ok(NewPerson {
        name,
        eye_color: draft.eye_color,
        hair_color,
        location,
        birthday: draft.birthday,
        nationality: draft.nationality,
    })
}

#[cfg(test)]
mod tests {
    use reel_types::{Color, CoordinatesDraft, LocationDraft};

    use super::*;

    fn valid_record() -> RecordDraft {
        RecordDraft {
            name: Some(String::from("Heat")),
            coordinates: Some(CoordinatesDraft {
                x: Some(1),
                y: Some(2),
            }),
            oscars_count: Some(1),
            budget: Some(60.5),
            golden_palm_count: Some(1),
            mpaa_rating: Some(MpaaRating::Pg13),
            genre: Some(Genre::Thriller),
            operator: Some(PersonDraft::reference(PersonId(1))),
            ..RecordDraft::default()
        }
    }

    fn valid_person() -> PersonDraft {
        PersonDraft {
            name: Some(String::from("Michael Mann")),
            hair_color: Some(Color::Black),
            location: Some(LocationDraft {
                x: Some(1),
                y: Some(2.5),
                z: Some(3.0),
            }),
            ..PersonDraft::default()
        }
    }

    fn record_message(draft: &RecordDraft) -> Option<String> {
        validate_record(draft).err().map(|e| e.message)
    }

    fn person_message(draft: &PersonDraft) -> Option<String> {
        validate_person(draft).err().map(|e| e.message)
    }

    #[test]
    fn accepts_minimal_record() {
        let fields = validate_record(&valid_record()).ok();
        assert_eq!(fields.as_ref().map(|f| f.genre), Some(Genre::Thriller));
        assert_eq!(fields.and_then(|f| f.creation_date), None);
    }

    #[test]
    fn blank_name_is_reported_first() {
        let draft = RecordDraft {
            name: Some(String::from("  ")),
            budget: None,
            ..valid_record()
        };
        assert_eq!(record_message(&draft).as_deref(), Some("name must not be blank"));
    }

    #[test]
    fn presence_checks_run_before_range_checks() {
        let draft = RecordDraft {
            oscars_count: Some(0),
            genre: None,
            ..valid_record()
        };
        assert_eq!(record_message(&draft).as_deref(), Some("genre must be present"));
    }

    #[test]
    fn missing_operator_is_rejected() {
        let draft = RecordDraft {
            operator: None,
            ..valid_record()
        };
        assert_eq!(record_message(&draft).as_deref(), Some("operator must be present"));
    }

    #[test]
    fn half_coordinates_are_rejected() {
        let draft = RecordDraft {
            coordinates: Some(CoordinatesDraft {
                x: Some(1),
                y: None,
            }),
            ..valid_record()
        };
        assert_eq!(
            record_message(&draft).as_deref(),
            Some("coordinates must have both x and y")
        );
    }

    #[test]
    fn nan_and_zero_budget_are_rejected() {
        for budget in [0.0, -1.0, f32::NAN] {
            let draft = RecordDraft {
                budget: Some(budget),
                ..valid_record()
            };
            assert_eq!(
                record_message(&draft).as_deref(),
                Some("budget must be greater than 0")
            );
        }
    }

    #[test]
    fn optional_ranges_only_apply_when_present() {
        let draft = RecordDraft {
            total_box_office: Some(0),
            ..valid_record()
        };
        assert_eq!(
            record_message(&draft).as_deref(),
            Some("totalBoxOffice must be absent or greater than 0")
        );

        let draft = RecordDraft {
            length: Some(-5),
            ..valid_record()
        };
        assert_eq!(
            record_message(&draft).as_deref(),
            Some("length must be absent or greater than 0")
        );
    }

    #[test]
    fn golden_palm_count_is_last() {
        let draft = RecordDraft {
            golden_palm_count: None,
            ..valid_record()
        };
        assert_eq!(
            record_message(&draft).as_deref(),
            Some("goldenPalmCount must be present and greater than 0")
        );
    }

    #[test]
    fn into_record_uses_fallback_date_only_when_absent() {
        let fallback = Utc::now();
        let people = ResolvedPeople {
            operator_id: PersonId(1),
            director_id: None,
            screenwriter_id: Some(PersonId(2)),
        };
        let record = validate_record(&valid_record())
            .ok()
            .map(|f| f.into_record(people, fallback));
        assert_eq!(record.as_ref().map(|r| r.creation_date), Some(fallback));
        assert_eq!(record.and_then(|r| r.screenwriter_id), Some(PersonId(2)));
    }

    #[test]
    fn accepts_minimal_person() {
        let person = validate_person(&valid_person()).ok();
        assert_eq!(person.map(|p| p.hair_color), Some(Color::Black));
    }

    #[test]
    fn person_rule_order() {
        let nameless = PersonDraft {
            name: None,
            hair_color: None,
            ..valid_person()
        };
        assert_eq!(person_message(&nameless).as_deref(), Some("name must not be blank"));

        let hairless = PersonDraft {
            hair_color: None,
            location: None,
            ..valid_person()
        };
        assert_eq!(person_message(&hairless).as_deref(), Some("hairColor must be present"));

        let nowhere = PersonDraft {
            location: None,
            ..valid_person()
        };
        assert_eq!(person_message(&nowhere).as_deref(), Some("location must be present"));
    }

    #[test]
    fn non_finite_location_is_rejected() {
        let draft = PersonDraft {
            location: Some(LocationDraft {
                x: Some(1),
                y: Some(f64::INFINITY),
                z: Some(0.0),
            }),
            ..valid_person()
        };
        assert_eq!(
            person_message(&draft).as_deref(),
            Some("location (x, y, z) must be finite numbers")
        );

        let draft = PersonDraft {
            location: Some(LocationDraft {
                x: Some(1),
                y: Some(0.0),
                z: Some(f32::NAN),
            }),
            ..valid_person()
        };
        assert!(validate_person(&draft).is_err());
    }
}
