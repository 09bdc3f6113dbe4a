//! Composite-key uniqueness checks.
//!
//! Guards run inside the caller's transaction so they see rows the same
//! batch has already inserted. They are the friendly first line; the store
//! constraints catch whatever slips past a concurrent writer.

use reel_types::{NewPerson, NewRecord, PersonId, RecordId};
use tracing::debug;

use crate::error::{CatalogError, ValidationError};
use crate::store::{CatalogTx, PersonKey, RecordKey};

/// Reject `record` if another record has the same name, operator and
/// director. `exclude` is the record's own identity when updating.
pub async fn ensure_record_unique<T>(
    tx: &mut T,
    record: &NewRecord,
    exclude: Option<RecordId>,
) -> Result<(), CatalogError>
where
    T: CatalogTx + ?Sized,
{
    let key = RecordKey {
        name: &record.name,
        operator_id: record.operator_id,
        director_id: record.director_id,
        exclude,
    };

    if tx.record_exists(&key).await? {
        debug!(name = %record.name, operator_id = %record.operator_id, "duplicate record rejected");
        return Err(ValidationError::new(format!(
            "record named '{}' already exists with the same operator and director",
            record.name
        ))
        .into());
    }
    Ok(())
}

/// Reject `person` if another person has the same name and birthday. Two
/// persons without a birthday collide. `exclude` is the person's own
/// identity when updating.
pub async fn ensure_person_unique<T>(
    tx: &mut T,
    person: &NewPerson,
    exclude: Option<PersonId>,
) -> Result<(), CatalogError>
where
    T: CatalogTx + ?Sized,
{
    let key = PersonKey {
        name: &person.name,
        birthday: person.birthday,
        exclude,
    };

    if tx.person_exists(&key).await? {
        let birthday = person
            .birthday
            .map_or_else(|| String::from("none"), |b| b.to_rfc3339());
        debug!(name = %person.name, %birthday, "duplicate person rejected");
        return Err(ValidationError::new(format!(
            "person named '{}' with birthday {birthday} already exists",
            person.name
        ))
        .into());
    }
    Ok(())
}
