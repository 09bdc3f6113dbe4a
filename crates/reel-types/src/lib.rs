//! Shared type definitions for the Reel catalog.
//!
//! This crate is the single source of truth for the entities, identifiers,
//! enumerations, and input drafts used across the Reel workspace. Types that
//! leave the server derive `ts-rs` bindings for the web client.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe integer wrappers for entity identities
//! - [`enums`] -- Text-backed enumerations (ratings, genres, colors, statuses)
//! - [`structs`] -- Persisted entities and their validated insert shapes
//! - [`drafts`] -- Unvalidated inputs from the API and import payloads
//! - [`timestamp`] -- Lenient timestamp parsing for inbound payloads

pub mod drafts;
pub mod enums;
pub mod ids;
pub mod structs;
pub mod timestamp;

pub use drafts::{CoordinatesDraft, LocationDraft, PersonDraft, RecordDraft};
pub use enums::{ChangeKind, Color, Country, Genre, ImportStatus, MpaaRating, UnknownVariant};
pub use ids::{ImportId, PersonId, RecordId};
pub use structs::{
    ChangeEvent, Coordinates, ImportAttempt, Location, NewImportAttempt, NewPerson, NewRecord,
    Person, Record,
};
pub use timestamp::{TimestampError, parse_timestamp};

#[cfg(test)]
mod tests {
    //! `TypeScript` binding generation.

    #[test]
    fn export_bindings() {
        use ts_rs::TS;

        let _ = crate::ids::RecordId::export_all();
        let _ = crate::ids::PersonId::export_all();
        let _ = crate::ids::ImportId::export_all();

        let _ = crate::enums::Color::export_all();
        let _ = crate::enums::Country::export_all();
        let _ = crate::enums::MpaaRating::export_all();
        let _ = crate::enums::Genre::export_all();
        let _ = crate::enums::ImportStatus::export_all();
        let _ = crate::enums::ChangeKind::export_all();

        let _ = crate::structs::Coordinates::export_all();
        let _ = crate::structs::Location::export_all();
        let _ = crate::structs::Person::export_all();
        let _ = crate::structs::Record::export_all();
        let _ = crate::structs::ImportAttempt::export_all();
        let _ = crate::structs::ChangeEvent::export_all();
    }
}
