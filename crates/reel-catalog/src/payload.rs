//! XML import payloads.
//!
//! ```xml
//! <movies>
//!   <movie><name>Heat</name>...</movie>
//! </movies>
//!
//! <persons>
//!   <person><name>Michael Mann</name>...</person>
//! </persons>
//! ```
//!
//! Element names follow the JSON field names (camelCase). A missing list,
//! an empty root, and an empty or whitespace-only body all parse to zero
//! descriptors.

use reel_types::{PersonDraft, RecordDraft};
use serde::Deserialize;

use crate::error::CatalogError;

#[derive(Debug, Default, Deserialize)]
struct RecordsDocument {
    #[serde(default, rename = "movie")]
    records: Vec<RecordDraft>,
}

#[derive(Debug, Default, Deserialize)]
struct PersonsDocument {
    #[serde(default, rename = "person")]
    persons: Vec<PersonDraft>,
}

fn parse_document<T>(xml: &str) -> Result<Option<T>, CatalogError>
where
    T: for<'de> Deserialize<'de>,
{
    if xml.trim().is_empty() {
        return Ok(None);
    }
    quick_xml::de::from_str(xml)
        .map(Some)
        .map_err(|e| CatalogError::Payload(e.to_string()))
}

/// Parse a `<movies>` document into record drafts, in document order.
pub fn parse_records(xml: &str) -> Result<Vec<RecordDraft>, CatalogError> {
    Ok(parse_document::<RecordsDocument>(xml)?
        .map(|doc| doc.records)
        .unwrap_or_default())
}

/// Parse a `<persons>` document into person drafts, in document order.
pub fn parse_persons(xml: &str) -> Result<Vec<PersonDraft>, CatalogError> {
    Ok(parse_document::<PersonsDocument>(xml)?
        .map(|doc| doc.persons)
        .unwrap_or_default())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use reel_types::{Color, Genre, MpaaRating, PersonId};

    use super::*;

    #[test]
    fn parses_records_with_nested_people() {
        let xml = r"
            <movies>
              <movie>
                <name>Heat</name>
                <coordinates><x>1</x><y>2</y></coordinates>
                <oscarsCount>1</oscarsCount>
                <budget>60.5</budget>
                <totalBoxOffice>187</totalBoxOffice>
                <goldenPalmCount>1</goldenPalmCount>
                <mpaaRating>PG_13</mpaaRating>
                <genre>THRILLER</genre>
                <creationDate>1995-12-15</creationDate>
                <operator><id>4</id></operator>
                <director>
                  <name>Mann</name>
                  <hairColor>BLACK</hairColor>
                  <location><x>1</x><y>2.5</y><z>3</z></location>
                </director>
              </movie>
              <movie><name>Second</name></movie>
            </movies>";

        let drafts = parse_records(xml).unwrap();
        assert_eq!(drafts.len(), 2);

        let heat = drafts.first().unwrap();
        assert_eq!(heat.name.as_deref(), Some("Heat"));
        assert_eq!(heat.mpaa_rating, Some(MpaaRating::Pg13));
        assert_eq!(heat.genre, Some(Genre::Thriller));
        assert_eq!(heat.coordinates.and_then(|c| c.y), Some(2));
        assert!(heat.creation_date.is_some());
        assert_eq!(heat.operator.as_ref().and_then(|p| p.id), Some(PersonId(4)));
        assert_eq!(
            heat.director.as_ref().and_then(|p| p.hair_color),
            Some(Color::Black)
        );
        assert_eq!(
            heat.director
                .as_ref()
                .and_then(|p| p.location)
                .and_then(|l| l.x),
            Some(1)
        );
    }

    #[test]
    fn empty_inputs_are_zero_descriptors() {
        assert!(parse_records("").unwrap().is_empty());
        assert!(parse_records("  \n ").unwrap().is_empty());
        assert!(parse_records("<movies></movies>").unwrap().is_empty());
        assert!(parse_persons("<persons/>").unwrap().is_empty());
    }

    #[test]
    fn parses_persons() {
        let xml = r"
            <persons>
              <person>
                <name>Ann</name>
                <hairColor>RED</hairColor>
                <nationality>VATICAN</nationality>
                <birthday>1980-01-02T03:04:05Z</birthday>
                <location><x>0</x><y>0</y><z>0</z></location>
              </person>
            </persons>";
        let drafts = parse_persons(xml).unwrap();
        assert_eq!(drafts.len(), 1);
        assert!(drafts.first().and_then(|p| p.birthday).is_some());
    }

    #[test]
    fn malformed_xml_is_a_payload_error() {
        let err = parse_records("<movies><movie>").unwrap_err();
        assert!(matches!(err, CatalogError::Payload(_)));

        let err = parse_records("<movies><movie><genre>MUSICAL</genre></movie></movies>")
            .unwrap_err();
        assert!(matches!(err, CatalogError::Payload(_)));
    }
}
