//! Error types for the catalog core.
//!
//! [`ValidationError`] is the single user-facing rejection for malformed or
//! duplicate input. [`CatalogError`] wraps it together with the other failure
//! modes a catalog operation can produce. Store conflicts are folded into the
//! same variants the pre-commit checks would have produced, so a concurrent
//! insert that slips past the uniqueness guard still reads as a validation
//! failure.

use reel_types::ImportId;

use crate::store::StoreError;

/// A draft or candidate entity violates a validation or uniqueness rule.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ValidationError {
    /// Human-readable description of the first violated rule.
    pub message: String,
}

impl ValidationError {
    /// Create a validation error with the given description.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Errors returned by catalog operations.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// Input was malformed or would violate a uniqueness rule.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A dependent reference does not resolve, or a delete is blocked by
    /// records still referencing the entity.
    #[error("{0}")]
    Reference(String),

    /// The addressed entity does not exist.
    #[error("{0}")]
    NotFound(String),

    /// An import payload could not be parsed.
    #[error("malformed import payload: {0}")]
    Payload(String),

    /// The backing store failed.
    #[error("storage failure: {0}")]
    Storage(StoreError),

    /// A bulk import was rolled back; the attempt has been marked failed.
    #[error("Import failed: {source}")]
    ImportFailed {
        /// The audit row describing this attempt.
        attempt_id: ImportId,
        /// The error that aborted the batch.
        source: Box<CatalogError>,
    },
}

impl CatalogError {
    /// Prefix a user-facing error with the position of the descriptor that
    /// caused it, e.g. `record #3: ...`.
    #[must_use]
    pub fn at_position(self, kind: &str, position: usize) -> Self {
        self.context(&format!("{kind} #{position}"))
    }

    /// Prefix a user-facing error with `label: `. Storage failures are left
    /// untouched.
    #[must_use]
    pub fn context(self, label: &str) -> Self {
        let prefix = |msg: String| format!("{label}: {msg}");
        match self {
            Self::Validation(err) => Self::Validation(ValidationError::new(prefix(err.message))),
            Self::Reference(msg) => Self::Reference(prefix(msg)),
            Self::NotFound(msg) => Self::NotFound(prefix(msg)),
            Self::Payload(msg) => Self::Payload(prefix(msg)),
            other @ (Self::Storage(_) | Self::ImportFailed { .. }) => other,
        }
    }
}

impl From<StoreError> for CatalogError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::UniqueViolation(detail) => Self::Validation(ValidationError::new(
                format!("an entity with the same identifying fields already exists ({detail})"),
            )),
            StoreError::ForeignKeyViolation(detail) => {
                Self::Reference(format!("referenced person is missing or still in use ({detail})"))
            }
            backend @ StoreError::Backend(_) => Self::Storage(backend),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_prefix_applies_to_input_errors() {
        let err = CatalogError::from(ValidationError::new("name must not be blank"))
            .at_position("record", 3);
        assert_eq!(err.to_string(), "record #3: name must not be blank");
    }

    #[test]
    fn position_prefix_skips_storage_errors() {
        let err = CatalogError::Storage(StoreError::Backend(String::from("socket closed")))
            .at_position("person", 1);
        assert_eq!(err.to_string(), "storage failure: storage backend error: socket closed");
    }

    #[test]
    fn store_conflicts_map_to_input_errors() {
        let unique = CatalogError::from(StoreError::UniqueViolation(String::from("records_key")));
        assert!(matches!(unique, CatalogError::Validation(_)));

        let fk = CatalogError::from(StoreError::ForeignKeyViolation(String::from("operator")));
        assert!(matches!(fk, CatalogError::Reference(_)));

        let backend = CatalogError::from(StoreError::Backend(String::from("down")));
        assert!(matches!(backend, CatalogError::Storage(_)));
    }

    #[test]
    fn import_failure_wraps_description() {
        let err = CatalogError::ImportFailed {
            attempt_id: ImportId(4),
            source: Box::new(CatalogError::Reference(String::from("person 9 does not exist"))),
        };
        assert_eq!(err.to_string(), "Import failed: person 9 does not exist");
    }
}
