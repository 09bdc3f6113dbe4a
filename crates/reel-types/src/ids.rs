//! Type-safe identifier wrappers around store-assigned integers.
//!
//! Every catalog entity has a strongly-typed ID so a person identifier can
//! never be passed where a record identifier is expected. Identities are
//! assigned by the backing store (`BIGINT GENERATED ALWAYS AS IDENTITY` in
//! `PostgreSQL`, a shared sequence in the in-memory store) and are never
//! generated by callers.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Generates a newtype wrapper around `i64` with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
        #[serde(transparent)]
        #[ts(export, export_to = "bindings/")]
        pub struct $name(pub i64);

        impl $name {
            /// Return the inner integer value.
            pub const fn into_inner(self) -> i64 {
                self.0
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id! {
    /// Unique identifier for a catalog record (the movie entity).
    RecordId
}

define_id! {
    /// Unique identifier for a person referenced by records.
    PersonId
}

define_id! {
    /// Unique identifier for an audited import attempt.
    ImportId
}
