//! Enumeration types for the Reel catalog.
//!
//! Every enum has a single canonical text form (`as_str`) which is used
//! both on the wire (JSON and XML) and in the database, where the values are
//! stored as `TEXT` guarded by `CHECK` constraints. Substring filters in the
//! query composer match against this text form.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Returned when text does not name any variant of a catalog enum.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} value: {value:?}")]
pub struct UnknownVariant {
    /// Name of the enum that was being parsed.
    pub kind: &'static str,
    /// The rejected input.
    pub value: String,
}

/// Generates a text-backed enum with serde renames, `as_str`, `Display`,
/// and `FromStr`.
macro_rules! text_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $(
                $(#[$vmeta:meta])*
                $variant:ident => $text:tt,
            )+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
        #[ts(export, export_to = "bindings/")]
        pub enum $name {
            $(
                $(#[$vmeta])*
                #[serde(rename = $text)]
                $variant,
            )+
        }

        impl $name {
            /// Every variant, in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// Canonical text form used on the wire and in the database.
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $text,)+
                }
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl core::str::FromStr for $name {
            type Err = UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    _ => Err(UnknownVariant {
                        kind: stringify!($name),
                        value: s.to_owned(),
                    }),
                }
            }
        }
    };
}

text_enum! {
    /// Hair or eye color of a person.
    Color {
        /// Green.
        Green => "GREEN",
        /// Red.
        Red => "RED",
        /// Black.
        Black => "BLACK",
        /// Yellow.
        Yellow => "YELLOW",
        /// Orange.
        Orange => "ORANGE",
    }
}

text_enum! {
    /// Nationality of a person.
    Country {
        /// China.
        China => "CHINA",
        /// Vatican City.
        Vatican => "VATICAN",
        /// North Korea.
        NorthKorea => "NORTH_KOREA",
    }
}

text_enum! {
    /// MPAA category rating of a record.
    MpaaRating {
        /// General audiences.
        G => "G",
        /// Parental guidance suggested.
        Pg => "PG",
        /// Parents strongly cautioned.
        Pg13 => "PG_13",
        /// Adults only.
        Nc17 => "NC_17",
    }
}

text_enum! {
    /// Genre of a record.
    ///
    /// Threshold analytics ("genre above/below") compare the text form, not
    /// the declaration order.
    Genre {
        /// Action.
        Action => "ACTION",
        /// Western.
        Western => "WESTERN",
        /// Adventure.
        Adventure => "ADVENTURE",
        /// Thriller.
        Thriller => "THRILLER",
        /// Horror.
        Horror => "HORROR",
    }
}

text_enum! {
    /// Lifecycle status of an import attempt.
    ///
    /// An attempt starts as `InProgress` and moves exactly once to one of
    /// the two terminal states.
    ImportStatus {
        /// The import call is running.
        InProgress => "IN_PROGRESS",
        /// Every descriptor was committed.
        Success => "SUCCESS",
        /// The batch was rolled back.
        Failed => "FAILED",
    }
}

impl ImportStatus {
    /// Whether the status is final.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Success | Self::Failed)
    }
}

text_enum! {
    /// Kind of change announced to notification subscribers.
    ChangeKind {
        /// A record was created (by CRUD or by import).
        RecordCreated => "record-created",
        /// A record was updated.
        RecordUpdated => "record-updated",
        /// A record was deleted.
        RecordDeleted => "record-deleted",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_form_roundtrips_for_every_variant() {
        for rating in MpaaRating::ALL {
            assert_eq!(rating.as_str().parse::<MpaaRating>().ok(), Some(*rating));
        }
        for genre in Genre::ALL {
            assert_eq!(genre.to_string().parse::<Genre>().ok(), Some(*genre));
        }
    }

    #[test]
    fn serde_uses_text_form() {
        let json = serde_json::to_string(&MpaaRating::Pg13).ok();
        assert_eq!(json.as_deref(), Some("\"PG_13\""));

        let country: Result<Country, _> = serde_json::from_str("\"NORTH_KOREA\"");
        assert_eq!(country.ok(), Some(Country::NorthKorea));
    }

    #[test]
    fn unknown_text_is_rejected() {
        let err = "PURPLE".parse::<Color>().err();
        assert_eq!(
            err.map(|e| e.to_string()),
            Some(String::from("unknown Color value: \"PURPLE\""))
        );
    }

    #[test]
    fn only_success_and_failed_are_terminal() {
        assert!(!ImportStatus::InProgress.is_terminal());
        assert!(ImportStatus::Success.is_terminal());
        assert!(ImportStatus::Failed.is_terminal());
    }
}
