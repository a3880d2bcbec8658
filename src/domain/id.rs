//! ULID-based identifiers, one newtype per entity kind.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ulid::Ulid;

/// Error returned when parsing an invalid ULID string.
#[derive(Debug, Clone)]
pub struct ParseIdError {
    value: String,
    reason: String,
}

impl ParseIdError {
    /// Returns the invalid value that caused this error.
    pub fn invalid_value(&self) -> &str {
        &self.value
    }
}

impl fmt::Display for ParseIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid id '{}': {}", self.value, self.reason)
    }
}

impl std::error::Error for ParseIdError {}

/// Defines a ULID-backed identifier type.
///
/// Each entity kind gets its own type so a `TopicId` can never be handed to
/// an operation expecting a `NoteId`. IDs are 26-character Crockford Base32
/// strings, lexicographically sortable in creation order.
macro_rules! entity_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(Ulid);

        impl $name {
            /// Creates a new id with the current timestamp.
            pub fn new() -> Self {
                Self(Ulid::new())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "(\"{}\")"), self.0)
            }
        }

        impl FromStr for $name {
            type Err = ParseIdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ulid::from_string(s).map(Self).map_err(|e| ParseIdError {
                    value: s.to_string(),
                    reason: e.to_string(),
                })
            }
        }

        impl Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                serializer.serialize_str(&self.0.to_string())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let s = String::deserialize(deserializer)?;
                s.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

entity_id! {
    /// Identifier for a [`crate::domain::Note`].
    NoteId
}

entity_id! {
    /// Identifier for a [`crate::domain::Topic`].
    TopicId
}

entity_id! {
    /// Identifier for a [`crate::domain::SystematicEntry`].
    EntryId
}

entity_id! {
    /// Identifier for a [`crate::domain::Series`].
    SeriesId
}

entity_id! {
    /// Identifier for a [`crate::domain::Annotation`].
    AnnotationId
}

entity_id! {
    /// Identifier for a [`crate::domain::TagType`].
    TagTypeId
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn roundtrips_through_string() {
        let id = NoteId::new();
        let parsed: NoteId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn parses_known_ulid() {
        let id: TopicId = "01HQ3K5M7NXJK4QZPW8V2R6T9Y".parse().unwrap();
        assert_eq!(id.to_string(), "01HQ3K5M7NXJK4QZPW8V2R6T9Y");
    }

    #[test]
    fn rejects_invalid_ulid() {
        let err = "not-a-ulid".parse::<NoteId>().unwrap_err();
        assert_eq!(err.invalid_value(), "not-a-ulid");
    }

    #[test]
    fn rejects_wrong_length() {
        assert!("01HQ3K5M7N".parse::<SeriesId>().is_err());
    }

    #[test]
    fn debug_names_the_type() {
        let id: EntryId = "01HQ3K5M7NXJK4QZPW8V2R6T9Y".parse().unwrap();
        assert_eq!(format!("{:?}", id), "EntryId(\"01HQ3K5M7NXJK4QZPW8V2R6T9Y\")");
    }

    #[test]
    fn serde_roundtrip() {
        let id = AnnotationId::new();
        let json = serde_json::to_string(&id).unwrap();
        let parsed: AnnotationId = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn ids_sort_in_creation_order() {
        let a: NoteId = "01HQ3K5M7NXJK4QZPW8V2R6T9Y".parse().unwrap();
        let b: NoteId = "01HQ4A2R9PXJK4QZPW8V2R6T9Y".parse().unwrap();
        assert!(a < b);
    }
}
