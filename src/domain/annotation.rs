//! Annotations anchored to offsets inside systematic entry content.

use crate::domain::{AnnotationId, EntryId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The kind of an annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnotationKind {
    Highlight,
    Note,
}

impl AnnotationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnnotationKind::Highlight => "highlight",
            AnnotationKind::Note => "note",
        }
    }
}

impl FromStr for AnnotationKind {
    type Err = ParseAnnotationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "highlight" => Ok(AnnotationKind::Highlight),
            "note" => Ok(AnnotationKind::Note),
            other => Err(ParseAnnotationError(format!(
                "unknown annotation kind '{}'",
                other
            ))),
        }
    }
}

/// Error returned when constructing an invalid annotation.
#[derive(Debug, Clone)]
pub struct ParseAnnotationError(String);

impl fmt::Display for ParseAnnotationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for ParseAnnotationError {}

/// A highlight or free note anchored to a text offset range inside a
/// systematic entry's content. Its lifecycle is independent of the entry
/// it annotates; the entry may not even exist after a partial import.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Annotation {
    #[serde(default)]
    pub id: AnnotationId,
    pub systematic_id: EntryId,
    pub kind: AnnotationKind,
    pub start_offset: u32,
    pub end_offset: u32,
    #[serde(default)]
    pub content: Option<String>,
    pub created: DateTime<Utc>,
}

impl Annotation {
    /// Creates an annotation, validating the offset range.
    pub fn new(
        id: AnnotationId,
        systematic_id: EntryId,
        kind: AnnotationKind,
        start_offset: u32,
        end_offset: u32,
        created: DateTime<Utc>,
    ) -> Result<Self, ParseAnnotationError> {
        if end_offset < start_offset {
            return Err(ParseAnnotationError(format!(
                "end offset {} precedes start offset {}",
                end_offset, start_offset
            )));
        }
        Ok(Self {
            id,
            systematic_id,
            kind,
            start_offset,
            end_offset,
            content: None,
            created,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-01-15T10:30:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn new_validates_offsets() {
        let entry: EntryId = "01HQ3K5M7NXJK4QZPW8V2R6T9Y".parse().unwrap();
        assert!(
            Annotation::new(AnnotationId::new(), entry, AnnotationKind::Highlight, 10, 40, now())
                .is_ok()
        );
        assert!(
            Annotation::new(AnnotationId::new(), entry, AnnotationKind::Highlight, 40, 10, now())
                .is_err()
        );
    }

    #[test]
    fn zero_width_annotation_is_allowed() {
        let entry: EntryId = "01HQ3K5M7NXJK4QZPW8V2R6T9Y".parse().unwrap();
        assert!(
            Annotation::new(AnnotationId::new(), entry, AnnotationKind::Note, 5, 5, now()).is_ok()
        );
    }

    #[test]
    fn kind_storage_roundtrip() {
        for kind in [AnnotationKind::Highlight, AnnotationKind::Note] {
            assert_eq!(kind.as_str().parse::<AnnotationKind>().unwrap(), kind);
        }
    }
}
