//! Note entity: a user annotation attached to a verse range.

use crate::domain::{NoteId, Reference, SeriesId, TopicId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The kind of a note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoteKind {
    Note,
    Commentary,
    Sermon,
}

impl NoteKind {
    /// Returns the storage representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            NoteKind::Note => "note",
            NoteKind::Commentary => "commentary",
            NoteKind::Sermon => "sermon",
        }
    }
}

impl FromStr for NoteKind {
    type Err = ParseNoteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "note" => Ok(NoteKind::Note),
            "commentary" => Ok(NoteKind::Commentary),
            "sermon" => Ok(NoteKind::Sermon),
            other => Err(ParseNoteError {
                kind: ParseNoteErrorKind::UnknownKind(other.to_string()),
            }),
        }
    }
}

impl fmt::Display for NoteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ParseNoteErrorKind {
    EmptyTitle,
    SeriesOnNonSermon,
    UnknownKind(String),
}

/// Error returned when constructing an invalid note.
#[derive(Debug, Clone)]
pub struct ParseNoteError {
    kind: ParseNoteErrorKind,
}

impl fmt::Display for ParseNoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ParseNoteErrorKind::EmptyTitle => write!(f, "invalid note: title cannot be empty"),
            ParseNoteErrorKind::SeriesOnNonSermon => {
                write!(f, "invalid note: only sermons may belong to a series")
            }
            ParseNoteErrorKind::UnknownKind(s) => write!(f, "unknown note kind '{}'", s),
        }
    }
}

impl std::error::Error for ParseNoteError {}

/// A note attached to a verse range.
///
/// The content is rich-text markup stored as plain text; it may embed
/// `[[ST:Ch...]]` link tokens addressing systematic-theology entries. A
/// note has at most one primary topic (a direct field) and any number of
/// secondary topics, which live in the store's join table rather than on
/// this struct.
///
/// # Examples
///
/// ```
/// use berea::domain::{Note, NoteId, NoteKind, Reference};
/// use chrono::Utc;
///
/// let now = Utc::now();
/// let reference = Reference::parse("Romans 3:21-26").unwrap();
/// let note = Note::new(NoteId::new(), reference, "Righteousness apart from law", now, now)
///     .unwrap();
/// assert_eq!(note.kind(), NoteKind::Note);
/// ```
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    // A deserialized row may omit the id; `Default` generates a fresh one
    #[serde(default)]
    id: NoteId,
    #[serde(flatten)]
    reference: Reference,
    title: String,
    content: String,
    kind: NoteKind,
    #[serde(default)]
    primary_topic_id: Option<TopicId>,
    #[serde(default)]
    series_id: Option<SeriesId>,
    created: DateTime<Utc>,
    modified: DateTime<Utc>,
}

impl Note {
    /// Creates a new plain note with required fields only.
    ///
    /// # Errors
    ///
    /// Returns `ParseNoteError` if the title is empty or whitespace-only.
    pub fn new(
        id: NoteId,
        reference: Reference,
        title: impl Into<String>,
        created: DateTime<Utc>,
        modified: DateTime<Utc>,
    ) -> Result<Self, ParseNoteError> {
        Self::builder(id, reference, title, created, modified).build()
    }

    /// Creates a builder for constructing a note with optional fields.
    pub fn builder(
        id: NoteId,
        reference: Reference,
        title: impl Into<String>,
        created: DateTime<Utc>,
        modified: DateTime<Utc>,
    ) -> NoteBuilder {
        NoteBuilder {
            id,
            reference,
            title: title.into(),
            content: String::new(),
            kind: NoteKind::Note,
            primary_topic_id: None,
            series_id: None,
            created,
            modified,
        }
    }

    /// Returns the note's unique identifier.
    pub fn id(&self) -> NoteId {
        self.id
    }

    /// Returns the verse range this note is attached to.
    pub fn reference(&self) -> Reference {
        self.reference
    }

    /// Returns the note's title.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the note's content markup.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Returns the note's kind.
    pub fn kind(&self) -> NoteKind {
        self.kind
    }

    /// Returns the owning topic, if one is set.
    pub fn primary_topic_id(&self) -> Option<TopicId> {
        self.primary_topic_id
    }

    /// Returns the sermon series, if any.
    pub fn series_id(&self) -> Option<SeriesId> {
        self.series_id
    }

    /// Returns when the note was created.
    pub fn created(&self) -> DateTime<Utc> {
        self.created
    }

    /// Returns when the note was last modified.
    pub fn modified(&self) -> DateTime<Utc> {
        self.modified
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.title, self.reference)
    }
}

impl fmt::Debug for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Note")
            .field("id", &self.id)
            .field("reference", &self.reference)
            .field("title", &self.title)
            .field("kind", &self.kind)
            .field("primary_topic_id", &self.primary_topic_id)
            .field("series_id", &self.series_id)
            .finish()
    }
}

/// Builder for constructing a Note with optional fields.
pub struct NoteBuilder {
    id: NoteId,
    reference: Reference,
    title: String,
    content: String,
    kind: NoteKind,
    primary_topic_id: Option<TopicId>,
    series_id: Option<SeriesId>,
    created: DateTime<Utc>,
    modified: DateTime<Utc>,
}

impl NoteBuilder {
    /// Sets the content markup.
    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    /// Sets the note kind.
    pub fn kind(mut self, kind: NoteKind) -> Self {
        self.kind = kind;
        self
    }

    /// Sets the owning topic.
    pub fn primary_topic(mut self, topic_id: Option<TopicId>) -> Self {
        self.primary_topic_id = topic_id;
        self
    }

    /// Sets the sermon series.
    pub fn series(mut self, series_id: Option<SeriesId>) -> Self {
        self.series_id = series_id;
        self
    }

    /// Builds the note.
    ///
    /// # Errors
    ///
    /// Returns `ParseNoteError` if the title is empty or whitespace-only,
    /// or a series is set on a note that is not a sermon.
    pub fn build(self) -> Result<Note, ParseNoteError> {
        let title = self.title.trim().to_string();
        if title.is_empty() {
            return Err(ParseNoteError {
                kind: ParseNoteErrorKind::EmptyTitle,
            });
        }
        if self.series_id.is_some() && self.kind != NoteKind::Sermon {
            return Err(ParseNoteError {
                kind: ParseNoteErrorKind::SeriesOnNonSermon,
            });
        }
        Ok(Note {
            id: self.id,
            reference: self.reference,
            title,
            content: self.content,
            kind: self.kind,
            primary_topic_id: self.primary_topic_id,
            series_id: self.series_id,
            created: self.created,
            modified: self.modified,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn test_reference() -> Reference {
        Reference::parse("Romans 3:21-26").unwrap()
    }

    fn test_datetime() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-01-15T10:30:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn new_with_required_fields() {
        let id = NoteId::new();
        let note = Note::new(id, test_reference(), "Justification", test_datetime(), test_datetime())
            .unwrap();
        assert_eq!(note.id(), id);
        assert_eq!(note.title(), "Justification");
        assert_eq!(note.kind(), NoteKind::Note);
        assert_eq!(note.content(), "");
        assert_eq!(note.primary_topic_id(), None);
        assert_eq!(note.series_id(), None);
    }

    #[test]
    fn title_is_trimmed() {
        let note = Note::new(
            NoteId::new(),
            test_reference(),
            "  Justification  ",
            test_datetime(),
            test_datetime(),
        )
        .unwrap();
        assert_eq!(note.title(), "Justification");
    }

    #[test]
    fn title_cannot_be_empty() {
        assert!(Note::new(NoteId::new(), test_reference(), "", test_datetime(), test_datetime()).is_err());
        assert!(
            Note::new(NoteId::new(), test_reference(), "   ", test_datetime(), test_datetime()).is_err()
        );
    }

    #[test]
    fn builder_sets_optional_fields() {
        let topic_id = TopicId::new();
        let series_id = SeriesId::new();
        let note = Note::builder(
            NoteId::new(),
            test_reference(),
            "The Righteousness of God",
            test_datetime(),
            test_datetime(),
        )
        .content("See [[ST:Ch36]] on justification.")
        .kind(NoteKind::Sermon)
        .primary_topic(Some(topic_id))
        .series(Some(series_id))
        .build()
        .unwrap();

        assert_eq!(note.kind(), NoteKind::Sermon);
        assert_eq!(note.primary_topic_id(), Some(topic_id));
        assert_eq!(note.series_id(), Some(series_id));
        assert!(note.content().contains("[[ST:Ch36]]"));
    }

    #[test]
    fn series_rejected_on_non_sermon() {
        let result = Note::builder(
            NoteId::new(),
            test_reference(),
            "Commentary excerpt",
            test_datetime(),
            test_datetime(),
        )
        .kind(NoteKind::Commentary)
        .series(Some(SeriesId::new()))
        .build();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("series"));
    }

    #[test]
    fn kind_storage_roundtrip() {
        for kind in [NoteKind::Note, NoteKind::Commentary, NoteKind::Sermon] {
            assert_eq!(kind.as_str().parse::<NoteKind>().unwrap(), kind);
        }
        assert!("homily".parse::<NoteKind>().is_err());
    }

    #[test]
    fn display_shows_title_and_reference() {
        let note = Note::new(
            NoteId::new(),
            test_reference(),
            "Justification",
            test_datetime(),
            test_datetime(),
        )
        .unwrap();
        assert_eq!(format!("{}", note), "Justification (ROM 3:21-26)");
    }

    #[test]
    fn serde_roundtrip_flattens_reference() {
        let note = Note::builder(
            NoteId::new(),
            test_reference(),
            "Justification",
            test_datetime(),
            test_datetime(),
        )
        .content("body")
        .build()
        .unwrap();

        let json = serde_json::to_string(&note).unwrap();
        assert!(json.contains("\"book\":\"ROM\""));
        assert!(json.contains("\"startChapter\":3"));
        let parsed: Note = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, note);
    }
}
