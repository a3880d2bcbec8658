//! Structured verse references and the free-text reference parser.

use crate::domain::Book;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

/// One pattern recognizes every accepted shape:
/// `book c`, `book c:v`, `book c:v-v2`, and the cross-chapter
/// `book c:v-c2:v2`. The book segment is resolved separately through the
/// alias table.
fn reference_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(.+?)\s+(\d{1,3})(?::(\d{1,3})(?:\s*-\s*(?:(\d{1,3}):)?(\d{1,3}))?)?$")
            .expect("reference pattern is valid")
    })
}

/// A structured verse range: book, start chapter/verse, end chapter/verse.
///
/// Verse numbers are optional; `None` means the reference is chapter-level
/// ("1 Corinthians 13"). The range invariants hold by construction:
/// `start_chapter <= end_chapter`, and within a single chapter
/// `start_verse <= end_verse` when both are present.
///
/// # Examples
///
/// ```
/// use berea::domain::Reference;
///
/// let r = Reference::parse("Romans 3:21-26").unwrap();
/// assert_eq!(r.book().code(), "ROM");
/// assert_eq!(r.start_chapter(), 3);
/// assert_eq!(r.start_verse(), Some(21));
/// assert_eq!(r.end_verse(), Some(26));
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reference {
    book: Book,
    start_chapter: u16,
    start_verse: Option<u16>,
    end_chapter: u16,
    end_verse: Option<u16>,
}

/// Error returned when constructing a reference that violates range order.
#[derive(Debug, Clone)]
pub struct InvalidRangeError(String);

impl fmt::Display for InvalidRangeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for InvalidRangeError {}

impl Reference {
    /// Creates a reference, validating the range invariants.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRangeError` if `end_chapter < start_chapter`, or the
    /// chapters are equal and `end_verse < start_verse` with both present.
    pub fn new(
        book: Book,
        start_chapter: u16,
        start_verse: Option<u16>,
        end_chapter: u16,
        end_verse: Option<u16>,
    ) -> Result<Self, InvalidRangeError> {
        if end_chapter < start_chapter {
            return Err(InvalidRangeError(format!(
                "end chapter {} precedes start chapter {}",
                end_chapter, start_chapter
            )));
        }
        if start_chapter == end_chapter
            && let (Some(sv), Some(ev)) = (start_verse, end_verse)
            && ev < sv
        {
            return Err(InvalidRangeError(format!(
                "end verse {} precedes start verse {}",
                ev, sv
            )));
        }
        Ok(Self {
            book,
            start_chapter,
            start_verse,
            end_chapter,
            end_verse,
        })
    }

    /// Creates a chapter-level reference (no verse bounds).
    pub fn chapter(book: Book, chapter: u16) -> Self {
        Self {
            book,
            start_chapter: chapter,
            start_verse: None,
            end_chapter: chapter,
            end_verse: None,
        }
    }

    /// Parses a human-readable reference like "Romans 3:21-26".
    ///
    /// Input is lower-cased and whitespace-trimmed before matching. Returns
    /// `None` when the overall shape does not match or the book alias is
    /// unrecognized. Never panics, never guesses.
    ///
    /// Shapes and their expansion:
    /// - `book c`: both verses `None`
    /// - `book c:v`: `end_verse = start_verse`
    /// - `book c:v-v2`: end chapter implied equal to start
    /// - `book c:v-c2:v2`: explicit cross-chapter end
    pub fn parse(text: &str) -> Option<Reference> {
        let normalized = text.trim().to_lowercase();
        let caps = reference_pattern().captures(&normalized)?;

        let book = Book::from_alias(caps.get(1)?.as_str())?;
        let start_chapter: u16 = caps.get(2)?.as_str().parse().ok()?;
        let start_verse: Option<u16> = match caps.get(3) {
            Some(m) => Some(m.as_str().parse().ok()?),
            None => None,
        };
        let end_chapter: u16 = match caps.get(4) {
            Some(m) => m.as_str().parse().ok()?,
            None => start_chapter,
        };
        let end_verse: Option<u16> = match caps.get(5) {
            Some(m) => Some(m.as_str().parse().ok()?),
            None => start_verse,
        };

        Reference::new(book, start_chapter, start_verse, end_chapter, end_verse).ok()
    }

    /// Returns the book.
    pub fn book(&self) -> Book {
        self.book
    }

    /// Returns the start chapter.
    pub fn start_chapter(&self) -> u16 {
        self.start_chapter
    }

    /// Returns the start verse, or `None` for a chapter-level reference.
    pub fn start_verse(&self) -> Option<u16> {
        self.start_verse
    }

    /// Returns the end chapter.
    pub fn end_chapter(&self) -> u16 {
        self.end_chapter
    }

    /// Returns the end verse, or `None` for a chapter-level reference.
    pub fn end_verse(&self) -> Option<u16> {
        self.end_verse
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.book.code(), self.start_chapter)?;
        let Some(sv) = self.start_verse else {
            return Ok(());
        };
        write!(f, ":{}", sv)?;
        match (self.end_chapter == self.start_chapter, self.end_verse) {
            (true, Some(ev)) if ev != sv => write!(f, "-{}", ev),
            (false, Some(ev)) => write!(f, "-{}:{}", self.end_chapter, ev),
            _ => Ok(()),
        }
    }
}

impl fmt::Debug for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Reference(\"{}\")", self)
    }
}

impl FromStr for Reference {
    type Err = InvalidRangeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Reference::parse(s).ok_or_else(|| InvalidRangeError(format!("could not parse '{}'", s)))
    }
}
