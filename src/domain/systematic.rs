//! Systematic-theology entries, their reference strings, and link tokens.

use crate::domain::EntryId;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

/// Position of an entry in the fixed four-level hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    Part,
    Chapter,
    Section,
    Subsection,
}

impl EntryType {
    /// Returns the storage representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryType::Part => "part",
            EntryType::Chapter => "chapter",
            EntryType::Section => "section",
            EntryType::Subsection => "subsection",
        }
    }
}

impl FromStr for EntryType {
    type Err = ParseRefError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "part" => Ok(EntryType::Part),
            "chapter" => Ok(EntryType::Chapter),
            "section" => Ok(EntryType::Section),
            "subsection" => Ok(EntryType::Subsection),
            other => Err(ParseRefError(format!("unknown entry type '{}'", other))),
        }
    }
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

fn ref_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^ch(\d+)(?::([a-z])(?:\.(\d+))?)?$").expect("reference pattern is valid")
    })
}

fn token_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)\[\[ST:Ch(\d+)(?::([A-Za-z])(?:\.(\d+))?)?\]\]")
            .expect("token pattern is valid")
    })
}

/// The compact external address of a systematic entry: `Ch32`, `Ch32:A`,
/// or `Ch32:A.1`.
///
/// Parsing is case-insensitive and accepts any of the three granularities;
/// rendering is canonical (`Ch` prefix, uppercase section letter). The same
/// address embedded in note content as `[[ST:Ch32:A.1]]` is a link token.
///
/// # Examples
///
/// ```
/// use berea::domain::SystematicRef;
///
/// let r: SystematicRef = "ch32:a.1".parse().unwrap();
/// assert_eq!(r.to_string(), "Ch32:A.1");
/// assert_eq!(r.link_token(), "[[ST:Ch32:A.1]]");
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct SystematicRef {
    chapter: u16,
    section: Option<char>,
    subsection: Option<u16>,
}

/// Error returned when parsing an invalid reference string.
#[derive(Debug, Clone)]
pub struct ParseRefError(String);

impl fmt::Display for ParseRefError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for ParseRefError {}

impl SystematicRef {
    /// Creates a chapter-level reference.
    pub fn chapter(chapter: u16) -> Self {
        Self {
            chapter,
            section: None,
            subsection: None,
        }
    }

    /// Creates a section-level reference. The letter is uppercased.
    pub fn section(chapter: u16, letter: char) -> Self {
        Self {
            chapter,
            section: Some(letter.to_ascii_uppercase()),
            subsection: None,
        }
    }

    /// Creates a subsection-level reference. The letter is uppercased.
    pub fn subsection(chapter: u16, letter: char, number: u16) -> Self {
        Self {
            chapter,
            section: Some(letter.to_ascii_uppercase()),
            subsection: Some(number),
        }
    }

    /// Returns the chapter number.
    pub fn chapter_number(&self) -> u16 {
        self.chapter
    }

    /// Returns the section letter, if addressed below chapter level.
    pub fn section_letter(&self) -> Option<char> {
        self.section
    }

    /// Returns the subsection number, if addressed at subsection level.
    pub fn subsection_number(&self) -> Option<u16> {
        self.subsection
    }

    /// Renders the canonical link token for embedding in note content.
    ///
    /// There is exactly one canonical rendering per entry, so the token can
    /// be matched as a literal substring.
    pub fn link_token(&self) -> String {
        format!("[[ST:{}]]", self)
    }

    /// Parses a single link token (`[[ST:Ch32:A.1]]`), case-insensitively.
    ///
    /// The token must be the entire input apart from surrounding whitespace.
    pub fn from_link_token(text: &str) -> Option<SystematicRef> {
        let trimmed = text.trim();
        let caps = token_pattern().captures(trimmed)?;
        if caps.get(0)?.as_str().len() != trimmed.len() {
            return None;
        }
        Self::from_captures(&caps)
    }

    /// Finds every link token embedded in a block of note content.
    pub fn scan_tokens(content: &str) -> Vec<SystematicRef> {
        token_pattern()
            .captures_iter(content)
            .filter_map(|caps| Self::from_captures(&caps))
            .collect()
    }

    fn from_captures(caps: &regex::Captures<'_>) -> Option<SystematicRef> {
        let chapter: u16 = caps.get(1)?.as_str().parse().ok()?;
        let section = caps
            .get(2)
            .map(|m| m.as_str().chars().next().unwrap_or('a').to_ascii_uppercase());
        let subsection: Option<u16> = match caps.get(3) {
            Some(m) => Some(m.as_str().parse().ok()?),
            None => None,
        };
        Some(SystematicRef {
            chapter,
            section,
            subsection,
        })
    }
}

impl fmt::Display for SystematicRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ch{}", self.chapter)?;
        if let Some(letter) = self.section {
            write!(f, ":{}", letter)?;
            if let Some(number) = self.subsection {
                write!(f, ".{}", number)?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for SystematicRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SystematicRef(\"{}\")", self)
    }
}

impl FromStr for SystematicRef {
    type Err = ParseRefError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        let caps = ref_pattern()
            .captures(&normalized)
            .ok_or_else(|| ParseRefError(format!("invalid reference string '{}'", s)))?;

        let chapter: u16 = caps
            .get(1)
            .and_then(|m| m.as_str().parse().ok())
            .ok_or_else(|| ParseRefError(format!("invalid chapter number in '{}'", s)))?;
        let section = caps
            .get(2)
            .and_then(|m| m.as_str().chars().next())
            .map(|c| c.to_ascii_uppercase());
        let subsection: Option<u16> = match caps.get(3) {
            Some(m) => Some(
                m.as_str()
                    .parse()
                    .map_err(|_| ParseRefError(format!("invalid subsection number in '{}'", s)))?,
            ),
            None => None,
        };

        Ok(SystematicRef {
            chapter,
            section,
            subsection,
        })
    }
}

impl Serialize for SystematicRef {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for SystematicRef {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// A node in the four-level systematic-theology hierarchy.
///
/// The populated number/letter fields depend on `entry_type`: a part
/// carries only `part_number`, a chapter adds `chapter_number`, a section
/// adds `section_letter`, a subsection adds `subsection_number`. Entries at
/// chapter level and below are externally addressable by [`SystematicRef`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystematicEntry {
    pub id: EntryId,
    pub entry_type: EntryType,
    #[serde(default)]
    pub part_number: Option<u16>,
    #[serde(default)]
    pub chapter_number: Option<u16>,
    #[serde(default)]
    pub section_letter: Option<char>,
    #[serde(default)]
    pub subsection_number: Option<u16>,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub parent_id: Option<EntryId>,
    pub sort_order: i64,
}

impl SystematicEntry {
    /// Derives the entry's reference string from its position fields.
    ///
    /// Parts and entries missing a chapter number are not addressable and
    /// return `None`.
    pub fn reference(&self) -> Option<SystematicRef> {
        let chapter = self.chapter_number?;
        match self.entry_type {
            EntryType::Part => None,
            EntryType::Chapter => Some(SystematicRef::chapter(chapter)),
            EntryType::Section => Some(SystematicRef::section(chapter, self.section_letter?)),
            EntryType::Subsection => Some(SystematicRef::subsection(
                chapter,
                self.section_letter?,
                self.subsection_number?,
            )),
        }
    }

    /// Renders the entry's canonical link token, when addressable.
    pub fn link_token(&self) -> Option<String> {
        self.reference().map(|r| r.link_token())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn entry(entry_type: EntryType) -> SystematicEntry {
        SystematicEntry {
            id: "01HQ3K5M7NXJK4QZPW8V2R6T9Y".parse().unwrap(),
            entry_type,
            part_number: Some(5),
            chapter_number: Some(32),
            section_letter: Some('A'),
            subsection_number: Some(1),
            title: "Union with Christ".to_string(),
            content: String::new(),
            summary: None,
            parent_id: None,
            sort_order: 0,
        }
    }

    #[test]
    fn parses_all_three_granularities() {
        assert_eq!("Ch32".parse::<SystematicRef>().unwrap(), SystematicRef::chapter(32));
        assert_eq!(
            "Ch32:A".parse::<SystematicRef>().unwrap(),
            SystematicRef::section(32, 'A')
        );
        assert_eq!(
            "Ch32:A.1".parse::<SystematicRef>().unwrap(),
            SystematicRef::subsection(32, 'A', 1)
        );
    }

    #[test]
    fn parsing_is_case_insensitive() {
        assert_eq!(
            "ch32:a.1".parse::<SystematicRef>().unwrap(),
            SystematicRef::subsection(32, 'A', 1)
        );
        assert_eq!("CH7".parse::<SystematicRef>().unwrap(), SystematicRef::chapter(7));
    }

    #[test]
    fn rendering_is_canonical() {
        assert_eq!(SystematicRef::chapter(32).to_string(), "Ch32");
        assert_eq!(SystematicRef::section(32, 'a').to_string(), "Ch32:A");
        assert_eq!(SystematicRef::subsection(32, 'b', 3).to_string(), "Ch32:B.3");
    }

    #[test]
    fn rejects_malformed_references() {
        assert!("32".parse::<SystematicRef>().is_err());
        assert!("Ch".parse::<SystematicRef>().is_err());
        assert!("Ch32:".parse::<SystematicRef>().is_err());
        assert!("Ch32:AB".parse::<SystematicRef>().is_err());
        assert!("Ch32:A.".parse::<SystematicRef>().is_err());
        assert!("Ch32.1".parse::<SystematicRef>().is_err());
    }

    #[test]
    fn link_token_roundtrip() {
        for s in ["Ch32", "Ch32:A", "Ch32:A.1"] {
            let r: SystematicRef = s.parse().unwrap();
            let token = r.link_token();
            assert_eq!(SystematicRef::from_link_token(&token), Some(r));
        }
    }

    #[test]
    fn link_token_parse_is_case_insensitive() {
        assert_eq!(
            SystematicRef::from_link_token("[[st:ch32:a.1]]"),
            Some(SystematicRef::subsection(32, 'A', 1))
        );
    }

    #[test]
    fn from_link_token_rejects_embedded_text() {
        assert!(SystematicRef::from_link_token("see [[ST:Ch32]] here").is_none());
        assert!(SystematicRef::from_link_token("[[ST:Ch32]").is_none());
    }

    #[test]
    fn scan_tokens_finds_all_embedded_tokens() {
        let content = "Justification [[ST:Ch36]] flows into adoption \
                       [[ST:Ch37:A]] and union [[st:ch43:a.2]].";
        let found = SystematicRef::scan_tokens(content);
        assert_eq!(
            found,
            vec![
                SystematicRef::chapter(36),
                SystematicRef::section(37, 'A'),
                SystematicRef::subsection(43, 'A', 2),
            ]
        );
    }

    #[test]
    fn entry_reference_depends_on_type() {
        assert_eq!(entry(EntryType::Part).reference(), None);
        assert_eq!(
            entry(EntryType::Chapter).reference(),
            Some(SystematicRef::chapter(32))
        );
        assert_eq!(
            entry(EntryType::Section).reference(),
            Some(SystematicRef::section(32, 'A'))
        );
        assert_eq!(
            entry(EntryType::Subsection).reference(),
            Some(SystematicRef::subsection(32, 'A', 1))
        );
    }

    #[test]
    fn entry_link_token_matches_reference() {
        assert_eq!(
            entry(EntryType::Section).link_token().unwrap(),
            "[[ST:Ch32:A]]"
        );
    }

    #[test]
    fn entry_type_storage_roundtrip() {
        for t in [
            EntryType::Part,
            EntryType::Chapter,
            EntryType::Section,
            EntryType::Subsection,
        ] {
            assert_eq!(t.as_str().parse::<EntryType>().unwrap(), t);
        }
    }
}
