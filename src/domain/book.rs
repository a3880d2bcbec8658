//! Canonical Bible book codes and the static alias table used to resolve them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One row of the alias table: canonical code, display name, and the
/// lowercase alias spellings (whitespace removed) that resolve to it.
struct BookEntry {
    code: &'static str,
    name: &'static str,
    aliases: &'static [&'static str],
}

/// Static book table covering all 66 books.
///
/// Aliases are stored lowercase with whitespace stripped, so
/// "1 Corinthians", "1corinthians", "1cor", and "1co" all land on `1CO`.
static BOOKS: &[BookEntry] = &[
    BookEntry { code: "GEN", name: "Genesis", aliases: &["genesis", "gen", "ge", "gn"] },
    BookEntry { code: "EXO", name: "Exodus", aliases: &["exodus", "exo", "exod", "ex"] },
    BookEntry { code: "LEV", name: "Leviticus", aliases: &["leviticus", "lev", "le", "lv"] },
    BookEntry { code: "NUM", name: "Numbers", aliases: &["numbers", "num", "nu", "nm"] },
    BookEntry { code: "DEU", name: "Deuteronomy", aliases: &["deuteronomy", "deut", "deu", "dt"] },
    BookEntry { code: "JOS", name: "Joshua", aliases: &["joshua", "josh", "jos"] },
    BookEntry { code: "JDG", name: "Judges", aliases: &["judges", "judg", "jdg", "jg"] },
    BookEntry { code: "RUT", name: "Ruth", aliases: &["ruth", "rut", "ru"] },
    BookEntry { code: "1SA", name: "1 Samuel", aliases: &["1samuel", "1sam", "1sa", "isamuel"] },
    BookEntry { code: "2SA", name: "2 Samuel", aliases: &["2samuel", "2sam", "2sa", "iisamuel"] },
    BookEntry { code: "1KI", name: "1 Kings", aliases: &["1kings", "1kgs", "1ki", "ikings"] },
    BookEntry { code: "2KI", name: "2 Kings", aliases: &["2kings", "2kgs", "2ki", "iikings"] },
    BookEntry { code: "1CH", name: "1 Chronicles", aliases: &["1chronicles", "1chron", "1chr", "1ch"] },
    BookEntry { code: "2CH", name: "2 Chronicles", aliases: &["2chronicles", "2chron", "2chr", "2ch"] },
    BookEntry { code: "EZR", name: "Ezra", aliases: &["ezra", "ezr"] },
    BookEntry { code: "NEH", name: "Nehemiah", aliases: &["nehemiah", "neh", "ne"] },
    BookEntry { code: "EST", name: "Esther", aliases: &["esther", "esth", "est"] },
    BookEntry { code: "JOB", name: "Job", aliases: &["job", "jb"] },
    BookEntry { code: "PSA", name: "Psalms", aliases: &["psalms", "psalm", "psa", "pss", "ps"] },
    BookEntry { code: "PRO", name: "Proverbs", aliases: &["proverbs", "prov", "pro", "pr"] },
    BookEntry { code: "ECC", name: "Ecclesiastes", aliases: &["ecclesiastes", "eccl", "ecc", "ec"] },
    BookEntry { code: "SNG", name: "Song of Solomon", aliases: &["songofsolomon", "songofsongs", "song", "sng", "sos"] },
    BookEntry { code: "ISA", name: "Isaiah", aliases: &["isaiah", "isa", "is"] },
    BookEntry { code: "JER", name: "Jeremiah", aliases: &["jeremiah", "jer", "je"] },
    BookEntry { code: "LAM", name: "Lamentations", aliases: &["lamentations", "lam", "la"] },
    BookEntry { code: "EZK", name: "Ezekiel", aliases: &["ezekiel", "ezek", "ezk", "eze"] },
    BookEntry { code: "DAN", name: "Daniel", aliases: &["daniel", "dan", "da", "dn"] },
    BookEntry { code: "HOS", name: "Hosea", aliases: &["hosea", "hos", "ho"] },
    BookEntry { code: "JOL", name: "Joel", aliases: &["joel", "jol", "jl"] },
    BookEntry { code: "AMO", name: "Amos", aliases: &["amos", "amo", "am"] },
    BookEntry { code: "OBA", name: "Obadiah", aliases: &["obadiah", "obad", "oba", "ob"] },
    BookEntry { code: "JON", name: "Jonah", aliases: &["jonah", "jon"] },
    BookEntry { code: "MIC", name: "Micah", aliases: &["micah", "mic", "mi"] },
    BookEntry { code: "NAM", name: "Nahum", aliases: &["nahum", "nah", "nam", "na"] },
    BookEntry { code: "HAB", name: "Habakkuk", aliases: &["habakkuk", "hab", "hb"] },
    BookEntry { code: "ZEP", name: "Zephaniah", aliases: &["zephaniah", "zeph", "zep", "zp"] },
    BookEntry { code: "HAG", name: "Haggai", aliases: &["haggai", "hag", "hg"] },
    BookEntry { code: "ZEC", name: "Zechariah", aliases: &["zechariah", "zech", "zec", "zc"] },
    BookEntry { code: "MAL", name: "Malachi", aliases: &["malachi", "mal", "ml"] },
    BookEntry { code: "MAT", name: "Matthew", aliases: &["matthew", "matt", "mat", "mt"] },
    BookEntry { code: "MRK", name: "Mark", aliases: &["mark", "mrk", "mk"] },
    BookEntry { code: "LUK", name: "Luke", aliases: &["luke", "luk", "lk"] },
    BookEntry { code: "JHN", name: "John", aliases: &["john", "jhn", "jn"] },
    BookEntry { code: "ACT", name: "Acts", aliases: &["acts", "act", "ac"] },
    BookEntry { code: "ROM", name: "Romans", aliases: &["romans", "rom", "ro", "rm"] },
    BookEntry { code: "1CO", name: "1 Corinthians", aliases: &["1corinthians", "1cor", "1co", "icorinthians"] },
    BookEntry { code: "2CO", name: "2 Corinthians", aliases: &["2corinthians", "2cor", "2co", "iicorinthians"] },
    BookEntry { code: "GAL", name: "Galatians", aliases: &["galatians", "gal", "ga"] },
    BookEntry { code: "EPH", name: "Ephesians", aliases: &["ephesians", "eph"] },
    BookEntry { code: "PHP", name: "Philippians", aliases: &["philippians", "phil", "php"] },
    BookEntry { code: "COL", name: "Colossians", aliases: &["colossians", "col"] },
    BookEntry { code: "1TH", name: "1 Thessalonians", aliases: &["1thessalonians", "1thess", "1thes", "1th"] },
    BookEntry { code: "2TH", name: "2 Thessalonians", aliases: &["2thessalonians", "2thess", "2thes", "2th"] },
    BookEntry { code: "1TI", name: "1 Timothy", aliases: &["1timothy", "1tim", "1ti"] },
    BookEntry { code: "2TI", name: "2 Timothy", aliases: &["2timothy", "2tim", "2ti"] },
    BookEntry { code: "TIT", name: "Titus", aliases: &["titus", "tit", "ti"] },
    BookEntry { code: "PHM", name: "Philemon", aliases: &["philemon", "phlm", "phm"] },
    BookEntry { code: "HEB", name: "Hebrews", aliases: &["hebrews", "heb"] },
    BookEntry { code: "JAS", name: "James", aliases: &["james", "jas", "jm"] },
    BookEntry { code: "1PE", name: "1 Peter", aliases: &["1peter", "1pet", "1pe", "1pt"] },
    BookEntry { code: "2PE", name: "2 Peter", aliases: &["2peter", "2pet", "2pe", "2pt"] },
    BookEntry { code: "1JN", name: "1 John", aliases: &["1john", "1jn", "1jo"] },
    BookEntry { code: "2JN", name: "2 John", aliases: &["2john", "2jn", "2jo"] },
    BookEntry { code: "3JN", name: "3 John", aliases: &["3john", "3jn", "3jo"] },
    BookEntry { code: "JUD", name: "Jude", aliases: &["jude", "jud"] },
    BookEntry { code: "REV", name: "Revelation", aliases: &["revelation", "rev", "re"] },
];

/// A canonical 3-letter Bible book code (`GEN`, `ROM`, `1CO`, ...).
///
/// Constructed either from a canonical code (as stored in the database) or
/// from a free-text alias via [`Book::from_alias`]. Unknown spellings are
/// `None`, never an error or a guess.
///
/// # Examples
///
/// ```
/// use berea::domain::Book;
///
/// let book = Book::from_alias("1 Corinthians").unwrap();
/// assert_eq!(book.code(), "1CO");
/// assert_eq!(book.name(), "1 Corinthians");
/// ```
#[derive(Clone, Copy)]
pub struct Book {
    entry: &'static BookEntry,
}

impl PartialEq for Book {
    fn eq(&self, other: &Self) -> bool {
        self.entry.code == other.entry.code
    }
}

impl Eq for Book {}

impl std::hash::Hash for Book {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.entry.code.hash(state);
    }
}

impl Book {
    /// Resolves a free-text book name through the alias table.
    ///
    /// Matching is case-insensitive and ignores internal whitespace, so
    /// "1 corinthians", "1Cor", and "1co" all resolve to the same book.
    pub fn from_alias(text: &str) -> Option<Book> {
        let key: String = text
            .chars()
            .filter(|c| !c.is_whitespace())
            .flat_map(|c| c.to_lowercase())
            .collect();
        if key.is_empty() {
            return None;
        }
        BOOKS
            .iter()
            .find(|entry| entry.aliases.contains(&key.as_str()))
            .map(|entry| Book { entry })
    }

    /// Looks up a book by its canonical 3-letter code (case-insensitive).
    pub fn from_code(code: &str) -> Option<Book> {
        BOOKS
            .iter()
            .find(|entry| entry.code.eq_ignore_ascii_case(code))
            .map(|entry| Book { entry })
    }

    /// Returns the canonical 3-letter code.
    pub fn code(&self) -> &'static str {
        self.entry.code
    }

    /// Returns the display name.
    pub fn name(&self) -> &'static str {
        self.entry.name
    }
}

/// Error returned when a string is not a recognized book code.
#[derive(Debug, Clone)]
pub struct ParseBookError(String);

impl fmt::Display for ParseBookError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unrecognized book code '{}'", self.0)
    }
}

impl std::error::Error for ParseBookError {}

impl FromStr for Book {
    type Err = ParseBookError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Book::from_code(s).ok_or_else(|| ParseBookError(s.to_string()))
    }
}

impl fmt::Display for Book {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.entry.code)
    }
}

impl fmt::Debug for Book {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Book(\"{}\")", self.entry.code)
    }
}

impl Serialize for Book {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.entry.code)
    }
}

impl<'de> Deserialize<'de> for Book {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn from_alias_full_name() {
        assert_eq!(Book::from_alias("Romans").unwrap().code(), "ROM");
        assert_eq!(Book::from_alias("Genesis").unwrap().code(), "GEN");
    }

    #[test]
    fn from_alias_abbreviations() {
        assert_eq!(Book::from_alias("rom").unwrap().code(), "ROM");
        assert_eq!(Book::from_alias("Gen").unwrap().code(), "GEN");
        assert_eq!(Book::from_alias("ps").unwrap().code(), "PSA");
    }

    #[test]
    fn from_alias_numbered_books() {
        assert_eq!(Book::from_alias("1 Corinthians").unwrap().code(), "1CO");
        assert_eq!(Book::from_alias("1corinthians").unwrap().code(), "1CO");
        assert_eq!(Book::from_alias("1cor").unwrap().code(), "1CO");
        assert_eq!(Book::from_alias("1co").unwrap().code(), "1CO");
        assert_eq!(Book::from_alias("2 Timothy").unwrap().code(), "2TI");
    }

    #[test]
    fn from_alias_is_case_insensitive() {
        assert_eq!(Book::from_alias("ROMANS").unwrap().code(), "ROM");
        assert_eq!(Book::from_alias("SoNg Of SoLoMoN").unwrap().code(), "SNG");
    }

    #[test]
    fn from_alias_unknown_returns_none() {
        assert!(Book::from_alias("Not A Book").is_none());
        assert!(Book::from_alias("").is_none());
        assert!(Book::from_alias("   ").is_none());
    }

    #[test]
    fn from_code_roundtrip() {
        for code in ["GEN", "PSA", "1CO", "3JN", "REV"] {
            let book = Book::from_code(code).unwrap();
            assert_eq!(book.code(), code);
        }
    }

    #[test]
    fn from_code_is_case_insensitive() {
        assert_eq!(Book::from_code("rom").unwrap().code(), "ROM");
    }

    #[test]
    fn fromstr_rejects_aliases() {
        // FromStr is for stored codes only, not free-text aliases
        assert!("romans".parse::<Book>().is_err());
        assert!("ROM".parse::<Book>().is_ok());
    }

    #[test]
    fn alias_table_covers_66_books() {
        assert_eq!(BOOKS.len(), 66);
    }

    #[test]
    fn codes_are_unique() {
        let mut codes: Vec<&str> = BOOKS.iter().map(|b| b.code).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), 66);
    }

    #[test]
    fn aliases_are_unique_across_books() {
        let mut aliases: Vec<&str> = BOOKS.iter().flat_map(|b| b.aliases.iter().copied()).collect();
        let total = aliases.len();
        aliases.sort_unstable();
        aliases.dedup();
        assert_eq!(aliases.len(), total, "alias table contains duplicates");
    }

    #[test]
    fn serde_serializes_as_code() {
        let book = Book::from_alias("Romans").unwrap();
        let json = serde_json::to_string(&book).unwrap();
        assert_eq!(json, "\"ROM\"");
        let parsed: Book = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, book);
    }
}
