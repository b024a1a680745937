//! Dotted/lettered numbering embedded at the start of catalog labels.
//!
//! Labels look like `"5.1.a Membimbing tugas akhir"`; the leading token
//! (`5.1.a`) places the activity in the catalog hierarchy. Only used to
//! derive parent edges when an entry carries no usable `parent_id`.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

/// Digits separated by dots, optionally followed by one letter (with or
/// without a separating dot), ending at a word boundary.
const NUMBERING_PATTERN: &str = r"^\s*(\d+(?:\.\d+)*)(?:\.?([A-Za-z]))?\b";

static NUMBERING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(NUMBERING_PATTERN).expect("valid regex"));

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NumberingToken {
    segments: Vec<u32>,
    letter: Option<char>,
}

impl NumberingToken {
    /// Parse the leading token of a label. Returns `None` when the label
    /// does not start with a number.
    pub fn parse(label: &str) -> Option<Self> {
        let caps = NUMBERING_RE.captures(label)?;
        let segments = caps
            .get(1)?
            .as_str()
            .split('.')
            .map(|s| s.parse::<u32>().ok())
            .collect::<Option<Vec<_>>>()?;
        let letter = caps
            .get(2)
            .and_then(|m| m.as_str().chars().next())
            .map(|c| c.to_ascii_lowercase());
        Some(Self { segments, letter })
    }

    pub fn segments(&self) -> &[u32] {
        &self.segments
    }

    pub fn letter(&self) -> Option<char> {
        self.letter
    }

    /// A single number with no dot and no letter, e.g. `"7"`.
    pub fn is_top_level(&self) -> bool {
        self.segments.len() == 1 && self.letter.is_none()
    }

    /// The proper prefix one level up: `5.1.a -> 5.1`, `5.1 -> 5`,
    /// `5 -> None`.
    pub fn parent(&self) -> Option<Self> {
        if self.letter.is_some() {
            return Some(Self {
                segments: self.segments.clone(),
                letter: None,
            });
        }
        if self.segments.len() > 1 {
            return Some(Self {
                segments: self.segments[..self.segments.len() - 1].to_vec(),
                letter: None,
            });
        }
        None
    }
}

impl fmt::Display for NumberingToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = self
            .segments
            .iter()
            .map(u32::to_string)
            .collect::<Vec<_>>()
            .join(".");
        f.write_str(&joined)?;
        if let Some(letter) = self.letter {
            write!(f, ".{letter}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(label: &str) -> NumberingToken {
        NumberingToken::parse(label).unwrap_or_else(|| panic!("no token in {label:?}"))
    }

    #[test]
    fn parses_plain_and_dotted() {
        assert_eq!(token("12 Pendidikan").segments(), &[12]);
        assert_eq!(token("12.3 Mengajar").segments(), &[12, 3]);
        assert_eq!(token("  1.1.2. Kuliah").segments(), &[1, 1, 2]);
    }

    #[test]
    fn parses_trailing_letter() {
        let t = token("12.3.a Membimbing");
        assert_eq!(t.segments(), &[12, 3]);
        assert_eq!(t.letter(), Some('a'));
        assert_eq!(token("4.2B Seminar").letter(), Some('b'));
    }

    #[test]
    fn letter_must_end_the_token() {
        // "ab" is a word, not a numbering letter.
        let t = token("3.1.ab");
        assert_eq!(t.segments(), &[3, 1]);
        assert_eq!(t.letter(), None);
    }

    #[test]
    fn rejects_labels_without_leading_number() {
        assert!(NumberingToken::parse("a. Pengajaran").is_none());
        assert!(NumberingToken::parse("Pendidikan").is_none());
        assert!(NumberingToken::parse("").is_none());
    }

    #[test]
    fn top_level_detection() {
        assert!(token("7 Penunjang").is_top_level());
        assert!(token("7. Penunjang").is_top_level());
        assert!(!token("7.1").is_top_level());
        assert!(!token("7a").is_top_level());
    }

    #[test]
    fn parent_chain() {
        let t = token("5.1.a");
        let p = t.parent().unwrap();
        assert_eq!(p.to_string(), "5.1");
        let pp = p.parent().unwrap();
        assert_eq!(pp.to_string(), "5");
        assert!(pp.parent().is_none());
    }

    #[test]
    fn display_round_trip() {
        assert_eq!(token("10.2.c Lain").to_string(), "10.2.c");
        assert_eq!(token("3 Lain").to_string(), "3");
    }
}
