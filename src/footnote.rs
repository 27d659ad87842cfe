//! Footnote extraction from delimited verse text.
//!
//! Verse text carries each footnote inline between a pair of delimiters
//! (`{` and `}` by default). Splitting replaces every span with a lettered
//! anchor and returns the spans as a separate list:
//!
//! ```
//! use lectio::footnote::{FootnoteConfig, FootnoteSplitter};
//!
//! let splitter = FootnoteSplitter::new(FootnoteConfig::default().with_page_path("gen-1.html"))?;
//! let verse = splitter.split("5", "And God{Or gods} called{Lit. named}")?;
//!
//! assert_eq!(verse.footnotes[0].id, "5a");
//! assert_eq!(verse.footnotes[1].id, "5b");
//! assert!(verse.text.starts_with(r##"And God<sup><a href="gen-1.html#footnote-5a">[a]</a></sup>"##));
//! # Ok::<(), lectio::Error>(())
//! ```

use serde::Serialize;

use crate::error::{Error, Result};
use crate::render::escape_html;

/// Letters run `a..=z`, so no verse may carry more notes than this.
pub const MAX_LETTERED_NOTES: usize = 26;

/// Configuration for [`FootnoteSplitter`].
#[derive(Debug, Clone)]
pub struct FootnoteConfig {
    /// Opening delimiter.
    pub start: char,
    /// Closing delimiter.
    pub end: char,
    /// Page the anchors point into; may be empty for same-page links.
    pub page_path: String,
    /// Footnotes allowed per verse before [`Error::FootnoteLimit`].
    pub max_notes: usize,
}

impl Default for FootnoteConfig {
    fn default() -> Self {
        Self {
            start: '{',
            end: '}',
            page_path: String::new(),
            max_notes: MAX_LETTERED_NOTES,
        }
    }
}

impl FootnoteConfig {
    pub fn with_delimiters(mut self, start: char, end: char) -> Self {
        self.start = start;
        self.end = end;
        self
    }

    pub fn with_page_path(mut self, page_path: impl Into<String>) -> Self {
        self.page_path = page_path.into();
        self
    }

    pub fn with_max_notes(mut self, max_notes: usize) -> Self {
        self.max_notes = max_notes;
        self
    }
}

/// One extracted footnote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SplitFootnote {
    /// `{verse_id}{letter}`, e.g. `5a`. Not escaped; the anchor href is.
    pub id: String,
    pub text: String,
}

/// Verse text with footnote spans replaced by anchors.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SplitVerse {
    pub text: String,
    pub footnotes: Vec<SplitFootnote>,
}

/// Extracts delimited footnotes and assigns ordinal letters.
#[derive(Debug, Clone)]
pub struct FootnoteSplitter {
    config: FootnoteConfig,
}

impl FootnoteSplitter {
    /// Create a splitter. Fails with [`Error::InvalidArgument`] when the
    /// delimiters coincide or `max_notes` is outside `1..=26`.
    pub fn new(config: FootnoteConfig) -> Result<Self> {
        if config.start == config.end {
            return Err(Error::InvalidArgument(format!(
                "footnote delimiters must differ, got {:?} twice",
                config.start
            )));
        }
        if config.max_notes == 0 || config.max_notes > MAX_LETTERED_NOTES {
            return Err(Error::InvalidArgument(format!(
                "max_notes must be between 1 and {MAX_LETTERED_NOTES}, got {}",
                config.max_notes
            )));
        }
        Ok(Self { config })
    }

    pub fn config(&self) -> &FootnoteConfig {
        &self.config
    }

    /// Replace each delimited span in `text` with a lettered anchor.
    ///
    /// An opening delimiter with no closing one leaves the rest of the text
    /// as literal content.
    pub fn split(&self, verse_id: &str, text: &str) -> Result<SplitVerse> {
        let FootnoteConfig { start, end, .. } = self.config;
        let mut out = String::with_capacity(text.len());
        let mut footnotes = Vec::new();
        let mut rest = text;

        while let Some(open) = rest.find(start) {
            out.push_str(&rest[..open]);
            let after = &rest[open + start.len_utf8()..];

            let Some(close) = after.find(end) else {
                out.push_str(&rest[open..]);
                rest = "";
                break;
            };

            if footnotes.len() >= self.config.max_notes {
                return Err(Error::FootnoteLimit {
                    verse: verse_id.to_string(),
                    limit: self.config.max_notes,
                });
            }

            let letter = note_letter(footnotes.len());
            let id = format!("{verse_id}{letter}");
            out.push_str(&format!(
                "<sup><a href=\"{}#footnote-{}\">[{letter}]</a></sup>",
                escape_html(&self.config.page_path),
                escape_html(&id)
            ));
            footnotes.push(SplitFootnote {
                id,
                text: after[..close].to_string(),
            });
            rest = &after[close + end.len_utf8()..];
        }
        out.push_str(rest);

        Ok(SplitVerse {
            text: out,
            footnotes,
        })
    }

    /// Like [`split`](Self::split), prefixed with the verse number in
    /// superscript. Empty text stays empty.
    pub fn render_verse(&self, verse_number: &str, verse_id: &str, text: &str) -> Result<SplitVerse> {
        if text.is_empty() {
            return Ok(SplitVerse::default());
        }
        let mut verse = self.split(verse_id, text)?;
        verse.text.insert_str(0, &format!("<sup>{verse_number}</sup>"));
        Ok(verse)
    }

    /// Remove every complete delimited span, keeping the surrounding text.
    pub fn strip(&self, text: &str) -> String {
        let FootnoteConfig { start, end, .. } = self.config;
        let mut out = String::with_capacity(text.len());
        let mut rest = text;
        while let Some(open) = rest.find(start) {
            out.push_str(&rest[..open]);
            let after = &rest[open + start.len_utf8()..];
            match after.find(end) {
                Some(close) => rest = &after[close + end.len_utf8()..],
                None => {
                    out.push_str(&rest[open..]);
                    rest = "";
                }
            }
        }
        out.push_str(rest);
        out
    }
}

fn note_letter(index: usize) -> char {
    debug_assert!(index < MAX_LETTERED_NOTES);
    (b'a' + index as u8) as char
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn splitter() -> FootnoteSplitter {
        FootnoteSplitter::new(FootnoteConfig::default().with_page_path("page.html")).unwrap()
    }

    #[test]
    fn test_empty_input() {
        let verse = splitter().split("1", "").unwrap();
        assert_eq!(verse, SplitVerse::default());
        assert_eq!(splitter().render_verse("1", "1", "").unwrap(), SplitVerse::default());
    }

    #[test]
    fn test_two_footnotes_get_sequential_letters() {
        let verse = splitter().split("5", "a{first}b{second}c").unwrap();
        let ids: Vec<_> = verse.footnotes.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, ["5a", "5b"]);
        assert_eq!(verse.footnotes[0].text, "first");
        assert_eq!(verse.footnotes[1].text, "second");
        assert_eq!(
            verse.text,
            "a<sup><a href=\"page.html#footnote-5a\">[a]</a></sup>b\
             <sup><a href=\"page.html#footnote-5b\">[b]</a></sup>c"
        );
    }

    #[test]
    fn test_href_escaped_id_raw() {
        let verse = splitter().split("1.2\"b", "x{y}").unwrap();
        assert_eq!(verse.footnotes[0].id, "1.2\"ba");
        assert_eq!(
            verse.text,
            "x<sup><a href=\"page.html#footnote-1.2&quot;ba\">[a]</a></sup>"
        );
    }

    #[test]
    fn test_render_verse_prefix() {
        let verse = splitter().render_verse("3", "3", "Light{Heb. or}").unwrap();
        assert!(verse.text.starts_with("<sup>3</sup>Light<sup><a "));
        assert_eq!(verse.footnotes.len(), 1);
    }

    #[test]
    fn test_unterminated_delimiter_is_literal() {
        let verse = splitter().split("2", "a{note}b{unterminated").unwrap();
        assert_eq!(verse.footnotes.len(), 1);
        assert!(verse.text.ends_with("b{unterminated"));
    }

    #[test]
    fn test_stray_closing_delimiter_is_literal() {
        let verse = splitter().split("2", "a}b").unwrap();
        assert_eq!(verse.text, "a}b");
        assert!(verse.footnotes.is_empty());
    }

    #[test]
    fn test_limit_is_enforced() {
        let splitter =
            FootnoteSplitter::new(FootnoteConfig::default().with_max_notes(2)).unwrap();
        assert!(splitter.split("9", "{a}{b}").is_ok());
        let err = splitter.split("9", "{a}{b}{c}").unwrap_err();
        assert!(matches!(err, Error::FootnoteLimit { limit: 2, .. }));
    }

    #[test]
    fn test_twenty_six_notes_fit() {
        let text = "{n}".repeat(26);
        let verse = splitter().split("1", &text).unwrap();
        assert_eq!(verse.footnotes.last().unwrap().id, "1z");
        assert!(splitter().split("1", &"{n}".repeat(27)).is_err());
    }

    #[test]
    fn test_invalid_config() {
        assert!(FootnoteSplitter::new(FootnoteConfig::default().with_max_notes(0)).is_err());
        assert!(FootnoteSplitter::new(FootnoteConfig::default().with_max_notes(27)).is_err());
        assert!(FootnoteSplitter::new(FootnoteConfig::default().with_delimiters('|', '|')).is_err());
    }

    #[test]
    fn test_custom_delimiters() {
        let splitter =
            FootnoteSplitter::new(FootnoteConfig::default().with_delimiters('\u{E000}', '\u{E001}'))
                .unwrap();
        let verse = splitter.split("1", "x {kept}\u{E000}note\u{E001}").unwrap();
        assert!(verse.text.starts_with("x {kept}<sup>"));
        assert_eq!(verse.footnotes[0].text, "note");
    }

    #[test]
    fn test_strip() {
        assert_eq!(splitter().strip("a{x}b{y"), "ab{y");
    }

    proptest! {
        #[test]
        fn prop_split_is_identity_without_delimiters(text in "[^{}]*") {
            let verse = splitter().split("1", &text).unwrap();
            prop_assert_eq!(verse.text, text);
            prop_assert!(verse.footnotes.is_empty());
        }

        #[test]
        fn prop_footnote_ids_are_sequential(count in 0usize..=26) {
            let text = "w{n}".repeat(count);
            let verse = splitter().split("7", &text).unwrap();
            prop_assert_eq!(verse.footnotes.len(), count);
            for (i, note) in verse.footnotes.iter().enumerate() {
                prop_assert_eq!(&note.id, &format!("7{}", (b'a' + i as u8) as char));
            }
        }
    }
}
