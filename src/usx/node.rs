//! Typed node model for USX-like scripture markup.
//!
//! The element set is closed: every traversal site matches [`MarkupNode`]
//! exhaustively, so adding a kind is caught by the compiler at each visitor.

use crate::error::{Error, Result};

use super::metadata::ScriptureBookMetadata;

/// A node in a parsed scripture document.
///
/// Only [`Book`], [`Para`], [`CharSpan`], [`Footnote`] and [`CrossReference`]
/// own children. Children are kept in document (reading) order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkupNode {
    Book(Box<Book>),
    Identification(Identification),
    Chapter(ChapterMarker),
    Verse(VerseMarker),
    Para(Para),
    Char(CharSpan),
    Note(Footnote),
    Milestone(Milestone),
    LineBreak(LineBreak),
    CrossReference(CrossReference),
    /// Leaf text content, verbatim.
    Text(String),
}

impl MarkupNode {
    /// Child content, empty for leaf kinds.
    pub fn children(&self) -> &[MarkupNode] {
        match self {
            MarkupNode::Book(book) => &book.content,
            MarkupNode::Para(para) => &para.content,
            MarkupNode::Char(span) => &span.content,
            MarkupNode::Note(note) => &note.content,
            MarkupNode::CrossReference(xref) => &xref.content,
            MarkupNode::Identification(_)
            | MarkupNode::Chapter(_)
            | MarkupNode::Verse(_)
            | MarkupNode::Milestone(_)
            | MarkupNode::LineBreak(_)
            | MarkupNode::Text(_) => &[],
        }
    }

    /// Whether this kind may own child content.
    pub fn is_container(&self) -> bool {
        matches!(
            self,
            MarkupNode::Book(_)
                | MarkupNode::Para(_)
                | MarkupNode::Char(_)
                | MarkupNode::Note(_)
                | MarkupNode::CrossReference(_)
        )
    }

    /// Concatenated text of this node and its descendants.
    ///
    /// Marker leaves contribute nothing.
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    pub(crate) fn collect_text(&self, out: &mut String) {
        if let MarkupNode::Text(value) = self {
            out.push_str(value);
            return;
        }
        for child in self.children() {
            child.collect_text(out);
        }
    }
}

/// Root of a parsed document (`<usx>`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Book {
    pub(crate) version: String,
    pub(crate) metadata: ScriptureBookMetadata,
    pub(crate) content: Vec<MarkupNode>,
}

impl Book {
    pub(crate) fn new(
        version: String,
        metadata: ScriptureBookMetadata,
        content: Vec<MarkupNode>,
    ) -> Self {
        Self {
            version,
            metadata,
            content,
        }
    }

    /// USX schema version from the root element.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// A snapshot of the book metadata.
    ///
    /// The returned value is an independent copy; the tree keeps its own.
    pub fn metadata(&self) -> ScriptureBookMetadata {
        self.metadata.clone()
    }

    /// Top-level content in document order.
    pub fn content(&self) -> &[MarkupNode] {
        &self.content
    }

    /// The `<book>` identification element, if present at top level.
    pub fn identification(&self) -> Option<&Identification> {
        self.content.iter().find_map(|node| match node {
            MarkupNode::Identification(id) => Some(id),
            _ => None,
        })
    }
}

impl From<Book> for MarkupNode {
    fn from(book: Book) -> Self {
        MarkupNode::Book(Box::new(book))
    }
}

/// `<book code="GEN" style="id">Name</book>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identification {
    pub style: String,
    pub code: String,
    pub name: String,
}

/// Fields shared by chapter and verse boundary markers.
///
/// `number` is kept as written; parse it with [`ChapterMarker::number`] or
/// [`VerseMarker::number`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Marker {
    pub style: String,
    pub number: Option<String>,
    pub start_id: Option<String>,
    pub end_id: Option<String>,
}

impl Marker {
    /// An end marker (`eid` only) closes a range opened elsewhere.
    pub fn is_end(&self) -> bool {
        self.end_id.is_some() && self.start_id.is_none() && self.number.is_none()
    }

    /// The number exactly as written, or an empty string for end markers.
    pub fn number_str(&self) -> &str {
        self.number.as_deref().unwrap_or("")
    }

    fn parse_number(&self, field: &'static str) -> Result<u32> {
        let raw = self.number_str();
        raw.trim().parse::<u32>().map_err(|_| Error::InvalidNumber {
            field,
            value: raw.to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChapterMarker(pub Marker);

impl ChapterMarker {
    /// Parse the chapter number.
    pub fn number(&self) -> Result<u32> {
        self.0.parse_number("chapter")
    }
}

impl std::ops::Deref for ChapterMarker {
    type Target = Marker;

    fn deref(&self) -> &Marker {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VerseMarker(pub Marker);

impl VerseMarker {
    /// Parse the verse number. Ranges such as `"1-2"` fail; see
    /// [`VerseMarker::first_number`].
    pub fn number(&self) -> Result<u32> {
        self.0.parse_number("verse")
    }

    /// Leading integer of the verse number, so `"16-17"` and `"3a"` yield
    /// 16 and 3.
    pub fn first_number(&self) -> Result<u32> {
        let raw = self.number_str().trim();
        let digits = raw
            .find(|c: char| !c.is_ascii_digit())
            .map_or(raw, |end| &raw[..end]);
        digits.parse::<u32>().map_err(|_| Error::InvalidNumber {
            field: "verse",
            value: raw.to_string(),
        })
    }
}

impl std::ops::Deref for VerseMarker {
    type Target = Marker;

    fn deref(&self) -> &Marker {
        &self.0
    }
}

/// `<para style="p">…</para>`
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Para {
    pub style: String,
    pub content: Vec<MarkupNode>,
}

impl Para {
    /// Title (`mt*`) and section heading (`s*`, `ms*`) styles.
    pub fn is_heading(&self) -> bool {
        heading_level(&self.style).is_some()
    }
}

/// Heading level implied by a paragraph style.
pub(crate) fn heading_level(style: &str) -> Option<u8> {
    let family = style.trim_end_matches(|c: char| c.is_ascii_digit());
    match family {
        "mt" | "imt" => Some(1),
        "ms" => Some(2),
        "s" | "is" => Some(3),
        _ => None,
    }
}

/// `<char style="wj">…</char>` or `<w strong="H7225">…</w>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharSpan {
    pub style: String,
    /// Concatenated text of `content`.
    pub text: String,
    pub strong: Option<String>,
    /// `false` when the source marks the span as unterminated.
    pub closed: bool,
    pub content: Vec<MarkupNode>,
}

impl Default for CharSpan {
    fn default() -> Self {
        Self {
            style: String::new(),
            text: String::new(),
            strong: None,
            closed: true,
            content: Vec::new(),
        }
    }
}

/// `<note style="f" caller="+">…</note>`
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Footnote {
    pub style: String,
    pub caller: String,
    pub content: Vec<MarkupNode>,
}

/// `<ms style="qt-s" sid="…"/>`
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Milestone {
    pub style: String,
    pub start_id: Option<String>,
    pub end_id: Option<String>,
}

/// `<optbreak/>` or `<br/>`
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LineBreak {
    pub style: String,
}

/// `<ref loc="GEN 2:4">2:4</ref>`
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CrossReference {
    pub style: String,
    pub location: String,
    pub content: Vec<MarkupNode>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn marker(number: &str) -> Marker {
        Marker {
            style: "v".to_string(),
            number: Some(number.to_string()),
            ..Marker::default()
        }
    }

    #[test]
    fn test_leaves_have_no_children() {
        let leaf = MarkupNode::Verse(VerseMarker(marker("1")));
        assert!(leaf.children().is_empty());
        assert!(!leaf.is_container());
        assert!(MarkupNode::Para(Para::default()).is_container());
    }

    #[test]
    fn test_number_parsed_on_demand() {
        assert_eq!(ChapterMarker(marker("12")).number().unwrap(), 12);
        let err = ChapterMarker(marker("xii")).number().unwrap_err();
        assert!(matches!(err, Error::InvalidNumber { field: "chapter", .. }));
    }

    #[test]
    fn test_verse_range_first_number() {
        let verse = VerseMarker(marker("16-17"));
        assert!(verse.number().is_err());
        assert_eq!(verse.first_number().unwrap(), 16);
        assert_eq!(VerseMarker(marker("3a")).first_number().unwrap(), 3);
    }

    #[test]
    fn test_end_marker() {
        let end = Marker {
            style: "v".to_string(),
            end_id: Some("GEN 1:1".to_string()),
            ..Marker::default()
        };
        assert!(end.is_end());
        assert!(!marker("1").is_end());
    }

    #[test]
    fn test_plain_text_skips_markers() {
        let para = MarkupNode::Para(Para {
            style: "p".to_string(),
            content: vec![
                MarkupNode::Verse(VerseMarker(marker("1"))),
                MarkupNode::Text("In the ".to_string()),
                MarkupNode::Char(CharSpan {
                    style: "nd".to_string(),
                    text: "Lord".to_string(),
                    content: vec![MarkupNode::Text("Lord".to_string())],
                    ..CharSpan::default()
                }),
            ],
        });
        assert_eq!(para.plain_text(), "In the Lord");
    }

    #[test]
    fn test_heading_styles() {
        assert_eq!(heading_level("mt1"), Some(1));
        assert_eq!(heading_level("s"), Some(3));
        assert_eq!(heading_level("ms2"), Some(2));
        assert_eq!(heading_level("p"), None);
        assert_eq!(heading_level("q1"), None);
    }
}
