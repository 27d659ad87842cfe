//! Projections of a parsed [`Book`] into output forms.
//!
//! All projections share one traversal, [`walk`], parameterized by a
//! [`RenderSink`]. The walk owns reading order and the chapter/verse/milestone
//! bookkeeping; a sink only decides what to emit:
//!
//! - [`markdown`]: plain Markdown with verse numbers on new lines
//! - [`html`]: an embeddable HTML fragment with footnote anchors
//! - [`segment`]: a flat `(text, category)` sequence for chapter/verse access
//!
//! A sink is consumed by the walk, so each render call owns its buffers
//! exclusively. Inconsistent markup never aborts a render; it is reported
//! through [`Rendered::warnings`].

mod escape;
pub mod html;
pub mod markdown;
pub mod segment;

use std::collections::HashSet;
use std::fmt;

use crate::usx::{
    Book, ChapterMarker, CharSpan, CrossReference, Footnote, Identification, LineBreak,
    MarkupNode, Milestone, Para, VerseMarker,
};

pub use escape::escape_html;
pub use html::{HtmlConfig, HtmlOutput, render_html, render_html_annotated};
pub use markdown::{CollectedNote, MarkdownConfig, MarkdownOutput, render_markdown};
pub use segment::{ScriptureSegment, SegmentCategory, render_segments};

/// Output of a projection plus the diagnostics gathered while walking.
#[derive(Debug, Clone)]
pub struct Rendered<T> {
    pub output: T,
    pub warnings: Vec<RenderWarning>,
}

impl<T> Rendered<T> {
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}

/// Which kind of boundary marker a warning refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerKind {
    Chapter,
    Verse,
    Milestone,
}

impl fmt::Display for MarkerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MarkerKind::Chapter => "chapter",
            MarkerKind::Verse => "verse",
            MarkerKind::Milestone => "milestone",
        })
    }
}

/// A non-fatal discrepancy found while rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderWarning {
    /// An end id with no start id seen before it.
    UnmatchedEndId { kind: MarkerKind, id: String },
    /// A start id that is already open.
    DuplicateStartId { kind: MarkerKind, id: String },
    /// A chapter or verse number that does not parse.
    InvalidNumber { kind: MarkerKind, value: String },
    /// A verse carried more footnotes than the splitter allows.
    FootnoteLimit { verse: String, limit: usize },
}

impl fmt::Display for RenderWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderWarning::UnmatchedEndId { kind, id } => {
                write!(f, "{kind} end id {id:?} has no matching start id")
            }
            RenderWarning::DuplicateStartId { kind, id } => {
                write!(f, "{kind} start id {id:?} opened twice")
            }
            RenderWarning::InvalidNumber { kind, value } => {
                write!(f, "{kind} number {value:?} is not numeric")
            }
            RenderWarning::FootnoteLimit { verse, limit } => {
                write!(f, "verse {verse} exceeds {limit} footnotes; notes dropped")
            }
        }
    }
}

/// A container node as seen by a sink.
#[derive(Debug, Clone, Copy)]
pub enum Block<'a> {
    Para(&'a Para),
    Char(&'a CharSpan),
    Note(&'a Footnote),
    CrossReference(&'a CrossReference),
}

/// A leaf marker as seen by a sink.
#[derive(Debug, Clone, Copy)]
pub enum Leaf<'a> {
    Identification(&'a Identification),
    Chapter(&'a ChapterMarker),
    Verse(&'a VerseMarker),
    Milestone(&'a Milestone),
    LineBreak(&'a LineBreak),
}

/// Output accumulator driven by [`walk`].
pub trait RenderSink {
    type Output;

    fn open_block(&mut self, block: Block<'_>, cx: &mut RenderContext);

    fn close_block(&mut self, block: Block<'_>, cx: &mut RenderContext);

    fn append_text(&mut self, text: &str, cx: &mut RenderContext);

    fn leaf(&mut self, leaf: Leaf<'_>, cx: &mut RenderContext);

    fn finish(self, cx: &mut RenderContext) -> Self::Output;
}

/// Reading position and diagnostics for one walk.
#[derive(Debug, Default)]
pub struct RenderContext {
    chapter: Option<String>,
    verse: Option<String>,
    note_depth: usize,
    xref_depth: usize,
    open_chapters: HashSet<String>,
    open_verses: HashSet<String>,
    open_milestones: HashSet<String>,
    warnings: Vec<RenderWarning>,
}

impl RenderContext {
    /// Number of the current chapter as written.
    pub fn chapter(&self) -> Option<&str> {
        self.chapter.as_deref()
    }

    /// Number of the current verse as written; `None` outside any verse.
    pub fn verse(&self) -> Option<&str> {
        self.verse.as_deref()
    }

    /// Inside a footnote (at any depth). During `open_block`/`close_block`
    /// of a note this already counts the note itself.
    pub fn in_note(&self) -> bool {
        self.note_depth > 0
    }

    /// Depth of note nesting; 1 for the outermost note.
    pub fn note_depth(&self) -> usize {
        self.note_depth
    }

    pub fn in_cross_reference(&self) -> bool {
        self.xref_depth > 0
    }

    pub fn warn(&mut self, warning: RenderWarning) {
        tracing::warn!(%warning, "render warning");
        self.warnings.push(warning);
    }

    fn enter_chapter(&mut self, marker: &ChapterMarker) {
        if marker.is_end() {
            let id = marker.end_id.as_deref().unwrap_or_default();
            self.close_id(MarkerKind::Chapter, id);
            return;
        }
        if marker.number().is_err() {
            self.warn(RenderWarning::InvalidNumber {
                kind: MarkerKind::Chapter,
                value: marker.number_str().to_string(),
            });
        }
        if let Some(sid) = &marker.start_id {
            self.open_id(MarkerKind::Chapter, sid);
        }
        self.chapter = marker.number.clone();
        self.verse = None;
    }

    fn enter_verse(&mut self, marker: &VerseMarker) {
        if marker.is_end() {
            let id = marker.end_id.as_deref().unwrap_or_default();
            if self.close_id(MarkerKind::Verse, id) {
                self.verse = None;
            }
            return;
        }
        if marker.first_number().is_err() {
            self.warn(RenderWarning::InvalidNumber {
                kind: MarkerKind::Verse,
                value: marker.number_str().to_string(),
            });
        }
        if let Some(sid) = &marker.start_id {
            self.open_id(MarkerKind::Verse, sid);
        }
        self.verse = marker.number.clone();
    }

    fn enter_milestone(&mut self, milestone: &Milestone) {
        if let Some(sid) = &milestone.start_id {
            self.open_id(MarkerKind::Milestone, sid);
        }
        if let Some(eid) = &milestone.end_id {
            self.close_id(MarkerKind::Milestone, eid);
        }
    }

    fn open_ids(&mut self, kind: MarkerKind) -> &mut HashSet<String> {
        match kind {
            MarkerKind::Chapter => &mut self.open_chapters,
            MarkerKind::Verse => &mut self.open_verses,
            MarkerKind::Milestone => &mut self.open_milestones,
        }
    }

    fn open_id(&mut self, kind: MarkerKind, id: &str) {
        if !self.open_ids(kind).insert(id.to_string()) {
            self.warn(RenderWarning::DuplicateStartId {
                kind,
                id: id.to_string(),
            });
        }
    }

    /// Returns whether the id was open.
    fn close_id(&mut self, kind: MarkerKind, id: &str) -> bool {
        if self.open_ids(kind).remove(id) {
            return true;
        }
        self.warn(RenderWarning::UnmatchedEndId {
            kind,
            id: id.to_string(),
        });
        false
    }
}

/// Walk `book` in reading order, feeding `sink`.
pub fn walk<S: RenderSink>(book: &Book, mut sink: S) -> Rendered<S::Output> {
    let mut cx = RenderContext::default();
    for node in book.content() {
        visit(node, &mut sink, &mut cx);
    }
    let output = sink.finish(&mut cx);
    Rendered {
        output,
        warnings: cx.warnings,
    }
}

fn visit<S: RenderSink>(node: &MarkupNode, sink: &mut S, cx: &mut RenderContext) {
    match node {
        MarkupNode::Book(inner) => {
            for child in inner.content() {
                visit(child, sink, cx);
            }
        }
        MarkupNode::Identification(id) => sink.leaf(Leaf::Identification(id), cx),
        MarkupNode::Chapter(marker) => {
            cx.enter_chapter(marker);
            sink.leaf(Leaf::Chapter(marker), cx);
        }
        MarkupNode::Verse(marker) => {
            cx.enter_verse(marker);
            sink.leaf(Leaf::Verse(marker), cx);
        }
        MarkupNode::Milestone(milestone) => {
            cx.enter_milestone(milestone);
            sink.leaf(Leaf::Milestone(milestone), cx);
        }
        MarkupNode::LineBreak(line_break) => sink.leaf(Leaf::LineBreak(line_break), cx),
        MarkupNode::Para(para) => {
            sink.open_block(Block::Para(para), cx);
            visit_children(&para.content, sink, cx);
            sink.close_block(Block::Para(para), cx);
        }
        MarkupNode::Char(span) => {
            sink.open_block(Block::Char(span), cx);
            visit_children(&span.content, sink, cx);
            sink.close_block(Block::Char(span), cx);
        }
        MarkupNode::Note(note) => {
            cx.note_depth += 1;
            sink.open_block(Block::Note(note), cx);
            visit_children(&note.content, sink, cx);
            sink.close_block(Block::Note(note), cx);
            cx.note_depth -= 1;
        }
        MarkupNode::CrossReference(xref) => {
            cx.xref_depth += 1;
            sink.open_block(Block::CrossReference(xref), cx);
            visit_children(&xref.content, sink, cx);
            sink.close_block(Block::CrossReference(xref), cx);
            cx.xref_depth -= 1;
        }
        MarkupNode::Text(text) => {
            if !text.is_empty() {
                sink.append_text(text, cx);
            }
        }
    }
}

fn visit_children<S: RenderSink>(children: &[MarkupNode], sink: &mut S, cx: &mut RenderContext) {
    for child in children {
        visit(child, sink, cx);
    }
}
