//! Markdown projection.
//!
//! Verses start on their own line as `{number} text`. Title and section
//! heading paragraphs become headings; a run of consecutive heading paragraphs
//! is joined onto one heading line. Footnotes and cross-references are kept
//! out of the body and collected separately.

use serde::Serialize;

use crate::usx::Book;
use crate::usx::node::heading_level;

use super::{Block, Leaf, RenderContext, RenderSink, Rendered, walk};

/// Configuration for Markdown rendering.
#[derive(Debug, Clone)]
pub struct MarkdownConfig {
    /// Emit a `## {number}` heading at each chapter marker.
    pub chapter_headings: bool,
    /// Collect footnote text into [`MarkdownOutput::notes`].
    pub collect_notes: bool,
    /// Keep the text of cross-references that appear in the body.
    pub inline_cross_references: bool,
}

impl Default for MarkdownConfig {
    fn default() -> Self {
        Self {
            chapter_headings: true,
            collect_notes: true,
            inline_cross_references: false,
        }
    }
}

/// A footnote lifted out of the body text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollectedNote {
    pub caller: String,
    pub style: String,
    pub chapter: Option<String>,
    pub verse: Option<String>,
    pub text: String,
}

/// Result of rendering a book to Markdown.
#[derive(Debug, Clone, Default)]
pub struct MarkdownOutput {
    pub text: String,
    pub notes: Vec<CollectedNote>,
}

/// Render a book to Markdown.
pub fn render_markdown(book: &Book, config: &MarkdownConfig) -> Rendered<MarkdownOutput> {
    walk(book, MarkdownSink::new(config))
}

struct MarkdownSink<'c> {
    config: &'c MarkdownConfig,
    out: String,
    notes: Vec<CollectedNote>,
    current_note: Option<CollectedNote>,
    /// The paragraph being written is a heading.
    in_heading: bool,
    /// The last block closed was a heading and nothing followed it yet.
    heading_run: bool,
}

impl<'c> MarkdownSink<'c> {
    fn new(config: &'c MarkdownConfig) -> Self {
        Self {
            config,
            out: String::new(),
            notes: Vec::new(),
            current_note: None,
            in_heading: false,
            heading_run: false,
        }
    }

    /// Separate a new block from prior output by one blank line.
    fn start_block(&mut self) {
        self.heading_run = false;
        if self.out.is_empty() {
            return;
        }
        while !self.out.ends_with("\n\n") {
            self.out.push('\n');
        }
    }

    fn at_line_start(&self) -> bool {
        self.out.is_empty() || self.out.ends_with('\n')
    }

    fn push_body(&mut self, text: &str) {
        if self.in_heading {
            self.out.push_str(&text.replace('\n', " "));
        } else {
            self.out.push_str(text);
        }
    }

    fn emphasis(style: &str) -> &'static str {
        match style {
            "bd" => "**",
            "it" | "em" => "*",
            "bdit" => "***",
            _ => "",
        }
    }
}

impl RenderSink for MarkdownSink<'_> {
    type Output = MarkdownOutput;

    fn open_block(&mut self, block: Block<'_>, cx: &mut RenderContext) {
        match block {
            Block::Para(para) => {
                if cx.in_note() {
                    return;
                }
                match heading_level(&para.style) {
                    Some(_) if self.heading_run => {
                        self.out.push(' ');
                        self.in_heading = true;
                    }
                    Some(level) => {
                        self.start_block();
                        let level = if level == 1 { 1 } else { 2 };
                        self.out.push_str(&"#".repeat(level));
                        self.out.push(' ');
                        self.in_heading = true;
                    }
                    None => self.start_block(),
                }
                self.heading_run = false;
            }
            Block::Char(span) => {
                if cx.in_note() || cx.in_cross_reference() {
                    return;
                }
                self.out.push_str(Self::emphasis(&span.style));
            }
            Block::Note(note) => {
                if cx.note_depth() == 1 && self.config.collect_notes {
                    self.current_note = Some(CollectedNote {
                        caller: note.caller.clone(),
                        style: note.style.clone(),
                        chapter: cx.chapter().map(str::to_string),
                        verse: cx.verse().map(str::to_string),
                        text: String::new(),
                    });
                }
            }
            Block::CrossReference(_) => {}
        }
    }

    fn close_block(&mut self, block: Block<'_>, cx: &mut RenderContext) {
        match block {
            Block::Para(para) => {
                if cx.in_note() {
                    return;
                }
                self.in_heading = false;
                self.heading_run = heading_level(&para.style).is_some();
            }
            Block::Char(span) => {
                if cx.in_note() || cx.in_cross_reference() {
                    return;
                }
                self.out.push_str(Self::emphasis(&span.style));
            }
            Block::Note(_) => {
                if cx.note_depth() == 1
                    && let Some(mut note) = self.current_note.take()
                {
                    note.text = note.text.trim().to_string();
                    self.notes.push(note);
                }
            }
            Block::CrossReference(_) => {}
        }
    }

    fn append_text(&mut self, text: &str, cx: &mut RenderContext) {
        if cx.in_note() {
            if let Some(note) = self.current_note.as_mut() {
                note.text.push_str(text);
            }
            return;
        }
        if cx.in_cross_reference() && !self.config.inline_cross_references {
            return;
        }
        if self.heading_run && !text.trim().is_empty() {
            self.heading_run = false;
        }
        self.push_body(text);
    }

    fn leaf(&mut self, leaf: Leaf<'_>, cx: &mut RenderContext) {
        if cx.in_note() {
            return;
        }
        match leaf {
            Leaf::Chapter(marker) if !marker.is_end() => {
                if self.config.chapter_headings {
                    self.start_block();
                    self.out.push_str("## ");
                    self.out.push_str(marker.number_str());
                    self.out.push('\n');
                }
                self.heading_run = false;
            }
            Leaf::Verse(marker) if !marker.is_end() => {
                if !self.at_line_start() {
                    self.out.push('\n');
                }
                self.out.push_str(marker.number_str());
                self.out.push(' ');
                self.heading_run = false;
            }
            Leaf::LineBreak(_) => {
                if self.in_heading {
                    self.out.push(' ');
                } else {
                    self.out.push('\n');
                }
            }
            Leaf::Chapter(_) | Leaf::Verse(_) | Leaf::Identification(_) | Leaf::Milestone(_) => {}
        }
    }

    fn finish(mut self, _cx: &mut RenderContext) -> MarkdownOutput {
        let trimmed = self.out.trim_end().len();
        self.out.truncate(trimmed);
        if !self.out.is_empty() {
            self.out.push('\n');
        }
        MarkdownOutput {
            text: self.out,
            notes: self.notes,
        }
    }
}
