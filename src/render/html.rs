//! HTML fragment projection.
//!
//! Verse bodies are buffered from one verse marker to the next and passed
//! through [`FootnoteSplitter::render_verse`], so the verse number becomes a
//! superscript and every note inside the verse becomes a lettered anchor. The
//! notes themselves are returned in [`HtmlOutput::footnotes`].

use std::borrow::Cow;

use crate::error::{Error, Result};
use crate::footnote::{FootnoteConfig, FootnoteSplitter, MAX_LETTERED_NOTES, SplitFootnote};
use crate::unihan::GlossAnnotator;
use crate::usx::Book;
use crate::usx::node::heading_level;

use super::escape::{escape_html, push_escaped};
use super::{Block, Leaf, RenderContext, RenderSink, RenderWarning, Rendered, walk};

/// Private-use delimiters around note text inside a buffered verse.
const NOTE_OPEN: char = '\u{E000}';
const NOTE_CLOSE: char = '\u{E001}';

/// Configuration for HTML rendering.
#[derive(Debug, Clone)]
pub struct HtmlConfig {
    /// Page that footnote anchors link into; empty for same-page links.
    pub page_path: String,
    /// Footnotes allowed per verse.
    pub max_notes: usize,
    /// Emit a chapter heading at each chapter marker.
    pub chapter_headings: bool,
}

impl Default for HtmlConfig {
    fn default() -> Self {
        Self {
            page_path: String::new(),
            max_notes: MAX_LETTERED_NOTES,
            chapter_headings: true,
        }
    }
}

impl HtmlConfig {
    pub fn with_page_path(mut self, page_path: impl Into<String>) -> Self {
        self.page_path = page_path.into();
        self
    }

    pub fn with_max_notes(mut self, max_notes: usize) -> Self {
        self.max_notes = max_notes;
        self
    }
}

/// Result of rendering a book to HTML.
#[derive(Debug, Clone, Default)]
pub struct HtmlOutput {
    pub html: String,
    /// Footnotes in reading order. Their text is already HTML-escaped.
    pub footnotes: Vec<SplitFootnote>,
}

impl HtmlOutput {
    /// The footnotes as an ordered list whose items are the anchor targets.
    pub fn footnotes_html(&self) -> String {
        if self.footnotes.is_empty() {
            return String::new();
        }
        let mut out = String::from("<ol class=\"footnotes\">\n");
        for note in &self.footnotes {
            out.push_str("<li id=\"footnote-");
            push_escaped(&mut out, &note.id);
            out.push_str("\">");
            out.push_str(&note.text);
            out.push_str("</li>\n");
        }
        out.push_str("</ol>\n");
        out
    }
}

/// Render a book to an HTML fragment.
///
/// Fails only when `config` describes an invalid footnote limit.
pub fn render_html(book: &Book, config: &HtmlConfig) -> Result<Rendered<HtmlOutput>> {
    Ok(walk(book, HtmlSink::new(config, None)?))
}

/// Like [`render_html`], annotating body text with readings from `annotator`
/// when the book's language is Chinese, Japanese or Korean.
pub fn render_html_annotated(
    book: &Book,
    config: &HtmlConfig,
    annotator: &GlossAnnotator<'_>,
) -> Result<Rendered<HtmlOutput>> {
    let annotator = book.metadata().is_cjk().then_some(annotator);
    Ok(walk(book, HtmlSink::new(config, annotator)?))
}

struct PendingVerse {
    /// Escaped for output.
    number: String,
    /// Raw `{chapter}.{verse}`; escaped where it is written.
    id: String,
    buf: String,
}

struct HtmlSink<'a> {
    config: &'a HtmlConfig,
    splitter: FootnoteSplitter,
    annotator: Option<&'a GlossAnnotator<'a>>,
    out: String,
    verse: Option<PendingVerse>,
    /// Text of the outermost note being read.
    note: String,
    footnotes: Vec<SplitFootnote>,
}

impl<'a> HtmlSink<'a> {
    fn new(config: &'a HtmlConfig, annotator: Option<&'a GlossAnnotator<'a>>) -> Result<Self> {
        let splitter = FootnoteSplitter::new(
            FootnoteConfig::default()
                .with_delimiters(NOTE_OPEN, NOTE_CLOSE)
                .with_page_path(config.page_path.as_str())
                .with_max_notes(config.max_notes),
        )?;
        Ok(Self {
            config,
            splitter,
            annotator,
            out: String::new(),
            verse: None,
            note: String::new(),
            footnotes: Vec::new(),
        })
    }

    /// The open verse buffer, or the final output outside any verse.
    fn buf(&mut self) -> &mut String {
        match self.verse.as_mut() {
            Some(verse) => &mut verse.buf,
            None => &mut self.out,
        }
    }

    fn push(&mut self, html: &str) {
        self.buf().push_str(html);
    }

    fn body_html(&self, text: &str) -> String {
        let text: Cow<'_, str> = if text.contains([NOTE_OPEN, NOTE_CLOSE]) {
            Cow::Owned(text.replace([NOTE_OPEN, NOTE_CLOSE], ""))
        } else {
            Cow::Borrowed(text)
        };
        match self.annotator {
            Some(annotator) => annotator.ruby_html(&text),
            None => escape_html(&text),
        }
    }

    fn flush_verse(&mut self, cx: &mut RenderContext) {
        let Some(pending) = self.verse.take() else {
            return;
        };
        if pending.buf.is_empty() {
            // A verse with no body still shows its number.
            self.out.push_str(&format!("<sup>{}</sup>", pending.number));
            return;
        }
        match self
            .splitter
            .render_verse(&pending.number, &pending.id, &pending.buf)
        {
            Ok(verse) => {
                self.out.push_str(&verse.text);
                self.footnotes.extend(verse.footnotes);
            }
            Err(error) => {
                let warning = match error {
                    Error::FootnoteLimit { verse, limit } => RenderWarning::FootnoteLimit { verse, limit },
                    _ => RenderWarning::FootnoteLimit {
                        verse: pending.id.clone(),
                        limit: self.config.max_notes,
                    },
                };
                cx.warn(warning);
                self.out.push_str("<sup>");
                self.out.push_str(&pending.number);
                self.out.push_str("</sup>");
                self.out.push_str(&self.splitter.strip(&pending.buf));
            }
        }
    }

    fn open_tag(tag: &str, class: &str) -> String {
        format!("<{tag} class=\"{}\">", escape_html(class))
    }
}

fn block_tag(style: &str) -> &'static str {
    match heading_level(style) {
        Some(1) => "h1",
        Some(2) => "h2",
        Some(_) => "h3",
        None => "p",
    }
}

impl RenderSink for HtmlSink<'_> {
    type Output = HtmlOutput;

    fn open_block(&mut self, block: Block<'_>, cx: &mut RenderContext) {
        if cx.in_note() {
            if matches!(block, Block::Note(_)) && cx.note_depth() == 1 {
                self.note.clear();
            }
            return;
        }
        let html = match block {
            Block::Para(para) => Self::open_tag(block_tag(&para.style), &para.style),
            Block::Char(span) => match &span.strong {
                Some(strong) => format!(
                    "<span class=\"w\" data-strong=\"{}\">",
                    escape_html(strong)
                ),
                None => Self::open_tag("span", &span.style),
            },
            Block::CrossReference(xref) => format!(
                "<a class=\"xref\" data-loc=\"{}\">",
                escape_html(&xref.location)
            ),
            Block::Note(_) => return,
        };
        self.push(&html);
    }

    fn close_block(&mut self, block: Block<'_>, cx: &mut RenderContext) {
        match block {
            Block::Note(_) if cx.note_depth() == 1 => {
                let text = std::mem::take(&mut self.note);
                let text = text.trim();
                if self.verse.is_some() {
                    let mut marked = String::with_capacity(text.len() + 6);
                    marked.push(NOTE_OPEN);
                    marked.push_str(text);
                    marked.push(NOTE_CLOSE);
                    self.push(&marked);
                } else {
                    let html = format!("<span class=\"note\">{text}</span>");
                    self.push(&html);
                }
            }
            _ if cx.in_note() => {}
            Block::Para(para) => {
                let html = format!("</{}>\n", block_tag(&para.style));
                self.push(&html);
            }
            Block::Char(_) => self.push("</span>"),
            Block::CrossReference(_) => self.push("</a>"),
            Block::Note(_) => {}
        }
    }

    fn append_text(&mut self, text: &str, cx: &mut RenderContext) {
        if cx.in_note() {
            let plain = text.replace([NOTE_OPEN, NOTE_CLOSE], "");
            push_escaped(&mut self.note, &plain);
            return;
        }
        let html = self.body_html(text);
        self.push(&html);
    }

    fn leaf(&mut self, leaf: Leaf<'_>, cx: &mut RenderContext) {
        if cx.in_note() {
            return;
        }
        match leaf {
            Leaf::Chapter(marker) => {
                self.flush_verse(cx);
                if !marker.is_end() && self.config.chapter_headings {
                    let number = escape_html(marker.number_str());
                    self.out.push_str(&format!(
                        "<h2 class=\"c\" id=\"chapter-{number}\">{number}</h2>\n"
                    ));
                }
            }
            Leaf::Verse(marker) => {
                self.flush_verse(cx);
                if !marker.is_end() {
                    let chapter = cx.chapter().unwrap_or("0");
                    self.verse = Some(PendingVerse {
                        number: escape_html(marker.number_str()),
                        id: format!("{chapter}.{}", marker.number_str()),
                        buf: String::new(),
                    });
                }
            }
            Leaf::LineBreak(_) => self.push("<br/>"),
            Leaf::Identification(_) | Leaf::Milestone(_) => {}
        }
    }

    fn finish(mut self, cx: &mut RenderContext) -> HtmlOutput {
        self.flush_verse(cx);
        HtmlOutput {
            html: self.out,
            footnotes: self.footnotes,
        }
    }
}
