//! Single-pass USX parser built on quick-xml events.

use std::io::Read;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::error::{Error, Result};
use crate::util::{decode_text, extract_xml_encoding, resolve_entity, unescape_attr};

use super::metadata::ScriptureBookMetadata;
use super::node::{
    Book, ChapterMarker, CharSpan, CrossReference, Footnote, Identification, LineBreak,
    MarkupNode, Marker, Milestone, Para, VerseMarker,
};

/// Options for [`parse_usx`].
#[derive(Debug, Clone, Default)]
pub struct ParseOptions {
    /// Fail on elements outside the known set instead of skipping them.
    pub strict: bool,
    /// ISO language tag recorded in the book metadata.
    pub language: String,
    /// Bible version recorded in the metadata. Defaults to the `usx@version`
    /// attribute when unset.
    pub bible_version: Option<String>,
    pub version_description: String,
}

impl ParseOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn with_bible_version(mut self, version: impl Into<String>) -> Self {
        self.bible_version = Some(version.into());
        self
    }

    pub fn with_version_description(mut self, description: impl Into<String>) -> Self {
        self.version_description = description.into();
        self
    }
}

/// Parse a USX document from raw bytes.
///
/// The bytes are decoded as UTF-8, falling back to the encoding named in the
/// XML declaration. No partial tree is returned on failure.
pub fn parse_usx(bytes: &[u8], options: &ParseOptions) -> Result<Book> {
    let hint = extract_xml_encoding(bytes);
    let content = decode_text(bytes, hint);
    parse_usx_str(&content, options)
}

/// Parse a USX document from any reader.
pub fn parse_usx_reader<R: Read>(mut reader: R, options: &ParseOptions) -> Result<Book> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    parse_usx(&bytes, options)
}

/// Parse a USX document that is already decoded.
pub fn parse_usx_str(content: &str, options: &ParseOptions) -> Result<Book> {
    let mut reader = Reader::from_str(content);
    // Mixed content: whitespace between inline elements is significant.
    reader.config_mut().trim_text(false);

    let mut state = ParserState::new(options);

    loop {
        let event = reader.read_event().map_err(|e| {
            Error::MalformedMarkup(format!("at byte {}: {e}", reader.buffer_position()))
        })?;

        match event {
            Event::Start(e) => {
                state.close_text_run();
                state.start_element(&e, false)?;
            }
            Event::Empty(e) => {
                state.close_text_run();
                state.start_element(&e, true)?;
            }
            Event::End(_) => {
                state.close_text_run();
                state.end_element()?;
            }
            Event::Text(e) => {
                state.push_text(&String::from_utf8_lossy(e.as_ref()));
            }
            Event::CData(e) => {
                state.push_text(&String::from_utf8_lossy(&e));
            }
            Event::GeneralRef(e) => {
                let entity = String::from_utf8_lossy(e.as_ref());
                match resolve_entity(&entity) {
                    Some(resolved) => state.push_text(&resolved),
                    None => {
                        return Err(Error::MalformedMarkup(format!(
                            "unknown entity &{entity}; at byte {}",
                            reader.buffer_position()
                        )));
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    state.finish()
}

/// What an open element contributes to the tree when it closes.
enum FrameKind {
    Root { version: String },
    Identification { style: String, code: String },
    Para { style: String },
    Char { style: String, strong: Option<String>, closed: bool },
    Note { style: String, caller: String },
    CrossReference { style: String, location: String },
    /// A marker written with a start and end tag. The marker node was
    /// appended when the start tag was read; its own text is ignored.
    Marker,
    /// Unknown element skipped in lenient mode; children go to the parent.
    Transparent,
}

struct Frame {
    kind: FrameKind,
    children: Vec<MarkupNode>,
}

impl Frame {
    fn owns_children(&self) -> bool {
        !matches!(self.kind, FrameKind::Marker | FrameKind::Transparent)
    }
}

struct ParserState<'o> {
    options: &'o ParseOptions,
    stack: Vec<Frame>,
    book: Option<Book>,
    /// True while consecutive text events belong to one raw text run.
    text_run_open: bool,
}

impl<'o> ParserState<'o> {
    fn new(options: &'o ParseOptions) -> Self {
        Self {
            options,
            stack: Vec::new(),
            book: None,
            text_run_open: false,
        }
    }

    fn close_text_run(&mut self) {
        self.text_run_open = false;
    }

    fn start_element(&mut self, e: &BytesStart<'_>, is_empty: bool) -> Result<()> {
        let qname = e.name();
        let name = String::from_utf8_lossy(local_name(qname.as_ref())).into_owned();
        let attrs = Attrs::read(e, &name)?;

        if self.stack.is_empty() {
            if self.book.is_some() {
                return Err(Error::MalformedMarkup(format!(
                    "unexpected <{name}> after the document root"
                )));
            }
            if name != "usx" {
                return Err(Error::MalformedMarkup(format!(
                    "root element must be <usx>, found <{name}>"
                )));
            }
            self.stack.push(Frame {
                kind: FrameKind::Root {
                    version: attrs.get_or_default("version"),
                },
                children: Vec::new(),
            });
            if is_empty {
                self.end_element()?;
            }
            return Ok(());
        }

        let kind = match name.as_str() {
            "book" => {
                let code = attrs.get("code").ok_or_else(|| {
                    Error::MalformedMarkup("<book> is missing the code attribute".to_string())
                })?;
                FrameKind::Identification {
                    style: attrs.get_or_default("style"),
                    code,
                }
            }
            "chapter" => self.open_marker(MarkupNode::Chapter(ChapterMarker(
                attrs.marker("chapter")?,
            ))),
            "verse" => self.open_marker(MarkupNode::Verse(VerseMarker(attrs.marker("verse")?))),
            "ms" => self.open_marker(MarkupNode::Milestone(Milestone {
                style: attrs.get_or_default("style"),
                start_id: attrs.get("sid"),
                end_id: attrs.get("eid"),
            })),
            "optbreak" | "br" => self.open_marker(MarkupNode::LineBreak(LineBreak {
                style: attrs.get_or_default("style"),
            })),
            "para" => FrameKind::Para {
                style: attrs.get_or_default("style"),
            },
            "char" => FrameKind::Char {
                style: attrs.get_or_default("style"),
                strong: attrs.get("strong"),
                closed: attrs.get("closed").as_deref() != Some("false"),
            },
            "w" => FrameKind::Char {
                style: "w".to_string(),
                strong: attrs.get("strong"),
                closed: true,
            },
            "note" => FrameKind::Note {
                style: attrs.get_or_default("style"),
                caller: attrs.get_or_default("caller"),
            },
            "ref" => FrameKind::CrossReference {
                style: attrs.get("style").unwrap_or_else(|| "ref".to_string()),
                location: attrs.get_or_default("loc"),
            },
            other => {
                if self.options.strict {
                    return Err(Error::UnsupportedElement(other.to_string()));
                }
                tracing::debug!(element = other, "skipping unsupported element");
                FrameKind::Transparent
            }
        };

        self.stack.push(Frame {
            kind,
            children: Vec::new(),
        });
        if is_empty {
            self.end_element()?;
        }
        Ok(())
    }

    fn end_element(&mut self) -> Result<()> {
        let frame = self.stack.pop().ok_or_else(|| {
            Error::MalformedMarkup("closing tag without a matching opening tag".to_string())
        })?;

        let node = match frame.kind {
            FrameKind::Root { version } => {
                self.book = Some(self.build_book(version, frame.children)?);
                return Ok(());
            }
            FrameKind::Identification { style, code } => {
                let mut name = String::new();
                for child in &frame.children {
                    child.collect_text(&mut name);
                }
                MarkupNode::Identification(Identification {
                    style,
                    code,
                    name: name.trim().to_string(),
                })
            }
            FrameKind::Para { style } => MarkupNode::Para(Para {
                style,
                content: frame.children,
            }),
            FrameKind::Char {
                style,
                strong,
                closed,
            } => {
                let mut text = String::new();
                for child in &frame.children {
                    child.collect_text(&mut text);
                }
                MarkupNode::Char(CharSpan {
                    style,
                    text,
                    strong,
                    closed,
                    content: frame.children,
                })
            }
            FrameKind::Note { style, caller } => MarkupNode::Note(Footnote {
                style,
                caller,
                content: frame.children,
            }),
            FrameKind::CrossReference { style, location } => {
                MarkupNode::CrossReference(CrossReference {
                    style,
                    location,
                    content: frame.children,
                })
            }
            FrameKind::Marker | FrameKind::Transparent => return Ok(()),
        };

        self.append_node(node);
        Ok(())
    }

    fn build_book(&self, version: String, content: Vec<MarkupNode>) -> Result<Book> {
        let identification = content
            .iter()
            .find_map(|node| match node {
                MarkupNode::Identification(id) => Some(id),
                _ => None,
            })
            .ok_or_else(|| {
                Error::MalformedMarkup("document has no <book> identification".to_string())
            })?;

        let metadata = ScriptureBookMetadata {
            book_code: identification.code.clone(),
            iso_language: self.options.language.clone(),
            bible_version: self
                .options
                .bible_version
                .clone()
                .unwrap_or_else(|| version.clone()),
            version_description: self.options.version_description.clone(),
        };

        Ok(Book::new(version, metadata, content))
    }

    /// Nearest open frame that keeps children of its own.
    fn owner(&mut self) -> Option<&mut Frame> {
        self.stack.iter_mut().rev().find(|frame| frame.owns_children())
    }

    /// Markers take their place in the parent at the start tag, so anything
    /// nested before the end tag follows them.
    fn open_marker(&mut self, node: MarkupNode) -> FrameKind {
        self.append_node(node);
        FrameKind::Marker
    }

    fn append_node(&mut self, node: MarkupNode) {
        if let Some(owner) = self.owner() {
            owner.children.push(node);
        }
    }

    fn push_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        // Text inside a marker written with start/end tags carries nothing.
        if matches!(
            self.stack.last().map(|frame| &frame.kind),
            Some(FrameKind::Marker) | None
        ) {
            return;
        }

        let merge = self.text_run_open;
        self.text_run_open = true;

        let Some(owner) = self.owner() else {
            return;
        };
        if matches!(owner.kind, FrameKind::Root { .. }) && text.trim().is_empty() && !merge {
            // Formatting whitespace between top-level blocks.
            self.text_run_open = false;
            return;
        }

        if merge && let Some(MarkupNode::Text(last)) = owner.children.last_mut() {
            last.push_str(text);
            return;
        }
        owner.children.push(MarkupNode::Text(text.to_string()));
    }

    fn finish(self) -> Result<Book> {
        if let Some(frame) = self.stack.last() {
            let what = match frame.kind {
                FrameKind::Root { .. } => "usx",
                FrameKind::Identification { .. } => "book",
                FrameKind::Para { .. } => "para",
                FrameKind::Char { .. } => "char",
                FrameKind::Note { .. } => "note",
                FrameKind::CrossReference { .. } => "ref",
                FrameKind::Marker => "marker",
                FrameKind::Transparent => "element",
            };
            return Err(Error::MalformedMarkup(format!(
                "unexpected end of document inside <{what}>"
            )));
        }
        self.book
            .ok_or_else(|| Error::MalformedMarkup("document has no <usx> root".to_string()))
    }
}

/// Decoded attributes of one element.
struct Attrs(Vec<(String, String)>);

impl Attrs {
    fn read(e: &BytesStart<'_>, element: &str) -> Result<Self> {
        let mut pairs = Vec::new();
        for attr in e.attributes() {
            let attr = attr.map_err(|err| {
                Error::MalformedMarkup(format!("bad attribute on <{element}>: {err}"))
            })?;
            let key = String::from_utf8_lossy(local_name(attr.key.as_ref())).into_owned();
            let raw = String::from_utf8_lossy(&attr.value);
            pairs.push((key, unescape_attr(&raw).into_owned()));
        }
        Ok(Self(pairs))
    }

    fn get(&self, key: &str) -> Option<String> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
    }

    fn get_or_default(&self, key: &str) -> String {
        self.get(key).unwrap_or_default()
    }

    /// Chapter/verse marker fields; start markers must carry a number.
    fn marker(&self, element: &str) -> Result<Marker> {
        let marker = Marker {
            style: self.get("style").unwrap_or_else(|| match element {
                "chapter" => "c".to_string(),
                _ => "v".to_string(),
            }),
            number: self.get("number"),
            start_id: self.get("sid"),
            end_id: self.get("eid"),
        };
        if marker.number.is_none() && marker.end_id.is_none() {
            return Err(Error::MalformedMarkup(format!(
                "<{element}> is missing the number attribute"
            )));
        }
        Ok(marker)
    }
}

/// Extract local name from namespaced XML name (e.g., "usx:para" -> "para").
fn local_name(name: &[u8]) -> &[u8] {
    name.iter()
        .rposition(|&b| b == b':')
        .map(|i| &name[i + 1..])
        .unwrap_or(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(xml: &str) -> Result<Book> {
        parse_usx(xml.as_bytes(), &ParseOptions::default())
    }

    fn wrap(body: &str) -> String {
        format!(r#"<usx version="3.0"><book code="GEN" style="id">Genesis</book>{body}</usx>"#)
    }

    #[test]
    fn test_parse_minimal_book() {
        let book = parse(&wrap("")).unwrap();
        assert_eq!(book.version(), "3.0");
        assert_eq!(book.metadata().book_code, "GEN");
        assert_eq!(book.metadata().bible_version, "3.0");
        let id = book.identification().unwrap();
        assert_eq!(id.name, "Genesis");
        assert_eq!(id.style, "id");
    }

    #[test]
    fn test_mixed_content_order() {
        let book = parse(&wrap(
            r#"<para style="p">In the beginning <verse number="1" style="v"/>God created</para>"#,
        ))
        .unwrap();
        let MarkupNode::Para(para) = &book.content()[1] else {
            panic!("expected para");
        };
        assert_eq!(para.content.len(), 3);
        assert_eq!(para.content[0], MarkupNode::Text("In the beginning ".to_string()));
        assert!(matches!(para.content[1], MarkupNode::Verse(_)));
        assert_eq!(para.content[2], MarkupNode::Text("God created".to_string()));
    }

    #[test]
    fn test_adjacent_text_and_entities_merge() {
        let book = parse(&wrap(r#"<para style="p">Cain &amp; Abel<![CDATA[ <b>]]></para>"#)).unwrap();
        let MarkupNode::Para(para) = &book.content()[1] else {
            panic!("expected para");
        };
        assert_eq!(para.content, vec![MarkupNode::Text("Cain & Abel <b>".to_string())]);
    }

    #[test]
    fn test_whitespace_between_blocks_dropped() {
        let book = parse(&wrap("\n  <para style=\"p\"> a </para>\n")).unwrap();
        assert_eq!(book.content().len(), 2);
        let MarkupNode::Para(para) = &book.content()[1] else {
            panic!("expected para");
        };
        assert_eq!(para.content, vec![MarkupNode::Text(" a ".to_string())]);
    }

    #[test]
    fn test_char_text_and_strong() {
        let book = parse(&wrap(
            r#"<para style="p"><w strong="H430">God</w> <char style="wj" closed="false">I <char style="nd">am</char></char></para>"#,
        ))
        .unwrap();
        let MarkupNode::Para(para) = &book.content()[1] else {
            panic!("expected para");
        };
        let MarkupNode::Char(w) = &para.content[0] else {
            panic!("expected w");
        };
        assert_eq!(w.style, "w");
        assert_eq!(w.strong.as_deref(), Some("H430"));
        let MarkupNode::Char(wj) = &para.content[2] else {
            panic!("expected char");
        };
        assert_eq!(wj.text, "I am");
        assert!(!wj.closed);
        assert_eq!(wj.content.len(), 2);
    }

    #[test]
    fn test_nested_note_and_ref() {
        let book = parse(&wrap(
            r#"<para style="p">text<note style="f" caller="+"><char style="ft">see <ref loc="GEN 2:4">2:4</ref></char></note></para>"#,
        ))
        .unwrap();
        let MarkupNode::Para(para) = &book.content()[1] else {
            panic!("expected para");
        };
        let MarkupNode::Note(note) = &para.content[1] else {
            panic!("expected note");
        };
        assert_eq!(note.caller, "+");
        let MarkupNode::Char(ft) = &note.content[0] else {
            panic!("expected char");
        };
        let MarkupNode::CrossReference(xref) = &ft.content[1] else {
            panic!("expected ref");
        };
        assert_eq!(xref.location, "GEN 2:4");
        assert_eq!(ft.text, "see 2:4");
    }

    #[test]
    fn test_unknown_element_lenient_keeps_children() {
        let book = parse(&wrap(
            r#"<para style="p">a<figure>b<verse number="2" style="v"/></figure>c</para>"#,
        ))
        .unwrap();
        let MarkupNode::Para(para) = &book.content()[1] else {
            panic!("expected para");
        };
        // "a" and "b" are separate runs: an element sat between them
        assert_eq!(para.content.len(), 4);
        assert_eq!(para.content[0], MarkupNode::Text("a".to_string()));
        assert_eq!(para.content[1], MarkupNode::Text("b".to_string()));
        assert!(matches!(para.content[2], MarkupNode::Verse(_)));
        assert_eq!(para.content[3], MarkupNode::Text("c".to_string()));
    }

    #[test]
    fn test_marker_with_nested_element_keeps_order() {
        let book = parse(&wrap(
            r#"<para style="p"><verse number="1" style="v"><char style="wj">a</char></verse>b</para>"#,
        ))
        .unwrap();
        let MarkupNode::Para(para) = &book.content()[1] else {
            panic!("expected para");
        };
        assert_eq!(para.content.len(), 3);
        assert!(matches!(para.content[0], MarkupNode::Verse(_)));
        assert!(matches!(&para.content[1], MarkupNode::Char(c) if c.text == "a"));
        assert_eq!(para.content[2], MarkupNode::Text("b".to_string()));
    }

    #[test]
    fn test_marker_with_end_tag_ignores_own_text() {
        let book = parse(&wrap(
            r#"<para style="p">x<verse number="2" style="v">2</verse>y</para>"#,
        ))
        .unwrap();
        let MarkupNode::Para(para) = &book.content()[1] else {
            panic!("expected para");
        };
        assert_eq!(para.content.len(), 3);
        assert_eq!(para.content[0], MarkupNode::Text("x".to_string()));
        assert!(matches!(&para.content[1], MarkupNode::Verse(v) if v.number_str() == "2"));
        assert_eq!(para.content[2], MarkupNode::Text("y".to_string()));
    }

    #[test]
    fn test_unknown_element_strict_fails() {
        let err = parse_usx(
            wrap(r#"<para style="p"><figure/></para>"#).as_bytes(),
            &ParseOptions::new().strict(true),
        )
        .unwrap_err();
        assert!(matches!(err, Error::UnsupportedElement(name) if name == "figure"));
    }

    #[test]
    fn test_missing_book_code_fails() {
        let err = parse(r#"<usx version="3.0"><book style="id"/></usx>"#).unwrap_err();
        assert!(matches!(err, Error::MalformedMarkup(_)));
    }

    #[test]
    fn test_missing_identification_fails() {
        let err = parse(r#"<usx version="3.0"><para style="p">x</para></usx>"#).unwrap_err();
        assert!(matches!(err, Error::MalformedMarkup(_)));
    }

    #[test]
    fn test_missing_chapter_number_fails() {
        let err = parse(&wrap(r#"<chapter style="c"/>"#)).unwrap_err();
        assert!(matches!(err, Error::MalformedMarkup(_)));
    }

    #[test]
    fn test_end_markers_need_no_number() {
        let book = parse(&wrap(
            r#"<chapter number="1" style="c" sid="GEN 1"/><para style="p"><verse number="1" style="v" sid="GEN 1:1"/>x<verse eid="GEN 1:1"/></para><chapter eid="GEN 1"/>"#,
        ))
        .unwrap();
        let MarkupNode::Chapter(end) = &book.content()[3] else {
            panic!("expected chapter end");
        };
        assert!(end.is_end());
    }

    #[test]
    fn test_malformed_number_is_kept() {
        let book = parse(&wrap(r#"<chapter number="one" style="c"/>"#)).unwrap();
        let MarkupNode::Chapter(chapter) = &book.content()[1] else {
            panic!("expected chapter");
        };
        assert_eq!(chapter.number_str(), "one");
        assert!(chapter.number().is_err());
    }

    #[test]
    fn test_not_well_formed_fails() {
        assert!(matches!(
            parse(r#"<usx version="3.0"><book code="GEN">x</usx>"#).unwrap_err(),
            Error::MalformedMarkup(_)
        ));
        assert!(matches!(
            parse(r#"<usx version="3.0"><book code="GEN">x</book>"#).unwrap_err(),
            Error::MalformedMarkup(_)
        ));
        assert!(matches!(parse("").unwrap_err(), Error::MalformedMarkup(_)));
        assert!(matches!(
            parse(r#"<html><book code="GEN"/></html>"#).unwrap_err(),
            Error::MalformedMarkup(_)
        ));
    }

    #[test]
    fn test_options_populate_metadata() {
        let options = ParseOptions::new()
            .with_language("zh-Hant")
            .with_bible_version("CUV")
            .with_version_description("Chinese Union Version");
        let book = parse_usx(wrap("").as_bytes(), &options).unwrap();
        let meta = book.metadata();
        assert_eq!(meta.iso_language, "zh-Hant");
        assert_eq!(meta.bible_version, "CUV");
        assert_eq!(meta.version_description, "Chinese Union Version");
        assert!(meta.is_cjk());
    }

    #[test]
    fn test_metadata_snapshot_is_independent() {
        let book = parse(&wrap("")).unwrap();
        let mut snapshot = book.metadata();
        snapshot.book_code.push_str("X");
        assert_eq!(book.metadata().book_code, "GEN");
    }

    #[test]
    fn test_parse_from_reader() {
        let xml = wrap(r#"<para style="p">x</para>"#);
        let book = parse_usx_reader(std::io::Cursor::new(xml.into_bytes()), &ParseOptions::default())
            .unwrap();
        assert_eq!(book.content().len(), 2);
    }
}
