//! Flat segment projection used for chapter/verse random access.

use serde::{Deserialize, Serialize};

use crate::usx::Book;

use super::{Block, Leaf, RenderContext, RenderSink, Rendered, walk};

/// Structural category of a [`ScriptureSegment`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentCategory {
    Text,
    ChapterMarker,
    VerseMarker,
    Footnote,
    CrossReference,
    Milestone,
    LineBreak,
}

/// Smallest unit of rendered content, in document order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptureSegment {
    pub text: String,
    pub category: SegmentCategory,
}

impl ScriptureSegment {
    pub fn new(text: impl Into<String>, category: SegmentCategory) -> Self {
        Self {
            text: text.into(),
            category,
        }
    }

    pub fn is_chapter_marker(&self) -> bool {
        self.category == SegmentCategory::ChapterMarker
    }

    pub fn is_verse_marker(&self) -> bool {
        self.category == SegmentCategory::VerseMarker
    }
}

/// Project a book into its segment sequence.
///
/// Containers emit nothing themselves; each text run and each start marker
/// becomes one segment. End markers and the book identification are omitted.
pub fn render_segments(book: &Book) -> Rendered<Vec<ScriptureSegment>> {
    walk(book, SegmentSink::default())
}

#[derive(Default)]
struct SegmentSink {
    segments: Vec<ScriptureSegment>,
}

impl RenderSink for SegmentSink {
    type Output = Vec<ScriptureSegment>;

    fn open_block(&mut self, _block: Block<'_>, _cx: &mut RenderContext) {}

    fn close_block(&mut self, _block: Block<'_>, _cx: &mut RenderContext) {}

    fn append_text(&mut self, text: &str, cx: &mut RenderContext) {
        let category = if cx.in_note() {
            SegmentCategory::Footnote
        } else if cx.in_cross_reference() {
            SegmentCategory::CrossReference
        } else {
            SegmentCategory::Text
        };
        self.segments.push(ScriptureSegment::new(text, category));
    }

    fn leaf(&mut self, leaf: Leaf<'_>, _cx: &mut RenderContext) {
        let segment = match leaf {
            Leaf::Identification(_) => return,
            Leaf::Chapter(marker) if marker.is_end() => return,
            Leaf::Chapter(marker) => {
                ScriptureSegment::new(marker.number_str(), SegmentCategory::ChapterMarker)
            }
            Leaf::Verse(marker) if marker.is_end() => return,
            Leaf::Verse(marker) => {
                ScriptureSegment::new(marker.number_str(), SegmentCategory::VerseMarker)
            }
            Leaf::Milestone(milestone) => {
                ScriptureSegment::new(milestone.style.as_str(), SegmentCategory::Milestone)
            }
            Leaf::LineBreak(_) => ScriptureSegment::new("\n", SegmentCategory::LineBreak),
        };
        self.segments.push(segment);
    }

    fn finish(self, _cx: &mut RenderContext) -> Vec<ScriptureSegment> {
        self.segments
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usx::{ParseOptions, parse_usx};

    fn segments(body: &str) -> Vec<ScriptureSegment> {
        let xml = format!(r#"<usx version="3.0"><book code="GEN" style="id">Genesis</book>{body}</usx>"#);
        let book = parse_usx(xml.as_bytes(), &ParseOptions::default()).unwrap();
        render_segments(&book).output
    }

    fn categories(segments: &[ScriptureSegment]) -> Vec<SegmentCategory> {
        segments.iter().map(|s| s.category).collect()
    }

    #[test]
    fn test_text_verse_text() {
        let segs = segments(
            r#"<para style="p">In the beginning <verse number="1" style="v"/>God created...</para>"#,
        );
        assert_eq!(
            categories(&segs),
            [
                SegmentCategory::Text,
                SegmentCategory::VerseMarker,
                SegmentCategory::Text
            ]
        );
        assert_eq!(segs[0].text, "In the beginning ");
        assert_eq!(segs[1].text, "1");
        assert_eq!(segs[2].text, "God created...");
    }

    #[test]
    fn test_note_and_ref_categories() {
        let segs = segments(
            r#"<para style="p">x<note style="f" caller="+">see <ref loc="GEN 2:4">2:4</ref></note><ref loc="EXO 1:1">Ex 1:1</ref><optbreak/></para>"#,
        );
        assert_eq!(
            categories(&segs),
            [
                SegmentCategory::Text,
                SegmentCategory::Footnote,
                SegmentCategory::Footnote,
                SegmentCategory::CrossReference,
                SegmentCategory::LineBreak,
            ]
        );
    }

    #[test]
    fn test_end_markers_and_identification_omitted() {
        let segs = segments(
            r#"<chapter number="1" style="c" sid="GEN 1"/><para style="p"><verse number="1" style="v" sid="GEN 1:1"/>x<verse eid="GEN 1:1"/><ms style="ts"/></para><chapter eid="GEN 1"/>"#,
        );
        assert_eq!(
            segs,
            [
                ScriptureSegment::new("1", SegmentCategory::ChapterMarker),
                ScriptureSegment::new("1", SegmentCategory::VerseMarker),
                ScriptureSegment::new("x", SegmentCategory::Text),
                ScriptureSegment::new("ts", SegmentCategory::Milestone),
            ]
        );
    }

    #[test]
    fn test_segment_json_shape() {
        let seg = ScriptureSegment::new("1", SegmentCategory::ChapterMarker);
        let json = serde_json::to_string(&seg).unwrap();
        assert_eq!(json, r#"{"text":"1","category":"chapter_marker"}"#);
    }
}
