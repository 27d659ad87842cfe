//! Chapter ranges over a segment sequence.
//!
//! Each range starts at its chapter marker segment and runs up to the next
//! marker, so the ranges in order tile the whole sequence. Segments before the
//! first marker form chapter 0 when there are any.

use std::collections::HashMap;
use std::ops::Range;

use crate::render::{Rendered, ScriptureSegment, render_segments};
use crate::usx::Book;

/// One contiguous chapter range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterRange {
    /// `None` when the marker text is not a number.
    pub number: Option<u32>,
    pub start: usize,
    pub end: usize,
}

impl ChapterRange {
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Chapter number → range index, built in one scan and read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChapterIndex {
    ranges: Vec<ChapterRange>,
    by_number: HashMap<u32, usize>,
    len: usize,
}

impl ChapterIndex {
    pub fn build(segments: &[ScriptureSegment]) -> Self {
        let mut ranges: Vec<ChapterRange> = Vec::new();

        for (i, segment) in segments.iter().enumerate() {
            if !segment.is_chapter_marker() {
                continue;
            }
            match ranges.last_mut() {
                Some(open) => open.end = i,
                None if i > 0 => ranges.push(ChapterRange {
                    number: Some(0),
                    start: 0,
                    end: i,
                }),
                None => {}
            }
            ranges.push(ChapterRange {
                number: segment.text.trim().parse().ok(),
                start: i,
                end: segments.len(),
            });
        }

        if ranges.is_empty() && !segments.is_empty() {
            ranges.push(ChapterRange {
                number: Some(0),
                start: 0,
                end: segments.len(),
            });
        }

        let mut by_number = HashMap::with_capacity(ranges.len());
        for (slot, range) in ranges.iter().enumerate() {
            if let Some(number) = range.number {
                if by_number.contains_key(&number) {
                    tracing::debug!(chapter = number, "duplicate chapter number; keeping first");
                    continue;
                }
                by_number.insert(number, slot);
            }
        }

        Self {
            ranges,
            by_number,
            len: segments.len(),
        }
    }

    /// The range of chapter `number`, if the book has one.
    pub fn range(&self, number: u32) -> Option<Range<usize>> {
        self.by_number
            .get(&number)
            .map(|&slot| self.ranges[slot].range())
    }

    /// Segments of chapter `number`; empty when there is no such chapter.
    pub fn chapter<'s>(&self, segments: &'s [ScriptureSegment], number: u32) -> &'s [ScriptureSegment] {
        self.range(number)
            .and_then(|range| segments.get(range))
            .unwrap_or(&[])
    }

    /// The whole book as one slice.
    pub fn book<'s>(&self, segments: &'s [ScriptureSegment]) -> &'s [ScriptureSegment] {
        segments.get(..self.len).unwrap_or(segments)
    }

    /// All ranges in document order, including unnumbered ones.
    pub fn ranges(&self) -> &[ChapterRange] {
        &self.ranges
    }

    /// Addressable chapter numbers in document order.
    pub fn chapters(&self) -> impl Iterator<Item = u32> + '_ {
        self.ranges
            .iter()
            .enumerate()
            .filter_map(|(slot, range)| {
                let number = range.number?;
                (self.by_number.get(&number) == Some(&slot)).then_some(number)
            })
    }

    pub fn contains(&self, number: u32) -> bool {
        self.by_number.contains_key(&number)
    }
}

/// Segments of one book together with their chapter index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexedBook {
    segments: Vec<ScriptureSegment>,
    index: ChapterIndex,
}

impl IndexedBook {
    pub fn new(segments: Vec<ScriptureSegment>) -> Self {
        let index = ChapterIndex::build(&segments);
        Self { segments, index }
    }

    /// Render `book` to segments and index them.
    pub fn from_book(book: &Book) -> Rendered<Self> {
        let Rendered { output, warnings } = render_segments(book);
        Rendered {
            output: Self::new(output),
            warnings,
        }
    }

    pub fn chapter(&self, number: u32) -> &[ScriptureSegment] {
        self.index.chapter(&self.segments, number)
    }

    pub fn book(&self) -> &[ScriptureSegment] {
        self.index.book(&self.segments)
    }

    /// Segments from the marker of `verse` in `chapter` up to the next verse
    /// or chapter marker. Verse ranges such as `16-17` match their first
    /// number.
    pub fn verse(&self, chapter: u32, verse: u32) -> &[ScriptureSegment] {
        let segments = self.chapter(chapter);
        let Some(start) = segments
            .iter()
            .position(|s| s.is_verse_marker() && leading_number(&s.text) == Some(verse))
        else {
            return &[];
        };
        let end = segments[start + 1..]
            .iter()
            .position(|s| s.is_verse_marker() || s.is_chapter_marker())
            .map_or(segments.len(), |offset| start + 1 + offset);
        &segments[start..end]
    }

    pub fn chapters(&self) -> impl Iterator<Item = u32> + '_ {
        self.index.chapters()
    }

    pub fn index(&self) -> &ChapterIndex {
        &self.index
    }

    pub fn segments(&self) -> &[ScriptureSegment] {
        &self.segments
    }

    pub fn into_segments(self) -> Vec<ScriptureSegment> {
        self.segments
    }
}

fn leading_number(text: &str) -> Option<u32> {
    let text = text.trim();
    let end = text
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(text.len());
    text[..end].parse().ok()
}
