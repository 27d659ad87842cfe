//! USX scripture markup: node model and parser.

pub mod metadata;
pub mod node;
mod parser;

pub use metadata::{ScriptureBookMetadata, is_cjk_language};
pub use node::{
    Book, ChapterMarker, CharSpan, CrossReference, Footnote, Identification, LineBreak, Marker,
    MarkupNode, Milestone, Para, VerseMarker,
};
pub use parser::{ParseOptions, parse_usx, parse_usx_reader, parse_usx_str};
