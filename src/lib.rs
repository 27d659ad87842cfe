//! # lectio
//!
//! Scripture markup and CJK gloss pipelines.
//!
//! ## Features
//!
//! - Parse USX scripture markup into a typed node tree
//! - Render books to Markdown, embeddable HTML with footnote anchors, or a
//!   flat segment sequence indexed by chapter
//! - Parse Unihan gloss data and publish it as paginated, precompressed JSON
//!   shards
//!
//! ## Quick Start
//!
//! ```
//! use lectio::index::IndexedBook;
//! use lectio::render::{MarkdownConfig, render_markdown};
//! use lectio::usx::{ParseOptions, parse_usx};
//!
//! let xml = br#"<usx version="3.0">
//!   <book code="GEN" style="id">Genesis</book>
//!   <chapter number="1" style="c" sid="GEN 1"/>
//!   <para style="p"><verse number="1" style="v" sid="GEN 1:1"/>In the beginning God created the heavens and the earth.<verse eid="GEN 1:1"/></para>
//!   <chapter eid="GEN 1"/>
//! </usx>"#;
//!
//! let book = parse_usx(xml, &ParseOptions::default())?;
//! assert_eq!(book.metadata().book_code, "GEN");
//!
//! let markdown = render_markdown(&book, &MarkdownConfig::default());
//! assert!(markdown.output.text.contains("1 In the beginning"));
//!
//! let indexed = IndexedBook::from_book(&book).output;
//! assert_eq!(indexed.verse(1, 1).len(), 2);
//! # Ok::<(), lectio::Error>(())
//! ```
//!
//! ## Gloss shards
//!
//! ```no_run
//! use std::fs::File;
//! use std::io::BufReader;
//! use std::path::Path;
//!
//! use lectio::unihan::{
//!     CancelToken, PaginationPolicy, ShardConfig, paginate_fields, parse_field_major, write_shards,
//! };
//!
//! let report = parse_field_major(BufReader::new(File::open("Unihan_Readings.txt")?))?;
//! let pages = paginate_fields(&report.lookup, 1000, PaginationPolicy::ByKey)?;
//! let config = ShardConfig::default().with_gzip(true).with_brotli(true);
//! write_shards(&pages, Path::new("public/unihan"), &config, &CancelToken::new())?;
//! # Ok::<(), lectio::Error>(())
//! ```

pub mod error;
pub mod footnote;
pub mod index;
pub mod render;
pub mod unihan;
pub mod usx;
pub(crate) mod util;

pub use error::{Error, Result};
pub use index::{ChapterIndex, IndexedBook};
pub use usx::{Book, MarkupNode, ParseOptions, parse_usx};
