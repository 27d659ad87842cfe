//! Unihan gloss data: parsing, lookup and sharded delivery.
//!
//! ```
//! use lectio::unihan::{Codepoint, UnihanField, parse_codepoint_major};
//!
//! let data = "U+4E00\tkDefinition\tone\nU+4E00\tkMandarin\tyī\n";
//! let report = parse_codepoint_major(data.as_bytes()).unwrap();
//! let one = Codepoint::from('一');
//! assert_eq!(report.lookup.values(one, &UnihanField::Mandarin), ["yī"]);
//! ```

pub mod annotate;
pub mod codepoint;
pub mod field;
pub mod lookup;
pub mod paginate;
pub mod parser;
pub mod shard;

pub use annotate::GlossAnnotator;
pub use codepoint::Codepoint;
pub use field::UnihanField;
pub use lookup::{CodepointValues, FieldValues, UnihanFieldDictionary, UnihanLookup};
pub use paginate::{FieldPages, PaginatedDictionary, PaginationPolicy, paginate, paginate_fields};
pub use parser::{
    Lookup, ParseReport, Shape, SkipReason, SkippedLine, parse_codepoint_major, parse_field_major,
    parse_unihan,
};
pub use shard::{
    CancelToken, ShardConfig, ShardFile, ShardNaming, ShardReport, page_json, serialize_pages,
    write_shards,
};
