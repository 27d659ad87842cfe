//! Error types for lectio operations.

use thiserror::Error;

/// Errors that can occur while parsing, rendering or sharding.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The markup is not well-formed XML or lacks a required structural field.
    #[error("Malformed markup: {0}")]
    MalformedMarkup(String),

    /// An element outside the known set was met while parsing in strict mode.
    #[error("Unsupported element: <{0}>")]
    UnsupportedElement(String),

    /// A chapter or verse number attribute that does not parse as an integer.
    #[error("Invalid {field} number: {value:?}")]
    InvalidNumber { field: &'static str, value: String },

    #[error("Invalid codepoint: {0:?}")]
    InvalidCodepoint(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Verse {verse} has more than {limit} footnotes")]
    FootnoteLimit { verse: String, limit: usize },
}

pub type Result<T> = std::result::Result<T, Error>;
