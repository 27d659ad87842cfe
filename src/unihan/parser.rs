//! Parser for tab-delimited Unihan data files.
//!
//! Each record is `U+XXXX<TAB>fieldName<TAB>value`. Lines starting with `#`
//! and blank lines are ignored. A record whose codepoint does not parse, or
//! that lacks a field, is skipped and reported in [`ParseReport::skipped`].

use std::fmt;
use std::io::BufRead;

use memchr::memchr;

use crate::error::{Error, Result};

use super::codepoint::Codepoint;
use super::field::UnihanField;
use super::lookup::{UnihanFieldDictionary, UnihanLookup};

/// Orientation of the lookup built by [`parse_unihan`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Shape {
    #[default]
    CodepointMajor,
    FieldMajor,
}

/// A lookup in the requested orientation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    CodepointMajor(UnihanLookup),
    FieldMajor(UnihanFieldDictionary),
}

/// Why a line was skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    InvalidCodepoint(String),
    MissingFields,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::InvalidCodepoint(raw) => write!(f, "invalid codepoint {raw:?}"),
            SkipReason::MissingFields => f.write_str("expected three tab-separated fields"),
        }
    }
}

/// A record that was not loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedLine {
    /// 1-based line number.
    pub line: usize,
    pub reason: SkipReason,
}

/// A parsed lookup and what was left out of it.
#[derive(Debug, Clone)]
pub struct ParseReport<T> {
    pub lookup: T,
    /// Records loaded.
    pub records: usize,
    pub skipped: Vec<SkippedLine>,
}

impl<T> ParseReport<T> {
    pub fn skip_count(&self) -> usize {
        self.skipped.len()
    }
}

/// Parse a Unihan file into the requested shape.
pub fn parse_unihan<R: BufRead>(reader: R, shape: Shape) -> Result<ParseReport<Lookup>> {
    Ok(match shape {
        Shape::CodepointMajor => {
            let report = parse_codepoint_major(reader)?;
            ParseReport {
                lookup: Lookup::CodepointMajor(report.lookup),
                records: report.records,
                skipped: report.skipped,
            }
        }
        Shape::FieldMajor => {
            let report = parse_field_major(reader)?;
            ParseReport {
                lookup: Lookup::FieldMajor(report.lookup),
                records: report.records,
                skipped: report.skipped,
            }
        }
    })
}

/// Parse into codepoint → field → values.
pub fn parse_codepoint_major<R: BufRead>(reader: R) -> Result<ParseReport<UnihanLookup>> {
    let mut lookup = UnihanLookup::new();
    let (records, skipped) =
        for_each_record(reader, |cp, field, value| lookup.push(cp, field, value))?;
    Ok(ParseReport {
        lookup,
        records,
        skipped,
    })
}

/// Parse into field → codepoint → values.
pub fn parse_field_major<R: BufRead>(reader: R) -> Result<ParseReport<UnihanFieldDictionary>> {
    let mut dict = UnihanFieldDictionary::new();
    let (records, skipped) =
        for_each_record(reader, |cp, field, value| dict.push(cp, field, value))?;
    Ok(ParseReport {
        lookup: dict,
        records,
        skipped,
    })
}

fn for_each_record<R, F>(reader: R, mut sink: F) -> Result<(usize, Vec<SkippedLine>)>
where
    R: BufRead,
    F: FnMut(Codepoint, UnihanField, String),
{
    let mut records = 0;
    let mut skipped = Vec::new();

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let line_no = index + 1;
        let line = if line_no == 1 {
            line.trim_start_matches('\u{FEFF}')
        } else {
            line.as_str()
        };
        let line = line.strip_suffix('\r').unwrap_or(line);

        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }

        match parse_record(line) {
            Ok((codepoint, field, value)) => {
                sink(codepoint, field, value.to_string());
                records += 1;
            }
            Err(reason) => {
                tracing::debug!(line = line_no, %reason, "skipping Unihan record");
                skipped.push(SkippedLine {
                    line: line_no,
                    reason,
                });
            }
        }
    }

    if !skipped.is_empty() {
        tracing::info!(records, skipped = skipped.len(), "parsed Unihan data with skipped lines");
    }
    Ok((records, skipped))
}

fn parse_record(line: &str) -> std::result::Result<(Codepoint, UnihanField, &str), SkipReason> {
    let bytes = line.as_bytes();
    let first = memchr(b'\t', bytes).ok_or(SkipReason::MissingFields)?;
    let second = memchr(b'\t', &bytes[first + 1..])
        .map(|i| i + first + 1)
        .ok_or(SkipReason::MissingFields)?;

    let raw_codepoint = line[..first].trim();
    let field_name = line[first + 1..second].trim();
    let value = &line[second + 1..];

    if field_name.is_empty() {
        return Err(SkipReason::MissingFields);
    }

    let codepoint = raw_codepoint.parse::<Codepoint>().map_err(|e| match e {
        Error::InvalidCodepoint(raw) => SkipReason::InvalidCodepoint(raw),
        other => SkipReason::InvalidCodepoint(other.to_string()),
    })?;

    Ok((codepoint, UnihanField::parse(field_name), value))
}
