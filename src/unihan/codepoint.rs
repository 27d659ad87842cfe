//! Integer codepoints and their `U+XXXX` notation.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::{Error, Result};

/// A Unicode scalar value stored as an integer.
///
/// Parsing never renders text; use [`Codepoint::to_char`] or
/// [`Codepoint::to_utf16`] at presentation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Codepoint(u32);

impl Codepoint {
    pub const MAX: u32 = 0x10FFFF;

    /// Fails with [`Error::InvalidCodepoint`] for surrogates and values
    /// beyond U+10FFFF.
    pub fn new(value: u32) -> Result<Self> {
        if value > Self::MAX || (0xD800..=0xDFFF).contains(&value) {
            return Err(Error::InvalidCodepoint(format!("{value:#X}")));
        }
        Ok(Self(value))
    }

    pub fn value(self) -> u32 {
        self.0
    }

    pub fn to_char(self) -> Option<char> {
        char::from_u32(self.0)
    }

    /// UTF-16 code units; supplementary-plane values become a surrogate pair.
    pub fn to_utf16(self) -> Vec<u16> {
        let mut buf = [0u16; 2];
        match self.to_char() {
            Some(c) => c.encode_utf16(&mut buf).to_vec(),
            None => Vec::new(),
        }
    }

    /// Whether the codepoint lies outside the Basic Multilingual Plane.
    pub fn is_supplementary(self) -> bool {
        self.0 > 0xFFFF
    }
}

impl From<char> for Codepoint {
    fn from(c: char) -> Self {
        Self(c as u32)
    }
}

impl FromStr for Codepoint {
    type Err = Error;

    /// Parse `U+XXXX` notation.
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::InvalidCodepoint(s.to_string());
        let hex = s
            .strip_prefix("U+")
            .or_else(|| s.strip_prefix("u+"))
            .ok_or_else(invalid)?;
        if hex.is_empty() || hex.len() > 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        let value = u32::from_str_radix(hex, 16).map_err(|_| invalid())?;
        Self::new(value).map_err(|_| invalid())
    }
}

impl fmt::Display for Codepoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "U+{:04X}", self.0)
    }
}
