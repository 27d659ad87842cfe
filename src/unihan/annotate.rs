//! Reading annotations for CJK text.

use crate::render::escape_html;

use super::codepoint::Codepoint;
use super::field::UnihanField;
use super::lookup::UnihanLookup;

/// Looks up one reading field per character and wraps hits in `<ruby>`.
///
/// The lookup is borrowed read-only; any number of annotators may share it.
#[derive(Debug, Clone, Copy)]
pub struct GlossAnnotator<'a> {
    lookup: &'a UnihanLookup,
    field: &'a UnihanField,
}

impl<'a> GlossAnnotator<'a> {
    pub fn new(lookup: &'a UnihanLookup, field: &'a UnihanField) -> Self {
        Self { lookup, field }
    }

    pub fn field(&self) -> &UnihanField {
        self.field
    }

    /// First value of the configured field for `c`.
    pub fn reading(&self, c: char) -> Option<&'a str> {
        self.lookup
            .values(Codepoint::from(c), self.field)
            .first()
            .map(String::as_str)
    }

    /// Escape `text` as HTML, annotating every character that has a reading.
    pub fn ruby_html(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len() * 2);
        let mut buf = [0u8; 4];
        for c in text.chars() {
            let escaped = escape_html(c.encode_utf8(&mut buf));
            match self.reading(c) {
                Some(reading) => {
                    out.push_str("<ruby>");
                    out.push_str(&escaped);
                    out.push_str("<rt>");
                    out.push_str(&escape_html(reading));
                    out.push_str("</rt></ruby>");
                }
                None => out.push_str(&escaped),
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::unihan::parse_codepoint_major;

    #[test]
    fn test_ruby_wraps_known_characters() {
        let data = "U+4E00\tkMandarin\tyī\nU+4E8C\tkMandarin\tèr\n";
        let lookup = parse_codepoint_major(data.as_bytes()).unwrap().lookup;
        let annotator = GlossAnnotator::new(&lookup, &UnihanField::Mandarin);
        assert_eq!(annotator.reading('一'), Some("yī"));
        assert_eq!(annotator.reading('三'), None);
        assert_eq!(
            annotator.ruby_html("一<二>三"),
            "<ruby>一<rt>yī</rt></ruby>&lt;<ruby>二<rt>èr</rt></ruby>&gt;三"
        );
    }

    #[test]
    fn test_other_field_not_consulted() {
        let data = "U+4E00\tkDefinition\tone\n";
        let lookup = parse_codepoint_major(data.as_bytes()).unwrap().lookup;
        let annotator = GlossAnnotator::new(&lookup, &UnihanField::Mandarin);
        assert_eq!(annotator.ruby_html("一"), "一");
    }
}
