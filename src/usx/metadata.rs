//! Book-level metadata extracted during parsing.

use serde::Serialize;

/// Identifying metadata for one parsed book.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ScriptureBookMetadata {
    /// Three-letter book code from `<book code="…">`, e.g. `GEN`.
    pub book_code: String,
    /// ISO 639 language tag of the text.
    pub iso_language: String,
    pub bible_version: String,
    pub version_description: String,
}

impl ScriptureBookMetadata {
    /// Whether the text language is Chinese, Japanese or Korean.
    pub fn is_cjk(&self) -> bool {
        is_cjk_language(&self.iso_language)
    }
}

/// Check an ISO 639-1/639-3 tag (with optional region/script) for a CJK language.
pub fn is_cjk_language(tag: &str) -> bool {
    let primary = tag
        .split(['-', '_'])
        .next()
        .unwrap_or("")
        .to_ascii_lowercase();
    matches!(
        primary.as_str(),
        "zh" | "zho" | "chi" | "cmn" | "yue" | "ja" | "jpn" | "ko" | "kor"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cjk_detection() {
        assert!(is_cjk_language("zh"));
        assert!(is_cjk_language("zh-Hant-TW"));
        assert!(is_cjk_language("JA"));
        assert!(is_cjk_language("cmn"));
        assert!(!is_cjk_language("en"));
        assert!(!is_cjk_language(""));
    }
}
