//! Unihan field names.

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};

/// A Unihan property name such as `kMandarin`.
///
/// Names outside the known set are kept verbatim in [`UnihanField::Unknown`]
/// so nothing in the source file is lost.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum UnihanField {
    Definition,
    Mandarin,
    Cantonese,
    HanyuPinyin,
    HanyuPinlu,
    Xhc1983,
    Tang,
    JapaneseOn,
    JapaneseKun,
    Japanese,
    Korean,
    Hangul,
    Vietnamese,
    TotalStrokes,
    RsUnicode,
    SimplifiedVariant,
    TraditionalVariant,
    SemanticVariant,
    SpecializedSemanticVariant,
    ZVariant,
    Frequency,
    GradeLevel,
    Phonetic,
    Unknown(String),
}

impl UnihanField {
    /// Every recognized field, in sort order.
    pub const KNOWN: [UnihanField; 23] = [
        UnihanField::Definition,
        UnihanField::Mandarin,
        UnihanField::Cantonese,
        UnihanField::HanyuPinyin,
        UnihanField::HanyuPinlu,
        UnihanField::Xhc1983,
        UnihanField::Tang,
        UnihanField::JapaneseOn,
        UnihanField::JapaneseKun,
        UnihanField::Japanese,
        UnihanField::Korean,
        UnihanField::Hangul,
        UnihanField::Vietnamese,
        UnihanField::TotalStrokes,
        UnihanField::RsUnicode,
        UnihanField::SimplifiedVariant,
        UnihanField::TraditionalVariant,
        UnihanField::SemanticVariant,
        UnihanField::SpecializedSemanticVariant,
        UnihanField::ZVariant,
        UnihanField::Frequency,
        UnihanField::GradeLevel,
        UnihanField::Phonetic,
    ];

    /// Map a field name to its variant; never fails.
    pub fn parse(name: &str) -> Self {
        match name {
            "kDefinition" => UnihanField::Definition,
            "kMandarin" => UnihanField::Mandarin,
            "kCantonese" => UnihanField::Cantonese,
            "kHanyuPinyin" => UnihanField::HanyuPinyin,
            "kHanyuPinlu" => UnihanField::HanyuPinlu,
            "kXHC1983" => UnihanField::Xhc1983,
            "kTang" => UnihanField::Tang,
            "kJapaneseOn" => UnihanField::JapaneseOn,
            "kJapaneseKun" => UnihanField::JapaneseKun,
            "kJapanese" => UnihanField::Japanese,
            "kKorean" => UnihanField::Korean,
            "kHangul" => UnihanField::Hangul,
            "kVietnamese" => UnihanField::Vietnamese,
            "kTotalStrokes" => UnihanField::TotalStrokes,
            "kRSUnicode" => UnihanField::RsUnicode,
            "kSimplifiedVariant" => UnihanField::SimplifiedVariant,
            "kTraditionalVariant" => UnihanField::TraditionalVariant,
            "kSemanticVariant" => UnihanField::SemanticVariant,
            "kSpecializedSemanticVariant" => UnihanField::SpecializedSemanticVariant,
            "kZVariant" => UnihanField::ZVariant,
            "kFrequency" => UnihanField::Frequency,
            "kGradeLevel" => UnihanField::GradeLevel,
            "kPhonetic" => UnihanField::Phonetic,
            other => UnihanField::Unknown(other.to_string()),
        }
    }

    /// The field name as it appears in the data file.
    pub fn name(&self) -> &str {
        match self {
            UnihanField::Definition => "kDefinition",
            UnihanField::Mandarin => "kMandarin",
            UnihanField::Cantonese => "kCantonese",
            UnihanField::HanyuPinyin => "kHanyuPinyin",
            UnihanField::HanyuPinlu => "kHanyuPinlu",
            UnihanField::Xhc1983 => "kXHC1983",
            UnihanField::Tang => "kTang",
            UnihanField::JapaneseOn => "kJapaneseOn",
            UnihanField::JapaneseKun => "kJapaneseKun",
            UnihanField::Japanese => "kJapanese",
            UnihanField::Korean => "kKorean",
            UnihanField::Hangul => "kHangul",
            UnihanField::Vietnamese => "kVietnamese",
            UnihanField::TotalStrokes => "kTotalStrokes",
            UnihanField::RsUnicode => "kRSUnicode",
            UnihanField::SimplifiedVariant => "kSimplifiedVariant",
            UnihanField::TraditionalVariant => "kTraditionalVariant",
            UnihanField::SemanticVariant => "kSemanticVariant",
            UnihanField::SpecializedSemanticVariant => "kSpecializedSemanticVariant",
            UnihanField::ZVariant => "kZVariant",
            UnihanField::Frequency => "kFrequency",
            UnihanField::GradeLevel => "kGradeLevel",
            UnihanField::Phonetic => "kPhonetic",
            UnihanField::Unknown(name) => name,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, UnihanField::Unknown(_))
    }
}

impl FromStr for UnihanField {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Infallible> {
        Ok(Self::parse(s))
    }
}

impl fmt::Display for UnihanField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for UnihanField {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}
