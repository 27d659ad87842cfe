//! In-memory gloss lookups in both orientations.

use std::collections::BTreeMap;
use std::collections::btree_map;

use crate::error::{Error, Result};

use super::codepoint::Codepoint;
use super::field::UnihanField;

/// Values of every field for one codepoint.
pub type FieldValues = BTreeMap<UnihanField, Vec<String>>;

/// Values of one field, sorted by codepoint.
pub type CodepointValues = BTreeMap<Codepoint, Vec<String>>;

/// Codepoint-major lookup: codepoint → field → values in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnihanLookup {
    entries: BTreeMap<Codepoint, FieldValues>,
}

impl UnihanLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, codepoint: Codepoint, field: UnihanField, value: String) {
        self.entries
            .entry(codepoint)
            .or_default()
            .entry(field)
            .or_default()
            .push(value);
    }

    pub fn get(&self, codepoint: Codepoint) -> Option<&FieldValues> {
        self.entries.get(&codepoint)
    }

    /// Values of `field` for `codepoint`, empty when absent.
    pub fn values(&self, codepoint: Codepoint, field: &UnihanField) -> &[String] {
        self.entries
            .get(&codepoint)
            .and_then(|fields| fields.get(field))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Number of distinct codepoints.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, Codepoint, FieldValues> {
        self.entries.iter()
    }

    /// Re-orient as field → codepoint → values.
    pub fn to_field_major(&self) -> UnihanFieldDictionary {
        let mut dict = UnihanFieldDictionary::new();
        for (&codepoint, fields) in &self.entries {
            for (field, values) in fields {
                dict.fields
                    .entry(field.clone())
                    .or_default()
                    .insert(codepoint, values.clone());
            }
        }
        dict
    }
}

/// Field-major dictionary: field → codepoint (sorted) → values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnihanFieldDictionary {
    fields: BTreeMap<UnihanField, CodepointValues>,
}

impl UnihanFieldDictionary {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, codepoint: Codepoint, field: UnihanField, value: String) {
        self.fields
            .entry(field)
            .or_default()
            .entry(codepoint)
            .or_default()
            .push(value);
    }

    pub fn get(&self, field: &UnihanField) -> Option<&CodepointValues> {
        self.fields.get(field)
    }

    /// Entries of `field`; fails with [`Error::InvalidArgument`] when the
    /// dictionary holds no such field.
    pub fn field(&self, field: &UnihanField) -> Result<&CodepointValues> {
        self.fields
            .get(field)
            .ok_or_else(|| Error::InvalidArgument(format!("no entries for field {field}")))
    }

    pub fn fields(&self) -> impl Iterator<Item = &UnihanField> {
        self.fields.keys()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, UnihanField, CodepointValues> {
        self.fields.iter()
    }

    /// Keep only the listed fields.
    pub fn retain_fields(&mut self, keep: &[UnihanField]) {
        self.fields.retain(|field, _| keep.contains(field));
    }

    /// Number of (field, codepoint) entries.
    pub fn entry_count(&self) -> usize {
        self.fields.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cp(value: u32) -> Codepoint {
        Codepoint::new(value).unwrap()
    }

    #[test]
    fn test_repeated_field_appends() {
        let mut lookup = UnihanLookup::new();
        lookup.push(cp(0x4E2D), UnihanField::Mandarin, "zhōng".to_string());
        lookup.push(cp(0x4E2D), UnihanField::Mandarin, "zhòng".to_string());
        assert_eq!(
            lookup.values(cp(0x4E2D), &UnihanField::Mandarin),
            ["zhōng", "zhòng"]
        );
        assert!(lookup.values(cp(0x4E2D), &UnihanField::Cantonese).is_empty());
    }

    #[test]
    fn test_to_field_major() {
        let mut lookup = UnihanLookup::new();
        lookup.push(cp(0x4E01), UnihanField::Definition, "male adult".to_string());
        lookup.push(cp(0x4E00), UnihanField::Definition, "one".to_string());
        lookup.push(cp(0x4E00), UnihanField::Mandarin, "yī".to_string());

        let dict = lookup.to_field_major();
        assert_eq!(dict.entry_count(), 3);
        let defs = dict.field(&UnihanField::Definition).unwrap();
        let keys: Vec<_> = defs.keys().map(|c| c.value()).collect();
        assert_eq!(keys, [0x4E00, 0x4E01]);
        assert!(matches!(
            dict.field(&UnihanField::Korean),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_retain_fields() {
        let mut dict = UnihanFieldDictionary::new();
        dict.push(cp(0x4E00), UnihanField::Definition, "one".to_string());
        dict.push(cp(0x4E00), UnihanField::Mandarin, "yī".to_string());
        dict.retain_fields(&[UnihanField::Mandarin]);
        assert_eq!(dict.fields().collect::<Vec<_>>(), [&UnihanField::Mandarin]);
    }
}
