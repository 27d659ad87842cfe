//! Fixed-size, order-stable pages over a sorted gloss field.
//!
//! Two policies decide which page an entry belongs to:
//!
//! - [`PaginationPolicy::ByKey`] uses `codepoint / page_size`. A page's
//!   membership never changes when unrelated entries are added, so page files
//!   make stable cache keys. Pages can be sparse.
//! - [`PaginationPolicy::ByOrdinal`] uses `rank / page_size` over the sorted
//!   entries. Pages are dense but every page after an insertion shifts.
//!
//! One policy and page size apply to a whole [`FieldPages`] set.

use std::collections::BTreeMap;

use crate::error::{Error, Result};

use super::codepoint::Codepoint;
use super::field::UnihanField;
use super::lookup::{CodepointValues, UnihanFieldDictionary};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PaginationPolicy {
    #[default]
    ByKey,
    ByOrdinal,
}

impl PaginationPolicy {
    /// Page index for the entry at `ordinal` with key `codepoint`.
    pub fn page_of(self, codepoint: Codepoint, ordinal: usize, page_size: u32) -> u32 {
        match self {
            PaginationPolicy::ByKey => codepoint.value() / page_size,
            PaginationPolicy::ByOrdinal => (ordinal / page_size as usize) as u32,
        }
    }
}

/// One field split into pages keyed by page index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginatedDictionary {
    policy: PaginationPolicy,
    page_size: u32,
    pages: BTreeMap<u32, CodepointValues>,
}

impl PaginatedDictionary {
    pub fn policy(&self) -> PaginationPolicy {
        self.policy
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn page(&self, index: u32) -> Option<&CodepointValues> {
        self.pages.get(&index)
    }

    pub fn pages(&self) -> impl Iterator<Item = (u32, &CodepointValues)> {
        self.pages.iter().map(|(&index, page)| (index, page))
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Total entries across all pages.
    pub fn entry_count(&self) -> usize {
        self.pages.values().map(BTreeMap::len).sum()
    }
}

/// Split sorted `entries` into pages of `page_size`.
pub fn paginate(
    entries: &CodepointValues,
    page_size: u32,
    policy: PaginationPolicy,
) -> Result<PaginatedDictionary> {
    if page_size == 0 {
        return Err(Error::InvalidArgument(
            "page size must be greater than zero".to_string(),
        ));
    }

    let mut pages: BTreeMap<u32, CodepointValues> = BTreeMap::new();
    for (ordinal, (&codepoint, values)) in entries.iter().enumerate() {
        pages
            .entry(policy.page_of(codepoint, ordinal, page_size))
            .or_default()
            .insert(codepoint, values.clone());
    }

    Ok(PaginatedDictionary {
        policy,
        page_size,
        pages,
    })
}

/// Paginated dictionaries for several fields sharing one policy and size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPages {
    policy: PaginationPolicy,
    page_size: u32,
    fields: BTreeMap<UnihanField, PaginatedDictionary>,
}

impl FieldPages {
    pub fn new(page_size: u32, policy: PaginationPolicy) -> Result<Self> {
        if page_size == 0 {
            return Err(Error::InvalidArgument(
                "page size must be greater than zero".to_string(),
            ));
        }
        Ok(Self {
            policy,
            page_size,
            fields: BTreeMap::new(),
        })
    }

    /// Add one field's pages; fails when its policy or page size differs
    /// from the set's.
    pub fn insert(&mut self, field: UnihanField, pages: PaginatedDictionary) -> Result<()> {
        if pages.policy != self.policy || pages.page_size != self.page_size {
            return Err(Error::InvalidArgument(format!(
                "field {field} paginated as {:?}/{} but set uses {:?}/{}",
                pages.policy, pages.page_size, self.policy, self.page_size
            )));
        }
        self.fields.insert(field, pages);
        Ok(())
    }

    pub fn policy(&self) -> PaginationPolicy {
        self.policy
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn get(&self, field: &UnihanField) -> Option<&PaginatedDictionary> {
        self.fields.get(field)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&UnihanField, &PaginatedDictionary)> {
        self.fields.iter()
    }

    /// Number of (field, page) pairs, i.e. shard files.
    pub fn page_count(&self) -> usize {
        self.fields.values().map(PaginatedDictionary::page_count).sum()
    }
}

/// Paginate every field of `dict` with one policy.
pub fn paginate_fields(
    dict: &UnihanFieldDictionary,
    page_size: u32,
    policy: PaginationPolicy,
) -> Result<FieldPages> {
    let mut set = FieldPages::new(page_size, policy)?;
    for (field, entries) in dict.iter() {
        set.insert(field.clone(), paginate(entries, page_size, policy)?)?;
    }
    Ok(set)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn cp(value: u32) -> Codepoint {
        Codepoint::new(value).unwrap()
    }

    fn entries(keys: &[u32]) -> CodepointValues {
        keys.iter()
            .map(|&k| (cp(k), vec![format!("v{k:X}")]))
            .collect()
    }

    #[test]
    fn test_zero_page_size_rejected() {
        let result = paginate(&entries(&[0x4E00]), 0, PaginationPolicy::ByKey);
        assert!(matches!(result, Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_key_policy_page_index() {
        let pages = paginate(&entries(&[0x4E00, 0x4E01, 0x9F8D]), 1000, PaginationPolicy::ByKey)
            .unwrap();
        assert!(pages.page(19).unwrap().contains_key(&cp(0x4E01)));
        assert!(pages.page(40).unwrap().contains_key(&cp(0x9F8D)));
        assert_eq!(pages.page_count(), 2);
    }

    #[test]
    fn test_ordinal_policy_is_dense() {
        let pages = paginate(
            &entries(&[0x4E00, 0x4E01, 0x9F8D, 0x20000, 0x20001]),
            2,
            PaginationPolicy::ByOrdinal,
        )
        .unwrap();
        let sizes: Vec<(u32, usize)> = pages.pages().map(|(i, p)| (i, p.len())).collect();
        assert_eq!(sizes, [(0, 2), (1, 2), (2, 1)]);
    }

    #[test]
    fn test_mixed_policies_rejected() {
        let mut set = FieldPages::new(100, PaginationPolicy::ByKey).unwrap();
        let ordinal = paginate(&entries(&[1]), 100, PaginationPolicy::ByOrdinal).unwrap();
        assert!(matches!(
            set.insert(UnihanField::Mandarin, ordinal),
            Err(Error::InvalidArgument(_))
        ));
        let resized = paginate(&entries(&[1]), 50, PaginationPolicy::ByKey).unwrap();
        assert!(set.insert(UnihanField::Mandarin, resized).is_err());
    }

    #[test]
    fn test_paginate_fields() {
        let mut dict = UnihanFieldDictionary::new();
        dict.push(cp(0x4E00), UnihanField::Definition, "one".to_string());
        dict.push(cp(0x4E00), UnihanField::Mandarin, "yī".to_string());
        dict.push(cp(0x5000), UnihanField::Mandarin, "jù".to_string());
        let set = paginate_fields(&dict, 4096, PaginationPolicy::ByKey).unwrap();
        assert_eq!(set.page_count(), 3);
        assert_eq!(set.get(&UnihanField::Mandarin).unwrap().entry_count(), 2);
    }

    fn arb_entries() -> impl Strategy<Value = CodepointValues> {
        prop::collection::btree_map(
            (0u32..0x3_0000).prop_filter("surrogate", |v| !(0xD800..=0xDFFF).contains(v)),
            prop::collection::vec("[a-z]{1,4}", 1..3),
            0..200,
        )
        .prop_map(|m| m.into_iter().map(|(k, v)| (cp(k), v)).collect())
    }

    proptest! {
        #[test]
        fn prop_entry_count_preserved(
            source in arb_entries(),
            size in 1u32..5000,
            ordinal in any::<bool>(),
        ) {
            let policy = if ordinal { PaginationPolicy::ByOrdinal } else { PaginationPolicy::ByKey };
            let pages = paginate(&source, size, policy).unwrap();
            prop_assert_eq!(pages.entry_count(), source.len());
        }

        #[test]
        fn prop_key_page_independent_of_neighbours(source in arb_entries()) {
            let mut source = source;
            source.insert(cp(0x4E01), vec!["dīng".to_string()]);
            let pages = paginate(&source, 1000, PaginationPolicy::ByKey).unwrap();
            prop_assert!(pages.page(19).unwrap().contains_key(&cp(0x4E01)));
            for (index, page) in pages.pages() {
                for codepoint in page.keys() {
                    prop_assert_eq!(codepoint.value() / 1000, index);
                }
            }
        }
    }
}
