//! Keyword search over the contract object.
//!
//! A query is split on whitespace into terms; a record matches when every
//! term occurs as a case-insensitive substring of its lower-cased
//! `contract_object`. Terms are compared as plain text, so characters
//! such as `(`, `.` or `*` carry no pattern meaning.

use crate::dataset::RecordStore;
use crate::types::ContractRecord;
use log::debug;

/// Ordered view of store rows satisfying the current criteria.
///
/// Holds row positions, never copies of records, and always keeps the
/// store's original order.
#[derive(Debug, Clone)]
pub struct FilteredSet<'a> {
    store: &'a RecordStore,
    rows: Vec<usize>,
}

impl<'a> FilteredSet<'a> {
    /// Every row of the store
    pub fn all(store: &'a RecordStore) -> Self {
        Self { store, rows: (0..store.len()).collect() }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Row positions in store order
    #[cfg(test)]
    pub fn rows(&self) -> &[usize] {
        &self.rows
    }

    pub fn store(&self) -> &'a RecordStore {
        self.store
    }

    pub fn records(&self) -> impl Iterator<Item = &'a ContractRecord> + '_ {
        let store = self.store;
        self.rows.iter().filter_map(move |&row| store.get(row))
    }

    /// Keep only the rows for which `keep` returns true
    pub fn retain<F>(self, mut keep: F) -> Self
    where
        F: FnMut(usize, &ContractRecord) -> bool,
    {
        let store = self.store;
        let rows = self
            .rows
            .into_iter()
            .filter(|&row| store.get(row).is_some_and(|record| keep(row, record)))
            .collect();
        Self { store, rows }
    }
}

/// Lower-cased whitespace-separated terms of a query
pub fn query_terms(query: &str) -> Vec<String> {
    query.to_lowercase().split_whitespace().map(str::to_string).collect()
}

/// True when every term is a substring of `haystack`
pub fn matches_all(haystack: &str, terms: &[String]) -> bool {
    terms.iter().all(|term| haystack.contains(term.as_str()))
}

/// Narrow `set` to the records whose object contains every query term.
///
/// An empty or whitespace-only query returns the set unchanged.
pub fn search<'a>(set: FilteredSet<'a>, query: &str) -> FilteredSet<'a> {
    let terms = query_terms(query);
    if terms.is_empty() {
        return set;
    }

    let store = set.store();
    let before = set.len();
    let result = set.retain(|row, _| matches_all(store.search_text(row), &terms));
    debug!("search {:?}: {} of {} rows match {} term(s)", query, result.len(), before, terms.len());
    result
}
