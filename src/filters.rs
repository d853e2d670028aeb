//! Categorical, value-range and date-range filters.
//!
//! Filters are independent predicates combined by logical AND, so they
//! commute and the output keeps input order.

use crate::dataset::RecordStore;
use crate::search::FilteredSet;
use crate::types::{CategoryField, ContractRecord};
use chrono::NaiveDate;
use log::debug;
use std::collections::BTreeSet;

/// Inclusive bounds on `contract_value`, in currency units
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ValueRange {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl ValueRange {
    pub fn new(min: Option<f64>, max: Option<f64>) -> Self {
        Self { min, max }
    }

    /// True when the bounds span every value in `domain` (amounts start at 0)
    pub fn covers(&self, domain: Option<(f64, f64)>) -> bool {
        let (low, high) = match domain {
            Some((low, high)) => (low.min(0.0), high),
            None => return self.min.is_none_or(|min| min <= 0.0) && self.max.is_none(),
        };
        self.min.is_none_or(|min| min <= low) && self.max.is_none_or(|max| max >= high)
    }

    pub fn contains(&self, value: f64) -> bool {
        self.min.is_none_or(|min| value >= min) && self.max.is_none_or(|max| value <= max)
    }
}

/// Date window; a missing record date always passes its side of the window
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateRange {
    pub fn is_unbounded(&self) -> bool {
        self.from.is_none() && self.to.is_none()
    }

    pub fn admits(&self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> bool {
        let start_ok = match (start, self.from) {
            (Some(start), Some(from)) => start >= from,
            _ => true,
        };
        let end_ok = match (end, self.to) {
            (Some(end), Some(to)) => end <= to,
            _ => true,
        };
        start_ok && end_ok
    }
}

/// Everything a user can narrow the record set by, besides the query
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterCriteria {
    pub modalities: BTreeSet<String>,
    pub cities: BTreeSet<String>,
    pub contract_types: BTreeSet<String>,
    pub statuses: BTreeSet<String>,
    pub value_range: ValueRange,
    pub date_range: DateRange,
}

impl FilterCriteria {
    pub fn selected(&self, field: CategoryField) -> &BTreeSet<String> {
        match field {
            CategoryField::Modality => &self.modalities,
            CategoryField::City => &self.cities,
            CategoryField::ContractType => &self.contract_types,
            CategoryField::Status => &self.statuses,
        }
    }

    pub fn selected_mut(&mut self, field: CategoryField) -> &mut BTreeSet<String> {
        match field {
            CategoryField::Modality => &mut self.modalities,
            CategoryField::City => &mut self.cities,
            CategoryField::ContractType => &mut self.contract_types,
            CategoryField::Status => &mut self.statuses,
        }
    }
}

/// A single record predicate
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Record value must be one of `allowed`
    Category { field: CategoryField, allowed: BTreeSet<String> },
    /// `contract_value` within bounds; missing values fail
    Value(ValueRange),
    /// Start not before `from`, end not after `to`; missing dates pass
    Dates(DateRange),
}

impl Filter {
    pub fn matches(&self, record: &ContractRecord) -> bool {
        match self {
            Filter::Category { field, allowed } => {
                allowed.is_empty() || record.category(*field).is_some_and(|value| allowed.contains(value))
            }
            Filter::Value(range) => record.contract_value.is_some_and(|value| range.contains(value)),
            Filter::Dates(range) => range.admits(record.start_date, record.end_date),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Filter::Category { field, allowed } => {
                format!("{} in [{}]", field.as_str(), allowed.iter().cloned().collect::<Vec<_>>().join(", "))
            }
            Filter::Value(range) => format!("value in [{:?}, {:?}]", range.min, range.max),
            Filter::Dates(range) => format!("dates in [{:?}, {:?}]", range.from, range.to),
        }
    }
}

/// Sequence of active filters
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterPipeline {
    filters: Vec<Filter>,
}

impl FilterPipeline {
    /// Build the active filters for `criteria` against `store`.
    ///
    /// Empty category sets, unbounded date windows and value ranges that
    /// cover the store's whole value domain impose no constraint and are
    /// left out, so records with a missing value survive them.
    pub fn new(criteria: &FilterCriteria, store: &RecordStore) -> Self {
        let mut filters = Vec::new();

        for field in CategoryField::all() {
            let allowed = criteria.selected(field);
            if !allowed.is_empty() {
                filters.push(Filter::Category { field, allowed: allowed.clone() });
            }
        }

        if !criteria.value_range.covers(store.value_domain()) {
            filters.push(Filter::Value(criteria.value_range));
        }

        if !criteria.date_range.is_unbounded() {
            filters.push(Filter::Dates(criteria.date_range));
        }

        Self { filters }
    }

    #[cfg(test)]
    pub fn from_filters(filters: Vec<Filter>) -> Self {
        Self { filters }
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Narrow `set` by each filter in turn
    pub fn apply<'a>(&self, set: FilteredSet<'a>) -> FilteredSet<'a> {
        self.filters.iter().fold(set, |current, filter| {
            let before = current.len();
            let narrowed = current.retain(|_, record| filter.matches(record));
            debug!("filter {}: {} -> {} rows", filter.describe(), before, narrowed.len());
            narrowed
        })
    }
}

#[cfg(test)]
#[path = "filters_test.rs"]
mod filters_test;
