//! Descriptive statistics over a filtered record set.
//!
//! This module handles aggregating contract records into counts, value
//! statistics and the most frequent modality/entity, for the document
//! renderer and the console summary.

use crate::format::{NOT_AVAILABLE, format_count, format_currency};
use crate::types::ContractRecord;
use std::collections::{HashMap, HashSet};

/// A categorical value and how many records carry it
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct RankedValue {
    pub name: String,
    pub count: usize,
}

/// Summary of a filtered record set.
///
/// Value statistics are `None` when the set is empty or every
/// `contract_value` is missing.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct Statistics {
    pub total: usize,
    pub distinct_entities: usize,
    pub distinct_cities: usize,
    pub distinct_modalities: usize,
    pub distinct_providers: usize,
    pub value_sum: Option<f64>,
    pub value_mean: Option<f64>,
    pub value_median: Option<f64>,
    pub value_min: Option<f64>,
    pub value_max: Option<f64>,
    pub top_modality: Option<RankedValue>,
    pub top_entity: Option<RankedValue>,
}

impl Statistics {
    /// Share of the set carrying the modal modality, in percent
    pub fn top_modality_share(&self) -> Option<f64> {
        let top = self.top_modality.as_ref()?;
        if self.total == 0 {
            return None;
        }
        Some(top.count as f64 / self.total as f64 * 100.0)
    }

    /// Labeled rows for report statistics tables
    pub fn table_rows(&self) -> Vec<(&'static str, String)> {
        let top_modality = match (&self.top_modality, self.top_modality_share()) {
            (Some(top), Some(share)) => format!("{} ({:.1}%)", top.name, share),
            _ => NOT_AVAILABLE.to_string(),
        };
        let top_entity = match &self.top_entity {
            Some(top) => format!("{} ({})", top.name, top.count),
            None => NOT_AVAILABLE.to_string(),
        };

        vec![
            ("Total contratos", format_count(self.total)),
            ("Entidades únicas", format_count(self.distinct_entities)),
            ("Ciudades", format_count(self.distinct_cities)),
            ("Proveedores únicos", format_count(self.distinct_providers)),
            ("Modalidades", format_count(self.distinct_modalities)),
            ("Valor total", format_currency(self.value_sum)),
            ("Valor promedio", format_currency(self.value_mean)),
            ("Valor mediana", format_currency(self.value_median)),
            ("Valor mínimo", format_currency(self.value_min)),
            ("Valor máximo", format_currency(self.value_max)),
            ("Modalidad predominante", top_modality),
            ("Entidad con más contratos", top_entity),
        ]
    }
}

/// Count distinct non-missing values
fn distinct<'a>(values: impl Iterator<Item = Option<&'a str>>) -> usize {
    values.flatten().collect::<HashSet<_>>().len()
}

/// Most frequent non-missing value; ties go to the value seen first
fn most_frequent<'a>(values: impl Iterator<Item = Option<&'a str>>) -> Option<RankedValue> {
    let mut order: Vec<(&str, usize)> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for value in values.flatten() {
        match index.get(value) {
            Some(&slot) => order[slot].1 += 1,
            None => {
                index.insert(value, order.len());
                order.push((value, 1));
            }
        }
    }

    let mut best: Option<(&str, usize)> = None;
    for (name, count) in order {
        if best.is_none_or(|(_, best_count)| count > best_count) {
            best = Some((name, count));
        }
    }
    best.map(|(name, count)| RankedValue { name: name.to_string(), count })
}

fn median(sorted: &[f64]) -> Option<f64> {
    let n = sorted.len();
    if n == 0 {
        return None;
    }
    if n % 2 == 1 { Some(sorted[n / 2]) } else { Some((sorted[n / 2 - 1] + sorted[n / 2]) / 2.0) }
}

/// Aggregate a (possibly empty) set of records.
///
/// # Arguments
/// * `records` - Records of the filtered set, in set order
///
/// # Returns
/// A `Statistics` with zero counts and `None` value statistics for an
/// empty input.
pub fn aggregate<'a, I>(records: I) -> Statistics
where
    I: IntoIterator<Item = &'a ContractRecord>,
{
    let records: Vec<&ContractRecord> = records.into_iter().collect();

    let mut values: Vec<f64> = records.iter().filter_map(|r| r.contract_value).collect();
    values.sort_by(|a, b| a.total_cmp(b));

    let value_sum = if values.is_empty() { None } else { Some(values.iter().sum::<f64>()) };
    let value_mean = value_sum.map(|sum| sum / values.len() as f64);

    Statistics {
        total: records.len(),
        distinct_entities: distinct(records.iter().map(|r| r.entity_name.as_deref())),
        distinct_cities: distinct(records.iter().map(|r| r.city.as_deref())),
        distinct_modalities: distinct(records.iter().map(|r| r.contracting_modality.as_deref())),
        distinct_providers: distinct(records.iter().map(|r| r.awarded_provider.as_deref())),
        value_sum,
        value_mean,
        value_median: median(&values),
        value_min: values.first().copied(),
        value_max: values.last().copied(),
        top_modality: most_frequent(records.iter().map(|r| r.contracting_modality.as_deref())),
        top_entity: most_frequent(records.iter().map(|r| r.entity_name.as_deref())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(entity: &str, modality: Option<&str>, value: Option<f64>) -> ContractRecord {
        ContractRecord {
            entity_name: Some(entity.to_string()),
            contracting_modality: modality.map(str::to_string),
            contract_value: value,
            ..Default::default()
        }
    }

    #[test]
    fn test_empty_statistics() {
        let stats = aggregate(&Vec::<ContractRecord>::new());
        assert_eq!(stats.total, 0);
        assert_eq!(stats.distinct_entities, 0);
        assert_eq!(stats.distinct_cities, 0);
        assert_eq!(stats.value_sum, None);
        assert_eq!(stats.value_mean, None);
        assert_eq!(stats.value_median, None);
        assert_eq!(stats.value_min, None);
        assert_eq!(stats.value_max, None);
        assert_eq!(stats.top_modality, None);
        assert_eq!(stats.top_modality_share(), None);
        assert_eq!(stats.top_entity, None);

        let rows = stats.table_rows();
        assert_eq!(rows[0], ("Total contratos", "0".to_string()));
        assert_eq!(rows[5], ("Valor total", NOT_AVAILABLE.to_string()));
        assert_eq!(rows[10], ("Modalidad predominante", NOT_AVAILABLE.to_string()));
    }

    #[test]
    fn test_all_values_missing() {
        let records = vec![record("A", None, None), record("B", None, None)];
        let stats = aggregate(&records);
        assert_eq!(stats.total, 2);
        assert_eq!(stats.distinct_entities, 2);
        assert_eq!(stats.value_sum, None);
        assert_eq!(stats.value_median, None);
    }

    #[test]
    fn test_value_statistics() {
        let records = vec![
            record("A", Some("Directa"), Some(10.0)),
            record("B", Some("Directa"), Some(40.0)),
            record("A", Some("Mínima"), None),
            record("C", Some("Mínima"), Some(20.0)),
            record("A", Some("Directa"), Some(30.0)),
        ];
        let stats = aggregate(&records);
        assert_eq!(stats.total, 5);
        assert_eq!(stats.distinct_entities, 3);
        assert_eq!(stats.distinct_modalities, 2);
        assert_eq!(stats.value_sum, Some(100.0));
        assert_eq!(stats.value_mean, Some(25.0));
        assert_eq!(stats.value_median, Some(25.0));
        assert_eq!(stats.value_min, Some(10.0));
        assert_eq!(stats.value_max, Some(40.0));
        assert_eq!(stats.top_modality, Some(RankedValue { name: "Directa".to_string(), count: 3 }));
        assert_eq!(stats.top_modality_share(), Some(60.0));
        assert_eq!(stats.top_entity, Some(RankedValue { name: "A".to_string(), count: 3 }));
    }

    #[test]
    fn test_odd_median() {
        let records = vec![record("A", None, Some(5.0)), record("A", None, Some(1.0)), record("A", None, Some(3.0))];
        assert_eq!(aggregate(&records).value_median, Some(3.0));
    }

    #[test]
    fn test_mode_ties_go_to_first_seen() {
        let records = vec![
            record("Zeta", Some("Mínima"), None),
            record("Alfa", Some("Directa"), None),
            record("Alfa", Some("Directa"), None),
            record("Zeta", Some("Mínima"), None),
        ];
        let stats = aggregate(&records);
        assert_eq!(stats.top_modality.map(|t| t.name), Some("Mínima".to_string()));
        assert_eq!(stats.top_entity.map(|t| t.name), Some("Zeta".to_string()));
    }

    #[test]
    fn test_share_uses_whole_set_as_denominator() {
        let records = vec![record("A", Some("Directa"), None), record("B", None, None)];
        let stats = aggregate(&records);
        assert_eq!(stats.top_modality_share(), Some(50.0));
        let rows = stats.table_rows();
        assert_eq!(rows[10].1, "Directa (50.0%)");
        assert_eq!(rows[11].1, "A (1)");
    }
}
