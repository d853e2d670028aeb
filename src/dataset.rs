/// Dataset loading and the in-memory record store
///
/// This module handles:
/// - Reading the contract CSV as text cells
/// - The typed parse step (text, amounts, dates) with fallback-to-missing
/// - The immutable `RecordStore` and its precomputed search column
/// - `DatasetCache`, which loads the store exactly once per process
use crate::errors::{AppError, Result};
use crate::types::{CategoryField, ContractRecord};
use chrono::{NaiveDate, NaiveDateTime};
use log::{debug, info};
use std::collections::BTreeSet;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, OnceLock};

pub const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Accepted timestamp layouts; only the calendar day is kept
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
];

/// Raw dataset row, every cell still text
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct RawContractRow {
    #[serde(rename = "nombre_entidad")]
    entity_name: Option<String>,
    #[serde(rename = "ciudad")]
    city: Option<String>,
    #[serde(rename = "modalidad_de_contratacion")]
    contracting_modality: Option<String>,
    #[serde(rename = "tipo_de_contrato")]
    contract_type: Option<String>,
    #[serde(rename = "estado_contrato")]
    contract_status: Option<String>,
    #[serde(rename = "proveedor_adjudicado")]
    awarded_provider: Option<String>,
    #[serde(rename = "objeto_del_contrato")]
    contract_object: Option<String>,
    #[serde(rename = "valor_del_contrato")]
    contract_value: Option<String>,
    #[serde(rename = "valor_pagado")]
    paid_value: Option<String>,
    #[serde(rename = "fecha_de_inicio_del_contrato")]
    start_date: Option<String>,
    #[serde(rename = "fecha_de_fin_del_contrato")]
    end_date: Option<String>,
    #[serde(rename = "proceso_de_compra")]
    process_reference: Option<String>,
    #[serde(rename = "urlproceso")]
    process_url: Option<String>,
}

/// Counters collected while parsing, for the load log line
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub rows: usize,
    pub unparsed_amounts: usize,
    pub unparsed_dates: usize,
}

impl RawContractRow {
    fn into_record(self, report: &mut LoadReport) -> ContractRecord {
        let mut amount = |raw: Option<String>| {
            let parsed = parse_amount(raw.as_deref());
            if parsed.is_none() && has_text(raw.as_deref()) {
                report.unparsed_amounts += 1;
            }
            parsed
        };
        let contract_value = amount(self.contract_value);
        let paid_value = amount(self.paid_value);

        let mut date = |raw: Option<String>| {
            let parsed = parse_date(raw.as_deref());
            if parsed.is_none() && has_text(raw.as_deref()) {
                report.unparsed_dates += 1;
            }
            parsed
        };
        let start_date = date(self.start_date);
        let end_date = date(self.end_date);

        ContractRecord {
            entity_name: parse_text(self.entity_name),
            city: parse_text(self.city),
            contracting_modality: parse_text(self.contracting_modality),
            contract_type: parse_text(self.contract_type),
            contract_status: parse_text(self.contract_status),
            awarded_provider: parse_text(self.awarded_provider),
            contract_object: parse_text(self.contract_object),
            contract_value,
            paid_value,
            start_date,
            end_date,
            process_reference: parse_text(self.process_reference),
            process_url: parse_text(self.process_url),
        }
    }
}

fn has_text(raw: Option<&str>) -> bool {
    raw.is_some_and(|s| !s.trim().is_empty())
}

/// Trim a text cell; empty becomes missing
pub fn parse_text(raw: Option<String>) -> Option<String> {
    let raw = raw?;
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else if trimmed.len() == raw.len() {
        Some(raw)
    } else {
        Some(trimmed.to_string())
    }
}

/// Parse a currency amount; anything that is not a finite number is missing
pub fn parse_amount(raw: Option<&str>) -> Option<f64> {
    let text = raw?.trim();
    if text.is_empty() {
        return None;
    }
    match text.parse::<f64>() {
        Ok(value) if value.is_finite() => Some(value),
        _ => None,
    }
}

/// Parse a calendar date from the formats the source system emits
pub fn parse_date(raw: Option<&str>) -> Option<NaiveDate> {
    let text = raw?.trim();
    if text.is_empty() {
        return None;
    }

    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Some(date);
    }

    let without_zone = text.trim_end_matches('Z');
    for format in DATETIME_FORMATS {
        if let Ok(timestamp) = NaiveDateTime::parse_from_str(without_zone, format) {
            return Some(timestamp.date());
        }
    }

    NaiveDate::parse_from_str(text, "%m/%d/%Y").ok()
}

/// Immutable in-memory table of contract records.
///
/// Row identity is the position in `records`. Nothing mutates the store
/// after construction; filtering produces row-index views over it.
#[derive(Debug, Clone, Default)]
pub struct RecordStore {
    records: Vec<ContractRecord>,
    search_index: Vec<String>,
}

impl RecordStore {
    /// Build a store from already-typed records
    pub fn from_records(records: Vec<ContractRecord>) -> Self {
        let search_index = records
            .iter()
            .map(|r| r.contract_object.as_deref().unwrap_or("").to_lowercase())
            .collect();
        Self { records, search_index }
    }

    /// Parse CSV bytes (an optional UTF-8 BOM is skipped)
    pub fn from_csv_reader<R: Read>(mut reader: R) -> Result<(Self, LoadReport)> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        let body = bytes.strip_prefix(UTF8_BOM).unwrap_or(&bytes);

        let mut csv_reader = csv::ReaderBuilder::new().flexible(true).from_reader(body);
        let mut report = LoadReport::default();
        let mut records = Vec::new();

        for row in csv_reader.deserialize::<RawContractRow>() {
            let raw = row?;
            records.push(raw.into_record(&mut report));
            report.rows += 1;
        }

        Ok((Self::from_records(records), report))
    }

    /// Load the dataset file at `path`
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(AppError::DatasetNotFound(path.display().to_string()));
        }

        debug!("Loading dataset from {:?}", path);
        let file = fs::File::open(path)?;
        let (store, report) = Self::from_csv_reader(file)?;

        info!(
            "Loaded {} contracts from {} ({} unparseable amounts, {} unparseable dates)",
            report.rows,
            path.display(),
            report.unparsed_amounts,
            report.unparsed_dates
        );

        Ok(store)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[cfg(test)]
    pub fn records(&self) -> &[ContractRecord] {
        &self.records
    }

    pub fn get(&self, row: usize) -> Option<&ContractRecord> {
        self.records.get(row)
    }

    /// Lower-cased contract object of a row (empty when missing)
    pub fn search_text(&self, row: usize) -> &str {
        self.search_index.get(row).map(String::as_str).unwrap_or("")
    }

    /// Sorted distinct non-missing values of a categorical column
    pub fn distinct_values(&self, field: CategoryField) -> Vec<String> {
        let values: BTreeSet<&str> = self.records.iter().filter_map(|r| r.category(field)).collect();
        values.into_iter().map(str::to_string).collect()
    }

    /// Smallest and largest `contract_value` present, if any
    pub fn value_domain(&self) -> Option<(f64, f64)> {
        self.records.iter().filter_map(|r| r.contract_value).fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
    }

    /// Earliest start date and latest end date present
    pub fn date_domain(&self) -> (Option<NaiveDate>, Option<NaiveDate>) {
        let earliest = self.records.iter().filter_map(|r| r.start_date).min();
        let latest = self.records.iter().filter_map(|r| r.end_date).max();
        (earliest, latest)
    }
}

/// Load-once holder for the record store.
///
/// The first caller loads the file while holding `init_guard`; callers
/// arriving during that load block on the guard and then reuse the
/// stored result. A failed load leaves the cell empty so a later call
/// can retry.
pub struct DatasetCache {
    path: PathBuf,
    store: OnceLock<RecordStore>,
    init_guard: Mutex<()>,
    loads: AtomicUsize,
}

impl DatasetCache {
    pub fn new(path: PathBuf) -> Self {
        Self { path, store: OnceLock::new(), init_guard: Mutex::new(()), loads: AtomicUsize::new(0) }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get the store, loading it on first access
    pub fn get(&self) -> Result<&RecordStore> {
        if let Some(store) = self.store.get() {
            return Ok(store);
        }

        let _guard = self.init_guard.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(store) = self.store.get() {
            debug!("Dataset already loaded by a concurrent caller");
            return Ok(store);
        }

        let loaded = RecordStore::load(&self.path)?;
        self.loads.fetch_add(1, Ordering::SeqCst);
        Ok(self.store.get_or_init(|| loaded))
    }

    /// Number of times the file was actually read
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
#[path = "dataset_test.rs"]
mod dataset_test;
