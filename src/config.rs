/// Configuration module - Build the query plan from CLI arguments
///
/// This module handles:
/// - Loading the optional TOML criteria file
/// - Merging file criteria with command-line criteria
/// - Resolving the dataset path
/// - Expanding export formats into export kinds
///
/// Everything is resolved up front so the rest of the program works
/// from one immutable `QueryPlan`.
use crate::cli::{self, CliArgs, ExportFormat};
use crate::filters::{DateRange, FilterCriteria, ValueRange};
use crate::report::ExportKind;
use crate::types::CategoryField;
use chrono::NaiveDate;
use log::debug;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Dataset location used when nothing else is configured
pub const FALLBACK_DATASET: &str = "output/contratos.csv";

/// Criteria file layout (`--filters <FILE>`). Dates are `"YYYY-MM-DD"` strings.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FilterFile {
    pub query: Option<String>,
    pub modalities: Vec<String>,
    pub cities: Vec<String>,
    pub contract_types: Vec<String>,
    pub statuses: Vec<String>,
    pub min_value: Option<f64>,
    pub max_value: Option<f64>,
    pub from: Option<String>,
    pub to: Option<String>,
}

impl FilterFile {
    fn category(&self, field: CategoryField) -> &[String] {
        match field {
            CategoryField::Modality => &self.modalities,
            CategoryField::City => &self.cities,
            CategoryField::ContractType => &self.contract_types,
            CategoryField::Status => &self.statuses,
        }
    }
}

/// Everything one run needs, resolved from arguments, file and environment
#[derive(Debug, Clone)]
pub struct QueryPlan {
    pub dataset_path: PathBuf,
    pub query: String,
    pub criteria: FilterCriteria,
    pub exports: Vec<ExportKind>,
    pub output_dir: PathBuf,
    pub limit: usize,
    pub json: bool,
    pub list_values: Option<CategoryField>,
}

/// Parse a criteria file from its TOML text
pub fn parse_filter_file(text: &str) -> Result<FilterFile, String> {
    toml::from_str(text).map_err(|e| format!("Invalid filters file: {}", e))
}

/// Read and parse a criteria file
pub fn load_filter_file(path: &Path) -> Result<FilterFile, String> {
    let text = fs::read_to_string(path).map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
    parse_filter_file(&text).map_err(|e| format!("{} ({})", e, path.display()))
}

/// Dataset path: explicit argument, then environment, then the user data
/// directory when the file exists there, then `FALLBACK_DATASET`
pub fn resolve_dataset_path(explicit: Option<&Path>, from_env: Option<String>) -> PathBuf {
    if let Some(path) = explicit {
        debug!("Dataset from --data: {:?}", path);
        return path.to_path_buf();
    }

    if let Some(path) = from_env.filter(|p| !p.trim().is_empty()) {
        debug!("Dataset from ${}: {}", cli::DATASET_ENV, path);
        return PathBuf::from(path);
    }

    if let Some(path) = cli::default_dataset_path()
        && path.exists()
    {
        debug!("Dataset from data directory: {:?}", path);
        return path;
    }

    debug!("Dataset from fallback location {}", FALLBACK_DATASET);
    PathBuf::from(FALLBACK_DATASET)
}

/// Expand requested formats into distinct export kinds, first request first
pub fn export_kinds(formats: &[ExportFormat]) -> Vec<ExportKind> {
    let all = ExportKind::all();
    let mut kinds = Vec::new();
    for format in formats {
        let expanded: &[ExportKind] = match format {
            ExportFormat::Csv => &[ExportKind::Csv],
            ExportFormat::Text => &[ExportKind::Text],
            ExportFormat::Xlsx => &[ExportKind::Spreadsheet],
            ExportFormat::Pdf => &[ExportKind::Pdf],
            ExportFormat::All => &all,
        };
        for kind in expanded {
            if !kinds.contains(kind) {
                kinds.push(*kind);
            }
        }
    }
    kinds
}

fn file_date(value: Option<&str>, key: &str) -> Result<Option<NaiveDate>, String> {
    value.map(|v| cli::parse_date_arg(v).map_err(|e| format!("filters file '{}': {}", key, e))).transpose()
}

/// Reject bounds that no record could satisfy
fn check_criteria(criteria: &FilterCriteria) -> Result<(), String> {
    let ValueRange { min, max } = criteria.value_range;
    for (name, value) in [("min_value", min), ("max_value", max)] {
        if let Some(v) = value
            && (!v.is_finite() || v < 0.0)
        {
            return Err(format!("{} must be a non-negative amount, got {}", name, v));
        }
    }
    if let (Some(min), Some(max)) = (min, max)
        && min > max
    {
        return Err(format!("Minimum value {} is greater than maximum value {}", min, max));
    }

    let DateRange { from, to } = criteria.date_range;
    if let (Some(from), Some(to)) = (from, to)
        && from > to
    {
        return Err(format!("Start date {} is after end date {}", from, to));
    }

    Ok(())
}

/// Merge file criteria with command-line criteria
fn merge_criteria(args: &CliArgs, file: &FilterFile) -> Result<FilterCriteria, String> {
    let mut criteria = FilterCriteria::default();

    for field in CategoryField::all() {
        let from_cli: &[String] = match field {
            CategoryField::Modality => &args.modality,
            CategoryField::City => &args.city,
            CategoryField::ContractType => &args.contract_type,
            CategoryField::Status => &args.status,
        };
        let selected = criteria.selected_mut(field);
        selected.extend(file.category(field).iter().chain(from_cli).map(|v| v.trim().to_string()).filter(|v| !v.is_empty()));
        if !selected.is_empty() {
            debug!("{} filter: {:?}", field.as_str(), selected);
        }
    }

    criteria.value_range = ValueRange::new(args.min_value.or(file.min_value), args.max_value.or(file.max_value));
    criteria.date_range = DateRange {
        from: args.from.or(file_date(file.from.as_deref(), "from")?),
        to: args.to.or(file_date(file.to.as_deref(), "to")?),
    };

    check_criteria(&criteria)?;
    Ok(criteria)
}

/// Build the query plan from CLI arguments
pub fn build_query_plan(args: &CliArgs) -> Result<QueryPlan, String> {
    debug!("Building query plan");

    let file = match &args.filters {
        Some(path) => {
            debug!("Loading criteria from {:?}", path);
            load_filter_file(path)?
        }
        None => FilterFile::default(),
    };

    // Step 1: Query text
    let query = if args.query.is_empty() { file.query.clone().unwrap_or_default() } else { args.query_text() };
    debug!("Query: {:?}", query);

    // Step 2: Filter criteria
    let criteria = merge_criteria(args, &file)?;

    // Step 3: Dataset
    let dataset_path = resolve_dataset_path(args.data.as_deref(), std::env::var(cli::DATASET_ENV).ok());

    // Step 4: Exports
    let exports = export_kinds(&args.export);
    debug!("Exports: {:?} into {:?}", exports, args.output_dir);

    Ok(QueryPlan {
        dataset_path,
        query,
        criteria,
        exports,
        output_dir: args.output_dir.clone(),
        limit: args.limit,
        json: args.json,
        list_values: args.list_values,
    })
}

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;
