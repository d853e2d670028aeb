use crate::types::CategoryField;
use chrono::NaiveDate;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Environment variable naming the dataset file
pub const DATASET_ENV: &str = "SECOP_DATASET";

/// Get the default dataset location for secop-demand
/// Uses platform-specific data directories:
/// - Linux: ~/.local/share/secop-demand/contratos.csv
/// - macOS: ~/Library/Application Support/secop-demand/contratos.csv
/// - Windows: %APPDATA%/secop-demand/contratos.csv
pub fn default_dataset_path() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join("secop-demand").join("contratos.csv"))
}

/// Parse a `YYYY-MM-DD` date argument
pub fn parse_date_arg(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|e| format!("invalid date '{}' ({}), expected YYYY-MM-DD", value, e))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    /// Filtered records as CSV
    Csv,
    /// Text report
    Text,
    /// Excel workbook report
    Xlsx,
    /// PDF report
    Pdf,
    /// Every format above
    All,
}

#[derive(Parser, Debug, Clone)]
#[command(name = "secop-demand")]
#[command(about = "Search SECOP contracts and generate demand-analysis reports")]
#[command(version)]
pub struct CliArgs {
    /// Search terms matched against the contract object (all must occur)
    #[arg(value_name = "QUERY")]
    pub query: Vec<String>,

    /// Dataset CSV file (default: $SECOP_DATASET, then the user data directory, then ./output/contratos.csv)
    #[arg(long, value_name = "PATH")]
    pub data: Option<PathBuf>,

    /// TOML file with saved filter criteria; command-line values take precedence
    #[arg(long, value_name = "FILE")]
    pub filters: Option<PathBuf>,

    /// Keep only these contracting modalities (repeatable)
    #[arg(long, value_name = "MODALITY")]
    pub modality: Vec<String>,

    /// Keep only these cities (repeatable)
    #[arg(long, value_name = "CITY")]
    pub city: Vec<String>,

    /// Keep only these contract types (repeatable)
    #[arg(long, value_name = "TYPE")]
    pub contract_type: Vec<String>,

    /// Keep only these contract statuses (repeatable)
    #[arg(long, value_name = "STATUS")]
    pub status: Vec<String>,

    /// Minimum contract value, inclusive
    #[arg(long, value_name = "AMOUNT")]
    pub min_value: Option<f64>,

    /// Maximum contract value, inclusive
    #[arg(long, value_name = "AMOUNT")]
    pub max_value: Option<f64>,

    /// Contracts starting on or after this date (YYYY-MM-DD)
    #[arg(long, value_name = "DATE", value_parser = parse_date_arg)]
    pub from: Option<NaiveDate>,

    /// Contracts ending on or before this date (YYYY-MM-DD)
    #[arg(long, value_name = "DATE", value_parser = parse_date_arg)]
    pub to: Option<NaiveDate>,

    /// Exports to write (repeatable or comma separated)
    #[arg(long, value_enum, value_name = "FORMAT", value_delimiter = ',')]
    pub export: Vec<ExportFormat>,

    /// Directory the exports are written to
    #[arg(long, default_value = ".", value_name = "DIR")]
    pub output_dir: PathBuf,

    /// Number of result rows shown on the console (0 hides the table)
    #[arg(long, default_value = "20")]
    pub limit: usize,

    /// Print the result statistics as JSON instead of the console summary
    #[arg(long)]
    pub json: bool,

    /// List the values available for a filter and exit
    #[arg(long, value_enum, value_name = "FIELD")]
    pub list_values: Option<CategoryField>,

    /// Override console width (default: auto-detect)
    #[arg(long, value_name = "COLUMNS")]
    pub console_width: Option<usize>,
}

impl CliArgs {
    /// Parse command-line arguments
    pub fn parse_args() -> Self {
        let mut args = CliArgs::parse();

        // Support quoted multi-word queries: "seguridad vial" counts as two terms
        args.query = args.query.iter().flat_map(|s| s.split_whitespace().map(|t| t.to_string())).collect();

        args
    }

    /// The search text as entered
    pub fn query_text(&self) -> String {
        self.query.join(" ")
    }

    /// Validate argument combinations
    pub fn validate(&self) -> Result<(), String> {
        for (flag, value) in [("--min-value", self.min_value), ("--max-value", self.max_value)] {
            if let Some(v) = value
                && (!v.is_finite() || v < 0.0)
            {
                return Err(format!("{} must be a non-negative amount, got {}", flag, v));
            }
        }

        if let (Some(min), Some(max)) = (self.min_value, self.max_value)
            && min > max
        {
            return Err(format!("--min-value ({}) is greater than --max-value ({})", min, max));
        }

        if let (Some(from), Some(to)) = (self.from, self.to)
            && from > to
        {
            return Err(format!("--from ({}) is after --to ({})", from, to));
        }

        if self.list_values.is_some() && !self.export.is_empty() {
            return Err("Cannot combine --list-values with --export".to_string());
        }

        if let Some(width) = self.console_width
            && width < 40
        {
            return Err(format!("--console-width must be at least 40, got {}", width));
        }

        Ok(())
    }
}
