//! Report generation module - statistics and the demand-analysis report.
//!
//! This module handles:
//! - Aggregating statistics over a filtered record set
//! - Building the structured report content shared by every renderer
//! - Rendering that content as text, an xlsx workbook or a PDF
//! - Exporting the filtered set and the rendered reports to files
//!
//! Console rendering is handled by the console_format module.
//!
//! # Module Organization
//!
//! - `stats` - Statistics aggregator
//! - `content` - Document builder (`ReportDocument`, `compose`)
//! - `text` - Fixed-width text renderer
//! - `spreadsheet` - Workbook renderer
//! - `pdf` - Paginated document renderer
//! - `export` - CSV export, file output, JSON statistics

mod content;
mod export;
mod pdf;
mod spreadsheet;
mod stats;
mod text;

// Re-export statistics
pub use stats::{Statistics, aggregate};

// Re-export document building
pub use content::compose;

// Re-export export functions
pub use export::{ExportKind, statistics_json, write_exports};
