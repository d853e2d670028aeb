//! Report export functions.
//!
//! This module handles producing export bytes in memory (delimited
//! text, text report, workbook, PDF) and writing them under their fixed
//! file names, plus the JSON statistics printed by `--json`.

use super::content::ReportDocument;
use super::pdf::render_pdf;
use super::spreadsheet::render_spreadsheet;
use super::stats::Statistics;
use super::text::render_text;
use crate::dataset::UTF8_BOM;
use crate::errors::{AppError, Result};
use crate::types::ContractRecord;
use chrono::NaiveDate;
use log::{debug, info};
use std::fs;
use std::path::{Path, PathBuf};

pub const CSV_FILE_NAME: &str = "contratos_filtrados.csv";
pub const TEXT_FILE_NAME: &str = "analisis_demanda.txt";
pub const SPREADSHEET_FILE_NAME: &str = "analisis_demanda.xlsx";
pub const PDF_FILE_NAME: &str = "analisis_demanda.pdf";

/// Columns of the delimited export, in order
pub const CSV_COLUMNS: [&str; 12] = [
    "nombre_entidad",
    "ciudad",
    "modalidad_de_contratacion",
    "objeto_del_contrato",
    "tipo_de_contrato",
    "estado_contrato",
    "valor_del_contrato",
    "valor_pagado",
    "proveedor_adjudicado",
    "fecha_de_inicio_del_contrato",
    "fecha_de_fin_del_contrato",
    "urlproceso",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ExportKind {
    Csv,
    Text,
    Spreadsheet,
    Pdf,
}

impl ExportKind {
    pub fn all() -> [ExportKind; 4] {
        [ExportKind::Csv, ExportKind::Text, ExportKind::Spreadsheet, ExportKind::Pdf]
    }

    pub fn file_name(&self) -> &'static str {
        match self {
            ExportKind::Csv => CSV_FILE_NAME,
            ExportKind::Text => TEXT_FILE_NAME,
            ExportKind::Spreadsheet => SPREADSHEET_FILE_NAME,
            ExportKind::Pdf => PDF_FILE_NAME,
        }
    }
}

fn text_cell(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

/// Integral amounts are written without a fractional part
fn amount_cell(value: Option<f64>) -> String {
    match value {
        Some(v) if v.fract() == 0.0 && v.abs() < 1e15 => format!("{:.0}", v),
        Some(v) => v.to_string(),
        None => String::new(),
    }
}

fn date_cell(value: Option<NaiveDate>) -> String {
    value.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_default()
}

/// Encode records as BOM-prefixed CSV with the displayed columns
pub fn export_csv<'a, I>(records: I) -> Result<Vec<u8>>
where
    I: IntoIterator<Item = &'a ContractRecord>,
{
    let mut writer = csv::Writer::from_writer(UTF8_BOM.to_vec());
    writer.write_record(CSV_COLUMNS)?;

    for record in records {
        writer.write_record([
            text_cell(&record.entity_name),
            text_cell(&record.city),
            text_cell(&record.contracting_modality),
            text_cell(&record.contract_object),
            text_cell(&record.contract_type),
            text_cell(&record.contract_status),
            amount_cell(record.contract_value),
            amount_cell(record.paid_value),
            text_cell(&record.awarded_provider),
            date_cell(record.start_date),
            date_cell(record.end_date),
            text_cell(&record.process_url),
        ])?;
    }

    writer.into_inner().map_err(|e| AppError::Io(e.into_error()))
}

/// Statistics of a result as pretty JSON
pub fn statistics_json(stats: &Statistics, query: &str, dataset: &Path) -> Result<String> {
    use serde_json::json;

    let report = json!({
        "dataset": dataset.display().to_string(),
        "query": query,
        "statistics": stats,
    });
    Ok(serde_json::to_string_pretty(&report)?)
}

/// Produce each requested export and write it into `output_dir`.
///
/// # Arguments
/// * `kinds` - Exports to produce, written in this order
/// * `output_dir` - Target directory, created when missing
/// * `records` - The filtered records, for the delimited export
/// * `doc` - Report content, for the text, workbook and PDF exports
///
/// # Returns
/// Paths of the written files.
pub fn write_exports(
    kinds: &[ExportKind],
    output_dir: &Path,
    records: &[&ContractRecord],
    doc: &ReportDocument,
) -> Result<Vec<PathBuf>> {
    if kinds.is_empty() {
        return Ok(Vec::new());
    }
    fs::create_dir_all(output_dir)?;
    debug!("Exporting {} contract(s) as {:?}", doc.record_count(), kinds);

    let mut written = Vec::with_capacity(kinds.len());
    for kind in kinds {
        let bytes = match kind {
            ExportKind::Csv => export_csv(records.iter().copied())?,
            ExportKind::Text => render_text(doc).into_bytes(),
            ExportKind::Spreadsheet => render_spreadsheet(doc)?,
            ExportKind::Pdf => render_pdf(doc)?,
        };

        let path = output_dir.join(kind.file_name());
        fs::write(&path, &bytes)?;
        info!("Wrote {} ({} bytes)", path.display(), bytes.len());
        written.push(path);
    }

    Ok(written)
}
