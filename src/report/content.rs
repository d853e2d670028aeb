//! Structured report content.
//!
//! Renderers never format record fields themselves: `compose` builds a
//! `ReportDocument` (a sequence of sections) from the filtered records,
//! the query and the precomputed statistics, and each renderer lays out
//! those sections in its own container format.

use super::stats::Statistics;
use crate::format::ReportFields;
use crate::types::ContractRecord;
use chrono::NaiveDateTime;

pub const REPORT_TITLE: &str = "ANÁLISIS DE LA DEMANDA";
pub const STATISTICS_HEADING: &str = "ESTADÍSTICOS DEL RESULTADO";
pub const DATA_SOURCE: &str = "SECOP II — datos.gov.co";

pub const INTRODUCTION: [&str; 2] = [
    "Se validan en el portal de contratación SECOP procesos adelantados en los últimos años por algunas \
     entidades estatales del departamento y por este municipio para satisfacer las necesidades requeridas.",
    "De acuerdo a la consulta en el portal único de contratación estatal — SECOP \
     (www.colombiacompra.gov.co), se observa la siguiente información:",
];

/// Timestamp format used by every closing line
pub fn format_timestamp(at: &NaiveDateTime) -> String {
    at.format("%d/%m/%Y %H:%M").to_string()
}

/// One contract's labeled fields and its position in the set
#[derive(Debug, Clone, PartialEq)]
pub struct RecordBlock {
    pub index: usize,
    pub total: usize,
    pub fields: Vec<(&'static str, String)>,
}

impl RecordBlock {
    pub fn heading(&self) -> String {
        format!("CONTRATO {} DE {}", self.index, self.total)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Section {
    Title(String),
    Paragraph(String),
    /// Highlighted single line, e.g. the search keywords
    Callout(String),
    Heading(String),
    StatsTable(Vec<(&'static str, String)>),
    Record(RecordBlock),
    Closing { generated_at: NaiveDateTime, total: usize },
}

/// Ordered report content shared by all renderers
#[derive(Debug, Clone, PartialEq)]
pub struct ReportDocument {
    pub sections: Vec<Section>,
}

impl ReportDocument {
    pub fn records(&self) -> impl Iterator<Item = &RecordBlock> {
        self.sections.iter().filter_map(|section| match section {
            Section::Record(block) => Some(block),
            _ => None,
        })
    }

    pub fn record_count(&self) -> usize {
        self.records().count()
    }
}

/// Appends sections in order
#[derive(Debug, Default)]
pub struct DocumentBuilder {
    sections: Vec<Section>,
}

impl DocumentBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, text: &str) -> Self {
        self.sections.push(Section::Title(text.to_string()));
        self
    }

    pub fn paragraph(mut self, text: &str) -> Self {
        self.sections.push(Section::Paragraph(text.to_string()));
        self
    }

    pub fn callout(mut self, text: String) -> Self {
        self.sections.push(Section::Callout(text));
        self
    }

    pub fn heading(mut self, text: &str) -> Self {
        self.sections.push(Section::Heading(text.to_string()));
        self
    }

    pub fn stats_table(mut self, rows: Vec<(&'static str, String)>) -> Self {
        self.sections.push(Section::StatsTable(rows));
        self
    }

    pub fn record(mut self, index: usize, total: usize, fields: &ReportFields) -> Self {
        self.sections.push(Section::Record(RecordBlock { index, total, fields: fields.labeled() }));
        self
    }

    pub fn closing(mut self, generated_at: NaiveDateTime, total: usize) -> Self {
        self.sections.push(Section::Closing { generated_at, total });
        self
    }

    pub fn build(self) -> ReportDocument {
        ReportDocument { sections: self.sections }
    }
}

/// Build the demand-analysis report for a filtered set.
///
/// # Arguments
/// * `records` - Filtered records, in set order
/// * `query` - Search text as entered; the keyword callout is omitted when blank
/// * `stats` - Statistics of the same records
/// * `generated_at` - Timestamp printed in the closing line
pub fn compose<'a, I>(records: I, query: &str, stats: &Statistics, generated_at: NaiveDateTime) -> ReportDocument
where
    I: IntoIterator<Item = &'a ContractRecord>,
{
    let records: Vec<&ContractRecord> = records.into_iter().collect();
    let total = records.len();

    let mut builder =
        DocumentBuilder::new().title(REPORT_TITLE).paragraph(INTRODUCTION[0]).paragraph(INTRODUCTION[1]);

    let query = query.trim();
    if !query.is_empty() {
        builder = builder.callout(format!("Palabras clave: {}", query));
    }

    builder = builder.heading(STATISTICS_HEADING).stats_table(stats.table_rows());

    for (i, record) in records.iter().enumerate() {
        builder = builder.record(i + 1, total, &ReportFields::from_record(record));
    }

    builder.closing(generated_at, total).build()
}
