/// Console formatting module - Pure rendering concerns
///
/// This module handles all console output formatting for a search result:
/// - The headline metrics line
/// - Results table layout and borders
/// - Color terminal output
/// - Text truncation and padding
///
/// It accepts records and statistics and renders them to any
/// `std::io::Write` destination through `TableWriter`.

use crate::format::{NOT_AVAILABLE, format_compact_currency, format_count, format_currency};
use crate::report::Statistics;
use crate::types::ContractRecord;
use log::debug;
use std::io::{self, Write};
use std::sync::OnceLock;
use term::color::Color;
use terminal_size::{Width, terminal_size};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Writer for table output - configurable for color/plain text
pub struct TableWriter<W: Write> {
    writer: W,
    use_colors: bool,
}

impl<W: Write> TableWriter<W> {
    /// Create a new table writer
    pub fn new(writer: W, use_colors: bool) -> Self {
        Self { writer, use_colors }
    }

    /// Write formatted text, optionally with color
    fn write_colored(&mut self, text: &str, color: Color) -> io::Result<()> {
        if self.use_colors {
            if let Some(ref mut t) = term::stdout() {
                let _ = t.fg(color);
                let _ = t.attr(term::Attr::Bold);
                let _ = t.write_all(text.as_bytes());
                let _ = t.reset();
                Ok(())
            } else {
                write!(self.writer, "{}", text)
            }
        } else {
            write!(self.writer, "{}", text)
        }
    }

    /// Write the four headline metrics
    pub fn write_summary(&mut self, stats: &Statistics) -> io::Result<()> {
        let metrics = summary_metrics(stats);
        writeln!(self.writer)?;
        for (i, (label, value)) in metrics.iter().enumerate() {
            if i > 0 {
                write!(self.writer, "   ")?;
            }
            write!(self.writer, "{}: ", label)?;
            self.write_colored(value, term::color::BRIGHT_CYAN)?;
        }
        writeln!(self.writer)?;
        writeln!(self.writer)
    }

    /// Write the first `limit` records as a bordered table
    pub fn write_results_table(&mut self, records: &[&ContractRecord], limit: usize) -> io::Result<()> {
        if limit == 0 || records.is_empty() {
            return Ok(());
        }

        write!(self.writer, "{}", format_table_header())?;
        for record in records.iter().take(limit) {
            write!(self.writer, "{}", format_record_row(record))?;
        }
        write!(self.writer, "{}", format_table_footer())?;

        if records.len() > limit {
            writeln!(self.writer, "Mostrando {} de {} contratos", limit, format_count(records.len()))?;
        }
        Ok(())
    }
}

/// Labeled headline metrics: contracts, total value, entities, cities
pub fn summary_metrics(stats: &Statistics) -> [(&'static str, String); 4] {
    [
        ("Contratos encontrados", format_count(stats.total)),
        ("Valor total", format_compact_currency(stats.value_sum)),
        ("Entidades", format_count(stats.distinct_entities)),
        ("Ciudades", format_count(stats.distinct_cities)),
    ]
}

//
// Table Layout and Widths
//

/// Column widths for the 5-column results table
#[derive(Debug, Clone, Copy)]
pub struct TableWidths {
    pub entity: usize,
    pub city: usize,
    pub modality: usize,
    pub value: usize,
    pub object: usize,
    pub total: usize, // Total table width including borders
}

impl TableWidths {
    pub fn new(terminal_width: usize) -> Self {
        // Borders: │ = 6 characters (1 before each column + 1 at end)
        let borders = 6;
        let available = terminal_width.saturating_sub(borders);

        let city = 16;
        let modality = 24;
        // "$ 1,234,567,890,123" fits
        let value = 21;

        // Entity and object share what is left, object gets the larger part
        let remaining = available.saturating_sub(city + modality + value);
        let entity = (remaining * 2 / 5).max(12);
        let object = remaining.saturating_sub(entity).max(12);

        let total = entity + city + modality + value + object + borders;
        TableWidths { entity, city, modality, value, object, total }
    }
}

/// Get terminal width or default to 120
fn get_terminal_width() -> usize {
    if let Some((Width(w), _)) = terminal_size() {
        w as usize
    } else {
        120 // Default width
    }
}

// Table widths - fixed on first use
static WIDTHS: OnceLock<TableWidths> = OnceLock::new();

/// Fix the table width instead of asking the terminal
pub fn set_console_width(width: usize) {
    let _ = WIDTHS.set(TableWidths::new(width)); // Ignore error if already initialized
}

/// Get table widths (with fallback to the terminal width if not set)
pub fn get_widths() -> &'static TableWidths {
    WIDTHS.get_or_init(|| {
        let widths = TableWidths::new(get_terminal_width());
        debug!("Results table is {} columns wide", widths.total);
        widths
    })
}

//
// Text Formatting Utilities
//

/// Count the display width of a string, accounting for wide Unicode characters
pub fn display_width(s: &str) -> usize {
    UnicodeWidthStr::width(s)
}

/// Truncate and pad string to exact width
pub fn truncate_with_padding(s: &str, width: usize) -> String {
    let display_w = display_width(s);

    if display_w > width {
        let mut result = String::new();
        let mut current_width = 0;

        // Reserve space for "..."
        let target_width = if width >= 3 { width - 3 } else { width };

        for c in s.chars() {
            let c_width = UnicodeWidthChar::width(c).unwrap_or(1);
            if current_width + c_width > target_width {
                break;
            }
            result.push(c);
            current_width += c_width;
        }

        if width >= 3 {
            result.push_str("...");
            current_width += 3;
        }

        if current_width < width {
            result.push_str(&" ".repeat(width - current_width));
        }

        result
    } else {
        let padding = width - display_w;
        format!("{}{}", s, " ".repeat(padding))
    }
}

/// Right-align within `width`, truncating like `truncate_with_padding`
pub fn pad_left(s: &str, width: usize) -> String {
    let display_w = display_width(s);
    if display_w > width { truncate_with_padding(s, width) } else { format!("{}{}", " ".repeat(width - display_w), s) }
}

// Multi-line values (objects often carry line breaks) print on one line
fn single_line(value: Option<&str>) -> String {
    match value {
        Some(v) => v.split_whitespace().collect::<Vec<_>>().join(" "),
        None => NOT_AVAILABLE.to_string(),
    }
}

//
// Table Header/Footer Rendering
//

/// Format table header as a string
pub fn format_table_header() -> String {
    let w = get_widths();

    let mut output = String::new();
    output.push_str(&format!(
        "┌{:─<width1$}┬{:─<width2$}┬{:─<width3$}┬{:─<width4$}┬{:─<width5$}┐\n",
        "",
        "",
        "",
        "",
        "",
        width1 = w.entity,
        width2 = w.city,
        width3 = w.modality,
        width4 = w.value,
        width5 = w.object
    ));
    output.push_str(&format!(
        "│{:^width1$}│{:^width2$}│{:^width3$}│{:^width4$}│{:^width5$}│\n",
        "Entidad",
        "Ciudad",
        "Modalidad",
        "Valor",
        "Objeto",
        width1 = w.entity,
        width2 = w.city,
        width3 = w.modality,
        width4 = w.value,
        width5 = w.object
    ));
    output.push_str(&format!(
        "├{:─<width1$}┼{:─<width2$}┼{:─<width3$}┼{:─<width4$}┼{:─<width5$}┤\n",
        "",
        "",
        "",
        "",
        "",
        width1 = w.entity,
        width2 = w.city,
        width3 = w.modality,
        width4 = w.value,
        width5 = w.object
    ));

    output
}

/// Format one record as a table row
pub fn format_record_row(record: &ContractRecord) -> String {
    let w = get_widths();
    format!(
        "│ {} │ {} │ {} │ {} │ {} │\n",
        truncate_with_padding(&single_line(record.entity_name.as_deref()), w.entity - 2),
        truncate_with_padding(&single_line(record.city.as_deref()), w.city - 2),
        truncate_with_padding(&single_line(record.contracting_modality.as_deref()), w.modality - 2),
        pad_left(&format_currency(record.contract_value), w.value - 2),
        truncate_with_padding(&single_line(record.contract_object.as_deref()), w.object - 2),
    )
}

/// Format table footer as a string
pub fn format_table_footer() -> String {
    let w = get_widths();
    format!(
        "└{:─<width1$}┴{:─<width2$}┴{:─<width3$}┴{:─<width4$}┴{:─<width5$}┘\n",
        "",
        "",
        "",
        "",
        "",
        width1 = w.entity,
        width2 = w.city,
        width3 = w.modality,
        width4 = w.value,
        width5 = w.object
    )
}

/// Print the headline metrics to stdout with colors
pub fn print_summary(stats: &Statistics) {
    let mut writer = TableWriter::new(io::stdout(), true);
    let _ = writer.write_summary(stats);
}

/// Print the results table to stdout
pub fn print_results_table(records: &[&ContractRecord], limit: usize) {
    let mut writer = TableWriter::new(io::stdout(), false);
    let _ = writer.write_results_table(records, limit);
}

#[cfg(test)]
#[path = "console_format_test.rs"]
mod console_format_test;
