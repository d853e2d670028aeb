//! Workbook rendering of a `ReportDocument`: one row per contract.

use super::content::{RecordBlock, ReportDocument};
use crate::errors::Result;
use crate::format::FIELD_LABELS;
use rust_xlsxwriter::{Color, Format, FormatAlign, FormatBorder, Workbook};
use unicode_width::UnicodeWidthStr;

pub const SHEET_NAME: &str = "Análisis Demanda";

/// Widths, in characters, of the `No` column followed by each field column
pub const COLUMN_WIDTHS: [f64; 10] = [5.0, 22.0, 20.0, 35.0, 40.0, 60.0, 18.0, 20.0, 60.0, 40.0];

const LINE_HEIGHT: f64 = 15.0;
/// Tallest row Excel accepts, in points
const MAX_ROW_HEIGHT: f64 = 409.0;

/// Lines `text` occupies when wrapped at `width` characters
fn wrapped_lines(text: &str, width: f64) -> usize {
    let per_line = (width.floor() as usize).max(1);
    text.split('\n').map(|line| line.width().div_ceil(per_line).max(1)).sum()
}

/// Row height, in points, fitting the tallest wrapped cell up to `MAX_ROW_HEIGHT`
pub fn row_height(cells: &[&str]) -> f64 {
    let lines = cells
        .iter()
        .zip(COLUMN_WIDTHS.iter())
        .map(|(cell, width)| wrapped_lines(cell, *width))
        .max()
        .unwrap_or(1)
        .max(1);
    (lines as f64 * LINE_HEIGHT).min(MAX_ROW_HEIGHT)
}

/// Cell texts of one contract row: the index, then each field in `FIELD_LABELS` order
pub fn row_cells(block: &RecordBlock) -> Vec<String> {
    std::iter::once(block.index.to_string()).chain(block.fields.iter().map(|(_, value)| value.clone())).collect()
}

/// Render the record blocks of `doc` as an xlsx workbook
pub fn render_spreadsheet(doc: &ReportDocument) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();

    let header_format = Format::new()
        .set_bold()
        .set_font_color(Color::White)
        .set_background_color(Color::RGB(0x003366))
        .set_text_wrap()
        .set_align(FormatAlign::Top)
        .set_border(FormatBorder::Thin);
    let cell_format = Format::new().set_text_wrap().set_align(FormatAlign::Top).set_border(FormatBorder::Thin);

    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SHEET_NAME)?;

    for (col, width) in COLUMN_WIDTHS.iter().enumerate() {
        worksheet.set_column_width(col as u16, *width)?;
    }

    worksheet.write_string_with_format(0, 0, "No", &header_format)?;
    for (col, label) in FIELD_LABELS.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16 + 1, *label, &header_format)?;
    }
    worksheet.set_freeze_panes(1, 0)?;

    for (i, block) in doc.records().enumerate() {
        let row = i as u32 + 1;
        worksheet.write_number_with_format(row, 0, block.index as f64, &cell_format)?;

        let cells = row_cells(block);
        for (col, value) in cells.iter().enumerate().skip(1) {
            worksheet.write_string_with_format(row, col as u16, value, &cell_format)?;
        }

        let cell_refs: Vec<&str> = cells.iter().map(String::as_str).collect();
        worksheet.set_row_height(row, row_height(&cell_refs))?;
    }

    Ok(workbook.save_to_buffer()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::content::compose;
    use crate::format::ReportFields;
    use crate::report::stats::{Statistics, aggregate};
    use crate::types::ContractRecord;
    use chrono::NaiveDateTime;

    fn timestamp() -> NaiveDateTime {
        chrono::NaiveDate::from_ymd_opt(2024, 5, 2).and_then(|d| d.and_hms_opt(8, 0, 0)).unwrap()
    }

    #[test]
    fn test_row_height_follows_longest_wrapped_cell() {
        assert_eq!(row_height(&["1", "short"]), LINE_HEIGHT);
        // OBJETO column (index 5) is 60 characters wide
        let object = "x".repeat(130);
        let cells = ["1", "", "", "", "", object.as_str()];
        assert_eq!(row_height(&cells), 3.0 * LINE_HEIGHT);
        assert_eq!(row_height(&["1", "a\nb\nc\nd"]), 4.0 * LINE_HEIGHT);
        assert_eq!(row_height(&[]), LINE_HEIGHT);
    }

    #[test]
    fn test_row_height_capped_for_huge_cells() {
        let object = "x".repeat(6000);
        let cells = ["1", "", "", "", "", object.as_str()];
        assert_eq!(row_height(&cells), MAX_ROW_HEIGHT);
        let many_lines = "z\n".repeat(500);
        assert_eq!(row_height(&["1", many_lines.as_str()]), MAX_ROW_HEIGHT);
    }

    #[test]
    fn test_row_cells_match_report_fields() {
        let records = vec![
            ContractRecord {
                entity_name: Some("Alcaldía de Girón".to_string()),
                city: Some("Girón".to_string()),
                contract_object: Some("Vigilancia de sedes".to_string()),
                contract_value: Some(1_200_000_000.0),
                process_reference: Some("CO1.PCCNTR.100".to_string()),
                ..Default::default()
            },
            ContractRecord { contract_object: Some("Aseo".to_string()), ..Default::default() },
        ];
        let doc = compose(&records, "", &aggregate(&records), timestamp());

        for (block, record) in doc.records().zip(&records) {
            let fields = ReportFields::from_record(record);
            let expected: Vec<String> = std::iter::once(block.index.to_string())
                .chain([
                    fields.process,
                    fields.modality,
                    fields.contractor,
                    fields.contracting_party,
                    fields.object,
                    fields.value,
                    fields.duration,
                    fields.link,
                    fields.observations,
                ])
                .collect();
            assert_eq!(row_cells(block), expected);
            assert_eq!(row_cells(block).len(), FIELD_LABELS.len() + 1);
        }

        let first = doc.records().next().unwrap();
        assert_eq!(row_cells(first)[0], "1");
        assert_eq!(row_cells(first)[4], "ALCALDÍA DE GIRÓN, GIRÓN");
    }

    #[test]
    fn test_wrapped_lines_minimum_one() {
        assert_eq!(wrapped_lines("", 20.0), 1);
        assert_eq!(wrapped_lines(&"y".repeat(40), 20.0), 2);
        assert_eq!(wrapped_lines(&"y".repeat(41), 20.0), 3);
    }

    #[test]
    fn test_workbook_bytes() {
        let records = vec![ContractRecord {
            contract_object: Some("Suministro de alimentos".to_string()),
            ..Default::default()
        }];
        let doc = compose(&records, "alimentos", &aggregate(&records), timestamp());
        let bytes = render_spreadsheet(&doc).unwrap();
        assert!(bytes.starts_with(b"PK"));
    }

    #[test]
    fn test_empty_workbook_still_renders() {
        let doc = compose(&Vec::<ContractRecord>::new(), "", &Statistics::default(), timestamp());
        let bytes = render_spreadsheet(&doc).unwrap();
        assert!(bytes.starts_with(b"PK"));
    }
}
