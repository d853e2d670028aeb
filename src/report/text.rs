//! Plain-text rendering of a `ReportDocument`.

use super::content::{ReportDocument, Section, format_timestamp};

const RULE_WIDTH: usize = 70;
const FIELD_LABEL_WIDTH: usize = 20;
const STAT_LABEL_WIDTH: usize = 28;

/// Render the report as fixed-width text, one block per contract
pub fn render_text(doc: &ReportDocument) -> String {
    let mut lines: Vec<String> = Vec::new();

    for section in &doc.sections {
        match section {
            Section::Title(title) => {
                lines.push(title.clone());
                lines.push("=".repeat(RULE_WIDTH));
                lines.push(String::new());
            }
            Section::Paragraph(text) => lines.push(text.clone()),
            Section::Callout(text) => {
                lines.push(String::new());
                lines.push(text.clone());
            }
            Section::Heading(heading) => {
                lines.push(String::new());
                lines.push(heading.clone());
                lines.push("=".repeat(RULE_WIDTH));
            }
            Section::StatsTable(rows) => {
                for (label, value) in rows {
                    lines.push(format!("{:<width$} {}", label, value, width = STAT_LABEL_WIDTH));
                }
                lines.push(String::new());
            }
            Section::Record(block) => {
                lines.push("-".repeat(RULE_WIDTH));
                lines.push(format!("CONTRATO {}", block.index));
                lines.push("-".repeat(RULE_WIDTH));
                for (label, value) in &block.fields {
                    lines.push(format!("{:<width$} {}", label, value, width = FIELD_LABEL_WIDTH));
                }
                lines.push(String::new());
            }
            Section::Closing { generated_at, .. } => {
                lines.push(format!("Fecha de generación: {}", format_timestamp(generated_at)));
            }
        }
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::NOT_AVAILABLE;
    use crate::report::content::compose;
    use crate::report::stats::{Statistics, aggregate};
    use crate::types::ContractRecord;
    use chrono::{NaiveDate, NaiveDateTime};

    fn timestamp() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 12, 1).and_then(|d| d.and_hms_opt(16, 30, 0)).unwrap()
    }

    #[test]
    fn test_empty_set_still_has_boilerplate() {
        let doc = compose(&Vec::<ContractRecord>::new(), "", &Statistics::default(), timestamp());
        let text = render_text(&doc);

        assert!(text.starts_with("ANÁLISIS DE LA DEMANDA\n"));
        assert!(text.contains("Se validan en el portal de contratación SECOP"));
        assert!(text.contains(&format!("{:<28} 0", "Total contratos")));
        assert!(text.contains(&format!("{:<28} {}", "Valor total", NOT_AVAILABLE)));
        assert!(!text.contains("CONTRATO 1"));
        assert!(text.ends_with("Fecha de generación: 01/12/2024 16:30"));
    }

    #[test]
    fn test_record_blocks() {
        let records = vec![
            ContractRecord {
                process_reference: Some("CO1.PCCNTR.100".to_string()),
                contract_object: Some("Vigilancia privada".to_string()),
                contract_value: Some(2_000_000.0),
                start_date: NaiveDate::from_ymd_opt(2024, 1, 1),
                end_date: NaiveDate::from_ymd_opt(2024, 1, 16),
                ..Default::default()
            },
            ContractRecord::default(),
        ];
        let doc = compose(&records, "vigilancia", &aggregate(&records), timestamp());
        let text = render_text(&doc);

        assert!(text.contains("Palabras clave: vigilancia"));
        assert!(text.contains("\nCONTRATO 1\n"));
        assert!(text.contains("\nCONTRATO 2\n"));
        assert!(text.contains("No PROCESO SECOP     CO1.PCCNTR.100"));
        assert!(text.contains("OBJETO               VIGILANCIA PRIVADA"));
        assert!(text.contains("VALOR                $ 2,000,000"));
        assert!(text.contains("PLAZO                15 DÍAS"));
        assert!(text.contains(&format!("MODALIDAD            {}", NOT_AVAILABLE)));
        assert!(text.contains("OBSERVACIONES        Se evidencia adicional al contrato"));

        let rules = text.lines().filter(|l| *l == "-".repeat(70)).count();
        assert_eq!(rules, 4);
    }
}
