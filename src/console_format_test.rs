/// Tests for console formatting module
///
/// These tests ensure the results table keeps a stable shape
/// at a fixed console width.

#[cfg(test)]
mod tests {
    use crate::console_format::*;
    use crate::format::NOT_AVAILABLE;
    use crate::report::aggregate;
    use crate::types::ContractRecord;

    /// Standard width for tests to ensure reproducible output
    const TEST_CONSOLE_WIDTH: usize = 120;

    /// Set up test environment with fixed console width
    fn setup_test_width() {
        set_console_width(TEST_CONSOLE_WIDTH);
    }

    fn record(entity: &str, object: &str, value: Option<f64>) -> ContractRecord {
        ContractRecord {
            entity_name: Some(entity.to_string()),
            city: Some("Piedecuesta".to_string()),
            contracting_modality: Some("Selección abreviada de menor cuantía".to_string()),
            contract_object: Some(object.to_string()),
            contract_value: value,
            ..Default::default()
        }
    }

    #[test]
    fn test_display_width_ascii() {
        assert_eq!(display_width("hello"), 5);
        assert_eq!(display_width(""), 0);
        assert_eq!(display_width("test123"), 7);
    }

    #[test]
    fn test_display_width_unicode() {
        // Box drawing and accented characters are single width
        assert_eq!(display_width("│"), 1);
        assert_eq!(display_width("─"), 1);
        assert_eq!(display_width("Girón"), 5);
        // Wide characters
        assert_eq!(display_width("📦"), 2);
    }

    #[test]
    fn test_truncate_with_padding_exact_fit() {
        let result = truncate_with_padding("hello", 5);
        assert_eq!(result, "hello");
        assert_eq!(display_width(&result), 5);
    }

    #[test]
    fn test_truncate_with_padding_needs_padding() {
        let result = truncate_with_padding("hi", 5);
        assert_eq!(result, "hi   ");
        assert_eq!(display_width(&result), 5);
    }

    #[test]
    fn test_truncate_with_padding_needs_truncation() {
        let result = truncate_with_padding("vigilancia privada", 10);
        assert_eq!(result, "vigilan...");
        assert_eq!(display_width(&result), 10);
    }

    #[test]
    fn test_pad_left() {
        assert_eq!(pad_left("$ 1,500", 10), "   $ 1,500");
        assert_eq!(display_width(&pad_left("$ 123,456,789,012", 8)), 8);
    }

    #[test]
    fn test_table_widths_calculation() {
        let widths = TableWidths::new(TEST_CONSOLE_WIDTH);
        assert_eq!(widths.total, TEST_CONSOLE_WIDTH);
        assert!(widths.object > widths.entity);
        assert!(widths.entity >= 12);

        // Narrow terminals keep usable minimums
        let narrow = TableWidths::new(40);
        assert!(narrow.entity >= 12);
        assert!(narrow.object >= 12);
    }

    #[test]
    fn test_table_header_contains_all_columns() {
        setup_test_width();
        let header = format_table_header();
        for column in ["Entidad", "Ciudad", "Modalidad", "Valor", "Objeto"] {
            assert!(header.contains(column), "missing {}", column);
        }
        assert_eq!(header.lines().count(), 3);
    }

    #[test]
    fn test_rows_match_header_width() {
        setup_test_width();
        let widths = get_widths();
        let header = format_table_header();
        let row = format_record_row(&record(
            "Empresa Social del Estado Hospital Universitario de Santander",
            "Suministro de\nmedicamentos y dispositivos médicos para la red hospitalaria departamental",
            Some(2_345_678_901.0),
        ));
        let footer = format_table_footer();

        for line in header.lines().chain(row.lines()).chain(footer.lines()) {
            assert_eq!(display_width(line), widths.total, "line {:?}", line);
        }
        assert_eq!(row.lines().count(), 1);
        assert!(row.contains("$ 2,345,678,901"));
    }

    #[test]
    fn test_missing_values_show_not_available() {
        setup_test_width();
        let row = format_record_row(&ContractRecord::default());
        assert_eq!(row.matches(NOT_AVAILABLE).count(), 5);
    }

    #[test]
    fn test_summary_metrics() {
        let records = vec![
            record("Alcaldía de Piedecuesta", "vigilancia", Some(1_200_000_000.0)),
            record("Alcaldía de Piedecuesta", "aseo", Some(300_000_000.0)),
            record("Gobernación de Santander", "obra", None),
        ];
        let metrics = summary_metrics(&aggregate(&records));
        assert_eq!(metrics[0], ("Contratos encontrados", "3".to_string()));
        assert_eq!(metrics[1], ("Valor total", "$1.50B".to_string()));
        assert_eq!(metrics[2], ("Entidades", "2".to_string()));
        assert_eq!(metrics[3], ("Ciudades", "1".to_string()));

        let empty = summary_metrics(&aggregate(&Vec::<ContractRecord>::new()));
        assert_eq!(empty[1], ("Valor total", "$0".to_string()));
    }

    #[test]
    fn test_results_table_respects_limit() {
        setup_test_width();
        let records: Vec<ContractRecord> =
            (0..5).map(|i| record("Alcaldía", &format!("objeto {}", i), Some(1000.0))).collect();
        let refs: Vec<&ContractRecord> = records.iter().collect();

        let mut buffer = Vec::new();
        TableWriter::new(&mut buffer, false).write_results_table(&refs, 3).unwrap();
        let output = String::from_utf8(buffer).unwrap();
        assert_eq!(output.lines().filter(|l| l.contains("objeto ")).count(), 3);
        assert!(output.contains("Mostrando 3 de 5 contratos"));

        let mut buffer = Vec::new();
        TableWriter::new(&mut buffer, false).write_results_table(&refs, 0).unwrap();
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_summary_plain_output() {
        let records = vec![record("Alcaldía", "vigilancia", Some(950_000.0))];
        let mut buffer = Vec::new();
        TableWriter::new(&mut buffer, false).write_summary(&aggregate(&records)).unwrap();
        let output = String::from_utf8(buffer).unwrap();
        assert!(output.contains("Contratos encontrados: 1"));
        assert!(output.contains("Valor total: $950,000"));
    }
}
