/// Tests for PDF layout and pagination
#[cfg(test)]
mod tests {
    use crate::dataset::RecordStore;
    use crate::report::content::{ReportDocument, compose};
    use crate::report::pdf::*;
    use crate::report::stats::{Statistics, aggregate};
    use crate::search::{FilteredSet, search};
    use crate::format::ReportFields;
    use crate::types::ContractRecord;
    use chrono::{NaiveDate, NaiveDateTime};
    use lopdf::Object;

    fn timestamp() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 7, 20).and_then(|d| d.and_hms_opt(11, 45, 0)).unwrap()
    }

    fn contract(object: &str) -> ContractRecord {
        ContractRecord {
            entity_name: Some("Gobernación de Santander".to_string()),
            city: Some("Bucaramanga".to_string()),
            contracting_modality: Some("Contratación directa".to_string()),
            awarded_provider: Some("Seguridad Andina Ltda".to_string()),
            contract_object: Some(object.to_string()),
            contract_value: Some(25_000_000.0),
            start_date: NaiveDate::from_ymd_opt(2024, 2, 1),
            end_date: NaiveDate::from_ymd_opt(2024, 8, 1),
            process_reference: Some("CO1.PCCNTR.555".to_string()),
            process_url: Some("{'url': 'https://community.secop.gov.co/Public/Tendering/555'}".to_string()),
            ..Default::default()
        }
    }

    fn document(records: &[ContractRecord], query: &str) -> ReportDocument {
        compose(records, query, &aggregate(records), timestamp())
    }

    fn assert_within_content_area(layout: &PdfLayout) {
        for (page, bottom) in layout.page_bottoms.iter().enumerate() {
            assert!(*bottom <= CONTENT_BOTTOM + 0.01, "page {} reaches {}", page + 1, bottom);
        }
    }

    #[test]
    fn test_vigilancia_scenario() {
        let store = RecordStore::from_records(vec![
            contract("Servicio de vigilancia para sedes educativas"),
            contract("Suministro de papelería"),
            contract("VIGILANCIA electrónica del parque"),
        ]);
        let result = search(FilteredSet::all(&store), "vigilancia");
        assert_eq!(result.rows(), &[0, 2]);

        let stats = aggregate(result.records());
        assert_eq!(stats.total, 2);

        let doc = compose(result.records(), "vigilancia", &stats, timestamp());
        let layout = layout(&doc);
        assert_eq!(layout.record_blocks, 2);
        assert_eq!(layout.stats_tables, 1);
        assert_within_content_area(&layout);
    }

    #[test]
    fn test_empty_set_renders_statistics_only() {
        let doc = compose(&Vec::<ContractRecord>::new(), "", &Statistics::default(), timestamp());
        let layout = layout(&doc);
        assert_eq!(layout.pages.len(), 1);
        assert_eq!(layout.record_blocks, 0);
        assert_eq!(layout.stats_tables, 1);

        let bytes = render_pdf(&doc).unwrap();
        assert!(bytes.starts_with(b"%PDF-1.5"));
    }

    #[test]
    fn test_rendered_page_count_matches_layout() {
        let records: Vec<ContractRecord> = (0..25).map(|i| contract(&format!("Mantenimiento vial tramo {}", i))).collect();
        let doc = document(&records, "mantenimiento");
        let expected_pages = layout(&doc).pages.len();
        assert!(expected_pages > 1);

        let bytes = render_pdf(&doc).unwrap();
        let parsed = lopdf::Document::load_mem(&bytes).unwrap();
        assert_eq!(parsed.get_pages().len(), expected_pages);
    }

    #[test]
    fn test_many_blocks_never_cross_page_bottom() {
        let records: Vec<ContractRecord> =
            (0..40).map(|i| contract(&"prestación de servicios profesionales ".repeat(1 + i % 7))).collect();
        let layout = layout(&document(&records, ""));
        assert_eq!(layout.record_blocks, 40);
        assert!(layout.pages.len() > 3);
        assert_within_content_area(&layout);
    }

    #[test]
    fn test_value_taller_than_a_page_is_split() {
        let records = vec![contract(&"vigilancia ".repeat(3000))];
        let layout = layout(&document(&records, "vigilancia"));
        assert_eq!(layout.record_blocks, 1);
        assert!(layout.pages.len() > 3, "got {} pages", layout.pages.len());
        assert_within_content_area(&layout);
    }

    #[test]
    fn test_wrap_text() {
        assert_eq!(wrap_text("", 50.0, Font::Regular, 7.5), vec![String::new()]);
        assert_eq!(wrap_text("uno dos", 50.0, Font::Regular, 7.5), vec!["uno dos".to_string()]);
        assert_eq!(wrap_text("uno\ndos", 50.0, Font::Regular, 7.5).len(), 2);

        let lines = wrap_text(&"x".repeat(200), 20.0, Font::Regular, 7.5);
        assert!(lines.len() > 1);
        assert_eq!(lines.concat(), "x".repeat(200));
        for line in &lines {
            assert!(text_width(line, Font::Regular, 7.5) <= 20.0);
        }
    }

    #[test]
    fn test_estimate_text_height() {
        // 138 mm column holds about 65 characters per line, plus one line of slack
        assert!((estimate_text_height("", 138.0) - 8.4).abs() < 1e-4);
        assert!((estimate_text_height(&"a".repeat(130), 138.0) - 12.6).abs() < 1e-4);
        assert!((estimate_text_height("a\nb", 138.0) - 12.6).abs() < 1e-4);
    }

    #[test]
    fn test_win_ansi_encoding() {
        assert_eq!(encode_win_ansi("Página"), vec![b'P', 0xE1, b'g', b'i', b'n', b'a']);
        assert_eq!(encode_win_ansi("SECOP — DÍAS"), b"SECOP \x97 D\xCDAS".to_vec());
        assert_eq!(encode_win_ansi("漢"), vec![b'?']);
    }

    #[test]
    fn test_footer_numbers_pages() {
        let records: Vec<ContractRecord> = (0..25).map(|i| contract(&format!("obra {}", i))).collect();
        let bytes = render_pdf(&document(&records, "")).unwrap();
        let parsed = lopdf::Document::load_mem(&bytes).unwrap();
        let total = parsed.get_pages().len();

        let mut ops = Vec::new();
        page_footer(&mut ops, 2, total);
        let shown: Vec<Vec<u8>> = ops
            .iter()
            .filter(|op| op.operator == "Tj")
            .filter_map(|op| match op.operands.first() {
                Some(Object::String(bytes, _)) => Some(bytes.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(shown, vec![encode_win_ansi(&format!("Página 2/{}", total))]);
    }

    fn shown_strings(pages: &[Vec<lopdf::content::Operation>]) -> Vec<Vec<u8>> {
        pages
            .iter()
            .flatten()
            .filter(|op| op.operator == "Tj")
            .filter_map(|op| match op.operands.first() {
                Some(Object::String(bytes, _)) => Some(bytes.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_every_field_value_is_drawn() {
        let mut long_object = contract(&"Prestación del servicio de vigilancia y seguridad privada ".repeat(4));
        long_object.contract_value = None;
        let records = vec![contract("Servicio de aseo para la sede principal"), long_object];
        let doc = document(&records, "");
        let shown = shown_strings(&layout(&doc).pages);

        let object = ReportFields::from_record(&records[1]).object;
        assert!(wrap_text(&object, COL_VALUE - 4.0, Font::Regular, VALUE_FONT).len() > 1);

        for record in &records {
            for (label, value) in ReportFields::from_record(record).labeled() {
                for line in wrap_text(&value, COL_VALUE - 4.0, Font::Regular, VALUE_FONT) {
                    assert!(shown.contains(&encode_win_ansi(&line)), "{} line {:?} not drawn", label, line);
                }
            }
        }
    }

    #[test]
    fn test_capital_widths_match_helvetica() {
        // 10 pt, 1/1000 em units to mm
        let mm = |units: f32| units / 1000.0 * 10.0 * 25.4 / 72.0;
        assert!((text_width("O", Font::Regular, 10.0) - mm(778.0)).abs() < 1e-4);
        assert!((text_width("Ó", Font::Regular, 10.0) - mm(778.0)).abs() < 1e-4);
        assert!((text_width("A", Font::Regular, 10.0) - mm(667.0)).abs() < 1e-4);
        assert!((text_width("A", Font::Bold, 10.0) - mm(722.0)).abs() < 1e-4);
        assert!((text_width("Í", Font::Regular, 10.0) - mm(278.0)).abs() < 1e-4);
        assert!((text_width("W", Font::Regular, 10.0) - mm(944.0)).abs() < 1e-4);
    }

    #[test]
    fn test_wide_capitals_stay_inside_value_column() {
        let width = COL_VALUE - 4.0;
        let lines = wrap_text(&"O".repeat(400), width, Font::Regular, VALUE_FONT);
        assert!(lines.len() > 1);
        for line in &lines {
            let real = line.chars().count() as f32 * 778.0 / 1000.0 * VALUE_FONT * 25.4 / 72.0;
            assert!(real <= width + 1e-3, "line of {} chars is {} mm", line.chars().count(), real);
        }
    }
}
