/// Field formatting shared by every report renderer
///
/// All functions here are total: any record, including one with every
/// field missing, yields display text.
use crate::types::ContractRecord;
use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::Regex;

/// Display text for a missing value
pub const NOT_AVAILABLE: &str = "not available";

/// Constant text of the observations column
pub const OBSERVATIONS: &str = "Se evidencia adicional al contrato";

/// Labels of a record block, in display order
pub const FIELD_LABELS: [&str; 9] = [
    "No PROCESO SECOP",
    "MODALIDAD",
    "CONTRATISTA",
    "CONTRATANTE",
    "OBJETO",
    "VALOR",
    "PLAZO",
    "ENLACE",
    "OBSERVACIONES",
];

lazy_static! {
    // Legacy single-quoted mapping, e.g. {'url': 'https://...'}
    static ref URL_ENTRY: Regex =
        Regex::new(r#"['"]url['"]\s*:\s*['"]([^'"]*)['"]"#).expect("url entry pattern is valid");
}

/// Insert `,` between groups of three digits
fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut grouped = String::with_capacity(len + len / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    grouped
}

/// Format with thousands separators and a fixed number of decimals
pub fn format_grouped(value: f64, decimals: usize) -> String {
    let value = if decimals == 0 { value.round_ties_even() } else { value };
    let text = format!("{:.*}", decimals, value.abs());
    let (integer, fraction) = match text.split_once('.') {
        Some((integer, fraction)) => (integer, Some(fraction)),
        None => (text.as_str(), None),
    };

    let is_zero = text.bytes().all(|b| b == b'0' || b == b'.');
    let mut out = String::new();
    if value.is_sign_negative() && !is_zero {
        out.push('-');
    }
    out.push_str(&group_thousands(integer));
    if let Some(fraction) = fraction {
        out.push('.');
        out.push_str(fraction);
    }
    out
}

/// Count with thousands separators
pub fn format_count(count: usize) -> String {
    group_thousands(&count.to_string())
}

/// `$ 1,500,000`, or the not-available marker
pub fn format_currency(amount: Option<f64>) -> String {
    match amount {
        Some(value) if value.is_finite() => format!("$ {}", format_grouped(value, 0)),
        _ => NOT_AVAILABLE.to_string(),
    }
}

/// Short currency for summary metrics: `$1.25B`, `$12.3M`, `$950,000`
pub fn format_compact_currency(amount: Option<f64>) -> String {
    let value = match amount {
        Some(value) if value.is_finite() && value != 0.0 => value,
        _ => return "$0".to_string(),
    };

    if value.abs() >= 1_000_000_000.0 {
        format!("${}B", format_grouped(value / 1_000_000_000.0, 2))
    } else if value.abs() >= 1_000_000.0 {
        format!("${}M", format_grouped(value / 1_000_000.0, 1))
    } else {
        format!("${}", format_grouped(value, 0))
    }
}

/// Contract term between two dates.
///
/// 30 days or more is expressed in rounded months (`2 MESES (45 días)`,
/// `1 MES (30 días)`); shorter spans in days (`15 DÍAS`). Reversed dates
/// give a negative day count.
pub fn format_duration(start: Option<NaiveDate>, end: Option<NaiveDate>) -> String {
    let (Some(start), Some(end)) = (start, end) else {
        return NOT_AVAILABLE.to_string();
    };

    let days = (end - start).num_days();
    if days >= 30 {
        let months = (days as f64 / 30.0).round_ties_even() as i64;
        let unit = if months == 1 { "MES" } else { "MESES" };
        format!("{} {} ({} días)", months, unit, days)
    } else {
        format!("{} DÍAS", days)
    }
}

/// Clean link from the `urlproceso` cell.
///
/// A serialized mapping with a `url` key yields that value; anything
/// that fails to decode is returned as-is.
pub fn extract_url(raw: Option<&str>) -> String {
    let text = match raw.map(str::trim) {
        Some(text) if !text.is_empty() && !text.eq_ignore_ascii_case("nan") && text != NOT_AVAILABLE => text,
        _ => return NOT_AVAILABLE.to_string(),
    };

    if text.starts_with('{')
        && text.contains("url")
        && let Some(url) = decode_url_mapping(text)
    {
        return if url.trim().is_empty() { NOT_AVAILABLE.to_string() } else { url };
    }

    text.to_string()
}

fn decode_url_mapping(text: &str) -> Option<String> {
    if let Ok(serde_json::Value::Object(map)) = serde_json::from_str::<serde_json::Value>(text)
        && let Some(url) = map.get("url").and_then(|v| v.as_str())
    {
        return Some(url.to_string());
    }

    URL_ENTRY.captures(text).map(|caps| caps[1].to_string())
}

fn upper_or_missing(value: Option<&str>) -> String {
    value.map(str::to_uppercase).unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

/// Display-ready values of one record, identical across renderers
#[derive(Debug, Clone, PartialEq)]
pub struct ReportFields {
    pub process: String,
    pub modality: String,
    pub contractor: String,
    pub contracting_party: String,
    pub object: String,
    pub value: String,
    pub duration: String,
    pub link: String,
    pub observations: String,
}

impl ReportFields {
    pub fn from_record(record: &ContractRecord) -> Self {
        let entity = upper_or_missing(record.entity_name.as_deref());
        let contracting_party = match record.city.as_deref() {
            Some(city) => format!("{}, {}", entity, city.to_uppercase()),
            None => entity,
        };

        Self {
            process: record.process_reference.clone().unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            modality: upper_or_missing(record.contracting_modality.as_deref()),
            contractor: upper_or_missing(record.awarded_provider.as_deref()),
            contracting_party,
            object: upper_or_missing(record.contract_object.as_deref()),
            value: format_currency(record.contract_value),
            duration: format_duration(record.start_date, record.end_date),
            link: extract_url(record.process_url.as_deref()),
            observations: OBSERVATIONS.to_string(),
        }
    }

    /// Values paired with `FIELD_LABELS`
    pub fn labeled(&self) -> Vec<(&'static str, String)> {
        let values = [
            &self.process,
            &self.modality,
            &self.contractor,
            &self.contracting_party,
            &self.object,
            &self.value,
            &self.duration,
            &self.link,
            &self.observations,
        ];
        FIELD_LABELS.iter().zip(values).map(|(label, value)| (*label, value.clone())).collect()
    }
}
