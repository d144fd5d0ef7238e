//! Formatting utilities for table cells.

use std::sync::LazyLock;

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use regex::Regex;
use serde_json::Value;

/// Placeholder rendered when a cell has no usable value.
pub const MISSING: &str = "-";

/// Default date rendering (day-first long form, local time).
pub const DEFAULT_DATE_FORMAT: &str = "%d/%m/%Y %H:%M:%S";

/// Legacy serialized-epoch form: `/Date(1700000000000)/`, optionally with an offset.
static LEGACY_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^/Date\((-?\d+)(?:[+-]\d{4})?\)/$").expect("static regex")
});

const SIZE_UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

/// Format a byte count with 1024-based units, rounded to two decimals.
pub fn format_size(bytes: f64) -> String {
    if !bytes.is_finite() || bytes <= 0.0 {
        return "0 Bytes".to_string();
    }
    let mut exp = 0;
    let mut scaled = bytes;
    while scaled >= 1024.0 && exp < SIZE_UNITS.len() - 1 {
        scaled /= 1024.0;
        exp += 1;
    }
    let rounded = (scaled * 100.0).round() / 100.0;
    format!("{} {}", format_number(rounded), SIZE_UNITS[exp])
}

/// Render a number without a trailing `.0` for integral values.
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// Parse any date representation the platform emits.
///
/// Accepts the legacy `/Date(<millis>)/` form, RFC 3339, naive ISO date-times,
/// plain dates and raw epoch milliseconds.
pub fn parse_date(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => parse_date_str(s.trim()),
        Value::Number(n) => n.as_i64().and_then(|ms| Utc.timestamp_millis_opt(ms).single()),
        _ => None,
    }
}

fn parse_date_str(s: &str) -> Option<DateTime<Utc>> {
    if s.is_empty() {
        return None;
    }
    if let Some(caps) = LEGACY_DATE.captures(s) {
        let ms: i64 = caps[1].parse().ok()?;
        return Utc.timestamp_millis_opt(ms).single();
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Format a date value in local time, or [`MISSING`] when it cannot be parsed.
pub fn format_date(value: &Value, format: &str) -> String {
    match parse_date(value) {
        Some(dt) => dt.with_timezone(&Local).format(format).to_string(),
        None => MISSING.to_string(),
    }
}

/// Fold common Latin accents so comparisons order "Álvaro" next to "alvaro".
fn fold_char(c: char) -> char {
    match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' => 'a',
        'ç' => 'c',
        'è' | 'é' | 'ê' | 'ë' => 'e',
        'ì' | 'í' | 'î' | 'ï' => 'i',
        'ñ' => 'n',
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' => 'o',
        'ù' | 'ú' | 'û' | 'ü' => 'u',
        'ý' | 'ÿ' => 'y',
        other => other,
    }
}

/// Collation-style string comparison: accent- and case-insensitive first,
/// then by exact text so the order is total.
pub fn compare_text(a: &str, b: &str) -> std::cmp::Ordering {
    let fold = |s: &str| -> Vec<char> {
        s.chars()
            .flat_map(char::to_lowercase)
            .map(fold_char)
            .collect()
    };
    fold(a).cmp(&fold(b)).then_with(|| a.cmp(b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::cmp::Ordering;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(0.0), "0 Bytes");
        assert_eq!(format_size(500.0), "500 Bytes");
        assert_eq!(format_size(1536.0), "1.5 KB");
        assert_eq!(format_size(1_048_576.0), "1 MB");
        assert_eq!(format_size(1_234_567.0), "1.18 MB");
        assert_eq!(format_size(5.0 * 1024.0 * 1024.0 * 1024.0 * 1024.0), "5120 GB");
    }

    #[test]
    fn test_parse_legacy_date() {
        let dt = parse_date(&json!("/Date(1700000000000)/")).unwrap();
        assert_eq!(dt.timestamp_millis(), 1_700_000_000_000);

        let dt = parse_date(&json!("/Date(1700000000000+0100)/")).unwrap();
        assert_eq!(dt.timestamp_millis(), 1_700_000_000_000);
    }

    #[test]
    fn test_parse_iso_dates() {
        assert!(parse_date(&json!("2024-03-01T10:20:30Z")).is_some());
        assert!(parse_date(&json!("2024-03-01T10:20:30")).is_some());
        assert!(parse_date(&json!("2024-03-01")).is_some());
        assert!(parse_date(&json!(1_700_000_000_000i64)).is_some());
    }

    #[test]
    fn test_unparseable_date_is_missing() {
        assert_eq!(format_date(&json!("not a date"), DEFAULT_DATE_FORMAT), MISSING);
        assert_eq!(format_date(&Value::Null, DEFAULT_DATE_FORMAT), MISSING);
        assert_eq!(format_date(&json!(""), DEFAULT_DATE_FORMAT), MISSING);
    }

    #[test]
    fn test_compare_text() {
        assert_eq!(compare_text("álvaro", "Beatriz"), Ordering::Less);
        assert_eq!(compare_text("b", "A"), Ordering::Greater);
        assert_eq!(compare_text("same", "same"), Ordering::Equal);
    }
}
