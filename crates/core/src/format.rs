//! es-CL display formatting helpers.
//!
//! The dashboard renders for Chilean operators: `.` groups thousands,
//! `,` separates decimals, absent values read "Sin datos" in detail panels
//! and "—" in table cells.

use chrono::DateTime;
use rust_decimal::{Decimal, RoundingStrategy};

/// Placeholder for absent values in detail panels.
pub const NO_DATA: &str = "Sin datos";

/// Placeholder for absent values in table cells.
pub const DASH: &str = "—";

/// Group an integer digit string with `.` separators: `1234567` → `1.234.567`.
fn group_digits(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    let offset = digits.len() % 3;
    for (i, c) in digits.chars().enumerate() {
        if i != 0 && (i + 3 - offset) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(c);
    }
    grouped
}

/// Format a decimal rounded to a whole amount with es-CL grouping.
///
/// Used for currency display, which carries no decimals in CLP.
#[must_use]
pub fn format_integer_amount(value: Decimal) -> String {
    let rounded = value.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    let text = rounded.normalize().to_string();
    let (sign, digits) = text
        .strip_prefix('-')
        .map_or(("", text.as_str()), |rest| ("-", rest));
    format!("{sign}{}", group_digits(digits))
}

/// Format a number with es-CL grouping, keeping up to three decimals.
#[must_use]
pub fn format_number(value: Decimal) -> String {
    let rounded = value.round_dp_with_strategy(3, RoundingStrategy::MidpointAwayFromZero);
    let text = rounded.normalize().to_string();
    let (sign, rest) = text
        .strip_prefix('-')
        .map_or(("", text.as_str()), |body| ("-", body));
    match rest.split_once('.') {
        Some((whole, frac)) => format!("{sign}{},{frac}", group_digits(whole)),
        None => format!("{sign}{}", group_digits(rest)),
    }
}

/// Parse an RFC 3339 timestamp and render it as `dd-mm-YYYY HH:MM`.
///
/// Returns `None` when the value does not parse; callers decide whether to
/// fall back to the raw string (tables) or a placeholder (detail panels).
#[must_use]
pub fn format_datetime(value: &str) -> Option<String> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.format("%d-%m-%Y %H:%M").to_string())
}

/// Table-cell rendering of an optional timestamp: raw string when it does not
/// parse, `—` when absent.
#[must_use]
pub fn format_datetime_or_raw(value: Option<&str>) -> String {
    value.map_or_else(
        || DASH.to_string(),
        |raw| format_datetime(raw).unwrap_or_else(|| raw.to_string()),
    )
}

/// Detail-panel rendering of an optional timestamp: `Sin datos` for anything
/// that is absent or unparseable.
#[must_use]
pub fn format_datetime_or_no_data(value: Option<&str>) -> String {
    value
        .and_then(format_datetime)
        .unwrap_or_else(|| NO_DATA.to_string())
}

/// Detail-panel rendering of optional text: trimmed, `Sin datos` when blank.
#[must_use]
pub fn format_text(value: Option<&str>) -> String {
    match value.map(str::trim) {
        Some(text) if !text.is_empty() => text.to_string(),
        _ => NO_DATA.to_string(),
    }
}

/// Detail-panel rendering of an optional count.
#[must_use]
pub fn format_count(value: Option<Decimal>) -> String {
    value.map_or_else(|| NO_DATA.to_string(), format_number)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    #[test]
    fn test_group_digits() {
        assert_eq!(format_integer_amount(Decimal::from(0)), "0");
        assert_eq!(format_integer_amount(Decimal::from(999)), "999");
        assert_eq!(format_integer_amount(Decimal::from(1000)), "1.000");
        assert_eq!(format_integer_amount(Decimal::from(1_234_567)), "1.234.567");
        assert_eq!(format_integer_amount(Decimal::from(-45_000)), "-45.000");
    }

    #[test]
    fn test_integer_amount_rounds_half_up() {
        let value = Decimal::from_str("1999.5").expect("decimal");
        assert_eq!(format_integer_amount(value), "2.000");
    }

    #[test]
    fn test_format_number_decimals() {
        let value = Decimal::from_str("1234.5").expect("decimal");
        assert_eq!(format_number(value), "1.234,5");
        assert_eq!(format_number(Decimal::from(7)), "7");
    }

    #[test]
    fn test_format_datetime() {
        let formatted = format_datetime("2024-03-05T14:30:00Z").expect("parses");
        assert_eq!(formatted, "05-03-2024 14:30");
        assert!(format_datetime("ayer").is_none());
    }

    #[test]
    fn test_datetime_fallbacks() {
        assert_eq!(format_datetime_or_raw(None), "—");
        assert_eq!(format_datetime_or_raw(Some("ayer")), "ayer");
        assert_eq!(format_datetime_or_no_data(Some("ayer")), "Sin datos");
        assert_eq!(format_datetime_or_no_data(None), "Sin datos");
    }

    #[test]
    fn test_format_text() {
        assert_eq!(format_text(Some("  hola  ")), "hola");
        assert_eq!(format_text(Some("   ")), "Sin datos");
        assert_eq!(format_text(None), "Sin datos");
    }
}
