//! Tolerant date/time parsing and temporal statistics.
//!
//! Values that fail to parse are counted, never raised. RFC 3339 is tried
//! first, then each configured chrono format in order; a date-only format
//! yields midnight.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Weekday};

use crate::batch::{CellValue, Column};
use crate::config::DateTimeConfig;
use crate::profiling::statistics::ratio;
use crate::profiling::types::{DateTimeStats, FormatCount};

const RFC3339: &str = "rfc3339";
const NATIVE: &str = "native";

/// A successfully parsed value and the format that matched.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedDate {
    pub value: NaiveDateTime,
    pub format: String,
    pub has_offset: bool,
}

/// Parses text with RFC 3339 or the first matching format.
pub fn parse_datetime(input: &str, formats: &[String]) -> Option<ParsedDate> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(input) {
        return Some(ParsedDate {
            value: parsed.naive_utc(),
            format: RFC3339.to_string(),
            has_offset: true,
        });
    }

    formats.iter().find_map(|format| {
        NaiveDateTime::parse_from_str(input, format)
            .ok()
            .or_else(|| {
                NaiveDate::parse_from_str(input, format)
                    .ok()
                    .and_then(|d| d.and_hms_opt(0, 0, 0))
            })
            .map(|value| ParsedDate {
                value,
                format: format.clone(),
                has_offset: false,
            })
    })
}

/// Parses a single cell. Only date cells and text can parse.
pub fn parse_cell(value: &CellValue, formats: &[String]) -> Option<ParsedDate> {
    match value {
        CellValue::Date(d) => Some(ParsedDate {
            value: *d,
            format: NATIVE.to_string(),
            has_offset: false,
        }),
        CellValue::Text(s) => parse_datetime(s, formats),
        _ => None,
    }
}

/// Every non-null cell that parses, in row order.
pub fn parsed_dates(column: &Column, formats: &[String]) -> Vec<ParsedDate> {
    column
        .non_null()
        .filter_map(|v| parse_cell(v, formats))
        .collect()
}

/// Computes the datetime block relative to the run's reference time.
pub fn datetime_stats(
    column: &Column,
    config: &DateTimeConfig,
    now: NaiveDateTime,
) -> DateTimeStats {
    let non_null_count = column.non_null().count();
    let parsed = parsed_dates(column, &config.formats);
    let parsed_count = parsed.len();

    let min = parsed.iter().map(|p| p.value).min();
    let max = parsed.iter().map(|p| p.value).max();
    let date_range_days = min.zip(max).map(|(lo, hi)| (hi - lo).num_days());

    let mut format_patterns: Vec<FormatCount> = Vec::new();
    for p in &parsed {
        match format_patterns.iter_mut().find(|f| f.format == p.format) {
            Some(entry) => entry.count += 1,
            None => format_patterns.push(FormatCount {
                format: p.format.clone(),
                count: 1,
            }),
        }
    }
    format_patterns.sort_by(|a, b| b.count.cmp(&a.count));

    let weekend_count = parsed
        .iter()
        .filter(|p| matches!(p.value.weekday(), Weekday::Sat | Weekday::Sun))
        .count();

    let format_consistency = ratio(parsed_count, non_null_count);

    DateTimeStats {
        parsed_count,
        invalid_count: non_null_count - parsed_count,
        min,
        max,
        date_range_days,
        format_consistency,
        low_format_consistency: non_null_count > 0
            && format_consistency < config.format_consistency_threshold,
        future_count: parsed.iter().filter(|p| p.value > now).count(),
        past_count: parsed.iter().filter(|p| p.value < now).count(),
        weekend_count,
        weekday_count: parsed_count - weekend_count,
        format_patterns,
        timezone_detected: parsed.iter().any(|p| p.has_offset),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn formats() -> Vec<String> {
        DateTimeConfig::default().formats
    }

    fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_parse_formats() {
        let f = formats();
        assert_eq!(parse_datetime("2024-01-15", &f).unwrap().value, at(2024, 1, 15));
        assert_eq!(parse_datetime("2024/01/15", &f).unwrap().format, "%Y/%m/%d");
        assert_eq!(
            parse_datetime("2024-01-15 10:30:00", &f).unwrap().format,
            "%Y-%m-%d %H:%M:%S"
        );
        assert!(parse_datetime("not a date", &f).is_none());
        assert!(parse_datetime("", &f).is_none());
    }

    #[test]
    fn test_rfc3339_with_offset_normalizes_to_utc() {
        let parsed = parse_datetime("2024-01-15T10:00:00+02:00", &formats()).unwrap();
        assert!(parsed.has_offset);
        let expected = NaiveDate::from_ymd_opt(2024, 1, 15)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap();
        assert_eq!(parsed.value, expected);
        assert_eq!(parsed.format, "rfc3339");
    }

    #[test]
    fn test_datetime_stats() {
        let column = Column::from_values(
            "d",
            [
                Some("2024-01-06"), // Saturday
                Some("2024-01-08"), // Monday
                Some("garbage"),
                None,
                Some("2030-01-01"),
            ],
        );
        let now = at(2025, 1, 1);
        let stats = datetime_stats(&column, &DateTimeConfig::default(), now);

        assert_eq!(stats.parsed_count, 3);
        assert_eq!(stats.invalid_count, 1);
        assert_eq!(stats.min, Some(at(2024, 1, 6)));
        assert_eq!(stats.max, Some(at(2030, 1, 1)));
        assert_eq!(stats.date_range_days, Some(2187));
        assert_eq!(stats.format_consistency, 0.75);
        assert!(stats.low_format_consistency);
        assert_eq!(stats.future_count, 1);
        assert_eq!(stats.past_count, 2);
        assert_eq!(stats.weekend_count, 1);
        assert_eq!(stats.weekday_count, 2);
        assert_eq!(stats.format_patterns[0].format, "%Y-%m-%d");
        assert_eq!(stats.format_patterns[0].count, 3);
        assert!(!stats.timezone_detected);
    }

    #[test]
    fn test_native_dates_parse() {
        let column = Column::from_values("d", [at(2024, 5, 5)]);
        let stats = datetime_stats(&column, &DateTimeConfig::default(), at(2024, 5, 5));
        assert_eq!(stats.parsed_count, 1);
        assert_eq!(stats.future_count, 0);
        assert_eq!(stats.past_count, 0);
        assert_eq!(stats.format_patterns[0].format, "native");
    }
}
