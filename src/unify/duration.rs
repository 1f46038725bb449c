//! Observation-window length in hours.
//!
//! Actual sources derive it from their timestamp span, modeled sources from a
//! free-text description such as `"6 hrs"` or `"2 days"`.

use chrono::NaiveDateTime;

/// Hour value assigned when a duration cannot be determined. Always lands in
/// the terminal bucket of every policy.
pub const UNKNOWN_HOURS: f64 = 1.0e9;

/// Inclusive span of a set of timestamps, in hours.
///
/// `(max - min) + 1`, so a single observation counts as one hour. Returns 0
/// for an empty set. Input order does not matter.
pub fn span_hours<I>(timestamps: I) -> f64
where
    I: IntoIterator<Item = NaiveDateTime>,
{
    let mut bounds: Option<(NaiveDateTime, NaiveDateTime)> = None;

    for ts in timestamps {
        bounds = match bounds {
            None => Some((ts, ts)),
            Some((first, last)) => Some((first.min(ts), last.max(ts))),
        };
    }

    match bounds {
        None => 0.0,
        Some((first, last)) => (last - first).num_seconds() as f64 / 3600.0 + 1.0,
    }
}

/// Parses a free-text duration into hours.
///
/// Only digits and the first decimal point are kept. Text mentioning `min` is
/// read as minutes, text mentioning `day` as days, anything else as hours.
/// Missing text, text without a digit, and unparseable text all yield
/// [`UNKNOWN_HOURS`].
pub fn parse_duration_text(text: Option<&str>) -> f64 {
    let Some(text) = text else {
        return UNKNOWN_HOURS;
    };
    if !text.chars().any(|c| c.is_ascii_digit()) {
        return UNKNOWN_HOURS;
    }

    let mut numeric = String::with_capacity(text.len());
    let mut seen_point = false;
    for c in text.chars() {
        if c.is_ascii_digit() {
            numeric.push(c);
        } else if c == '.' && !seen_point {
            seen_point = true;
            numeric.push(c);
        }
    }

    let value = match numeric.parse::<f64>() {
        Ok(v) if v.is_finite() => v,
        _ => return UNKNOWN_HOURS,
    };

    let lower = text.to_ascii_lowercase();
    if lower.contains("min") {
        value / 60.0
    } else if lower.contains("day") {
        value * 24.0
    } else {
        value
    }
}

/// Largest parsed duration across a location's rows.
///
/// Uses the longest window any row claims. Returns [`UNKNOWN_HOURS`] when there
/// are no rows.
pub fn worst_case_hours<'a, I>(texts: I) -> f64
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    texts
        .into_iter()
        .map(parse_duration_text)
        .fold(None, |acc: Option<f64>, h| Some(acc.map_or(h, |a| a.max(h))))
        .unwrap_or(UNKNOWN_HOURS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(day: u32, hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, day)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    #[test]
    fn test_single_observation_is_one_hour() {
        assert_eq!(span_hours([at(1, 8, 0)]), 1.0);
    }

    #[test]
    fn test_empty_span_is_zero() {
        assert_eq!(span_hours(Vec::<NaiveDateTime>::new()), 0.0);
    }

    #[test]
    fn test_span_is_inclusive_and_order_independent() {
        let hours = span_hours([at(2, 8, 0), at(1, 8, 0), at(1, 20, 0)]);
        assert_eq!(hours, 25.0);
    }

    #[test]
    fn test_span_with_fractional_hours() {
        assert_eq!(span_hours([at(1, 8, 0), at(1, 8, 30)]), 1.5);
    }

    #[test]
    fn test_span_is_monotonic() {
        let short = span_hours([at(1, 0, 0), at(1, 5, 0)]);
        let long = span_hours([at(1, 0, 0), at(1, 9, 0)]);
        assert!(short < long);
    }

    #[test]
    fn test_unit_conversion() {
        assert_eq!(parse_duration_text(Some("90 min")), 1.5);
        assert_eq!(parse_duration_text(Some("2 days")), 48.0);
        assert_eq!(parse_duration_text(Some("10")), 10.0);
        assert_eq!(parse_duration_text(Some("6 hrs")), 6.0);
        assert_eq!(parse_duration_text(Some("1 Day")), 24.0);
        assert_eq!(parse_duration_text(Some("30 Minutes")), 0.5);
    }

    #[test]
    fn test_text_without_digit_is_unknown() {
        assert_eq!(parse_duration_text(Some("unknown")), UNKNOWN_HOURS);
        assert_eq!(parse_duration_text(Some("nan")), UNKNOWN_HOURS);
        assert_eq!(parse_duration_text(Some("")), UNKNOWN_HOURS);
        assert_eq!(parse_duration_text(None), UNKNOWN_HOURS);
    }

    #[test]
    fn test_only_first_decimal_point_is_kept() {
        assert_eq!(parse_duration_text(Some("1.5.2 hrs")), 1.52);
        assert_eq!(parse_duration_text(Some("approx. 12 hours")), 0.12);
    }

    #[test]
    fn test_non_numeric_characters_are_stripped() {
        // "2 days 6 hrs" collapses to "26" and is read as days.
        assert_eq!(parse_duration_text(Some("2 days 6 hrs")), 26.0 * 24.0);
        assert_eq!(parse_duration_text(Some("~4h")), 4.0);
    }

    #[test]
    fn test_worst_case_takes_maximum() {
        let hours = worst_case_hours([Some("10"), Some("40 days")]);
        assert_eq!(hours, 960.0);
    }

    #[test]
    fn test_worst_case_with_unknown_row() {
        let hours = worst_case_hours([Some("10"), None]);
        assert_eq!(hours, UNKNOWN_HOURS);
    }

    #[test]
    fn test_worst_case_without_rows() {
        assert_eq!(worst_case_hours(std::iter::empty::<Option<&str>>()), UNKNOWN_HOURS);
    }
}
