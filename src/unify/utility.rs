use crate::unify::types::UNKNOWN_LOCATION;

/// Trims a location name, substituting [`UNKNOWN_LOCATION`] for missing or blank names.
pub fn normalize_location(name: Option<&str>) -> String {
    match name.map(str::trim) {
        Some(n) if !n.is_empty() => n.to_string(),
        _ => UNKNOWN_LOCATION.to_string(),
    }
}

/// Keeps the first non-null value seen.
pub fn first_present(current: Option<f64>, candidate: Option<f64>) -> Option<f64> {
    current.or(candidate.filter(|v| v.is_finite()))
}

/// Rounds a summed estimate to a non-negative count. NaN and negatives become 0.
pub fn round_count(value: f64) -> u64 {
    if value.is_finite() && value > 0.0 {
        value.round() as u64
    } else {
        0
    }
}
