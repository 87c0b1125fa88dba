//! Shared parsing utilities for incident feeds.
//!
//! Month and coordinate parsing used by every source implementation.

use chrono::{Datelike as _, NaiveDate};

use crate::SourceError;

/// Validates a police.uk month string (`YYYY-MM`) and returns it normalized
/// (zero-padded month).
///
/// # Errors
///
/// Returns [`SourceError::InvalidDate`] if the string is not a valid
/// calendar month.
pub fn parse_month(s: &str) -> Result<String, SourceError> {
    let trimmed = s.trim();
    let date = NaiveDate::parse_from_str(&format!("{trimmed}-01"), "%Y-%m-%d").map_err(|_| {
        SourceError::InvalidDate {
            value: s.to_string(),
        }
    })?;
    Ok(format!("{:04}-{:02}", date.year(), date.month()))
}

/// Parses lat/lng from the string fields the feed uses. Returns `None` if
/// either side is unparseable, out of WGS84 range, or the pair is exactly
/// `(0, 0)`.
///
/// A zero longitude on its own is valid: it runs through Greenwich.
#[must_use]
pub fn parse_lat_lng_str(lat: &str, lng: &str) -> Option<(f64, f64)> {
    let latitude = lat.trim().parse::<f64>().ok()?;
    let longitude = lng.trim().parse::<f64>().ok()?;
    if !latitude.is_finite() || !longitude.is_finite() {
        return None;
    }
    if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
        return None;
    }
    if latitude == 0.0 && longitude == 0.0 {
        return None;
    }
    Some((latitude, longitude))
}
