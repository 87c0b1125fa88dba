//! Raw police.uk street-crime payload and its normalization.
//!
//! The feed returns a JSON array shaped like:
//!
//! ```json
//! [{
//!   "category": "anti-social-behaviour",
//!   "location_type": "Force",
//!   "location": {
//!     "latitude": "52.634887",
//!     "street": { "id": 883345, "name": "On or near Fleet Street" },
//!     "longitude": "-1.131224"
//!   },
//!   "context": "",
//!   "outcome_status": null,
//!   "persistent_id": "",
//!   "id": 79459834,
//!   "location_subtype": "",
//!   "month": "2019-10"
//! }]
//! ```

use crime_cluster_source_models::Incident;
use serde::Deserialize;

use crate::parsing::parse_lat_lng_str;

/// One record of the street-crime array.
#[derive(Debug, Deserialize)]
pub struct StreetCrimeRecord {
    id: u64,
    category: String,
    #[serde(default)]
    month: Option<String>,
    #[serde(default)]
    location_type: Option<String>,
    #[serde(default)]
    persistent_id: Option<String>,
    #[serde(default)]
    location: Option<RawLocation>,
    #[serde(default)]
    outcome_status: Option<RawOutcome>,
}

#[derive(Debug, Deserialize)]
struct RawLocation {
    #[serde(default)]
    latitude: Option<String>,
    #[serde(default)]
    longitude: Option<String>,
    #[serde(default)]
    street: Option<RawStreet>,
}

#[derive(Debug, Deserialize)]
struct RawStreet {
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawOutcome {
    #[serde(default)]
    category: Option<String>,
}

impl StreetCrimeRecord {
    /// Converts the raw record found at `feed_index` into an [`Incident`],
    /// or `None` when the position is missing or unparseable.
    #[must_use]
    pub fn into_incident(self, feed_index: usize) -> Option<Incident> {
        let location = self.location?;
        let (latitude, longitude) =
            parse_lat_lng_str(location.latitude.as_deref()?, location.longitude.as_deref()?)?;

        Some(Incident {
            id: self.id,
            category: self.category,
            latitude,
            longitude,
            month: self.month.filter(|s| !s.is_empty()),
            street_name: location
                .street
                .and_then(|s| s.name)
                .filter(|s| !s.is_empty()),
            location_type: self.location_type.filter(|s| !s.is_empty()),
            persistent_id: self.persistent_id.filter(|s| !s.is_empty()),
            outcome: self
                .outcome_status
                .and_then(|o| o.category)
                .filter(|s| !s.is_empty()),
            feed_index,
        })
    }
}

/// Decodes a street-crime JSON array and normalizes every record, skipping
/// (and logging) records without a usable position. Feed order is kept.
///
/// # Errors
///
/// Returns [`serde_json::Error`] if the payload is not an array of records.
pub fn normalize_payload(body: &str) -> Result<Vec<Incident>, serde_json::Error> {
    let records: Vec<StreetCrimeRecord> = serde_json::from_str(body)?;
    let total = records.len();

    let mut incidents = Vec::with_capacity(total);
    for (feed_index, record) in records.into_iter().enumerate() {
        let id = record.id;
        match record.into_incident(feed_index) {
            Some(incident) => incidents.push(incident),
            None => log::warn!("Skipping incident {id}: missing or invalid location"),
        }
    }

    let skipped = total - incidents.len();
    if skipped > 0 {
        log::info!("Normalized {} of {total} records ({skipped} skipped)", incidents.len());
    } else {
        log::debug!("Normalized {total} records");
    }

    Ok(incidents)
}
