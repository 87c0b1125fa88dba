#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! The canonical incident record.
//!
//! Every incident source produces [`Incident`] values. Coordinates are
//! always present: records the feed delivers without a parseable position
//! are dropped during normalization.

use crime_cluster_crime_models::CrimeCategory;
use serde::{Deserialize, Serialize};

/// A street-level crime incident, immutable once fetched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Incident {
    /// Feed-assigned incident ID.
    pub id: u64,
    /// Raw category slug exactly as the feed delivered it.
    pub category: String,
    /// Latitude (WGS84).
    pub latitude: f64,
    /// Longitude (WGS84).
    pub longitude: f64,
    /// Month the incident was recorded in (`YYYY-MM`).
    pub month: Option<String>,
    /// Anonymised street name the position was snapped to.
    pub street_name: Option<String>,
    /// `"Force"` or `"BTP"` (British Transport Police).
    pub location_type: Option<String>,
    /// Stable 64-char identifier shared with the outcomes API. Empty for
    /// anti-social behaviour reports, which the feed leaves blank.
    pub persistent_id: Option<String>,
    /// Category of the latest recorded outcome, if any.
    pub outcome: Option<String>,
    /// Position of the record in the raw feed payload, counting records
    /// that were dropped for lacking a position.
    #[serde(default)]
    pub feed_index: usize,
}

impl Incident {
    /// Classifies the raw category slug into the known taxonomy.
    #[must_use]
    pub fn crime_category(&self) -> CrimeCategory {
        CrimeCategory::classify(&self.category)
    }

    /// Position as `[longitude, latitude]`, the `GeoJSON` axis order.
    #[must_use]
    pub const fn coordinates(&self) -> [f64; 2] {
        [self.longitude, self.latitude]
    }
}
