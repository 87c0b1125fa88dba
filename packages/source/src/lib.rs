#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Incident source trait and feed normalization.
//!
//! Each feed implements [`IncidentSource`] to define how raw records are
//! fetched and mapped to the canonical [`Incident`]. The police.uk street
//! crime API is the live source; [`file::FileSource`] reads a saved dump of
//! the same payload.

pub mod file;
pub mod parsing;
pub mod police_uk;
pub mod progress;
pub mod record;

use std::time::Duration;

use async_trait::async_trait;
use crime_cluster_source_models::Incident;

use crate::progress::ProgressCallback;

/// Errors that can occur while fetching or normalizing incidents.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The feed answered with a non-success status.
    #[error("HTTP {status} from {url}")]
    Status {
        /// Status code returned by the server.
        status: reqwest::StatusCode,
        /// Request URL.
        url: String,
    },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error (file read/write).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The requested month is not a valid `YYYY-MM` value.
    #[error("Invalid month {value:?}: expected YYYY-MM")]
    InvalidDate {
        /// The rejected input.
        value: String,
    },
}

/// Default police.uk API base URL.
pub const DEFAULT_API_URL: &str = "https://data.police.uk/api";

/// Where and when to fetch incidents.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchOptions {
    /// Category slug to request (`"all-crime"` for everything).
    pub category: String,
    /// Latitude of the query point; the feed returns incidents within a
    /// one-mile radius.
    pub latitude: f64,
    /// Longitude of the query point.
    pub longitude: f64,
    /// Month to query (`YYYY-MM`). `None` lets the feed pick its latest.
    pub date: Option<String>,
    /// Per-request timeout. `None` waits indefinitely.
    pub timeout: Option<Duration>,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            category: crime_cluster_crime_models::ALL_CRIME.to_string(),
            latitude: 52.629_729,
            longitude: -1.131_592,
            date: Some("2019-10".to_string()),
            timeout: None,
        }
    }
}

/// Trait that all incident sources must implement.
#[async_trait]
pub trait IncidentSource: Send + Sync {
    /// Returns a unique identifier for this source (e.g., `"police_uk"`).
    fn id(&self) -> &str;

    /// Returns the human-readable name of this source.
    fn name(&self) -> &str;

    /// Fetches and normalizes incidents, in feed order.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the fetch or the payload decode fails.
    async fn fetch(
        &self,
        options: &FetchOptions,
        progress: &dyn ProgressCallback,
    ) -> Result<Vec<Incident>, SourceError>;
}
