#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the crime cluster server.
//!
//! These types are serialized to JSON for the REST API. They wrap the map
//! session's own types so the wire contract can evolve separately.

use crime_cluster_crime_models::CrimeCategory;
use crime_cluster_map::{FetchStatus, IncidentFeature, IncidentPoint, Marker, SessionStatus};
use crime_cluster_viewport::{ViewState, Viewport};
use serde::{Deserialize, Serialize};

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHealth {
    /// Whether the server is healthy.
    pub healthy: bool,
    /// Server version.
    pub version: String,
}

/// A crime category the frontend can label markers with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiCategory {
    /// Feed slug.
    pub slug: String,
    /// Display label.
    pub label: String,
}

impl From<CrimeCategory> for ApiCategory {
    fn from(category: CrimeCategory) -> Self {
        Self {
            slug: category.to_string(),
            label: category.label().to_string(),
        }
    }
}

/// Everything the frontend needs before it draws the map.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiConfig {
    /// Map widget access token. Never validated server-side.
    pub access_token: Option<String>,
    /// Starting camera.
    pub initial_view: ViewState,
    /// Highest zoom a cluster click flies to.
    pub max_zoom: u8,
    /// Cluster radius in pixels.
    pub radius: f64,
    /// Incidents considered for clustering.
    pub max_incidents: usize,
    /// Known categories.
    pub categories: Vec<ApiCategory>,
}

/// Fetch lifecycle and counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiStatus {
    /// `loading`, `loaded` or `errored`.
    pub state: FetchStatus,
    /// Incidents the feed returned.
    pub fetched: usize,
    /// Incidents being clustered.
    pub clustered: usize,
    /// Incidents dropped by the cap.
    pub dropped: usize,
    /// Fetch error, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<SessionStatus> for ApiStatus {
    fn from(status: SessionStatus) -> Self {
        Self {
            state: status.status,
            fetched: status.fetched,
            clustered: status.clustered,
            dropped: status.fetched.saturating_sub(status.clustered),
            error: status.error,
        }
    }
}

/// Body of `PUT /api/viewport`, sent on every camera change.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewportUpdate {
    pub latitude: f64,
    pub longitude: f64,
    pub zoom: f64,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl From<ViewportUpdate> for Viewport {
    fn from(update: ViewportUpdate) -> Self {
        Self::new(
            update.latitude,
            update.longitude,
            update.zoom,
            update.width,
            update.height,
        )
    }
}

/// Query parameters for the markers and `GeoJSON` endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkerQueryParams {
    /// Bounding box as `west,south,east,north`. Defaults to the session
    /// viewport's bounds.
    pub bbox: Option<String>,
    /// Zoom override. Defaults to the session viewport's zoom.
    pub zoom: Option<f64>,
}

/// Query parameters for the cluster leaves endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeavesQueryParams {
    /// Page size (default 10).
    pub limit: Option<usize>,
    /// Number of leaves to skip (default 0).
    pub offset: Option<usize>,
}

/// Rendered markers for one view.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiMarkers {
    /// Zoom the markers were clustered at.
    pub zoom: f64,
    /// `[west, south, east, north]` used, or `None` for the whole world.
    pub bounds: Option<[f64; 4]>,
    /// Size of the clustered point set.
    pub total_points: usize,
    pub markers: Vec<Marker>,
}

/// Result of clicking a cluster.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiExpansion {
    pub cluster_id: usize,
    /// Zoom at which the cluster splits, before capping.
    pub expansion_zoom: u8,
    /// The new viewport, carrying the fly-to transition.
    pub viewport: Viewport,
}

/// Direct children of a cluster.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiChildren {
    pub cluster_id: usize,
    pub children: Vec<IncidentFeature>,
}

/// A page of incidents under a cluster.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiLeaves {
    pub cluster_id: usize,
    pub limit: usize,
    pub offset: usize,
    pub leaves: Vec<IncidentPoint>,
}

/// JSON error body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    pub error: String,
}

impl ApiError {
    #[must_use]
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
