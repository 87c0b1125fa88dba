#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Viewport-driven clustering of crime incidents.
//!
//! Ties the fetched incidents, the cluster index and the camera together:
//! incidents become capped point features, the viewport's bounds and zoom
//! select clusters, each cluster or point renders to a [`Marker`], and a
//! cluster click produces a fly-to [`Viewport`](crime_cluster_viewport::Viewport).

pub mod config;
pub mod markers;
pub mod points;
pub mod session;
pub mod state;

use crime_cluster_spatial::{
    BoundingBox, ClusterError, ClusterIndex, ClusterOptions, Feature, PointFeature,
};

pub use config::{ConfigError, MapConfig};
pub use markers::Marker;
pub use points::{IncidentFeature, IncidentPoint, IncidentProperties, prepare_points};
pub use session::{MapSession, SessionStatus};
pub use state::{FetchState, FetchStatus};

/// Clusters `points` once for a single view.
///
/// `bounds` of `None` means the whole world. Prefer [`MapSession`] when the
/// same points are rendered repeatedly: it keeps the index between calls.
///
/// # Errors
///
/// Returns [`ClusterError::InvalidOptions`] if `radius` or `max_zoom` is
/// unusable.
pub fn cluster<P: Clone>(
    points: &[PointFeature<P>],
    zoom: f64,
    bounds: Option<BoundingBox>,
    radius: f64,
    max_zoom: u8,
) -> Result<Vec<Feature<P>>, ClusterError> {
    let options = ClusterOptions {
        radius,
        max_zoom,
        ..ClusterOptions::default()
    };
    let index = ClusterIndex::load(options, points.to_vec())?;
    Ok(index.get_clusters(&bounds.unwrap_or_else(BoundingBox::world), zoom))
}
