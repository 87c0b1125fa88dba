//! Rendering clustered features into marker descriptions.
//!
//! One variant per feature kind. The frontend draws a sized bubble with the
//! count for [`Marker::Cluster`] and an icon for [`Marker::Incident`].

use crime_cluster_crime_models::CrimeCategory;
use crime_cluster_spatial::Feature;
use serde::{Deserialize, Serialize};

use crate::points::{IncidentFeature, IncidentProperties};

/// Smallest cluster bubble, in pixels.
pub const MIN_CLUSTER_DIAMETER: f64 = 10.0;

/// Extra diameter a cluster holding every point gets.
pub const CLUSTER_DIAMETER_RANGE: f64 = 30.0;

/// A single thing to draw on the map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Marker {
    #[serde(rename_all = "camelCase")]
    Cluster {
        /// Cluster ID to send back on click.
        id: usize,
        latitude: f64,
        longitude: f64,
        point_count: usize,
        /// Text shown inside the bubble.
        label: String,
        /// Bubble width and height.
        diameter_px: f64,
    },
    #[serde(rename_all = "camelCase")]
    Incident {
        crime_id: u64,
        latitude: f64,
        longitude: f64,
        /// Raw category slug.
        category: String,
        /// Human-readable category.
        label: String,
    },
}

impl Marker {
    /// Render key: cluster ID or crime ID.
    #[must_use]
    pub fn key(&self) -> String {
        match self {
            Self::Cluster { id, .. } => format!("cluster-{id}"),
            Self::Incident { crime_id, .. } => format!("crime-{crime_id}"),
        }
    }

    #[must_use]
    pub const fn is_cluster(&self) -> bool {
        matches!(self, Self::Cluster { .. })
    }
}

/// Bubble size for a cluster of `point_count` out of `total_points`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn cluster_diameter(point_count: usize, total_points: usize) -> f64 {
    if total_points == 0 {
        return MIN_CLUSTER_DIAMETER;
    }
    (point_count as f64 / total_points as f64)
        .mul_add(CLUSTER_DIAMETER_RANGE, MIN_CLUSTER_DIAMETER)
}

/// Renders one feature. `total_points` is the size of the clustered set.
#[must_use]
pub fn render(feature: &IncidentFeature, total_points: usize) -> Marker {
    match feature {
        Feature::Cluster(cluster) => Marker::Cluster {
            id: cluster.id,
            latitude: cluster.latitude(),
            longitude: cluster.longitude(),
            point_count: cluster.point_count,
            label: cluster.point_count.to_string(),
            diameter_px: cluster_diameter(cluster.point_count, total_points),
        },
        Feature::Point(point) => {
            let IncidentProperties { crime_id, category } = &point.properties;
            Marker::Incident {
                crime_id: *crime_id,
                latitude: point.latitude(),
                longitude: point.longitude(),
                category: category.clone(),
                label: CrimeCategory::classify(category).label().to_string(),
            }
        }
    }
}

/// Renders every feature, in order.
#[must_use]
pub fn render_all(features: &[IncidentFeature], total_points: usize) -> Vec<Marker> {
    features.iter().map(|f| render(f, total_points)).collect()
}
