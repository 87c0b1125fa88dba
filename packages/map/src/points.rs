//! Incidents to clusterable point features.

use crime_cluster_source_models::Incident;
use crime_cluster_spatial::{Feature, PointFeature};
use serde::{Deserialize, Serialize};

/// Properties carried by every incident point through clustering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncidentProperties {
    /// Source incident ID.
    pub crime_id: u64,
    /// Raw category slug.
    pub category: String,
}

/// A point feature for one incident.
pub type IncidentPoint = PointFeature<IncidentProperties>;

/// A clustered result over incident points.
pub type IncidentFeature = Feature<IncidentProperties>;

/// The point feature for one incident, at `[longitude, latitude]`.
#[must_use]
pub fn incident_point(incident: &Incident) -> IncidentPoint {
    PointFeature::new(
        incident.longitude,
        incident.latitude,
        IncidentProperties {
            crime_id: incident.id,
            category: incident.category.clone(),
        },
    )
}

/// Builds point features for the incidents among the first `cap` records
/// of the feed, in feed order.
///
/// The cap counts raw feed positions ([`Incident::feed_index`]), so records
/// dropped during normalization still use up their slot. An incident's
/// position in `incidents` is a lower bound on its feed position.
#[must_use]
pub fn prepare_points(incidents: &[Incident], cap: usize) -> Vec<IncidentPoint> {
    let points: Vec<IncidentPoint> = incidents
        .iter()
        .enumerate()
        .take_while(|(position, incident)| incident.feed_index.max(*position) < cap)
        .map(|(_, incident)| incident_point(incident))
        .collect();
    if points.len() < incidents.len() {
        log::debug!(
            "Dropping {} incidents past the first {cap} feed records",
            incidents.len() - points.len()
        );
    }
    points
}
