//! `GeoJSON` export of clustering results.
//!
//! Features come out in the shape map widgets already understand: points
//! carry their own properties plus `cluster: false`; clusters carry
//! `cluster: true`, `cluster_id`, `point_count` and
//! `point_count_abbreviated`.

use geojson::{Feature as GeoFeature, FeatureCollection, Geometry, JsonObject, Value};
use serde::Serialize;

use crate::{ClusterFeature, Feature, PointFeature};

/// Converts a clustering result into a `GeoJSON` feature.
///
/// # Errors
///
/// Returns [`serde_json::Error`] if the point properties fail to serialize.
pub fn to_geojson<P: Serialize>(feature: &Feature<P>) -> Result<GeoFeature, serde_json::Error> {
    match feature {
        Feature::Cluster(cluster) => Ok(cluster_to_geojson(cluster)),
        Feature::Point(point) => point_to_geojson(point),
    }
}

/// Converts a list of clustering results into a `FeatureCollection`.
///
/// # Errors
///
/// Returns [`serde_json::Error`] if any point's properties fail to
/// serialize.
pub fn to_feature_collection<P: Serialize>(
    features: &[Feature<P>],
) -> Result<FeatureCollection, serde_json::Error> {
    let features = features
        .iter()
        .map(to_geojson)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    })
}

fn point_geometry(coordinates: [f64; 2]) -> Geometry {
    Geometry::new(Value::Point(coordinates.to_vec()))
}

fn cluster_to_geojson(cluster: &ClusterFeature) -> GeoFeature {
    let mut properties = JsonObject::new();
    properties.insert("cluster".to_string(), true.into());
    properties.insert("cluster_id".to_string(), cluster.id.into());
    properties.insert("point_count".to_string(), cluster.point_count.into());
    properties.insert(
        "point_count_abbreviated".to_string(),
        cluster.point_count_abbreviated.clone().into(),
    );

    GeoFeature {
        bbox: None,
        geometry: Some(point_geometry(cluster.coordinates)),
        id: Some(geojson::feature::Id::Number(cluster.id.into())),
        properties: Some(properties),
        foreign_members: None,
    }
}

fn point_to_geojson<P: Serialize>(
    point: &PointFeature<P>,
) -> Result<GeoFeature, serde_json::Error> {
    let mut properties = match serde_json::to_value(&point.properties)? {
        serde_json::Value::Object(map) => map,
        serde_json::Value::Null => JsonObject::new(),
        other => {
            let mut map = JsonObject::new();
            map.insert("value".to_string(), other);
            map
        }
    };
    properties.insert("cluster".to_string(), false.into());

    Ok(GeoFeature {
        bbox: None,
        geometry: Some(point_geometry(point.coordinates)),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    })
}
