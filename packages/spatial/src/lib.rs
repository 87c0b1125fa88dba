#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Zoom-dependent point clustering.
//!
//! [`ClusterIndex`] precomputes one clustering per integer zoom level, from
//! `max_zoom` down to `min_zoom`, by greedily merging every point with its
//! unclaimed neighbours within a pixel radius. Each level is held in an
//! R-tree so viewport queries and cluster expansion stay cheap.
//!
//! Semantics follow the supercluster family of clusterers: same projection,
//! same cluster ID encoding, same expansion-zoom walk.

pub mod bbox;
pub mod export;
pub mod mercator;

use rstar::{AABB, PointDistance, RTree, RTreeObject};
use serde::{Deserialize, Serialize};

pub use bbox::{BoundingBox, ParseBoundingBoxError};

use crate::mercator::{lat_y, lng_x, x_lng, y_lat};

/// Marks a node that has not been visited at any zoom yet.
const UNVISITED: u8 = u8::MAX;

/// Zoom levels are packed into the low 5 bits of a cluster ID.
const ZOOM_BITS: usize = 5;

/// Highest supported `max_zoom` (the origin zoom `max_zoom + 1` must fit in
/// [`ZOOM_BITS`]).
pub const MAX_SUPPORTED_ZOOM: u8 = 30;

/// Errors returned by [`ClusterIndex`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClusterError {
    /// The ID does not name a cluster in this index.
    #[error("No cluster with the specified id: {id}")]
    NotFound {
        /// The rejected cluster ID.
        id: usize,
    },

    /// The options cannot produce a valid index.
    #[error("Invalid cluster options: {message}")]
    InvalidOptions {
        /// Description of what is wrong.
        message: String,
    },
}

/// Tuning for [`ClusterIndex`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClusterOptions {
    /// Lowest zoom level clusters are generated for.
    pub min_zoom: u8,
    /// Highest zoom level clusters are generated for. Above it every point
    /// is shown on its own.
    pub max_zoom: u8,
    /// Minimum number of points that form a cluster.
    pub min_points: usize,
    /// Cluster radius in pixels (relative to `extent`).
    pub radius: f64,
    /// Tile extent the radius is measured against.
    pub extent: f64,
}

impl Default for ClusterOptions {
    fn default() -> Self {
        Self {
            min_zoom: 0,
            max_zoom: 16,
            min_points: 2,
            radius: 40.0,
            extent: 512.0,
        }
    }
}

impl ClusterOptions {
    fn validate(&self) -> Result<(), ClusterError> {
        let invalid = |message: String| Err(ClusterError::InvalidOptions { message });
        if self.max_zoom > MAX_SUPPORTED_ZOOM {
            return invalid(format!(
                "max_zoom {} exceeds {MAX_SUPPORTED_ZOOM}",
                self.max_zoom
            ));
        }
        if self.min_zoom > self.max_zoom {
            return invalid(format!(
                "min_zoom {} is above max_zoom {}",
                self.min_zoom, self.max_zoom
            ));
        }
        if !(self.radius.is_finite() && self.radius > 0.0) {
            return invalid(format!("radius {} must be positive", self.radius));
        }
        if !(self.extent.is_finite() && self.extent > 0.0) {
            return invalid(format!("extent {} must be positive", self.extent));
        }
        Ok(())
    }
}

/// An input point: a position plus caller-defined properties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointFeature<P> {
    /// `[longitude, latitude]`.
    pub coordinates: [f64; 2],
    /// Arbitrary per-point properties.
    pub properties: P,
}

impl<P> PointFeature<P> {
    /// Creates a point at `[longitude, latitude]`.
    pub const fn new(longitude: f64, latitude: f64, properties: P) -> Self {
        Self {
            coordinates: [longitude, latitude],
            properties,
        }
    }

    /// Longitude in degrees.
    #[must_use]
    pub const fn longitude(&self) -> f64 {
        self.coordinates[0]
    }

    /// Latitude in degrees.
    #[must_use]
    pub const fn latitude(&self) -> f64 {
        self.coordinates[1]
    }
}

/// A synthetic aggregate of two or more points at some zoom.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterFeature {
    /// Cluster ID, valid for [`ClusterIndex::get_children`],
    /// [`ClusterIndex::get_leaves`] and
    /// [`ClusterIndex::get_cluster_expansion_zoom`].
    pub id: usize,
    /// Count-weighted centroid, `[longitude, latitude]`.
    pub coordinates: [f64; 2],
    /// Number of original points under this cluster.
    pub point_count: usize,
    /// `point_count` shortened for labels (`"1.2k"`, `"15k"`).
    pub point_count_abbreviated: String,
}

impl ClusterFeature {
    /// Longitude in degrees.
    #[must_use]
    pub const fn longitude(&self) -> f64 {
        self.coordinates[0]
    }

    /// Latitude in degrees.
    #[must_use]
    pub const fn latitude(&self) -> f64 {
        self.coordinates[1]
    }
}

/// One renderable result: a cluster or a passthrough point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Feature<P> {
    /// Aggregate of nearby points.
    Cluster(ClusterFeature),
    /// A single input point.
    Point(PointFeature<P>),
}

impl<P> Feature<P> {
    /// `[longitude, latitude]` of the cluster centroid or the point.
    #[must_use]
    pub const fn coordinates(&self) -> [f64; 2] {
        match self {
            Self::Cluster(c) => c.coordinates,
            Self::Point(p) => p.coordinates,
        }
    }

    /// Number of original points this feature stands for.
    #[must_use]
    pub const fn point_count(&self) -> usize {
        match self {
            Self::Cluster(c) => c.point_count,
            Self::Point(_) => 1,
        }
    }

    /// Whether this is a [`Feature::Cluster`].
    #[must_use]
    pub const fn is_cluster(&self) -> bool {
        matches!(self, Self::Cluster(_))
    }
}

/// Shortens a point count for display: `999`, `1.2k`, `15k`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn abbreviate_count(count: usize) -> String {
    if count >= 10_000 {
        format!("{}k", (count as f64 / 1000.0).round())
    } else if count >= 1000 {
        format!("{}k", (count as f64 / 100.0).round() / 10.0)
    } else {
        count.to_string()
    }
}

/// A point or cluster at one zoom level, in unit mercator coordinates.
#[derive(Debug, Clone, Copy)]
struct Node {
    x: f64,
    y: f64,
    /// Last zoom this node was visited at, or [`UNVISITED`].
    zoom: u8,
    /// Index into the input points for single points, cluster ID otherwise.
    id: usize,
    /// Cluster this node was merged into one level down.
    parent_id: Option<usize>,
    num_points: usize,
}

/// R-tree entry pointing back into [`Level::nodes`].
struct IndexedNode {
    index: usize,
    position: [f64; 2],
}

impl RTreeObject for IndexedNode {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.position)
    }
}

impl PointDistance for IndexedNode {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.position[0] - point[0];
        let dy = self.position[1] - point[1];
        dx * dx + dy * dy
    }
}

/// All nodes of one zoom level plus their spatial index.
struct Level {
    nodes: Vec<Node>,
    tree: RTree<IndexedNode>,
}

impl Level {
    fn new(nodes: Vec<Node>) -> Self {
        let entries = nodes
            .iter()
            .enumerate()
            .map(|(index, n)| IndexedNode {
                index,
                position: [n.x, n.y],
            })
            .collect();
        Self {
            nodes,
            tree: RTree::bulk_load(entries),
        }
    }

    /// Indices of nodes within `radius` of `(x, y)`, ascending.
    fn within(&self, x: f64, y: f64, radius: f64) -> Vec<usize> {
        let mut ids: Vec<usize> = self
            .tree
            .locate_within_distance([x, y], radius * radius)
            .map(|e| e.index)
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Indices of nodes inside the unit-coordinate box, ascending.
    fn range(&self, min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Vec<usize> {
        let envelope = AABB::from_corners([min_x, min_y], [max_x, max_y]);
        let mut ids: Vec<usize> = self
            .tree
            .locate_in_envelope(&envelope)
            .map(|e| e.index)
            .collect();
        ids.sort_unstable();
        ids
    }
}

/// Hierarchical clustering of a fixed point set.
///
/// Built once per point set; queries never mutate it.
pub struct ClusterIndex<P> {
    options: ClusterOptions,
    points: Vec<PointFeature<P>>,
    /// Indexed by zoom, `0..=max_zoom + 1`. `None` below `min_zoom`.
    levels: Vec<Option<Level>>,
}

impl<P: Clone> ClusterIndex<P> {
    /// Clusters `points` at every zoom from `options.max_zoom` down to
    /// `options.min_zoom`.
    ///
    /// # Errors
    ///
    /// Returns [`ClusterError::InvalidOptions`] if the zoom range or radius
    /// is unusable.
    pub fn load(
        options: ClusterOptions,
        points: Vec<PointFeature<P>>,
    ) -> Result<Self, ClusterError> {
        options.validate()?;

        let leaf_nodes = points
            .iter()
            .enumerate()
            .map(|(i, p)| Node {
                x: lng_x(p.longitude()),
                y: lat_y(p.latitude()),
                zoom: UNVISITED,
                id: i,
                parent_id: None,
                num_points: 1,
            })
            .collect();

        let top = usize::from(options.max_zoom) + 1;
        let mut levels: Vec<Option<Level>> = (0..=top).map(|_| None).collect();
        levels[top] = Some(Level::new(leaf_nodes));

        let mut index = Self {
            options,
            points,
            levels,
        };

        for zoom in (options.min_zoom..=options.max_zoom).rev() {
            let z = usize::from(zoom);
            let next = match index.levels[z + 1].as_mut() {
                Some(prev) => cluster_level(&options, index.points.len(), prev, zoom),
                None => Vec::new(),
            };
            log::trace!("zoom {zoom}: {} nodes", next.len());
            index.levels[z] = Some(Level::new(next));
        }

        log::debug!(
            "Clustered {} points over zooms {}..={}",
            index.points.len(),
            options.min_zoom,
            options.max_zoom
        );

        Ok(index)
    }

    /// Options the index was built with.
    #[must_use]
    pub const fn options(&self) -> &ClusterOptions {
        &self.options
    }

    /// Number of input points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the index holds no points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Clusters and points inside `bbox` at `zoom`.
    ///
    /// Longitudes are wrapped into `[-180, 180)`, latitudes clamped. A box
    /// at least 360° wide covers the world; a box crossing the antimeridian
    /// returns the eastern half followed by the western half. `zoom` is
    /// floored and clamped to `[min_zoom, max_zoom + 1]`.
    #[must_use]
    pub fn get_clusters(&self, bbox: &BoundingBox, zoom: f64) -> Vec<Feature<P>> {
        let mut min_lng = wrap_lng(bbox.west);
        let min_lat = bbox.south.clamp(-90.0, 90.0);
        #[allow(clippy::float_cmp)]
        let mut max_lng = if bbox.east == 180.0 {
            180.0
        } else {
            wrap_lng(bbox.east)
        };
        let max_lat = bbox.north.clamp(-90.0, 90.0);

        if bbox.east - bbox.west >= 360.0 {
            min_lng = -180.0;
            max_lng = 180.0;
        } else if min_lng > max_lng {
            let mut eastern =
                self.get_clusters(&BoundingBox::new(min_lng, min_lat, 180.0, max_lat), zoom);
            let western =
                self.get_clusters(&BoundingBox::new(-180.0, min_lat, max_lng, max_lat), zoom);
            eastern.extend(western);
            return eastern;
        }

        let Some(level) = self.level(self.limit_zoom(zoom)) else {
            return Vec::new();
        };

        level
            .range(lng_x(min_lng), lat_y(max_lat), lng_x(max_lng), lat_y(min_lat))
            .into_iter()
            .map(|k| self.node_feature(&level.nodes[k]))
            .collect()
    }

    /// Direct children of a cluster, one zoom level deeper.
    ///
    /// # Errors
    ///
    /// Returns [`ClusterError::NotFound`] if `cluster_id` is not a cluster
    /// in this index.
    pub fn get_children(&self, cluster_id: usize) -> Result<Vec<Feature<P>>, ClusterError> {
        let not_found = || ClusterError::NotFound { id: cluster_id };

        let origin_zoom = self.origin_zoom(cluster_id).ok_or_else(not_found)?;
        let origin_id = self.origin_id(cluster_id).ok_or_else(not_found)?;
        let level = self.level(origin_zoom).ok_or_else(not_found)?;
        let origin = level.nodes.get(origin_id).ok_or_else(not_found)?;

        let radius = self.radius_at(origin_zoom - 1);
        let children: Vec<Feature<P>> = level
            .within(origin.x, origin.y, radius)
            .into_iter()
            .filter(|&k| level.nodes[k].parent_id == Some(cluster_id))
            .map(|k| self.node_feature(&level.nodes[k]))
            .collect();

        if children.is_empty() {
            return Err(not_found());
        }
        Ok(children)
    }

    /// Looks a cluster up by ID, at the zoom level it was formed on.
    ///
    /// # Errors
    ///
    /// Returns [`ClusterError::NotFound`] if `cluster_id` is not a cluster
    /// in this index.
    pub fn get_cluster(&self, cluster_id: usize) -> Result<ClusterFeature, ClusterError> {
        let not_found = || ClusterError::NotFound { id: cluster_id };

        let origin_zoom = self.origin_zoom(cluster_id).ok_or_else(not_found)?;
        let origin_id = self.origin_id(cluster_id).ok_or_else(not_found)?;
        let seed = self
            .level(origin_zoom)
            .and_then(|l| l.nodes.get(origin_id))
            .ok_or_else(not_found)?;
        let level = self.level(origin_zoom - 1).ok_or_else(not_found)?;

        // The centroid lies within one radius of the seed point.
        level
            .within(seed.x, seed.y, self.radius_at(origin_zoom - 1) * 2.0)
            .into_iter()
            .map(|k| &level.nodes[k])
            .find(|n| n.id == cluster_id && n.num_points > 1)
            .and_then(|n| match self.node_feature(n) {
                Feature::Cluster(cluster) => Some(cluster),
                Feature::Point(_) => None,
            })
            .ok_or_else(not_found)
    }

    /// Original points under a cluster, skipping `offset` and returning at
    /// most `limit` of them.
    ///
    /// # Errors
    ///
    /// Returns [`ClusterError::NotFound`] if `cluster_id` is not a cluster
    /// in this index.
    pub fn get_leaves(
        &self,
        cluster_id: usize,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<PointFeature<P>>, ClusterError> {
        let mut leaves = Vec::new();
        if limit == 0 {
            // still validate the ID
            self.get_children(cluster_id)?;
            return Ok(leaves);
        }
        self.append_leaves(&mut leaves, cluster_id, limit, offset, 0)?;
        Ok(leaves)
    }

    fn append_leaves(
        &self,
        result: &mut Vec<PointFeature<P>>,
        cluster_id: usize,
        limit: usize,
        offset: usize,
        mut skipped: usize,
    ) -> Result<usize, ClusterError> {
        for child in self.get_children(cluster_id)? {
            match child {
                Feature::Cluster(cluster) => {
                    if skipped + cluster.point_count <= offset {
                        skipped += cluster.point_count;
                    } else {
                        skipped = self.append_leaves(result, cluster.id, limit, offset, skipped)?;
                    }
                }
                Feature::Point(point) => {
                    if skipped < offset {
                        skipped += 1;
                    } else {
                        result.push(point);
                    }
                }
            }
            if result.len() >= limit {
                break;
            }
        }
        Ok(skipped)
    }

    /// The zoom at which a cluster first splits into more than one child.
    ///
    /// Can be `max_zoom + 1` when the members only separate once clustering
    /// stops.
    ///
    /// # Errors
    ///
    /// Returns [`ClusterError::NotFound`] if `cluster_id` is not a cluster
    /// in this index.
    pub fn get_cluster_expansion_zoom(&self, cluster_id: usize) -> Result<u8, ClusterError> {
        let mut id = cluster_id;
        let mut expansion_zoom = self
            .origin_zoom(id)
            .ok_or(ClusterError::NotFound { id })?
            - 1;

        while expansion_zoom <= usize::from(self.options.max_zoom) {
            let children = self.get_children(id)?;
            expansion_zoom += 1;
            match children.as_slice() {
                [Feature::Cluster(only)] => id = only.id,
                _ => break,
            }
        }

        u8::try_from(expansion_zoom).map_err(|_| ClusterError::NotFound { id: cluster_id })
    }

    fn level(&self, zoom: usize) -> Option<&Level> {
        self.levels.get(zoom).and_then(Option::as_ref)
    }

    /// Origin zoom encoded in a cluster ID (the level its children live on).
    fn origin_zoom(&self, cluster_id: usize) -> Option<usize> {
        let offset = cluster_id.checked_sub(self.points.len())?;
        let zoom = offset % (1 << ZOOM_BITS);
        (zoom >= 1).then_some(zoom)
    }

    fn origin_id(&self, cluster_id: usize) -> Option<usize> {
        let offset = cluster_id.checked_sub(self.points.len())?;
        Some(offset >> ZOOM_BITS)
    }

    fn radius_at(&self, zoom: usize) -> f64 {
        let scale = f64::from(1_u32 << zoom.min(31));
        self.options.radius / (self.options.extent * scale)
    }

    fn limit_zoom(&self, zoom: f64) -> usize {
        let lo = f64::from(self.options.min_zoom);
        let hi = f64::from(self.options.max_zoom) + 1.0;
        if zoom.is_nan() {
            return usize::from(self.options.min_zoom);
        }
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let z = zoom.floor().clamp(lo, hi) as usize;
        z
    }

    fn node_feature(&self, node: &Node) -> Feature<P> {
        if node.num_points > 1 {
            Feature::Cluster(ClusterFeature {
                id: node.id,
                coordinates: [x_lng(node.x), y_lat(node.y)],
                point_count: node.num_points,
                point_count_abbreviated: abbreviate_count(node.num_points),
            })
        } else {
            Feature::Point(self.points[node.id].clone())
        }
    }
}

/// Builds the nodes of level `zoom` from the level above it, marking merged
/// nodes of `prev` with their new parent.
#[allow(clippy::cast_precision_loss)]
fn cluster_level(
    options: &ClusterOptions,
    num_input_points: usize,
    prev: &mut Level,
    zoom: u8,
) -> Vec<Node> {
    let radius = options.radius / (options.extent * f64::from(1_u32 << zoom));
    let mut next = Vec::new();

    for i in 0..prev.nodes.len() {
        if prev.nodes[i].zoom <= zoom {
            continue;
        }
        prev.nodes[i].zoom = zoom;

        let Node {
            x,
            y,
            num_points: origin_count,
            ..
        } = prev.nodes[i];
        let neighbors = prev.within(x, y, radius);

        let count = origin_count
            + neighbors
                .iter()
                .map(|&k| &prev.nodes[k])
                .filter(|n| n.zoom > zoom)
                .map(|n| n.num_points)
                .sum::<usize>();

        if count > origin_count && count >= options.min_points {
            let mut wx = x * origin_count as f64;
            let mut wy = y * origin_count as f64;
            let id = (i << ZOOM_BITS) + usize::from(zoom) + 1 + num_input_points;

            for &k in &neighbors {
                let neighbor = &mut prev.nodes[k];
                if neighbor.zoom <= zoom {
                    continue;
                }
                neighbor.zoom = zoom;
                wx += neighbor.x * neighbor.num_points as f64;
                wy += neighbor.y * neighbor.num_points as f64;
                neighbor.parent_id = Some(id);
            }

            prev.nodes[i].parent_id = Some(id);
            next.push(Node {
                x: wx / count as f64,
                y: wy / count as f64,
                zoom: UNVISITED,
                id,
                parent_id: None,
                num_points: count,
            });
        } else {
            next.push(prev.nodes[i]);

            if count > 1 {
                for &k in &neighbors {
                    let neighbor = &mut prev.nodes[k];
                    if neighbor.zoom <= zoom {
                        continue;
                    }
                    neighbor.zoom = zoom;
                    next.push(*neighbor);
                }
            }
        }
    }

    next
}

fn wrap_lng(lng: f64) -> f64 {
    (lng + 180.0).rem_euclid(360.0) - 180.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn points(coords: &[(f64, f64)]) -> Vec<PointFeature<usize>> {
        coords
            .iter()
            .enumerate()
            .map(|(i, &(lng, lat))| PointFeature::new(lng, lat, i))
            .collect()
    }

    fn leicester_points() -> Vec<PointFeature<usize>> {
        // Two tight groups ~5 km apart plus one outlier in London.
        points(&[
            (-1.1310, 52.6340),
            (-1.1312, 52.6341),
            (-1.1309, 52.6338),
            (-1.0600, 52.6500),
            (-1.0601, 52.6502),
            (-0.1278, 51.5074),
        ])
    }

    fn index(options: ClusterOptions) -> ClusterIndex<usize> {
        ClusterIndex::load(options, leicester_points()).unwrap()
    }

    fn cluster_of(features: &[Feature<usize>]) -> Vec<&ClusterFeature> {
        features
            .iter()
            .filter_map(|f| match f {
                Feature::Cluster(c) => Some(c),
                Feature::Point(_) => None,
            })
            .collect()
    }

    #[test]
    fn low_zoom_merges_nearby_points() {
        let idx = index(ClusterOptions::default());
        let features = idx.get_clusters(&BoundingBox::world(), 5.0);
        let total: usize = features.iter().map(Feature::point_count).sum();
        assert_eq!(total, 6);
        assert!(features.len() < 6);
        assert!(features.iter().any(Feature::is_cluster));
    }

    #[test]
    fn above_max_zoom_every_point_is_single() {
        let idx = index(ClusterOptions::default());
        let features = idx.get_clusters(&BoundingBox::world(), 17.0);
        assert_eq!(features.len(), 6);
        assert!(features.iter().all(|f| !f.is_cluster()));
    }

    #[test]
    fn point_features_keep_source_coordinates() {
        let idx = index(ClusterOptions::default());
        let features = idx.get_clusters(&BoundingBox::world(), 20.0);
        for feature in features {
            let Feature::Point(p) = feature else {
                panic!("expected only points");
            };
            assert_eq!(p.coordinates, leicester_points()[p.properties].coordinates);
        }
    }

    #[test]
    fn clustering_is_deterministic() {
        let a = index(ClusterOptions::default());
        let b = index(ClusterOptions::default());
        for zoom in 0..=17 {
            let z = f64::from(zoom);
            assert_eq!(
                a.get_clusters(&BoundingBox::world(), z),
                b.get_clusters(&BoundingBox::world(), z)
            );
        }
    }

    #[test]
    fn bbox_filters_results() {
        let idx = index(ClusterOptions::default());
        let london_only = BoundingBox::new(-0.5, 51.3, 0.3, 51.7);
        let features = idx.get_clusters(&london_only, 10.0);
        assert_eq!(features.len(), 1);
        assert_eq!(features[0].point_count(), 1);
    }

    #[test]
    fn centroid_is_count_weighted() {
        let idx = ClusterIndex::load(
            ClusterOptions::default(),
            points(&[(10.0, 0.0), (10.0002, 0.0)]),
        )
        .unwrap();
        let features = idx.get_clusters(&BoundingBox::world(), 3.0);
        assert_eq!(features.len(), 1);
        let Feature::Cluster(c) = &features[0] else {
            panic!("expected a cluster");
        };
        assert_eq!(c.point_count, 2);
        assert!((c.longitude() - 10.0001).abs() < 1e-9);
        assert!(c.latitude().abs() < 1e-9);
    }

    #[test]
    fn children_sum_to_parent_count() {
        let idx = index(ClusterOptions::default());
        let features = idx.get_clusters(&BoundingBox::world(), 2.0);
        for cluster in cluster_of(&features) {
            let children = idx.get_children(cluster.id).unwrap();
            let total: usize = children.iter().map(Feature::point_count).sum();
            assert_eq!(total, cluster.point_count);
        }
    }

    #[test]
    fn get_cluster_matches_rendered_cluster() {
        let idx = index(ClusterOptions::default());
        for zoom in [0.0, 3.0, 8.0, 12.0] {
            for cluster in cluster_of(&idx.get_clusters(&BoundingBox::world(), zoom)) {
                assert_eq!(&idx.get_cluster(cluster.id).unwrap(), cluster);
            }
        }
        assert!(idx.get_cluster(3).is_err());
    }

    #[test]
    fn expansion_zoom_splits_cluster() {
        let idx = index(ClusterOptions {
            radius: 75.0,
            max_zoom: 20,
            ..ClusterOptions::default()
        });
        let features = idx.get_clusters(&BoundingBox::world(), 4.0);
        for cluster in cluster_of(&features) {
            let zoom = idx.get_cluster_expansion_zoom(cluster.id).unwrap();
            assert!(zoom >= 4);
            assert!(zoom <= 21);

            // At the expansion zoom the cluster's members span several features.
            let around = BoundingBox::new(
                cluster.longitude() - 1.0,
                cluster.latitude() - 1.0,
                cluster.longitude() + 1.0,
                cluster.latitude() + 1.0,
            );
            let split = idx.get_clusters(&around, f64::from(zoom));
            assert!(
                split.iter().all(|f| f.point_count() < cluster.point_count),
                "cluster {} still whole at zoom {zoom}",
                cluster.id
            );
        }
    }

    #[test]
    fn leaves_paginate() {
        let idx = ClusterIndex::load(
            ClusterOptions::default(),
            points(&[
                (0.0, 0.0),
                (0.0001, 0.0),
                (0.0002, 0.0),
                (0.0, 0.0001),
                (0.0001, 0.0001),
            ]),
        )
        .unwrap();
        let features = idx.get_clusters(&BoundingBox::world(), 0.0);
        assert_eq!(features.len(), 1);
        let Feature::Cluster(c) = &features[0] else {
            panic!("expected a cluster");
        };

        let all = idx.get_leaves(c.id, usize::MAX, 0).unwrap();
        assert_eq!(all.len(), 5);

        let first = idx.get_leaves(c.id, 2, 0).unwrap();
        let rest = idx.get_leaves(c.id, 10, 2).unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(rest.len(), 3);

        let mut seen: Vec<usize> = first.iter().chain(&rest).map(|p| p.properties).collect();
        seen.sort_unstable();
        assert_eq!(seen, vec![0, 1, 2, 3, 4]);

        assert!(idx.get_leaves(c.id, 0, 0).unwrap().is_empty());
    }

    #[test]
    fn unknown_cluster_ids_error() {
        let idx = index(ClusterOptions::default());
        assert_eq!(
            idx.get_children(0),
            Err(ClusterError::NotFound { id: 0 })
        );
        assert!(idx.get_cluster_expansion_zoom(999_999).is_err());
        assert!(idx.get_leaves(12_345, 10, 0).is_err());
    }

    #[test]
    fn antimeridian_box_returns_both_sides() {
        let idx = ClusterIndex::load(
            ClusterOptions::default(),
            points(&[(179.5, 0.0), (-179.5, 0.0), (0.0, 0.0)]),
        )
        .unwrap();
        let features = idx.get_clusters(&BoundingBox::new(179.0, -1.0, -179.0, 1.0), 17.0);
        assert_eq!(features.len(), 2);
        assert!(features[0].coordinates()[0] > 0.0);
        assert!(features[1].coordinates()[0] < 0.0);
    }

    #[test]
    fn wide_box_covers_world() {
        let idx = index(ClusterOptions::default());
        let features = idx.get_clusters(&BoundingBox::new(-400.0, -90.0, 400.0, 90.0), 17.0);
        assert_eq!(features.len(), 6);
    }

    #[test]
    fn empty_index_returns_nothing() {
        let idx: ClusterIndex<usize> =
            ClusterIndex::load(ClusterOptions::default(), Vec::new()).unwrap();
        assert!(idx.is_empty());
        assert!(idx.get_clusters(&BoundingBox::world(), 6.0).is_empty());
    }

    #[test]
    fn rejects_unusable_options() {
        let too_deep = ClusterOptions {
            max_zoom: 31,
            ..ClusterOptions::default()
        };
        assert!(ClusterIndex::<usize>::load(too_deep, Vec::new()).is_err());

        let inverted = ClusterOptions {
            min_zoom: 10,
            max_zoom: 5,
            ..ClusterOptions::default()
        };
        assert!(ClusterIndex::<usize>::load(inverted, Vec::new()).is_err());

        let no_radius = ClusterOptions {
            radius: 0.0,
            ..ClusterOptions::default()
        };
        assert!(ClusterIndex::<usize>::load(no_radius, Vec::new()).is_err());
    }

    #[test]
    fn abbreviates_counts() {
        assert_eq!(abbreviate_count(999), "999");
        assert_eq!(abbreviate_count(1000), "1k");
        assert_eq!(abbreviate_count(1249), "1.2k");
        assert_eq!(abbreviate_count(15_400), "15k");
    }
}
