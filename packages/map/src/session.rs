//! A single user's map: fetched incidents, the cluster index over them and
//! the camera.

use crime_cluster_spatial::{BoundingBox, ClusterError, ClusterIndex, ClusterOptions};
use crime_cluster_viewport::{FlyToOptions, ViewState, Viewport};

use crate::config::MapConfig;
use crate::markers::{Marker, render_all};
use crate::points::{IncidentFeature, IncidentPoint, IncidentProperties, prepare_points};
use crate::state::{FetchState, FetchStatus};

/// Counts describing where the session is in its lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionStatus {
    pub status: FetchStatus,
    /// Incidents the feed returned.
    pub fetched: usize,
    /// Incidents kept after the cap.
    pub clustered: usize,
    pub error: Option<String>,
}

/// Viewport plus clustering state.
///
/// The index is rebuilt only when the fetch state changes. Viewport changes
/// only re-query it.
pub struct MapSession {
    options: ClusterOptions,
    max_incidents: usize,
    fly_to: FlyToOptions,
    state: FetchState,
    index: ClusterIndex<IncidentProperties>,
    viewport: Viewport,
    /// Whether the viewport's pixel size came from the frontend. Until then
    /// bounds are unknown and every feature is returned.
    sized: bool,
}

impl MapSession {
    /// Creates a session in [`FetchState::Loading`] with the configured
    /// initial viewport.
    ///
    /// # Errors
    ///
    /// Returns [`ClusterError::InvalidOptions`] if the configured radius or
    /// zoom range is unusable.
    pub fn new(config: &MapConfig) -> Result<Self, ClusterError> {
        let options = config.cluster_options();
        Ok(Self {
            options,
            max_incidents: config.max_incidents,
            fly_to: config.fly_to_options(),
            state: FetchState::Loading,
            index: ClusterIndex::load(options, Vec::new())?,
            viewport: config.initial_viewport(),
            sized: false,
        })
    }

    /// Replaces the fetch state and rebuilds the cluster index.
    ///
    /// # Errors
    ///
    /// Returns [`ClusterError::InvalidOptions`] if the index cannot be
    /// built.
    pub fn set_fetch_state(&mut self, state: FetchState) -> Result<(), ClusterError> {
        let points = prepare_points(state.incidents(), self.max_incidents);
        match &state {
            FetchState::Loading => log::debug!("Incident fetch pending"),
            FetchState::Loaded(incidents) => log::info!(
                "Loaded {} incidents, clustering {}",
                incidents.len(),
                points.len()
            ),
            FetchState::Errored(e) => log::error!("Incident fetch failed: {e}"),
        }
        self.index = ClusterIndex::load(self.options, points)?;
        self.state = state;
        Ok(())
    }

    #[must_use]
    pub const fn fetch_state(&self) -> &FetchState {
        &self.state
    }

    #[must_use]
    pub fn status(&self) -> SessionStatus {
        SessionStatus {
            status: self.state.status(),
            fetched: self.state.incidents().len(),
            clustered: self.index.len(),
            error: self.state.error().map(str::to_string),
        }
    }

    /// Number of points in the cluster index.
    #[must_use]
    pub fn total_points(&self) -> usize {
        self.index.len()
    }

    #[must_use]
    pub const fn cluster_options(&self) -> &ClusterOptions {
        &self.options
    }

    #[must_use]
    pub const fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// Stores a viewport reported by the frontend. Its size is trusted from
    /// here on, so [`Self::bounds`] starts returning a box.
    pub fn set_viewport(&mut self, viewport: Viewport) {
        log::trace!(
            "Viewport {:.5},{:.5} z{:.2} {}x{}",
            viewport.latitude,
            viewport.longitude,
            viewport.zoom,
            viewport.width,
            viewport.height
        );
        self.viewport = viewport;
        self.sized = true;
    }

    /// Advances the running transition, if any. Returns `true` when the
    /// camera is at rest.
    pub fn advance(&mut self, elapsed_ms: f64) -> bool {
        self.viewport.advance(elapsed_ms)
    }

    /// Current viewport bounds, or `None` before the frontend reported a
    /// size.
    #[must_use]
    pub fn bounds(&self) -> Option<BoundingBox> {
        self.sized.then(|| self.viewport.bounds())
    }

    /// Clustered features for the current viewport.
    #[must_use]
    pub fn features(&self) -> Vec<IncidentFeature> {
        self.features_for(self.bounds(), self.viewport.zoom)
    }

    /// Clustered features for an arbitrary view. `None` bounds means the
    /// whole world.
    #[must_use]
    pub fn features_for(&self, bounds: Option<BoundingBox>, zoom: f64) -> Vec<IncidentFeature> {
        let bounds = bounds.unwrap_or_else(BoundingBox::world);
        self.index.get_clusters(&bounds, zoom)
    }

    /// Markers for the current viewport.
    #[must_use]
    pub fn markers(&self) -> Vec<Marker> {
        render_all(&self.features(), self.index.len())
    }

    /// Markers for an arbitrary view.
    #[must_use]
    pub fn markers_for(&self, bounds: Option<BoundingBox>, zoom: f64) -> Vec<Marker> {
        render_all(&self.features_for(bounds, zoom), self.index.len())
    }

    /// Handles a click on a cluster: flies to its centroid at the zoom where
    /// it splits. Below `max_zoom` a click never zooms out; the result is
    /// always capped at `max_zoom`.
    ///
    /// The new viewport replaces the session's and is returned.
    ///
    /// # Errors
    ///
    /// Returns [`ClusterError::NotFound`] if `cluster_id` is not a cluster.
    pub fn click_cluster(&mut self, cluster_id: usize) -> Result<Viewport, ClusterError> {
        let cluster = self.index.get_cluster(cluster_id)?;
        let expansion = self.index.get_cluster_expansion_zoom(cluster_id)?;
        let max_zoom = f64::from(self.options.max_zoom);
        let zoom = f64::from(expansion).max(self.viewport.zoom).min(max_zoom);

        log::debug!(
            "Expanding cluster {cluster_id} ({} points) to zoom {zoom}",
            cluster.point_count
        );

        self.viewport = self.viewport.fly_to(
            ViewState {
                latitude: cluster.latitude(),
                longitude: cluster.longitude(),
                zoom,
            },
            &self.fly_to,
        );
        Ok(self.viewport)
    }

    /// Direct children of a cluster.
    ///
    /// # Errors
    ///
    /// Returns [`ClusterError::NotFound`] for unknown IDs.
    pub fn children(&self, cluster_id: usize) -> Result<Vec<IncidentFeature>, ClusterError> {
        self.index.get_children(cluster_id)
    }

    /// A page of the incidents under a cluster.
    ///
    /// # Errors
    ///
    /// Returns [`ClusterError::NotFound`] for unknown IDs.
    pub fn leaves(
        &self,
        cluster_id: usize,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<IncidentPoint>, ClusterError> {
        self.index.get_leaves(cluster_id, limit, offset)
    }

    /// Zoom at which a cluster splits, uncapped.
    ///
    /// # Errors
    ///
    /// Returns [`ClusterError::NotFound`] for unknown IDs.
    pub fn expansion_zoom(&self, cluster_id: usize) -> Result<u8, ClusterError> {
        self.index.get_cluster_expansion_zoom(cluster_id)
    }
}
