#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Map camera state.
//!
//! A [`Viewport`] is the centre, zoom and pixel size of the visible map,
//! plus an optional [`Transition`] describing an animation towards it. The
//! geographic bounds of the view are derived from those values in 512-px
//! web-mercator world space.

pub mod transition;

use crime_cluster_spatial::BoundingBox;
use crime_cluster_spatial::mercator::{lat_y, lng_x, x_lng, y_lat};
use serde::{Deserialize, Serialize};

pub use transition::{Easing, FlyToOptions, Interpolator, Transition};

/// World size in pixels at zoom 0.
pub const TILE_SIZE: f64 = 512.0;

/// Lowest zoom a viewport accepts.
pub const MIN_ZOOM: f64 = 0.0;

/// Highest zoom a viewport accepts.
pub const MAX_ZOOM: f64 = 24.0;

/// Mercator's latitude limit.
pub const MAX_LATITUDE: f64 = 85.051_129;

/// Centre and zoom of a camera, without size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewState {
    /// Latitude of the view centre.
    pub latitude: f64,
    /// Longitude of the view centre.
    pub longitude: f64,
    /// Fractional zoom level.
    pub zoom: f64,
}

/// The map camera: what part of the world is visible.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Viewport {
    /// Latitude of the view centre (the destination while transitioning).
    pub latitude: f64,
    /// Longitude of the view centre (the destination while transitioning).
    pub longitude: f64,
    /// Fractional zoom level (the destination while transitioning).
    pub zoom: f64,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Animation towards the current centre and zoom, if one is running.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transition: Option<Transition>,
}

impl Viewport {
    /// Creates a viewport, clamping latitude to the mercator limit, zoom to
    /// `[MIN_ZOOM, MAX_ZOOM]` and the size to at least one pixel.
    #[must_use]
    pub fn new(latitude: f64, longitude: f64, zoom: f64, width: u32, height: u32) -> Self {
        Self {
            latitude: latitude.clamp(-MAX_LATITUDE, MAX_LATITUDE),
            longitude,
            zoom: clamp_zoom(zoom),
            width: width.max(1),
            height: height.max(1),
            transition: None,
        }
    }

    /// Centre and zoom (the destination if a transition is running).
    #[must_use]
    pub const fn target(&self) -> ViewState {
        ViewState {
            latitude: self.latitude,
            longitude: self.longitude,
            zoom: self.zoom,
        }
    }

    /// Size in pixels as floats.
    #[must_use]
    pub fn size(&self) -> (f64, f64) {
        (f64::from(self.width), f64::from(self.height))
    }

    /// Geographic bounds of the visible area.
    ///
    /// East and west are not wrapped: a view wider than the world yields a
    /// box more than 360° wide.
    #[must_use]
    pub fn bounds(&self) -> BoundingBox {
        let scale = TILE_SIZE * 2f64.powf(self.zoom);
        let cx = lng_x(self.longitude) * scale;
        let cy = lat_y(self.latitude) * scale;
        let (width, height) = self.size();

        let west = x_lng((cx - width / 2.0) / scale);
        let east = x_lng((cx + width / 2.0) / scale);
        let north = y_lat(((cy - height / 2.0) / scale).clamp(0.0, 1.0));
        let south = y_lat(((cy + height / 2.0) / scale).clamp(0.0, 1.0));

        BoundingBox::new(west, south, east, north)
    }

    /// Returns this viewport moved to `state` instantly.
    #[must_use]
    pub fn jump_to(&self, state: ViewState) -> Self {
        Self {
            transition: None,
            ..Self::new(
                state.latitude,
                state.longitude,
                state.zoom,
                self.width,
                self.height,
            )
        }
    }

    /// Returns this viewport retargeted to `destination`, with a fly-to
    /// [`Transition`] from the current camera.
    ///
    /// If a transition is already running, the new one starts from the old
    /// one's destination.
    #[must_use]
    pub fn fly_to(&self, destination: ViewState, options: &FlyToOptions) -> Self {
        let mut next = self.jump_to(destination);
        let (width, height) = self.size();
        next.transition = Some(Transition::fly_to(
            self.target(),
            next.target(),
            width,
            height,
            options,
        ));
        next
    }

    /// Whether an animation is attached.
    #[must_use]
    pub const fn is_transitioning(&self) -> bool {
        self.transition.is_some()
    }

    /// Camera state `elapsed_ms` into the running transition, or the target
    /// when there is none.
    #[must_use]
    pub fn view_at(&self, elapsed_ms: f64) -> ViewState {
        self.transition
            .map_or_else(|| self.target(), |t| t.sample(elapsed_ms))
    }

    /// Drops the transition once `elapsed_ms` has reached its duration.
    /// Returns `true` if the viewport is now at rest.
    pub fn advance(&mut self, elapsed_ms: f64) -> bool {
        if self
            .transition
            .is_some_and(|t| t.is_finished(elapsed_ms))
        {
            self.transition = None;
        }
        self.transition.is_none()
    }
}

/// Lng/lat in degrees to 512-px world coordinates at zoom 0.
#[must_use]
pub fn lng_lat_to_world(lng: f64, lat: f64) -> [f64; 2] {
    [lng_x(lng) * TILE_SIZE, lat_y(lat) * TILE_SIZE]
}

/// 512-px world coordinates at zoom 0 back to `[lng, lat]`.
#[must_use]
pub fn world_to_lng_lat(xy: [f64; 2]) -> [f64; 2] {
    [x_lng(xy[0] / TILE_SIZE), y_lat(xy[1] / TILE_SIZE)]
}

fn clamp_zoom(zoom: f64) -> f64 {
    if zoom.is_nan() {
        return MIN_ZOOM;
    }
    zoom.clamp(MIN_ZOOM, MAX_ZOOM)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leicester() -> Viewport {
        Viewport::new(52.6376, -1.135_171, 6.0, 1280, 800)
    }

    #[test]
    fn bounds_surround_centre() {
        let vp = leicester();
        let b = vp.bounds();
        assert!(b.west < vp.longitude && vp.longitude < b.east);
        assert!(b.south < vp.latitude && vp.latitude < b.north);
    }

    #[test]
    fn bounds_width_matches_pixels() {
        // At zoom 0 a 512-px-wide view covers exactly the world.
        let vp = Viewport::new(0.0, 0.0, 0.0, 512, 256);
        let b = vp.bounds();
        assert!((b.west - -180.0).abs() < 1e-9);
        assert!((b.east - 180.0).abs() < 1e-9);
    }

    #[test]
    fn bounds_halve_per_zoom_level() {
        let a = Viewport::new(10.0, 20.0, 8.0, 1000, 1000).bounds();
        let b = Viewport::new(10.0, 20.0, 9.0, 1000, 1000).bounds();
        let wa = a.east - a.west;
        let wb = b.east - b.west;
        assert!((wa / wb - 2.0).abs() < 1e-9);
    }

    #[test]
    fn new_clamps_inputs() {
        let vp = Viewport::new(89.0, 0.0, 99.0, 0, 0);
        assert!((vp.latitude - MAX_LATITUDE).abs() < 1e-12);
        assert!((vp.zoom - MAX_ZOOM).abs() < 1e-12);
        assert_eq!((vp.width, vp.height), (1, 1));
        assert!(Viewport::new(0.0, 0.0, f64::NAN, 10, 10).zoom.abs() < 1e-12);
    }

    #[test]
    fn fly_to_retargets_with_transition() {
        let vp = leicester();
        let dest = ViewState {
            latitude: 52.63,
            longitude: -1.13,
            zoom: 12.0,
        };
        let next = vp.fly_to(
            dest,
            &FlyToOptions {
                speed: 2.0,
                ..FlyToOptions::default()
            },
        );
        assert_eq!(next.target(), dest);
        assert_eq!((next.width, next.height), (vp.width, vp.height));

        let transition = next.transition.unwrap();
        assert_eq!(transition.from, vp.target());
        assert_eq!(transition.to, dest);
        assert_eq!(next.view_at(0.0), vp.target());
        assert_eq!(next.view_at(transition.duration_ms), dest);
    }

    #[test]
    fn advance_clears_finished_transition() {
        let mut vp = leicester().fly_to(
            ViewState {
                latitude: 52.0,
                longitude: -1.0,
                zoom: 10.0,
            },
            &FlyToOptions::default(),
        );
        let duration = vp.transition.unwrap().duration_ms;
        assert!(!vp.advance(duration / 2.0));
        assert!(vp.is_transitioning());
        assert!(vp.advance(duration));
        assert!(!vp.is_transitioning());
    }

    #[test]
    fn serializes_without_transition_when_at_rest() {
        let json = serde_json::to_value(leicester()).unwrap();
        assert!(json.get("transition").is_none());
        assert_eq!(json["width"], 1280);
    }

    #[test]
    fn world_roundtrip() {
        let [lng, lat] = world_to_lng_lat(lng_lat_to_world(-1.135_171, 52.6376));
        assert!((lng - -1.135_171).abs() < 1e-9);
        assert!((lat - 52.6376).abs() < 1e-9);
    }
}
