//! Time-based camera transitions.
//!
//! [`Interpolator::FlyTo`] follows the "smooth and efficient zooming and
//! panning" path of van Wijk & Nuij: the camera zooms out while it pans and
//! back in as it arrives, and the automatic duration is proportional to the
//! path length. [`Interpolator::Linear`] lerps centre and zoom.

use serde::{Deserialize, Serialize};

use crate::{ViewState, lng_lat_to_world, world_to_lng_lat};

/// Below this world-pixel distance the path is treated as zoom-only.
const EPSILON: f64 = 0.01;

/// Default fly-to speed (path units per second).
pub const DEFAULT_SPEED: f64 = 1.2;

/// Default zoom-out curvature (`ρ`). `√2` is the value van Wijk & Nuij
/// found most pleasing.
pub const DEFAULT_CURVE: f64 = 1.414;

/// Maps linear time `t ∈ [0, 1]` onto eased progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Easing {
    /// `t`
    #[default]
    Linear,
    /// Fast start, gentle stop.
    EaseOutCubic,
    /// Gentle start and stop.
    EaseInOutCubic,
}

impl Easing {
    /// Applies the easing curve to `t` (clamped to `[0, 1]`).
    #[must_use]
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::EaseOutCubic => 1.0 - (1.0 - t).powi(3),
            Self::EaseInOutCubic => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
                }
            }
        }
    }
}

/// How intermediate camera states are computed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Interpolator {
    /// Straight lerp of centre and zoom.
    Linear,
    /// Zoom-out-and-in flight.
    FlyTo {
        /// Average speed; higher is faster.
        speed: f64,
        /// Zoom-out curvature `ρ`.
        curve: f64,
    },
}

/// Options for [`crate::Viewport::fly_to`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FlyToOptions {
    /// Average speed along the path.
    pub speed: f64,
    /// Zoom-out curvature `ρ`.
    pub curve: f64,
    /// Fixed duration in milliseconds. `None` derives it from the path.
    pub duration_ms: Option<f64>,
    /// Flights that would take longer than this jump instead.
    pub max_duration_ms: Option<f64>,
    /// Time easing.
    pub easing: Easing,
}

impl Default for FlyToOptions {
    fn default() -> Self {
        Self {
            speed: DEFAULT_SPEED,
            curve: DEFAULT_CURVE,
            duration_ms: None,
            max_duration_ms: None,
            easing: Easing::Linear,
        }
    }
}

/// An in-flight camera animation from one view to another.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transition {
    /// Camera state at `t = 0`.
    pub from: ViewState,
    /// Camera state at `t = 1`.
    pub to: ViewState,
    /// Total duration in milliseconds.
    pub duration_ms: f64,
    /// Path shape.
    pub interpolator: Interpolator,
    /// Time easing.
    pub easing: Easing,
    /// Viewport width in pixels while the transition runs.
    pub width: f64,
    /// Viewport height in pixels while the transition runs.
    pub height: f64,
}

impl Transition {
    /// Builds a fly-to transition, deriving the duration from the path when
    /// `options.duration_ms` is unset.
    #[must_use]
    pub fn fly_to(
        from: ViewState,
        to: ViewState,
        width: f64,
        height: f64,
        options: &FlyToOptions,
    ) -> Self {
        let path = FlyToPath::new(&from, &to, width, height, options.curve);
        let mut duration_ms = options
            .duration_ms
            .unwrap_or_else(|| path.auto_duration_ms(options.speed));
        if options.max_duration_ms.is_some_and(|max| duration_ms > max) {
            duration_ms = 0.0;
        }

        Self {
            from,
            to,
            duration_ms: duration_ms.max(0.0),
            interpolator: Interpolator::FlyTo {
                speed: options.speed,
                curve: options.curve,
            },
            easing: options.easing,
            width,
            height,
        }
    }

    /// Builds a linear transition of fixed duration.
    #[must_use]
    pub fn linear(
        from: ViewState,
        to: ViewState,
        width: f64,
        height: f64,
        duration_ms: f64,
        easing: Easing,
    ) -> Self {
        Self {
            from,
            to,
            duration_ms: duration_ms.max(0.0),
            interpolator: Interpolator::Linear,
            easing,
            width,
            height,
        }
    }

    /// Whether the animation has reached its end at `elapsed_ms`.
    #[must_use]
    pub fn is_finished(&self, elapsed_ms: f64) -> bool {
        elapsed_ms >= self.duration_ms
    }

    /// Camera state `elapsed_ms` after the transition started.
    #[must_use]
    pub fn sample(&self, elapsed_ms: f64) -> ViewState {
        if self.duration_ms <= 0.0 || elapsed_ms >= self.duration_ms {
            return self.to;
        }
        if elapsed_ms <= 0.0 {
            return self.from;
        }

        let t = self.easing.apply(elapsed_ms / self.duration_ms);
        match self.interpolator {
            Interpolator::Linear => ViewState {
                latitude: lerp(self.from.latitude, self.to.latitude, t),
                longitude: lerp(self.from.longitude, self.to.longitude, t),
                zoom: lerp(self.from.zoom, self.to.zoom, t),
            },
            Interpolator::FlyTo { curve, .. } => {
                FlyToPath::new(&self.from, &self.to, self.width, self.height, curve).sample(t)
            }
        }
    }
}

/// Precomputed parameters of a van Wijk & Nuij flight.
#[derive(Debug, Clone, Copy)]
struct FlyToPath {
    start: ViewState,
    end: ViewState,
    start_xy: [f64; 2],
    delta: [f64; 2],
    w0: f64,
    u1: f64,
    rho: f64,
    rho2: f64,
    r0: f64,
    /// Total path length.
    s: f64,
}

impl FlyToPath {
    fn new(start: &ViewState, end: &ViewState, width: f64, height: f64, rho: f64) -> Self {
        let start_scale = 2f64.powf(start.zoom);
        let scale = 2f64.powf(end.zoom - start.zoom);
        let start_xy = lng_lat_to_world(start.longitude, start.latitude);
        let end_xy = lng_lat_to_world(end.longitude, end.latitude);
        let delta = [end_xy[0] - start_xy[0], end_xy[1] - start_xy[1]];

        let w0 = width.max(height).max(1.0);
        let w1 = w0 / scale;
        let u1 = delta[0].hypot(delta[1]) * start_scale;
        let rho2 = rho * rho;

        if u1 < EPSILON {
            return Self {
                start: *start,
                end: *end,
                start_xy,
                delta,
                w0,
                u1,
                rho,
                rho2,
                r0: 0.0,
                s: (w1 / w0).ln().abs() / rho,
            };
        }

        let b0 = (w1 * w1 - w0 * w0 + rho2 * rho2 * u1 * u1) / (2.0 * w0 * rho2 * u1);
        let b1 = (w1 * w1 - w0 * w0 - rho2 * rho2 * u1 * u1) / (2.0 * w1 * rho2 * u1);
        let r0 = (b0.mul_add(b0, 1.0).sqrt() - b0).ln();
        let r1 = (b1.mul_add(b1, 1.0).sqrt() - b1).ln();

        Self {
            start: *start,
            end: *end,
            start_xy,
            delta,
            w0,
            u1,
            rho,
            rho2,
            r0,
            s: (r1 - r0) / rho,
        }
    }

    fn auto_duration_ms(&self, speed: f64) -> f64 {
        if speed <= 0.0 {
            return 0.0;
        }
        1000.0 * self.s / speed
    }

    fn sample(&self, t: f64) -> ViewState {
        if t >= 1.0 {
            return self.end;
        }

        let (u, zoom) = if self.u1 < EPSILON {
            (t, lerp(self.start.zoom, self.end.zoom, t))
        } else {
            let s = t * self.s;
            let w = self.r0.cosh() / (self.r0 + self.rho * s).cosh();
            let u = self.w0
                * ((self.r0.cosh() * (self.r0 + self.rho * s).tanh() - self.r0.sinh()) / self.rho2)
                / self.u1;
            (u, self.start.zoom + (1.0 / w).log2())
        };

        let [lng, lat] = world_to_lng_lat([
            self.delta[0].mul_add(u, self.start_xy[0]),
            self.delta[1].mul_add(u, self.start_xy[1]),
        ]);

        ViewState {
            latitude: lat,
            longitude: lng,
            zoom,
        }
    }
}

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    (b - a).mul_add(t, a)
}
