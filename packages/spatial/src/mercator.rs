//! Spherical web-mercator helpers.
//!
//! Unit coordinates: `x` and `y` both run over `[0, 1]`, with `(0, 0)` at
//! the north-west corner of the world (180°W, ~85.05°N). Multiply by a tile
//! size times `2^zoom` for pixel coordinates.

use std::f64::consts::PI;

/// Longitude (degrees) to unit mercator `x`.
#[must_use]
pub fn lng_x(lng: f64) -> f64 {
    lng / 360.0 + 0.5
}

/// Latitude (degrees) to unit mercator `y`, clamped to `[0, 1]`.
#[must_use]
pub fn lat_y(lat: f64) -> f64 {
    let sin = (lat * PI / 180.0).sin();
    let y = 0.5 - 0.25 * ((1.0 + sin) / (1.0 - sin)).ln() / PI;
    y.clamp(0.0, 1.0)
}

/// Unit mercator `x` back to longitude.
#[must_use]
pub fn x_lng(x: f64) -> f64 {
    (x - 0.5) * 360.0
}

/// Unit mercator `y` back to latitude.
#[must_use]
pub fn y_lat(y: f64) -> f64 {
    let y2 = (180.0 - y * 360.0) * PI / 180.0;
    360.0 * y2.exp().atan() / PI - 90.0
}
