//! Geographic bounding boxes.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A `west, south, east, north` box in degrees.
///
/// `west > east` describes a box crossing the antimeridian.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Western longitude boundary.
    pub west: f64,
    /// Southern latitude boundary.
    pub south: f64,
    /// Eastern longitude boundary.
    pub east: f64,
    /// Northern latitude boundary.
    pub north: f64,
}

impl BoundingBox {
    /// Creates a new bounding box from the given coordinates.
    #[must_use]
    pub const fn new(west: f64, south: f64, east: f64, north: f64) -> Self {
        Self {
            west,
            south,
            east,
            north,
        }
    }

    /// The whole world. Used as the filter when no viewport bounds are known.
    #[must_use]
    pub const fn world() -> Self {
        Self::new(-180.0, -90.0, 180.0, 90.0)
    }

    /// Flattened `[west, south, east, north]`.
    #[must_use]
    pub const fn to_array(self) -> [f64; 4] {
        [self.west, self.south, self.east, self.north]
    }

    /// Builds a box from a flattened `[west, south, east, north]` slice.
    #[must_use]
    pub fn from_slice(values: &[f64]) -> Option<Self> {
        match values {
            [w, s, e, n] => Some(Self::new(*w, *s, *e, *n)),
            _ => None,
        }
    }

    /// Whether `[lng, lat]` falls inside the box (antimeridian aware).
    #[must_use]
    pub fn contains(&self, lng: f64, lat: f64) -> bool {
        if lat < self.south || lat > self.north {
            return false;
        }
        if self.west <= self.east {
            lng >= self.west && lng <= self.east
        } else {
            lng >= self.west || lng <= self.east
        }
    }
}

/// Error returned when a `"west,south,east,north"` string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid bounding box {input:?}: expected \"west,south,east,north\"")]
pub struct ParseBoundingBoxError {
    /// The rejected input.
    pub input: String,
}

impl FromStr for BoundingBox {
    type Err = ParseBoundingBoxError;

    /// Parses a bounding box string `"west,south,east,north"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseBoundingBoxError {
            input: s.to_string(),
        };
        let parts = s
            .split(',')
            .map(|p| p.trim().parse::<f64>().map_err(|_| err()))
            .collect::<Result<Vec<_>, _>>()?;
        if parts.iter().any(|v| !v.is_finite()) {
            return Err(err());
        }
        Self::from_slice(&parts).ok_or_else(err)
    }
}
