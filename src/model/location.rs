//! World coordinates.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A point on the map in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

impl Location {
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Whether `other` lies within `radius` degrees on both axes.
    #[must_use]
    pub fn is_near(&self, other: &Location, radius: f64) -> bool {
        (self.latitude - other.latitude).abs() <= radius
            && (self.longitude - other.longitude).abs() <= radius
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.latitude, self.longitude)
    }
}
