use serde::{Deserialize, Serialize};

use crate::math::geo;

/// Geographic point in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    pub fn distance_km(&self, other: &Coordinate) -> f64 {
        geo::haversine_km(*self, *other)
    }
}

/// Sample as handed over by the platform location capability.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawFix {
    pub coordinate: Coordinate,
    /// Wall-clock time the client received the fix.
    pub captured_at_ms: i64,
    /// How long the platform had cached the position before delivering it.
    #[serde(default)]
    pub age_ms: u64,
}

impl RawFix {
    pub fn fresh(coordinate: Coordinate, captured_at_ms: i64) -> Self {
        Self {
            coordinate,
            captured_at_ms,
            age_ms: 0,
        }
    }
}

/// Accepted fix, the unit the speed estimator and marker state consume.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimestampedFix {
    pub coordinate: Coordinate,
    pub captured_at_ms: i64,
}
