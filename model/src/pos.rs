use std::fmt;

use serde::{Deserialize, Serialize};

/// A WGS84 position. Altitude is optional; most tracks are 2D.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LonLat {
    pub longitude: f64,
    pub latitude: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub altitude: Option<f64>,
}

impl LonLat {
    pub fn new(longitude: f64, latitude: f64) -> Self {
        Self {
            longitude,
            latitude,
            altitude: None,
        }
    }

    pub fn with_altitude(longitude: f64, latitude: f64, altitude: f64) -> Self {
        Self {
            longitude,
            latitude,
            altitude: Some(altitude),
        }
    }

    /// Accepts `[lon, lat]` or `[lon, lat, alt]`, the GeoJSON position layout.
    pub fn from_slice(coords: &[f64]) -> Option<Self> {
        match coords {
            [lon, lat] => Some(Self::new(*lon, *lat)),
            [lon, lat, alt, ..] => Some(Self::with_altitude(*lon, *lat, *alt)),
            _ => None,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.longitude.is_finite()
            && self.latitude.is_finite()
            && self.altitude.map(f64::is_finite).unwrap_or(true)
    }

    /// Linear interpolation in coordinate space. Good enough between two consecutive samples of a
    /// high-resolution trace; this isn't a great-circle calculation.
    pub fn lerp(self, other: LonLat, pct: f64) -> LonLat {
        let pct = pct.clamp(0.0, 1.0);
        LonLat {
            longitude: self.longitude + pct * (other.longitude - self.longitude),
            latitude: self.latitude + pct * (other.latitude - self.latitude),
            altitude: match (self.altitude, other.altitude) {
                (Some(a1), Some(a2)) => Some(a1 + pct * (a2 - a1)),
                _ => None,
            },
        }
    }
}

impl fmt::Display for LonLat {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "({}, {})", self.longitude, self.latitude)
    }
}
