// src/geo.rs

// Geographic value types and the haversine distance used by zone-radius
// queries. Zones are named semantic regions (parking, street) anchored to a
// fixed coordinate.

use serde::{Deserialize, Serialize};

/// Mean Earth radius in meters, for haversine distances.
const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// WGS84 latitude/longitude in degrees.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    /// Latitude in degrees, positive north.
    pub latitude: f64,
    /// Longitude in degrees, positive east.
    pub longitude: f64,
}

impl Coordinate {
    /// A coordinate from degree values.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Coordinate { latitude, longitude }
    }

    /// Great-circle distance to another coordinate, in meters.
    pub fn distance_to(&self, other: &Coordinate) -> f64 {
        let lat1 = self.latitude.to_radians();
        let lat2 = other.latitude.to_radians();
        let dlat = (other.latitude - self.latitude).to_radians();
        let dlon = (other.longitude - self.longitude).to_radians();

        let a = (dlat / 2.0).sin().powi(2)
            + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_M * a.sqrt().asin()
    }
}

/// Semantic zone categories known to the localization service.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ZoneType {
    /// A mapped parking area.
    Parking,
    /// A mapped street segment.
    Street,
}

/// A named semantic region with its reference coordinate.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    /// Which category of region this is.
    pub zone_type: ZoneType,
    /// The region's reference coordinate.
    pub coordinate: Coordinate,
}
