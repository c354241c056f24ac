/*!
 * Geographic calculations.
 *
 * Everything here works on a spherical Earth. That is plenty accurate for grouping fire hotspots
 * that are tens of kilometers apart and for weighting them by their distance to a city a few
 * hundred kilometers away.
 */
use serde::{Deserialize, Serialize};
use std::{
    fmt::{self, Display},
    str::FromStr,
};

/// Mean radius of the Earth in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/**
 * The simple great circle distance calculation (haversine formula).
 *
 * #Arguments
 * * lat1 - the latitude of the first point in degrees.
 * * lon1 - the longitude of the first point in degrees.
 * * lat2 - the latitude of the second point in degrees.
 * * lon2 - the longitude of the second point in degrees.
 *
 * #Returns
 * The distance between the points in kilometers.
 */
pub fn great_circle_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    const DEG2RAD: f64 = 2.0 * std::f64::consts::PI / 360.0;

    let lat1_r = lat1 * DEG2RAD;
    let lon1_r = lon1 * DEG2RAD;
    let lat2_r = lat2 * DEG2RAD;
    let lon2_r = lon2 * DEG2RAD;

    // Use the magnitude of the differences so swapping the points gives bit for bit the same
    // answer.
    let dlat2 = (lat2_r - lat1_r).abs() / 2.0;
    let dlon2 = (lon2_r - lon1_r).abs() / 2.0;

    let sin_dlat = f64::sin(dlat2);
    let sin_dlon = f64::sin(dlon2);
    let cos_product = f64::cos(lat1_r) * f64::cos(lat2_r);

    let h = sin_dlat * sin_dlat + sin_dlon * sin_dlon * cos_product;

    // Rounding can push h a hair over 1.0 for antipodal points.
    let arc = 2.0 * f64::asin(f64::sqrt(h.min(1.0)));

    arc * EARTH_RADIUS_KM
}

/// A geographic coordinate in decimal degrees.
///
/// Serialized as a two element `[lat, lon]` array.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Coord {
    pub lat: f64,
    pub lon: f64,
}

impl Coord {
    /// Create a new coordinate.
    pub const fn new(lat: f64, lon: f64) -> Self {
        Coord { lat, lon }
    }

    /// Great circle distance to another coordinate in kilometers.
    pub fn distance_km(&self, other: &Coord) -> f64 {
        great_circle_distance(self.lat, self.lon, other.lat, other.lon)
    }
}

impl From<[f64; 2]> for Coord {
    fn from([lat, lon]: [f64; 2]) -> Self {
        Coord { lat, lon }
    }
}

impl From<Coord> for [f64; 2] {
    fn from(coord: Coord) -> Self {
        [coord.lat, coord.lon]
    }
}

impl Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        write!(f, "{},{}", self.lat, self.lon)
    }
}

impl FromStr for Coord {
    type Err = String;

    /// Parse a coordinate in the form `lat,lon`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<_> = s.split(',').map(str::trim).collect();
        if parts.len() != 2 {
            return Err(format!("Expected lat,lon but found: {}", s));
        }

        let lat = parts[0]
            .parse()
            .map_err(|err| format!("Invalid latitude {}: {}", parts[0], err))?;
        let lon = parts[1]
            .parse()
            .map_err(|err| format!("Invalid longitude {}: {}", parts[1], err))?;

        Ok(Coord { lat, lon })
    }
}

/// A latitude/longitude aligned box described by its lower left and upper right corners.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub ll: Coord,
    pub ur: Coord,
}

impl BoundingBox {
    /// Create a box from its southern, western, northern, and eastern edges.
    pub const fn new(min_lat: f64, min_lon: f64, max_lat: f64, max_lon: f64) -> Self {
        BoundingBox {
            ll: Coord::new(min_lat, min_lon),
            ur: Coord::new(max_lat, max_lon),
        }
    }

    /// Check if a coordinate is inside the box. Points on the edges are inside.
    pub fn contains(&self, coord: Coord) -> bool {
        coord.lat >= self.ll.lat
            && coord.lat <= self.ur.lat
            && coord.lon >= self.ll.lon
            && coord.lon <= self.ur.lon
    }

    /// A box is valid if it has a non-zero, finite extent in both directions.
    pub fn is_valid(&self) -> bool {
        [self.ll.lat, self.ll.lon, self.ur.lat, self.ur.lon]
            .iter()
            .all(|v| v.is_finite())
            && self.ll.lat < self.ur.lat
            && self.ll.lon < self.ur.lon
    }
}

impl Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        write!(
            f,
            "{},{},{},{}",
            self.ll.lat, self.ll.lon, self.ur.lat, self.ur.lon
        )
    }
}

impl FromStr for BoundingBox {
    type Err = String;

    /// Parse a bounding box in the form `min_lat,min_lon,max_lat,max_lon`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let corners: Vec<f64> = s
            .split(',')
            .map(|v| v.trim().parse::<f64>())
            .collect::<Result<_, _>>()
            .map_err(|err| format!("Invalid bounding box {}: {}", s, err))?;

        if corners.len() != 4 {
            return Err(format!("Invalid number of coords: {}", s));
        }

        let bbox = BoundingBox::new(corners[0], corners[1], corners[2], corners[3]);

        if !bbox.is_valid() {
            return Err(format!(
                concat!(
                    "Minimum Lat/Lon must be less than Maximum Lat/Lon:",
                    " min_lat={} max_lat={} min_lon={} max_lon={}"
                ),
                bbox.ll.lat, bbox.ur.lat, bbox.ll.lon, bbox.ur.lon
            ));
        }

        Ok(bbox)
    }
}
