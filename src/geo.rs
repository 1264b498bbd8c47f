/*!
 * Geographic calculations.
 *
 * Everything here works in decimal degrees on the WGS84 ellipsoid approximated as a sphere. The
 * regions of interest are country sized, so simple approximations are accurate enough and a lot
 * faster than a full geodesic solution.
 */
use std::fmt::{self, Display};

pub use grid_index::{GridIndexView, MIN_CELL_KM};

mod grid_index;

/// Mean radius of the Earth in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0090;

const DEG2RAD: f64 = 2.0 * std::f64::consts::PI / 360.0;

/// Kilometers spanned by one degree of latitude (or longitude at the equator).
pub const KM_PER_DEGREE: f64 = EARTH_RADIUS_KM * DEG2RAD;

/// A geographic coordinate in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Coord {
    pub lat: f64,
    pub lon: f64,
}

impl Coord {
    /// Both components are finite numbers.
    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lon.is_finite()
    }

    /// Finite, with latitude in [-90, 90] and longitude in [-180, 180].
    pub fn is_valid(&self) -> bool {
        self.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lon)
    }

    /// Check if two coordinates are within `eps` degrees of each other in both components.
    pub fn is_close(&self, other: Coord, eps: f64) -> bool {
        (self.lat - other.lat).abs() <= eps && (self.lon - other.lon).abs() <= eps
    }
}

impl Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        write!(f, "{:.6},{:.6}", self.lat, self.lon)
    }
}

/// A lat/lon aligned rectangle described by its lower left and upper right corners.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub ll: Coord,
    pub ur: Coord,
}

impl BoundingBox {
    /// A box that contains nothing, expanding it by any coordinate yields a box around just that
    /// coordinate.
    pub const fn empty() -> Self {
        BoundingBox {
            ll: Coord {
                lat: f64::INFINITY,
                lon: f64::INFINITY,
            },
            ur: Coord {
                lat: f64::NEG_INFINITY,
                lon: f64::NEG_INFINITY,
            },
        }
    }

    /// Grow the box so it includes `coord`.
    pub fn expand_to_include(&mut self, coord: Coord) {
        self.ll.lat = self.ll.lat.min(coord.lat);
        self.ll.lon = self.ll.lon.min(coord.lon);
        self.ur.lat = self.ur.lat.max(coord.lat);
        self.ur.lon = self.ur.lon.max(coord.lon);
    }

    /// Check if a coordinate is inside the box, edges included.
    pub fn contains(&self, coord: Coord) -> bool {
        coord.lat >= self.ll.lat
            && coord.lat <= self.ur.lat
            && coord.lon >= self.ll.lon
            && coord.lon <= self.ur.lon
    }

    /// Check if two boxes overlap, treating edges within `eps` degrees as touching.
    pub fn overlap(&self, other: &BoundingBox, eps: f64) -> bool {
        if self.ur.lat + eps < other.ll.lat || other.ur.lat + eps < self.ll.lat {
            return false;
        }

        if self.ur.lon + eps < other.ll.lon || other.ur.lon + eps < self.ll.lon {
            return false;
        }

        true
    }
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::empty()
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

/// Anything with a location and an extent.
///
/// Bounding boxes are plain latitude / longitude ranges and never wrap at the antimeridian.
pub trait Geo {
    fn centroid(&self) -> Coord;
    fn bounding_box(&self) -> BoundingBox;
}

/**
 * the simple great circle distance calculation.
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
    let lat1_r = lat1 * DEG2RAD;
    let lat2_r = lat2 * DEG2RAD;

    let dlat2 = (lat2_r - lat1_r) / 2.0;
    let dlon2 = longitude_difference(lon1, lon2) * DEG2RAD / 2.0;

    let sin2_dlat = f64::powi(f64::sin(dlat2), 2);
    let sin2_dlon = f64::powi(f64::sin(dlon2), 2);

    let arc = 2.0
        * f64::asin(f64::sqrt(
            (sin2_dlat + sin2_dlon * f64::cos(lat1_r) * f64::cos(lat2_r)).min(1.0),
        ));

    arc * EARTH_RADIUS_KM
}

/**
 * Flat Earth (equirectangular) approximation of the distance between two points.
 *
 * Longitude differences are scaled by the cosine of the mean latitude. Within a few hundred
 * kilometers the error relative to the great circle distance is well under one percent, and it
 * needs a single trigonometric call.
 *
 * #Returns
 * The distance between the points in kilometers.
 */
pub fn equirectangular_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let mean_lat_r = (lat1 + lat2) / 2.0 * DEG2RAD;

    let dx = longitude_difference(lon1, lon2) * f64::cos(mean_lat_r);
    let dy = lat2 - lat1;

    f64::hypot(dx, dy) * KM_PER_DEGREE
}

/// Signed difference `lon2 - lon1` in degrees, taking the short way around the antimeridian.
pub(crate) fn longitude_difference(lon1: f64, lon2: f64) -> f64 {
    let mut dlon = lon2 - lon1;
    if dlon > 180.0 {
        dlon -= 360.0;
    } else if dlon < -180.0 {
        dlon += 360.0;
    }
    dlon
}
