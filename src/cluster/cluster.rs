use crate::{
    cluster::AnchorStrategy,
    detection::DetectionPoint,
    geo::{self, BoundingBox, Coord, Geo},
};
use chrono::{DateTime, Utc};

/**
 * The aggregate properties of a connected group of DetectionPoint objects.
 *
 * A cluster always has at least one member. Members are kept in the order they appeared in the
 * input to the clusterer.
 */
#[derive(Clone, Debug, PartialEq)]
pub struct Cluster {
    /// The representative location, chosen by an [AnchorStrategy].
    anchor: Coord,
    /// Average location of the points in the cluster.
    centroid: Coord,
    /// The original detections folded into this cluster.
    members: Vec<DetectionPoint>,
    /// Total (sum) of the fire power of the points in the cluster in megawatts.
    total_power: f64,
    /// Power of the most intense point in megawatts.
    max_power: f64,
    /// Highest detection confidence of any member.
    max_confidence: f64,
    /// Average detection confidence of the members.
    mean_confidence: f64,
    /// The distance from the cluster center to the farthest point in the cluster in kilometers.
    radius: f64,
    /// Time of the earliest detection.
    first_detected: DateTime<Utc>,
    /// Time of the latest detection.
    last_detected: DateTime<Utc>,
    /// Box just enclosing all the members.
    bbox: BoundingBox,
}

impl Cluster {
    /// Summarize a non-empty group of detections.
    pub(crate) fn from_members(members: Vec<DetectionPoint>, anchor: AnchorStrategy) -> Self {
        debug_assert!(!members.is_empty());

        let first = &members[0];

        let mut total_power = 0.0;
        let mut max_power = f64::NEG_INFINITY;
        let mut max_confidence = f64::NEG_INFINITY;
        let mut sum_confidence = 0.0;
        let mut first_detected = first.detected_at;
        let mut last_detected = first.detected_at;
        let mut bbox = BoundingBox::empty();
        let mut most_intense = first;

        // Longitudes are accumulated relative to the first member so a cluster straddling the
        // antimeridian doesn't average out to the other side of the planet.
        let mut sum_lat = 0.0;
        let mut sum_dlon = 0.0;

        for pnt in &members {
            sum_lat += pnt.location.lat;
            sum_dlon += geo::longitude_difference(first.location.lon, pnt.location.lon);

            total_power += pnt.frp;
            sum_confidence += pnt.confidence;
            max_confidence = max_confidence.max(pnt.confidence);

            if pnt.frp > max_power {
                max_power = pnt.frp;
                most_intense = pnt;
            }

            first_detected = first_detected.min(pnt.detected_at);
            last_detected = last_detected.max(pnt.detected_at);

            bbox.expand_to_include(pnt.location);
        }

        let count = members.len() as f64;
        let centroid = Coord {
            lat: sum_lat / count,
            lon: normalize_longitude(first.location.lon + sum_dlon / count),
        };

        let radius = members
            .iter()
            .map(|pnt| {
                geo::great_circle_distance(
                    pnt.location.lat,
                    pnt.location.lon,
                    centroid.lat,
                    centroid.lon,
                )
            })
            .fold(0.0, f64::max);

        let anchor = match anchor {
            AnchorStrategy::Centroid => centroid,
            AnchorStrategy::First => first.location,
            AnchorStrategy::MostIntense => most_intense.location,
        };

        Cluster {
            anchor,
            centroid,
            total_power,
            max_power,
            max_confidence,
            mean_confidence: sum_confidence / count,
            radius,
            first_detected,
            last_detected,
            bbox,
            members,
        }
    }

    /// The representative location of the cluster.
    pub fn anchor(&self) -> Coord {
        self.anchor
    }

    /// The number of points that are in this cluster.
    pub fn count(&self) -> usize {
        self.members.len()
    }

    /// The points in this cluster, in input order.
    pub fn members(&self) -> &[DetectionPoint] {
        &self.members
    }

    /// Give up the summary and keep the points.
    pub fn into_members(self) -> Vec<DetectionPoint> {
        self.members
    }

    /// Total fire radiative power of all the members in megawatts.
    pub fn total_power(&self) -> f64 {
        self.total_power
    }

    /// Fire radiative power of the most intense member in megawatts.
    pub fn max_power(&self) -> f64 {
        self.max_power
    }

    pub fn max_confidence(&self) -> f64 {
        self.max_confidence
    }

    pub fn mean_confidence(&self) -> f64 {
        self.mean_confidence
    }

    /// Distance in kilometers from the centroid to the farthest member.
    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn first_detected(&self) -> DateTime<Utc> {
        self.first_detected
    }

    pub fn last_detected(&self) -> DateTime<Utc> {
        self.last_detected
    }
}

impl Geo for Cluster {
    fn centroid(&self) -> Coord {
        self.centroid
    }

    /// The plain min / max box of the member coordinates. Unlike the centroid it does not wrap,
    /// so a cluster straddling the antimeridian gets a box spanning nearly all longitudes.
    fn bounding_box(&self) -> BoundingBox {
        self.bbox
    }
}

fn normalize_longitude(lon: f64) -> f64 {
    if lon > 180.0 {
        lon - 360.0
    } else if lon < -180.0 {
        lon + 360.0
    } else {
        lon
    }
}
