/*!
 * All the data related to a single satellite fire detection.
 *
 * A DetectionPoint is a thermal anomaly ("hotspot") reported by a satellite sensor. It carries
 * where and when it was seen along with how intense and how trustworthy the detection is.
 */
use crate::{
    geo::{BoundingBox, Coord, Geo},
    InvalidInput,
};
use chrono::{DateTime, Utc};

/**
 * Represents all the data associated with a single hotspot detection.
 */
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionPoint {
    /// Opaque identifier, only used for traceability.
    pub id: String,
    /// Where the anomaly was detected.
    pub location: Coord,
    /// When the anomaly was detected.
    pub detected_at: DateTime<Utc>,
    /// The fire radiative power in megawatts.
    pub frp: f64,
    /// Detection confidence as a percentage from 0 to 100.
    pub confidence: f64,
}

impl DetectionPoint {
    pub fn new<S: Into<String>>(
        id: S,
        lat: f64,
        lon: f64,
        detected_at: DateTime<Utc>,
        frp: f64,
        confidence: f64,
    ) -> Self {
        DetectionPoint {
            id: id.into(),
            location: Coord { lat, lon },
            detected_at,
            frp,
            confidence,
        }
    }

    /// Check this detection is usable for clustering.
    pub fn validate(&self) -> Result<(), InvalidInput> {
        let Coord { lat, lon } = self.location;

        if !self.location.is_finite() {
            return Err(InvalidInput::NonFiniteCoordinate {
                id: self.id.clone(),
                lat,
                lon,
            });
        }

        if !(-90.0..=90.0).contains(&lat) {
            return Err(InvalidInput::LatitudeOutOfRange {
                id: self.id.clone(),
                lat,
            });
        }

        if !(-180.0..=180.0).contains(&lon) {
            return Err(InvalidInput::LongitudeOutOfRange {
                id: self.id.clone(),
                lon,
            });
        }

        if !self.frp.is_finite() || self.frp < 0.0 {
            return Err(InvalidInput::InvalidPower {
                id: self.id.clone(),
                frp: self.frp,
            });
        }

        // NaN fails the range check too.
        if !(0.0..=100.0).contains(&self.confidence) {
            return Err(InvalidInput::InvalidConfidence {
                id: self.id.clone(),
                confidence: self.confidence,
            });
        }

        Ok(())
    }
}

impl Geo for DetectionPoint {
    fn centroid(&self) -> Coord {
        self.location
    }

    fn bounding_box(&self) -> BoundingBox {
        BoundingBox {
            ll: self.location,
            ur: self.location,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::TimeZone;

    fn point(lat: f64, lon: f64, frp: f64, confidence: f64) -> DetectionPoint {
        let detected_at = Utc.with_ymd_and_hms(2025, 4, 20, 13, 30, 0).unwrap();
        DetectionPoint::new("det", lat, lon, detected_at, frp, confidence)
    }

    #[test]
    fn test_valid_points() {
        assert!(point(55.9533, -3.1883, 12.5, 80.0).validate().is_ok());
        assert!(point(-90.0, 180.0, 0.0, 0.0).validate().is_ok());
        assert!(point(90.0, -180.0, 0.0, 100.0).validate().is_ok());
    }

    #[test]
    fn test_invalid_coordinates() {
        assert!(matches!(
            point(f64::NAN, 0.0, 1.0, 50.0).validate(),
            Err(InvalidInput::NonFiniteCoordinate { .. })
        ));
        assert!(matches!(
            point(0.0, f64::NEG_INFINITY, 1.0, 50.0).validate(),
            Err(InvalidInput::NonFiniteCoordinate { .. })
        ));
        assert!(matches!(
            point(90.5, 0.0, 1.0, 50.0).validate(),
            Err(InvalidInput::LatitudeOutOfRange { .. })
        ));
        assert!(matches!(
            point(0.0, -180.1, 1.0, 50.0).validate(),
            Err(InvalidInput::LongitudeOutOfRange { .. })
        ));
    }

    #[test]
    fn test_invalid_measurements() {
        assert!(matches!(
            point(56.0, -3.0, -0.1, 50.0).validate(),
            Err(InvalidInput::InvalidPower { .. })
        ));
        assert!(matches!(
            point(56.0, -3.0, f64::NAN, 50.0).validate(),
            Err(InvalidInput::InvalidPower { .. })
        ));
        assert!(matches!(
            point(56.0, -3.0, 1.0, 100.5).validate(),
            Err(InvalidInput::InvalidConfidence { .. })
        ));
        assert!(matches!(
            point(56.0, -3.0, 1.0, f64::NAN).validate(),
            Err(InvalidInput::InvalidConfidence { .. })
        ));
    }

    #[test]
    fn test_geo() {
        let p = point(57.4778, -4.2247, 3.0, 70.0);
        assert_eq!(p.centroid(), p.location);
        assert!(p.bounding_box().contains(p.location));
    }
}
