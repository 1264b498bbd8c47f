use std::{
    error::Error,
    fmt::{Display, Formatter},
};

/// Error type for I/O facing code, file loading and export.
pub type HotspotResult<T> = Result<T, Box<dyn Error>>;

/**
 * Input that the clusterer refuses to process.
 *
 * Validation happens for the whole batch before any clustering, so a single bad point fails the
 * entire call instead of being silently dropped.
 */
#[derive(Debug, Clone, PartialEq)]
pub enum InvalidInput {
    /// Latitude or longitude was NaN or infinite.
    NonFiniteCoordinate { id: String, lat: f64, lon: f64 },
    /// Latitude outside [-90, 90].
    LatitudeOutOfRange { id: String, lat: f64 },
    /// Longitude outside [-180, 180].
    LongitudeOutOfRange { id: String, lon: f64 },
    /// Fire radiative power was negative or not finite.
    InvalidPower { id: String, frp: f64 },
    /// Confidence outside [0, 100] or not finite.
    InvalidConfidence { id: String, confidence: f64 },
    /// The clustering distance threshold must be finite and at least one millimeter.
    Threshold(f64),
}

impl InvalidInput {
    /// The id of the detection that failed validation, if the error is about a detection.
    pub fn point_id(&self) -> Option<&str> {
        use InvalidInput::*;

        match self {
            NonFiniteCoordinate { id, .. }
            | LatitudeOutOfRange { id, .. }
            | LongitudeOutOfRange { id, .. }
            | InvalidPower { id, .. }
            | InvalidConfidence { id, .. } => Some(id),
            Threshold(_) => None,
        }
    }
}

impl Display for InvalidInput {
    fn fmt(&self, f: &mut Formatter) -> Result<(), std::fmt::Error> {
        use InvalidInput::*;

        match self {
            NonFiniteCoordinate { id, lat, lon } => {
                write!(f, "detection {} has a non-finite coordinate ({}, {})", id, lat, lon)
            }
            LatitudeOutOfRange { id, lat } => {
                write!(f, "detection {} latitude {} is outside [-90, 90]", id, lat)
            }
            LongitudeOutOfRange { id, lon } => {
                write!(f, "detection {} longitude {} is outside [-180, 180]", id, lon)
            }
            InvalidPower { id, frp } => {
                write!(f, "detection {} has invalid fire radiative power {}", id, frp)
            }
            InvalidConfidence { id, confidence } => {
                write!(f, "detection {} confidence {} is outside [0, 100]", id, confidence)
            }
            Threshold(km) => {
                write!(f, "cluster threshold must be at least 1 mm, got {} km", km)
            }
        }
    }
}

impl Error for InvalidInput {}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_point_id() {
        let err = InvalidInput::LatitudeOutOfRange {
            id: "abc".to_owned(),
            lat: 91.0,
        };
        assert_eq!(err.point_id(), Some("abc"));
        assert_eq!(InvalidInput::Threshold(-1.0).point_id(), None);
    }

    #[test]
    fn test_display_names_the_point() {
        let err = InvalidInput::NonFiniteCoordinate {
            id: "viirs-17".to_owned(),
            lat: f64::NAN,
            lon: 0.0,
        };
        assert!(err.to_string().contains("viirs-17"));
    }
}
