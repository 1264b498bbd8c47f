//! Group satellite fire detections ("hotspots") into clusters of nearby detections.
//!
//! ```
//! use chrono::{TimeZone, Utc};
//! use hotspots::{cluster, DetectionPoint};
//!
//! let now = Utc.with_ymd_and_hms(2025, 4, 20, 13, 30, 0).unwrap();
//! let points = vec![
//!     DetectionPoint::new("a", 57.0800, -3.6700, now, 12.5, 80.0),
//!     DetectionPoint::new("b", 57.0801, -3.6702, now, 3.0, 55.0),
//!     DetectionPoint::new("c", 55.9533, -3.1883, now, 1.0, 40.0),
//! ];
//!
//! let clusters = cluster(&points).unwrap();
//! assert_eq!(clusters.len(), 2);
//! assert_eq!(clusters[0].count(), 2);
//! ```
pub use cluster::{
    cluster, AnchorStrategy, Cluster, ClusterList, HotspotClusterer, Linkage,
    DEFAULT_THRESHOLD_KM, MIN_THRESHOLD_KM,
};
pub use detection::DetectionPoint;
pub use error::{HotspotResult, InvalidInput};
pub use geo::{
    equirectangular_distance, great_circle_distance, BoundingBox, Coord, Geo, GridIndexView,
};
pub use hotspot_file::HotspotFile;
pub use kml::{KmlFile, KmlWriter, KmzFile};

// Clustering holds no shared state, so batches can be processed on any thread.
static_assertions::assert_impl_all!(DetectionPoint: Send, Sync);
static_assertions::assert_impl_all!(Cluster: Send, Sync);
static_assertions::assert_impl_all!(ClusterList: Send, Sync);
static_assertions::assert_impl_all!(HotspotClusterer: Send, Sync, Copy);
static_assertions::assert_impl_all!(HotspotFile: Send);

/**************************************************************************************************
 * Private Implementation
 *************************************************************************************************/
mod cluster;
mod detection;
mod error;
mod geo;
mod hotspot_file;
mod kml;
