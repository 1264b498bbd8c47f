use crate::{
    cluster::{Cluster, HotspotClusterer},
    detection::DetectionPoint,
    kml::{KmlFile, KmlWriter, KmzFile},
    HotspotResult, InvalidInput,
};
use std::{fmt::Write, path::Path};

/**
 * Keep a cluster list with metadata about where the detections came from.
 */
#[derive(Debug, Clone)]
pub struct ClusterList {
    /// A label for the batch of detections, usually the name of the file they were loaded from.
    pub source: String,
    /// List of Cluster objects associated with the above metadata.
    pub clusters: Vec<Cluster>,
}

impl ClusterList {
    /**
     * Cluster a batch of detections and keep the result together with its source label.
     *
     * #Arguments
     * source - a label for the batch.
     * clusterer - the configured clusterer to use.
     * points - the detections.
     */
    pub fn from_points<S: Into<String>>(
        source: S,
        clusterer: &HotspotClusterer,
        points: &[DetectionPoint],
    ) -> Result<Self, InvalidInput> {
        let clusters = clusterer.cluster(points)?;

        Ok(ClusterList {
            source: source.into(),
            clusters,
        })
    }

    /// The total number of detections in all the clusters.
    pub fn num_points(&self) -> usize {
        self.clusters.iter().map(Cluster::count).sum()
    }

    /// Get the number of clusters in the list.
    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    /// Check if this list is empty.
    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    /// Get an iterator over the clusters.
    pub fn iter(&self) -> impl Iterator<Item = &Cluster> {
        self.clusters.iter()
    }

    /// The cluster with the most total power, ties go to the one that came first.
    pub fn biggest(&self) -> Option<&Cluster> {
        self.clusters.iter().fold(None, |biggest, clust| match biggest {
            Some(big) if big.total_power() >= clust.total_power() => Some(big),
            _ => Some(clust),
        })
    }

    /// Get a vector of clusters.
    pub fn into_vec(self) -> Vec<Cluster> {
        self.clusters
    }

    /// Save this list in a KML file.
    pub fn save_kml<P: AsRef<Path>>(&self, kml_path: P) -> HotspotResult<()> {
        let mut kml = KmlFile::new(kml_path)?;
        self.write_kml(&mut kml)?;
        kml.finish()
    }

    /// Save this list in a KMZ file.
    ///
    /// Only returns `Ok` once the archive is completely written.
    pub fn save_kmz<P: AsRef<Path>>(&self, kmz_path: P) -> HotspotResult<()> {
        let mut kmz = KmzFile::new(kmz_path)?;
        self.write_kml(&mut kmz)?;
        kmz.finish()
    }

    /// Write the clusters as placemarks into an already started document.
    pub fn write_kml<K: KmlWriter>(&self, kml: &mut K) -> HotspotResult<()> {
        kml.start_style(Some("hotspot"))?;
        kml.create_icon_style(
            Some("http://maps.google.com/mapfiles/kml/shapes/firedept.png"),
            1.0,
        )?;
        kml.finish_style()?;

        kml.start_folder(Some(&self.source), true)?;

        let mut name = String::with_capacity(32);
        let mut description = String::with_capacity(256);
        for (idx, clust) in self.clusters.iter().enumerate() {
            name.clear();
            let _ = write!(&mut name, "{}", idx + 1);

            description.clear();
            let _ = write!(
                &mut description,
                concat!(
                    "Detections: {}<br/>",
                    "Total Power: {:.1} MW<br/>",
                    "Max Power: {:.1} MW<br/>",
                    "Max Confidence: {:.0}%<br/>",
                    "Radius: {:.2} km<br/>",
                    "First Detected: {}<br/>",
                    "Last Detected: {}<br/>",
                ),
                clust.count(),
                clust.total_power(),
                clust.max_power(),
                clust.max_confidence(),
                clust.radius(),
                clust.first_detected(),
                clust.last_detected(),
            );

            kml.start_placemark(Some(&name), Some(&description), Some("#hotspot"))?;
            kml.timespan(clust.first_detected(), clust.last_detected())?;
            let anchor = clust.anchor();
            kml.create_point(anchor.lat, anchor.lon, 0.0)?;
            kml.finish_placemark()?;
        }

        kml.finish_folder()?;

        Ok(())
    }
}
