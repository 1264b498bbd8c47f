use crate::{
    cluster::Cluster,
    detection::DetectionPoint,
    geo::{equirectangular_distance, GridIndexView, MIN_CELL_KM},
    InvalidInput,
};
use std::ops::ControlFlow;

/// Detections closer than this many kilometers end up in the same cluster by default.
pub const DEFAULT_THRESHOLD_KM: f64 = 2.0;

/// The smallest accepted threshold, one millimeter.
pub const MIN_THRESHOLD_KM: f64 = MIN_CELL_KM;

/// How detections are linked together into a cluster.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    strum::IntoStaticStr,
)]
#[strum(serialize_all = "kebab-case")]
pub enum Linkage {
    /// Every member is within the threshold of at least one other member. Clusters can chain
    /// along a fire front.
    #[default]
    Single,
    /// The first unclustered detection absorbs everything within the threshold of itself, and
    /// nothing else. Clusters are never wider than twice the threshold.
    Seed,
}

/// Which location represents a cluster.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    strum::IntoStaticStr,
)]
#[strum(serialize_all = "kebab-case")]
pub enum AnchorStrategy {
    /// The mean latitude and longitude of the members.
    #[default]
    Centroid,
    /// The location of the member that came first in the input.
    First,
    /// The location of the member with the highest fire radiative power, ties go to the one
    /// earliest in the input.
    MostIntense,
}

/**
 * Groups detections into clusters of nearby detections.
 *
 * The clusterer holds only configuration, so a single instance can be shared between threads
 * and used for any number of independent batches.
 */
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HotspotClusterer {
    threshold_km: f64,
    linkage: Linkage,
    anchor: AnchorStrategy,
}

impl Default for HotspotClusterer {
    fn default() -> Self {
        HotspotClusterer {
            threshold_km: DEFAULT_THRESHOLD_KM,
            linkage: Linkage::default(),
            anchor: AnchorStrategy::default(),
        }
    }
}

impl HotspotClusterer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the linking distance in kilometers.
    ///
    /// It is checked when clustering, a value that isn't finite or is below [MIN_THRESHOLD_KM]
    /// makes [HotspotClusterer::cluster] fail with [InvalidInput::Threshold].
    pub fn with_threshold_km(mut self, threshold_km: f64) -> Self {
        self.threshold_km = threshold_km;
        self
    }

    pub fn with_linkage(mut self, linkage: Linkage) -> Self {
        self.linkage = linkage;
        self
    }

    pub fn with_anchor(mut self, anchor: AnchorStrategy) -> Self {
        self.anchor = anchor;
        self
    }

    pub fn threshold_km(&self) -> f64 {
        self.threshold_km
    }

    pub fn linkage(&self) -> Linkage {
        self.linkage
    }

    pub fn anchor(&self) -> AnchorStrategy {
        self.anchor
    }

    /**
     * Group DetectionPoint objects into clusters.
     *
     * Every point ends up in exactly one cluster. Clusters are returned in the input order of
     * their first member, and the members of each cluster are in input order, so the same input
     * always gives the same output.
     *
     * #Arguments
     * points - the detections to group, they are cloned into the clusters.
     *
     * #Returns
     * The clusters, or the first validation failure. Nothing is clustered if any point is
     * invalid.
     */
    pub fn cluster(&self, points: &[DetectionPoint]) -> Result<Vec<Cluster>, InvalidInput> {
        if !self.threshold_km.is_finite() || self.threshold_km < MIN_THRESHOLD_KM {
            return Err(InvalidInput::Threshold(self.threshold_km));
        }

        for pnt in points {
            pnt.validate()?;
        }

        let view = match GridIndexView::build_for(points, self.threshold_km) {
            Some(view) => view,
            None => return Ok(vec![]),
        };

        let mut visited = vec![false; points.len()];
        let mut clusters: Vec<Cluster> = vec![];
        let mut group: Vec<usize> = vec![];

        for seed in 0..points.len() {
            if visited[seed] {
                continue;
            }

            visited[seed] = true;
            group.clear();
            group.push(seed);

            match self.linkage {
                Linkage::Single => {
                    // Breadth first, the group doubles as the queue.
                    let mut next = 0;
                    while next < group.len() {
                        let current = group[next];
                        next += 1;
                        self.absorb_neighbors(&view, points, current, &mut visited, &mut group);
                    }
                }
                Linkage::Seed => {
                    self.absorb_neighbors(&view, points, seed, &mut visited, &mut group)
                }
            }

            // Every index below the seed was already claimed, so the seed stays first.
            group.sort_unstable();
            let members = group.iter().map(|&idx| points[idx].clone()).collect();
            clusters.push(Cluster::from_members(members, self.anchor));
        }

        log::debug!(
            "clustered {} detections into {} clusters ({} grid cells, {} linkage, {} km)",
            points.len(),
            clusters.len(),
            view.num_cells(),
            self.linkage,
            self.threshold_km
        );

        Ok(clusters)
    }

    /// Claim every unvisited point within the threshold of `points[center]` for `group`.
    fn absorb_neighbors(
        &self,
        view: &GridIndexView<DetectionPoint>,
        points: &[DetectionPoint],
        center: usize,
        visited: &mut [bool],
        group: &mut Vec<usize>,
    ) {
        let origin = points[center].location;
        let threshold_km = self.threshold_km;

        view.foreach_near(
            origin,
            (visited, group),
            |candidate, candidate_idx, (visited, group)| {
                if !visited[candidate_idx] {
                    let dist = equirectangular_distance(
                        origin.lat,
                        origin.lon,
                        candidate.location.lat,
                        candidate.location.lon,
                    );

                    if dist <= threshold_km {
                        visited[candidate_idx] = true;
                        group.push(candidate_idx);
                    }
                }

                ControlFlow::Continue((visited, group))
            },
        );
    }
}

/// Cluster with the default configuration.
pub fn cluster(points: &[DetectionPoint]) -> Result<Vec<Cluster>, InvalidInput> {
    HotspotClusterer::default().cluster(points)
}
