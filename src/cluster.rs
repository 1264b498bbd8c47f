/*!
 * Types and functions for working with clusters.
 *
 * A cluster describes the aggregate properties of a spatially connected group (or cluster) of
 * DetectionPoint objects.
 */

pub use cluster::Cluster;
pub use cluster_list::ClusterList;
pub use clusterer::{
    cluster, AnchorStrategy, HotspotClusterer, Linkage, DEFAULT_THRESHOLD_KM, MIN_THRESHOLD_KM,
};

mod cluster;
mod cluster_list;
mod clusterer;
