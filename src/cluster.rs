/*!
 * Types and functions for working with clusters.
 *
 * A cluster describes the aggregate properties of a group of FireHotspot objects that are
 * connected to each other by chains of hotspots that are all within a fixed distance of their
 * neighbor.
 */

pub use cluster::{ClusterSeverity, FireCluster};
pub use cluster_list::{partition, ClusterList, DEFAULT_MAX_CLUSTERS, DEFAULT_RADIUS_KM};

mod cluster;
mod cluster_list;
