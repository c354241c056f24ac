use crate::{cluster::FireCluster, hotspot::FireHotspot};
use log::debug;

/// Hotspots closer than this (in kilometers) are linked into the same cluster.
pub const DEFAULT_RADIUS_KM: f64 = 20.0;

/// Only this many of the most powerful clusters are reported.
pub const DEFAULT_MAX_CLUSTERS: usize = 5;

/**
 * Split hotspots into groups connected by chains of neighbors within `radius_km` of each other.
 *
 * This is a flood fill over the implicit graph where every pair of hotspots within `radius_km` of
 * each other is joined by an edge. Each group is a full connected component, so two hotspots end
 * up together if any chain of close neighbors joins them, not just if they are close to the hotspot
 * that started the group.
 *
 * The cost is quadratic in the number of hotspots, which is fine for the tens to hundreds of
 * detections in a batch.
 *
 * #Returns
 * A list of groups, each a list of indexes into `hotspots`. Every index appears exactly once.
 * Groups are in the order they were discovered, and the seed of each group is its lowest index.
 */
pub fn partition(hotspots: &[FireHotspot], radius_km: f64) -> Vec<Vec<usize>> {
    let mut visited = vec![false; hotspots.len()];
    let mut groups: Vec<Vec<usize>> = vec![];

    for seed in 0..hotspots.len() {
        if visited[seed] {
            continue;
        }

        visited[seed] = true;
        let mut members = vec![seed];

        // members doubles as the work queue, everything past next is still to be expanded.
        let mut next = 0;
        while next < members.len() {
            let current = hotspots[members[next]].position;

            for candidate in 0..hotspots.len() {
                if !visited[candidate]
                    && current.distance_km(&hotspots[candidate].position) <= radius_km
                {
                    visited[candidate] = true;
                    members.push(candidate);
                }
            }

            next += 1;
        }

        groups.push(members);
    }

    groups
}

/**
 * The clusters found in a single batch of hotspots, ranked by total fire power.
 */
#[derive(Debug, Clone, Default)]
pub struct ClusterList {
    /// The linking distance used to form the clusters.
    pub radius_km: f64,
    /// The clusters, most powerful first.
    pub clusters: Vec<FireCluster>,
}

impl ClusterList {
    /**
     * Group hotspots into clusters and rank them.
     *
     * #Arguments
     * hotspots - all the hotspots in the batch.
     * radius_km - the linking distance.
     *
     * #Returns
     * Every cluster, sorted by total fire power descending. Clusters with equal power keep the
     * order they were discovered in.
     */
    pub fn from_hotspots(hotspots: &[FireHotspot], radius_km: f64) -> Self {
        let mut clusters: Vec<FireCluster> = partition(hotspots, radius_km)
            .into_iter()
            .enumerate()
            .map(|(id, indexes)| {
                let members: Vec<&FireHotspot> = indexes.iter().map(|&i| &hotspots[i]).collect();
                FireCluster::summarize(id as u32, &members, radius_km)
            })
            .collect();

        clusters.sort_by(|a, b| b.total_frp.total_cmp(&a.total_frp));

        debug!(
            "Grouped {} hotspots into {} clusters with a {} km radius.",
            hotspots.len(),
            clusters.len(),
            radius_km
        );

        ClusterList {
            radius_km,
            clusters,
        }
    }

    /// Keep only the `max_clusters` most powerful clusters.
    pub fn top(mut self, max_clusters: usize) -> Self {
        self.clusters.truncate(max_clusters);
        self
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
    pub fn iter(&self) -> impl Iterator<Item = &FireCluster> {
        self.clusters.iter()
    }

    /// Get the vector of clusters.
    pub fn into_vec(self) -> Vec<FireCluster> {
        self.clusters
    }
}
