use crate::{geo::Coord, hotspot::FireHotspot};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

/// How bad a cluster is, judged by its total fire power.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    IntoStaticStr,
)]
pub enum ClusterSeverity {
    Low,
    Moderate,
    High,
    Critical,
}

impl ClusterSeverity {
    /// Classify a total fire radiative power in megawatts.
    pub fn from_total_frp(total_frp: f64) -> Self {
        if total_frp > 500.0 {
            ClusterSeverity::Critical
        } else if total_frp > 200.0 {
            ClusterSeverity::High
        } else if total_frp > 50.0 {
            ClusterSeverity::Moderate
        } else {
            ClusterSeverity::Low
        }
    }
}

/**
 * The aggregate properties of a connected group of FireHotspot objects.
 */
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FireCluster {
    /// Sequence number in the order the clusters were discovered, not the rank.
    pub id: u32,
    /// Average latitude and longitude of the hotspots in the cluster.
    #[serde(serialize_with = "crate::snapshot::coord_four_decimals")]
    pub center: Coord,
    /// The number of hotspots in this cluster.
    pub fire_count: usize,
    /// Total (sum) of the fire power of the hotspots in the cluster in megawatts.
    #[serde(serialize_with = "crate::snapshot::one_decimal")]
    pub total_frp: f64,
    /// Mean detection confidence of the hotspots in percent.
    #[serde(serialize_with = "crate::snapshot::one_decimal")]
    pub avg_confidence: f64,
    pub severity: ClusterSeverity,
    /// The linking distance used to build this cluster.
    pub radius_km: f64,
    /// The distance from the cluster center to the farthest hotspot in the cluster.
    pub extent_km: f64,
    /// The ids of the member hotspots.
    pub members: Vec<u32>,
}

impl FireCluster {
    /**
     * Summarize a group of hotspots that have already been found to be connected.
     *
     * #Arguments
     * id - the sequence number for the new cluster.
     * members - the hotspots in the cluster, this must not be empty.
     * radius_km - the linking distance used to form the group.
     */
    pub(crate) fn summarize(id: u32, members: &[&FireHotspot], radius_km: f64) -> Self {
        debug_assert!(!members.is_empty());

        let count = members.len() as f64;

        let mut lat = 0.0;
        let mut lon = 0.0;
        let mut total_frp = 0.0;
        let mut confidence = 0.0;
        for hotspot in members {
            lat += hotspot.position.lat;
            lon += hotspot.position.lon;
            total_frp += hotspot.frp;
            confidence += f64::from(hotspot.confidence);
        }

        let center = Coord::new(lat / count, lon / count);

        let extent_km = members
            .iter()
            .map(|hotspot| hotspot.position.distance_km(&center))
            .fold(0.0, f64::max);

        FireCluster {
            id,
            center,
            fire_count: members.len(),
            total_frp,
            avg_confidence: confidence / count,
            severity: ClusterSeverity::from_total_frp(total_frp),
            radius_km,
            extent_km,
            members: members.iter().map(|hotspot| hotspot.id).collect(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::hotspot::SourceTier;

    #[test]
    fn test_severity_thresholds() {
        assert_eq!(ClusterSeverity::from_total_frp(0.0), ClusterSeverity::Low);
        assert_eq!(ClusterSeverity::from_total_frp(50.0), ClusterSeverity::Low);
        assert_eq!(ClusterSeverity::from_total_frp(50.1), ClusterSeverity::Moderate);
        assert_eq!(ClusterSeverity::from_total_frp(200.0), ClusterSeverity::Moderate);
        assert_eq!(ClusterSeverity::from_total_frp(200.1), ClusterSeverity::High);
        assert_eq!(ClusterSeverity::from_total_frp(500.0), ClusterSeverity::High);
        assert_eq!(ClusterSeverity::from_total_frp(500.1), ClusterSeverity::Critical);
    }

    #[test]
    fn test_summarize() {
        let a = FireHotspot::new(4, Coord::new(30.0, 75.0), 10.0, 70, SourceTier::Live);
        let b = FireHotspot::new(9, Coord::new(30.1, 75.1), 30.0, 90, SourceTier::Live);

        let cluster = FireCluster::summarize(2, &[&a, &b], 20.0);

        assert_eq!(cluster.id, 2);
        assert_eq!(cluster.fire_count, 2);
        assert_eq!(cluster.members, vec![4, 9]);
        assert!((cluster.center.lat - 30.05).abs() < 1.0e-12);
        assert!((cluster.center.lon - 75.05).abs() < 1.0e-12);
        assert_eq!(cluster.total_frp, 40.0);
        assert_eq!(cluster.avg_confidence, 80.0);
        assert_eq!(cluster.severity, ClusterSeverity::Low);
        assert_eq!(cluster.radius_km, 20.0);

        let half_diagonal = a.position.distance_km(&b.position) / 2.0;
        assert!((cluster.extent_km - half_diagonal).abs() < 0.05);
    }
}
