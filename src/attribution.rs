/*!
 * Estimate how much of the pollution at a city is due to the fires upwind of it.
 *
 * Every hotspot gets an impact score, its fire power weighted by the inverse of its distance from
 * the target. The scores are summed and mapped onto a percentage of the ambient pollution. The
 * constants here are a heuristic calibration, not a physical model.
 */
use crate::{geo::Coord, hotspot::FireHotspot};
use log::debug;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

/// Delhi, the downwind city.
pub const DEFAULT_TARGET: Coord = Coord::new(28.6139, 77.2090);

/// How many of the highest impact hotspots to keep.
pub const DEFAULT_MAX_IMPACTFUL: usize = 50;

/// Added to the distance so a fire right at the target does not divide by zero.
pub const DISTANCE_GUARD_KM: f64 = 1.0;

/// Total impact that adds one percentage point.
pub const IMPACT_PER_PERCENT: f64 = 50.0;

/// The attribution before any fires are counted.
pub const BASELINE_PERCENT: f64 = 5.0;

/// Never attribute more than this share of the pollution to crop fires.
pub const MAX_PERCENT: f64 = 45.0;

/// Weight applied to fires upwind of the target in the smoke drift estimate.
const DRIFT_WEIGHT: f64 = 0.5;

/// Smoke drift above this is considered severe.
const SEVERE_DRIFT: f64 = 50.0;

/// How serious the attributed share of pollution is.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, IntoStaticStr,
)]
pub enum AttributionSeverity {
    Moderate,
    High,
    Critical,
}

impl AttributionSeverity {
    /// Classify an attribution percentage.
    pub fn from_percent(percent: f64) -> Self {
        if percent > 30.0 {
            AttributionSeverity::Critical
        } else if percent > 20.0 {
            AttributionSeverity::High
        } else {
            AttributionSeverity::Moderate
        }
    }
}

/// Risk of smoke from upwind fires reaching the target.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, IntoStaticStr,
)]
pub enum DriftRisk {
    Moderate,
    Severe,
}

/// The smoke drift estimate for the winter north-westerly wind pattern.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SmokeDrift {
    /// Fire power of upwind hotspots weighted by their closeness to the target.
    #[serde(serialize_with = "crate::snapshot::two_decimals")]
    pub estimated_pm25_contribution: f64,
    pub risk: DriftRisk,
    /// The number of hotspots north-west of the target.
    pub upwind_fire_count: usize,
}

impl SmokeDrift {
    /**
     * Estimate smoke drift from fires north-west of the target.
     *
     * Closeness is measured as the sum of the absolute latitude and longitude differences in
     * degrees. Fires that are not strictly north and strictly west of the target are ignored, so
     * that sum is never zero.
     */
    pub fn estimate(hotspots: &[FireHotspot], target: Coord) -> Self {
        let mut drift = 0.0;
        let mut upwind_fire_count = 0;

        for hotspot in hotspots
            .iter()
            .filter(|h| h.position.lat > target.lat && h.position.lon < target.lon)
        {
            let dlat = (hotspot.position.lat - target.lat).abs();
            let dlon = (hotspot.position.lon - target.lon).abs();
            drift += hotspot.frp / (dlat + dlon) * DRIFT_WEIGHT;
            upwind_fire_count += 1;
        }

        let risk = if drift > SEVERE_DRIFT {
            DriftRisk::Severe
        } else {
            DriftRisk::Moderate
        };

        SmokeDrift {
            estimated_pm25_contribution: drift,
            risk,
            upwind_fire_count,
        }
    }
}

/// Impact score of a single fire on the target.
pub fn impact_score(hotspot: &FireHotspot, target: Coord) -> f64 {
    hotspot.frp / (hotspot.position.distance_km(&target) + DISTANCE_GUARD_KM)
}

/// Map a total impact onto the share of pollution attributed to the fires.
///
/// The result is always between [BASELINE_PERCENT] and [MAX_PERCENT] for non-negative impacts.
pub fn stubble_percentage(total_impact: f64) -> f64 {
    (total_impact / IMPACT_PER_PERCENT + BASELINE_PERCENT).min(MAX_PERCENT)
}

/**
 * The estimated contribution of a batch of fires to the pollution at the target.
 */
#[derive(Debug, Clone, PartialEq)]
pub struct AttributionResult {
    /// Sum of the impact scores of every hotspot.
    pub total_impact: f64,
    /// Share of the ambient pollution attributed to the fires, in percent.
    pub stubble_percentage: f64,
    pub severity: AttributionSeverity,
    /// The most impactful hotspots, highest impact first.
    pub top_impactful: Vec<FireHotspot>,
    /// The number of hotspots considered.
    pub total_fire_count: usize,
    pub smoke_drift: SmokeDrift,
}

impl AttributionResult {
    /**
     * Score every hotspot against the target and summarize.
     *
     * This attaches an impact score to each hotspot in `hotspots`, which otherwise keeps its
     * order.
     *
     * #Arguments
     * hotspots - all the hotspots in the batch.
     * target - the location to attribute pollution at.
     * max_impactful - how many of the highest scoring hotspots to keep in `top_impactful`.
     */
    pub fn assess(hotspots: &mut [FireHotspot], target: Coord, max_impactful: usize) -> Self {
        let mut total_impact = 0.0;
        for hotspot in hotspots.iter_mut() {
            let score = impact_score(hotspot, target);
            hotspot.impact_score = Some(score);
            total_impact += score;
        }

        let mut ranked: Vec<FireHotspot> = hotspots.to_vec();
        ranked.sort_by(|a, b| {
            let a = a.impact_score.unwrap_or(0.0);
            let b = b.impact_score.unwrap_or(0.0);
            b.total_cmp(&a)
        });
        ranked.truncate(max_impactful);

        let stubble_percentage = stubble_percentage(total_impact);

        debug!(
            "Total impact {:.2} from {} hotspots, {:.1}% attributed.",
            total_impact,
            hotspots.len(),
            stubble_percentage
        );

        AttributionResult {
            total_impact,
            stubble_percentage,
            severity: AttributionSeverity::from_percent(stubble_percentage),
            top_impactful: ranked,
            total_fire_count: hotspots.len(),
            smoke_drift: SmokeDrift::estimate(hotspots, target),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::hotspot::SourceTier;
    use proptest::prelude::*;

    fn hotspot(id: u32, lat: f64, lon: f64, frp: f64) -> FireHotspot {
        FireHotspot::new(id, Coord::new(lat, lon), frp, 80, SourceTier::Live)
    }

    #[test]
    fn test_fire_at_the_target() {
        let fire = hotspot(0, DEFAULT_TARGET.lat, DEFAULT_TARGET.lon, 37.5);
        assert_eq!(impact_score(&fire, DEFAULT_TARGET), 37.5);
    }

    #[test]
    fn test_empty_batch() {
        let result = AttributionResult::assess(&mut [], DEFAULT_TARGET, DEFAULT_MAX_IMPACTFUL);

        assert_eq!(result.total_impact, 0.0);
        assert_eq!(result.stubble_percentage, 5.0);
        assert_eq!(result.severity, AttributionSeverity::Moderate);
        assert!(result.top_impactful.is_empty());
        assert_eq!(result.total_fire_count, 0);
        assert_eq!(result.smoke_drift.risk, DriftRisk::Moderate);
        assert_eq!(result.smoke_drift.upwind_fire_count, 0);
    }

    #[test]
    fn test_percentage_is_capped() {
        assert_eq!(stubble_percentage(0.0), 5.0);
        assert_eq!(stubble_percentage(500.0), 15.0);
        assert_eq!(stubble_percentage(2000.0), 45.0);
        assert_eq!(stubble_percentage(1.0e9), 45.0);
    }

    #[test]
    fn test_severity_thresholds() {
        assert_eq!(AttributionSeverity::from_percent(5.0), AttributionSeverity::Moderate);
        assert_eq!(AttributionSeverity::from_percent(20.0), AttributionSeverity::Moderate);
        assert_eq!(AttributionSeverity::from_percent(20.5), AttributionSeverity::High);
        assert_eq!(AttributionSeverity::from_percent(30.0), AttributionSeverity::High);
        assert_eq!(AttributionSeverity::from_percent(30.5), AttributionSeverity::Critical);
        assert_eq!(AttributionSeverity::from_percent(45.0), AttributionSeverity::Critical);
    }

    #[test]
    fn test_scores_are_attached_and_ranked() {
        let mut fires = vec![
            hotspot(0, 31.5, 74.5, 100.0),
            hotspot(1, DEFAULT_TARGET.lat, DEFAULT_TARGET.lon, 10.0),
            hotspot(2, 30.0, 75.0, 100.0),
        ];

        let result = AttributionResult::assess(&mut fires, DEFAULT_TARGET, 2);

        // The input keeps its order but now carries scores.
        let ids: Vec<u32> = fires.iter().map(|f| f.id).collect();
        assert_eq!(ids, vec![0, 1, 2]);
        assert!(fires.iter().all(|f| f.impact_score.is_some()));
        assert_eq!(fires[1].impact_score, Some(10.0));

        let sum: f64 = fires.iter().filter_map(|f| f.impact_score).sum();
        assert!((result.total_impact - sum).abs() < 1.0e-12);

        // The fire at the target wins, then the closer of the two big fires.
        let ranked: Vec<u32> = result.top_impactful.iter().map(|f| f.id).collect();
        assert_eq!(ranked, vec![1, 2]);
        assert_eq!(result.total_fire_count, 3);
    }

    #[test]
    fn test_smoke_drift_only_counts_north_west() {
        let fires = vec![
            // North-west, 1 + 2 degrees away.
            hotspot(0, DEFAULT_TARGET.lat + 1.0, DEFAULT_TARGET.lon - 2.0, 240.0),
            // South-west, ignored.
            hotspot(1, DEFAULT_TARGET.lat - 1.0, DEFAULT_TARGET.lon - 1.0, 300.0),
            // North-east, ignored.
            hotspot(2, DEFAULT_TARGET.lat + 1.0, DEFAULT_TARGET.lon + 1.0, 300.0),
        ];

        let drift = SmokeDrift::estimate(&fires, DEFAULT_TARGET);

        assert_eq!(drift.upwind_fire_count, 1);
        assert!((drift.estimated_pm25_contribution - 40.0).abs() < 1.0e-9);
        assert_eq!(drift.risk, DriftRisk::Moderate);

        let mut more = fires;
        more.push(hotspot(3, DEFAULT_TARGET.lat + 0.5, DEFAULT_TARGET.lon - 0.5, 100.0));
        assert_eq!(SmokeDrift::estimate(&more, DEFAULT_TARGET).risk, DriftRisk::Severe);
    }

    proptest! {
        #[test]
        fn percentage_stays_in_range(
            fires in prop::collection::vec((-60.0f64..60.0, -170.0f64..170.0, 0.0f64..5000.0), 0..60)
        ) {
            let mut hotspots: Vec<FireHotspot> = fires
                .into_iter()
                .enumerate()
                .map(|(id, (lat, lon, frp))| hotspot(id as u32, lat, lon, frp))
                .collect();

            let result = AttributionResult::assess(&mut hotspots, DEFAULT_TARGET, DEFAULT_MAX_IMPACTFUL);

            prop_assert!(result.stubble_percentage >= BASELINE_PERCENT);
            prop_assert!(result.stubble_percentage <= MAX_PERCENT);
            prop_assert!(result.top_impactful.len() <= DEFAULT_MAX_IMPACTFUL);

            let scores: Vec<f64> = result.top_impactful.iter().filter_map(|f| f.impact_score).collect();
            prop_assert!(scores.windows(2).all(|w| w[0] >= w[1]));
        }
    }
}
