/*!
 * Where the hotspots for a batch come from.
 *
 * There are three tiers of data, tried in order until one works:
 *
 * 1. [live] - the satellite feed, fetched over HTTP.
 * 2. [cache] - the hotspots from the snapshot saved by the previous batch.
 * 3. [simulated] - a plausible synthetic batch. This only fails if it is given nonsense.
 *
 * A lower tier is only tried if the one above it fails. A live feed that works but has no fires
 * in it is a perfectly good answer.
 */
use crate::{
    error::TierFailure,
    geo::BoundingBox,
    hotspot::{FireHotspot, SourceTier},
};
use chrono::{DateTime, Utc};
use log::{info, warn};

pub mod cache;
pub mod live;
pub mod simulated;

/// The hotspots for a batch and where they came from.
#[derive(Debug, Clone)]
pub struct Acquisition {
    pub hotspots: Vec<FireHotspot>,
    /// The tier that provided the hotspots.
    pub tier: SourceTier,
    /// When the hotspots were observed, or generated for simulated data.
    pub timestamp: DateTime<Utc>,
}

/// Which detections to keep from a feed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IngestFilter {
    /// Only keep detections inside this region.
    pub region: BoundingBox,
    /// Drop detections with a confidence (percent) below this.
    pub min_confidence: u8,
}

/// The Punjab and Haryana crop burning region.
pub const DEFAULT_REGION: BoundingBox = BoundingBox::new(28.0, 73.0, 32.5, 78.0);

/// Default minimum detection confidence in percent.
pub const DEFAULT_MIN_CONFIDENCE: u8 = 70;

impl Default for IngestFilter {
    fn default() -> Self {
        IngestFilter {
            region: DEFAULT_REGION,
            min_confidence: DEFAULT_MIN_CONFIDENCE,
        }
    }
}

impl IngestFilter {
    /// Check a hotspot against the region, the confidence threshold, and basic sanity.
    pub fn accepts(&self, hotspot: &FireHotspot) -> bool {
        hotspot.is_well_formed()
            && self.region.contains(hotspot.position)
            && hotspot.confidence >= self.min_confidence
    }
}

/**
 * Get the hotspots for a batch from the best tier that works.
 *
 * Each argument is one tier. They are called in order, and only until one succeeds.
 *
 * #Arguments
 * live - fetch from the satellite feed.
 * cached - load the previous batch, with the time it was originally acquired.
 * simulated - generate a synthetic batch.
 *
 * #Returns
 * The hotspots and the tier that supplied them, or the failure of the simulated tier if every
 * tier failed.
 */
pub fn acquire_hotspots<L, C, S>(live: L, cached: C, simulated: S) -> Result<Acquisition, TierFailure>
where
    L: FnOnce() -> Result<Vec<FireHotspot>, TierFailure>,
    C: FnOnce() -> Result<(Vec<FireHotspot>, DateTime<Utc>), TierFailure>,
    S: FnOnce() -> Result<Vec<FireHotspot>, TierFailure>,
{
    live()
        .map(|hotspots| {
            info!("Detected {} live fires.", hotspots.len());
            Acquisition {
                hotspots,
                tier: SourceTier::Live,
                timestamp: Utc::now(),
            }
        })
        .or_else(|err| {
            warn!("Live feed unavailable: {}", err);
            cached().map(|(hotspots, timestamp)| {
                info!("Using {} cached fires from {}.", hotspots.len(), timestamp);
                Acquisition {
                    hotspots,
                    tier: SourceTier::Cached,
                    timestamp,
                }
            })
        })
        .or_else(|err| {
            warn!("Cached data unavailable: {}", err);
            simulated().map(|hotspots| {
                info!("Using {} simulated fires.", hotspots.len());
                Acquisition {
                    hotspots,
                    tier: SourceTier::Simulated,
                    timestamp: Utc::now(),
                }
            })
        })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::geo::Coord;
    use chrono::TimeZone;
    use std::cell::Cell;

    fn fires(n: u32, tier: SourceTier) -> Vec<FireHotspot> {
        (0..n)
            .map(|id| FireHotspot::new(id, Coord::new(30.0, 75.0), 10.0, 80, tier))
            .collect()
    }

    fn offline() -> Result<Vec<FireHotspot>, TierFailure> {
        Err(TierFailure::Status(503))
    }

    #[test]
    fn test_live_short_circuits() {
        let lower_tier_called = Cell::new(false);

        let acq = acquire_hotspots(
            || Ok(fires(3, SourceTier::Live)),
            || {
                lower_tier_called.set(true);
                Err(TierFailure::CacheMissing("x".into()))
            },
            || {
                lower_tier_called.set(true);
                Ok(fires(50, SourceTier::Simulated))
            },
        )
        .unwrap();

        assert_eq!(acq.tier, SourceTier::Live);
        assert_eq!(acq.hotspots.len(), 3);
        assert!(!lower_tier_called.get());
    }

    #[test]
    fn test_empty_live_feed_is_still_live() {
        let acq = acquire_hotspots(
            || Ok(vec![]),
            || panic!("cache should not be consulted"),
            || panic!("simulation should not be consulted"),
        )
        .unwrap();

        assert_eq!(acq.tier, SourceTier::Live);
        assert!(acq.hotspots.is_empty());
    }

    #[test]
    fn test_cache_keeps_original_timestamp() {
        let then = Utc.with_ymd_and_hms(2025, 11, 3, 6, 30, 0).unwrap();

        let acq = acquire_hotspots(
            offline,
            || Ok((fires(2, SourceTier::Cached), then)),
            || panic!("simulation should not be consulted"),
        )
        .unwrap();

        assert_eq!(acq.tier, SourceTier::Cached);
        assert_eq!(acq.timestamp, then);
        assert_eq!(acq.hotspots.len(), 2);
    }

    #[test]
    fn test_falls_through_to_simulation() {
        let acq = acquire_hotspots(
            offline,
            || Err(TierFailure::CacheMissing("fire_data.json".into())),
            || Ok(fires(42, SourceTier::Simulated)),
        )
        .unwrap();

        assert_eq!(acq.tier, SourceTier::Simulated);
        assert_eq!(acq.hotspots.len(), 42);
    }

    #[test]
    fn test_total_failure_reports_simulation_error() {
        let err = acquire_hotspots(
            offline,
            || Err(TierFailure::CacheMissing("fire_data.json".into())),
            || Err(TierFailure::InvalidRegion("empty".to_owned())),
        )
        .unwrap_err();

        assert!(matches!(err, TierFailure::InvalidRegion(_)));
    }

    #[test]
    fn test_filter() {
        let filter = IngestFilter::default();

        let ok = FireHotspot::new(0, Coord::new(30.0, 75.0), 10.0, 70, SourceTier::Live);
        assert!(filter.accepts(&ok));

        let mut low_confidence = ok.clone();
        low_confidence.confidence = 69;
        assert!(!filter.accepts(&low_confidence));

        let mut outside = ok.clone();
        outside.position = Coord::new(27.9, 75.0);
        assert!(!filter.accepts(&outside));

        let mut negative = ok;
        negative.frp = -3.0;
        assert!(!filter.accepts(&negative));
    }
}
