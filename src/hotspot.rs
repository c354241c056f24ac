/*!
 * All the data related to a single satellite fire detection.
 *
 * A FireHotspot is created once per batch by one of the [source](crate::source) tiers. After that
 * the only thing that ever changes is the impact score attached by the
 * [attribution](crate::attribution) engine.
 */
use crate::geo::Coord;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

/// The data source priority levels, best first.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    IntoStaticStr,
)]
pub enum SourceTier {
    /// Fresh detections from the satellite feed.
    Live,
    /// Detections reused from the previous persisted batch.
    Cached,
    /// Synthetic detections, used when nothing better is available.
    Simulated,
}

impl SourceTier {
    /// Is this data a degraded stand in for a real measurement?
    pub fn is_degraded(self) -> bool {
        !matches!(self, SourceTier::Live)
    }
}

/// Categorical detection confidence as reported by some sensors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum ConfidenceLevel {
    Nominal,
    High,
}

impl ConfidenceLevel {
    /// Map the category to a percentage so it can be averaged with numeric confidences.
    pub fn percent(self) -> u8 {
        match self {
            ConfidenceLevel::Nominal => 70,
            ConfidenceLevel::High => 90,
        }
    }
}

/**
 * A single detected point source of fire.
 */
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FireHotspot {
    /// Sequence number, unique within a batch.
    pub id: u32,
    /// Where the fire was detected.
    pub position: Coord,
    /// The fire radiative power in megawatts.
    pub frp: f64,
    /// Brightness temperature in Kelvin, if the source reports it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brightness: Option<f64>,
    /// A normalized intensity, roughly 0 to 1.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intensity: Option<f64>,
    /// Detection confidence in percent.
    pub confidence: u8,
    /// Which tier this detection came from.
    #[serde(default = "cached_tier")]
    pub source_tier: SourceTier,
    /// Estimated contribution to the pollution at the target, set by the attribution engine.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "crate::snapshot::two_decimals_opt"
    )]
    pub impact_score: Option<f64>,
}

// Snapshots written before the tier was recorded can only have come from a cache.
fn cached_tier() -> SourceTier {
    SourceTier::Cached
}

impl FireHotspot {
    /// Create a hotspot without the optional brightness and intensity values.
    pub fn new(id: u32, position: Coord, frp: f64, confidence: u8, tier: SourceTier) -> Self {
        FireHotspot {
            id,
            position,
            frp,
            brightness: None,
            intensity: None,
            confidence,
            source_tier: tier,
            impact_score: None,
        }
    }

    /// Check the values that downstream calculations depend on.
    ///
    /// Hotspots that fail this check are dropped at ingestion time.
    pub fn is_well_formed(&self) -> bool {
        self.frp.is_finite()
            && self.frp >= 0.0
            && self.position.lat.is_finite()
            && self.position.lon.is_finite()
            && (-90.0..=90.0).contains(&self.position.lat)
            && (-180.0..=180.0).contains(&self.position.lon)
            && self.confidence <= 100
    }
}
