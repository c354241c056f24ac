//! Reuse the hotspots from the last snapshot that was saved.

use crate::{
    error::TierFailure,
    hotspot::{FireHotspot, SourceTier},
    snapshot::SnapshotStore,
};
use chrono::{DateTime, Utc};
use log::debug;

/**
 * Load the hotspots from the previous batch.
 *
 * Measured hotspots are marked as cached, simulated ones stay marked as simulated, and old impact
 * scores are cleared. Any that are not well formed (e.g. from a hand edited file) are dropped.
 *
 * #Returns
 * The hotspots and the time they were originally acquired.
 */
pub fn load(store: &SnapshotStore) -> Result<(Vec<FireHotspot>, DateTime<Utc>), TierFailure> {
    let snapshot = store.load()?;
    let timestamp = snapshot.metadata.timestamp;

    let stored = snapshot.all_fires.len();
    let hotspots: Vec<FireHotspot> = snapshot
        .all_fires
        .into_iter()
        .filter(FireHotspot::is_well_formed)
        .map(|mut hotspot| {
            if hotspot.source_tier != SourceTier::Simulated {
                hotspot.source_tier = SourceTier::Cached;
            }
            hotspot.impact_score = None;
            hotspot
        })
        .collect();

    debug!(
        "Loaded {} of {} hotspots from {}",
        hotspots.len(),
        stored,
        store.path().display()
    );

    Ok((hotspots, timestamp))
}
