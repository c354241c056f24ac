/*!
 * The result of a batch, and the file it is kept in between batches.
 *
 * The snapshot written at the end of one batch is the cached data source for the next batch when
 * the live feed can't be reached.
 */
use crate::{
    attribution::{AttributionResult, AttributionSeverity, SmokeDrift},
    cluster::{ClusterList, FireCluster},
    error::{BurnWatchResult, PipelineError, TierFailure},
    geo::Coord,
    hotspot::{FireHotspot, SourceTier},
};
use chrono::{DateTime, Utc};
use log::info;
use serde::{Deserialize, Serialize, Serializer};
use std::{
    fs::File,
    io::{BufWriter, ErrorKind, Write},
    path::{Path, PathBuf},
};

/// Round `value` to `decimals` places.
pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}

/*-------------------------------------------------------------------------------------------------
 *                      Published precision, only applied when serializing
 *-----------------------------------------------------------------------------------------------*/
pub(crate) fn one_decimal<S: Serializer>(value: &f64, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(round_to(*value, 1))
}

pub(crate) fn two_decimals<S: Serializer>(value: &f64, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(round_to(*value, 2))
}

pub(crate) fn two_decimals_opt<S: Serializer>(
    value: &Option<f64>,
    s: S,
) -> Result<S::Ok, S::Error> {
    match value {
        Some(value) => s.serialize_some(&round_to(*value, 2)),
        None => s.serialize_none(),
    }
}

pub(crate) fn coord_four_decimals<S: Serializer>(coord: &Coord, s: S) -> Result<S::Ok, S::Error> {
    [round_to(coord.lat, 4), round_to(coord.lon, 4)].serialize(s)
}

/// Where and when the hotspots in a snapshot came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    /// When the hotspots were acquired. For cached data this is the time of the original batch.
    pub timestamp: DateTime<Utc>,
    /// The name of the upstream feed.
    pub source: String,
    /// Which tier provided the hotspots.
    pub status: SourceTier,
}

/// The attribution figures as they are published.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributionSummary {
    #[serde(serialize_with = "one_decimal")]
    pub stubble_percentage: f64,
    pub severity: AttributionSeverity,
    pub total_fire_count: usize,
    #[serde(default, serialize_with = "two_decimals")]
    pub total_impact: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub smoke_drift: Option<SmokeDrift>,
}

/**
 * Everything computed for one batch of hotspots.
 */
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchSnapshot {
    pub metadata: Metadata,
    /// Every hotspot in the batch, in ingestion order.
    pub all_fires: Vec<FireHotspot>,
    /// The highest impact hotspots, highest first.
    pub impactful_fires: Vec<FireHotspot>,
    /// The most powerful clusters, most powerful first.
    pub clusters: Vec<FireCluster>,
    pub attribution: AttributionSummary,
}

impl BatchSnapshot {
    /// Put together the results of the stages of a batch.
    pub fn assemble(
        metadata: Metadata,
        hotspots: Vec<FireHotspot>,
        clusters: ClusterList,
        attribution: AttributionResult,
    ) -> Self {
        let AttributionResult {
            total_impact,
            stubble_percentage,
            severity,
            top_impactful,
            total_fire_count,
            smoke_drift,
        } = attribution;

        BatchSnapshot {
            metadata,
            all_fires: hotspots,
            impactful_fires: top_impactful,
            clusters: clusters.into_vec(),
            attribution: AttributionSummary {
                stubble_percentage,
                severity,
                total_fire_count,
                total_impact,
                smoke_drift: Some(smoke_drift),
            },
        }
    }
}

/// The file the latest snapshot is kept in.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    /// Keep snapshots at `path`.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        SnapshotStore {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Get the path of the snapshot file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the most recent snapshot.
    pub fn load(&self) -> Result<BatchSnapshot, TierFailure> {
        let text = std::fs::read_to_string(&self.path).map_err(|err| {
            if err.kind() == ErrorKind::NotFound {
                TierFailure::CacheMissing(self.path.clone())
            } else {
                TierFailure::CacheRead {
                    path: self.path.clone(),
                    source: err,
                }
            }
        })?;

        serde_json::from_str(&text).map_err(|err| TierFailure::CacheCorrupt {
            path: self.path.clone(),
            source: err,
        })
    }

    /// Replace the stored snapshot.
    ///
    /// The snapshot is written to a temporary file next to the target and then moved into place,
    /// so a reader never sees a half written file.
    pub fn save(&self, snapshot: &BatchSnapshot) -> BurnWatchResult<()> {
        let persist_err = |err| PipelineError::Persist {
            path: self.path.clone(),
            source: err,
        };

        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(persist_err)?;
        }

        let tmp_path = self.path.with_extension("json.tmp");
        let mut out = BufWriter::new(File::create(&tmp_path).map_err(persist_err)?);
        serde_json::to_writer_pretty(&mut out, snapshot)?;
        out.flush().map_err(persist_err)?;
        drop(out);

        std::fs::rename(&tmp_path, &self.path).map_err(persist_err)?;

        info!(
            "Saved {} snapshot with {} hotspots to {}",
            snapshot.metadata.status,
            snapshot.all_fires.len(),
            self.path.display()
        );

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        attribution::{DEFAULT_MAX_IMPACTFUL, DEFAULT_TARGET},
        cluster::DEFAULT_RADIUS_KM,
        geo::Coord,
    };

    fn sample_snapshot() -> BatchSnapshot {
        let mut hotspots = vec![
            FireHotspot::new(0, Coord::new(30.0, 75.0), 10.0, 80, SourceTier::Live),
            FireHotspot::new(1, Coord::new(30.0, 75.0), 20.0, 90, SourceTier::Live),
            FireHotspot::new(2, Coord::new(31.0, 74.0), 60.0, 75, SourceTier::Live),
        ];

        let clusters = ClusterList::from_hotspots(&hotspots, DEFAULT_RADIUS_KM);
        let attribution =
            AttributionResult::assess(&mut hotspots, DEFAULT_TARGET, DEFAULT_MAX_IMPACTFUL);

        let metadata = Metadata {
            timestamp: Utc::now(),
            source: "NASA-MODIS".to_owned(),
            status: SourceTier::Live,
        };

        BatchSnapshot::assemble(metadata, hotspots, clusters, attribution)
    }

    #[test]
    fn test_assemble() {
        let snapshot = sample_snapshot();

        assert_eq!(snapshot.all_fires.len(), 3);
        assert_eq!(snapshot.impactful_fires.len(), 3);
        assert_eq!(snapshot.clusters.len(), 2);
        assert_eq!(snapshot.clusters[0].total_frp, 60.0);
        assert_eq!(snapshot.attribution.total_fire_count, 3);
        assert!(snapshot.all_fires.iter().all(|f| f.impact_score.is_some()));
    }

    #[test]
    fn test_json_field_names() {
        let snapshot = sample_snapshot();
        let value = serde_json::to_value(&snapshot).unwrap();

        assert_eq!(value["metadata"]["status"], "Live");
        assert_eq!(value["metadata"]["source"], "NASA-MODIS");
        assert!(value["all_fires"].is_array());
        assert!(value["impactful_fires"].is_array());
        assert!(value["clusters"][0]["center"].is_array());
        assert!(value["clusters"][0]["total_frp"].is_number());
        assert!(value["attribution"]["stubble_percentage"].is_number());
        assert_eq!(value["attribution"]["total_fire_count"], 3);
        assert!(value["attribution"]["severity"].is_string());
    }

    #[test]
    fn test_published_precision() {
        let mut snapshot = sample_snapshot();
        snapshot.all_fires[0].impact_score = Some(0.123456);
        snapshot.clusters[0].center = Coord::new(30.123456, 74.987654);
        snapshot.clusters[0].total_frp = 60.04;
        snapshot.attribution.stubble_percentage = 5.5555;
        snapshot.attribution.total_impact = 27.7777;

        let value = serde_json::to_value(&snapshot).unwrap();

        assert_eq!(value["all_fires"][0]["impact_score"], 0.12);
        assert_eq!(value["clusters"][0]["center"][0], 30.1235);
        assert_eq!(value["clusters"][0]["center"][1], 74.9877);
        assert_eq!(value["clusters"][0]["total_frp"], 60.0);
        assert_eq!(value["attribution"]["stubble_percentage"], 5.6);
        assert_eq!(value["attribution"]["total_impact"], 27.78);

        // Only the published copy is rounded.
        assert_eq!(snapshot.attribution.stubble_percentage, 5.5555);
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(12.345678, 4), 12.3457);
        assert_eq!(round_to(150.04, 1), 150.0);
        assert_eq!(round_to(-3.14159, 2), -3.14);
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path().join("nested").join("fire_data.json"));

        let snapshot = sample_snapshot();
        store.save(&snapshot).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded.metadata, snapshot.metadata);
        assert_eq!(loaded.all_fires.len(), snapshot.all_fires.len());
        assert_eq!(loaded.clusters.len(), snapshot.clusters.len());

        // No temporary file left behind.
        assert!(!store.path().with_extension("json.tmp").exists());
    }

    #[test]
    fn test_missing_and_corrupt_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path().join("fire_data.json"));

        assert!(matches!(store.load(), Err(TierFailure::CacheMissing(_))));

        std::fs::write(store.path(), "{ not json").unwrap();
        assert!(matches!(store.load(), Err(TierFailure::CacheCorrupt { .. })));
    }
}
