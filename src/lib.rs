/*!
 * Track crop residue fires from satellite hotspot detections and estimate how much of the air
 * pollution in a downwind city they account for.
 *
 * Each batch gets its hotspots from the best source available (the live feed, the last saved
 * snapshot, or a simulation), groups them into clusters, scores them against the target city, and
 * saves the result as a snapshot for the next batch and for publishing.
 */
pub use archive::{ArchivedBatch, SnapshotArchive};
pub use attribution::{AttributionResult, AttributionSeverity, DriftRisk, SmokeDrift};
pub use cluster::{ClusterList, ClusterSeverity, FireCluster};
pub use error::{BurnWatchResult, PipelineError, TierFailure};
pub use geo::{great_circle_distance, BoundingBox, Coord};
pub use hotspot::{ConfidenceLevel, FireHotspot, SourceTier};
pub use kml::{KmlFile, KmlWriter};
pub use pipeline::{PipelineConfig, PipelineContext};
pub use snapshot::{BatchSnapshot, Metadata, SnapshotStore};
pub use source::{simulated::SimulationParams, Acquisition, IngestFilter};

pub mod attribution;
pub mod cluster;
pub mod geo;
pub mod kml;
pub mod pipeline;
pub mod source;

/**************************************************************************************************
 * Private Implementation
 *************************************************************************************************/
mod archive;
mod error;
mod hotspot;
mod snapshot;
