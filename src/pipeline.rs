/*!
 * Run a batch from start to finish.
 *
 * A [PipelineContext] is built once by the caller and then used for as many batches as it wants.
 * Only one batch may run at a time against a given snapshot file, the caller is responsible for
 * that.
 */
use crate::{
    attribution::{AttributionResult, DEFAULT_MAX_IMPACTFUL, DEFAULT_TARGET},
    cluster::{ClusterList, DEFAULT_MAX_CLUSTERS, DEFAULT_RADIUS_KM},
    error::{BurnWatchResult, PipelineError},
    geo::{BoundingBox, Coord},
    snapshot::{BatchSnapshot, Metadata, SnapshotStore},
    source::{
        self, cache,
        live::{self, DEFAULT_FEED_NAME, DEFAULT_FEED_URL, DEFAULT_TIMEOUT},
        simulated::{self, SimulationParams},
        Acquisition, IngestFilter, DEFAULT_MIN_CONFIDENCE, DEFAULT_REGION,
    },
};
use log::info;
use rand::{rngs::StdRng, SeedableRng};
use reqwest::blocking::Client;
use std::{
    fmt::{self, Display},
    path::PathBuf,
    time::Duration,
};

/// Where the snapshot is kept if nothing else is specified.
pub const DEFAULT_SNAPSHOT_FILE: &str = "fire_data.json";

/// Everything that can be tuned about a batch.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// URL of the CSV fire feed.
    pub feed_url: String,
    /// Name of the feed recorded in the snapshot metadata.
    pub feed_name: String,
    /// Only hotspots in this region are used, simulated ones are placed in it.
    pub region: BoundingBox,
    /// Minimum detection confidence in percent.
    pub min_confidence: u8,
    /// How long to wait on the live feed.
    pub timeout: Duration,
    /// Where the snapshot is saved, and loaded from when the feed is down.
    pub snapshot_path: PathBuf,
    /// Linking distance for clustering.
    pub radius_km: f64,
    /// How many clusters to report.
    pub max_clusters: usize,
    /// The city the fires are attributed to.
    pub target: Coord,
    /// How many of the most impactful hotspots to report.
    pub max_impactful: usize,
    pub simulation: SimulationParams,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            feed_url: DEFAULT_FEED_URL.to_owned(),
            feed_name: DEFAULT_FEED_NAME.to_owned(),
            region: DEFAULT_REGION,
            min_confidence: DEFAULT_MIN_CONFIDENCE,
            timeout: DEFAULT_TIMEOUT,
            snapshot_path: PathBuf::from(DEFAULT_SNAPSHOT_FILE),
            radius_km: DEFAULT_RADIUS_KM,
            max_clusters: DEFAULT_MAX_CLUSTERS,
            target: DEFAULT_TARGET,
            max_impactful: DEFAULT_MAX_IMPACTFUL,
            simulation: SimulationParams::default(),
        }
    }
}

impl Display for PipelineConfig {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        writeln!(f, "            Feed: {} ({})", self.feed_name, self.feed_url)?;
        writeln!(f, "          Region: {}", self.region)?;
        writeln!(f, "  Min Confidence: {}%", self.min_confidence)?;
        writeln!(f, "         Timeout: {:?}", self.timeout)?;
        writeln!(f, "        Snapshot: {}", self.snapshot_path.display())?;
        writeln!(f, "  Cluster Radius: {} km", self.radius_km)?;
        writeln!(f, "    Max Clusters: {}", self.max_clusters)?;
        writeln!(f, "          Target: {}", self.target)?;
        write!(f, "   Max Impactful: {}", self.max_impactful)
    }
}

impl PipelineConfig {
    fn ingest_filter(&self) -> IngestFilter {
        IngestFilter {
            region: self.region,
            min_confidence: self.min_confidence,
        }
    }
}

/**
 * The long lived state needed to run batches.
 */
pub struct PipelineContext {
    config: PipelineConfig,
    http: Client,
    store: SnapshotStore,
    rng: StdRng,
}

impl PipelineContext {
    /// Set up to run batches with `config`.
    pub fn new(config: PipelineConfig) -> BurnWatchResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("burnwatch/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(PipelineError::HttpClient)?;

        let store = SnapshotStore::new(&config.snapshot_path);

        let rng = match config.simulation.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Ok(PipelineContext {
            config,
            http,
            store,
            rng,
        })
    }

    /// Get the configuration.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Get the snapshot store.
    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    /// Get the hotspots for a batch from the best available tier.
    pub fn acquire(&mut self) -> BurnWatchResult<Acquisition> {
        let filter = self.config.ingest_filter();
        let PipelineContext {
            config,
            http,
            store,
            rng,
        } = self;

        source::acquire_hotspots(
            || live::fetch(http, &config.feed_url, &filter),
            || cache::load(store),
            || simulated::generate(&config.simulation, &config.region, rng),
        )
        .map_err(PipelineError::AllTiersFailed)
    }

    /**
     * Run one batch: acquire, cluster, attribute, then save the snapshot.
     *
     * #Returns
     * The snapshot that was saved.
     */
    pub fn run(&mut self) -> BurnWatchResult<BatchSnapshot> {
        let Acquisition {
            mut hotspots,
            tier,
            timestamp,
        } = self.acquire()?;

        let clusters = ClusterList::from_hotspots(&hotspots, self.config.radius_km)
            .top(self.config.max_clusters);

        let attribution =
            AttributionResult::assess(&mut hotspots, self.config.target, self.config.max_impactful);

        info!(
            "{} batch: {} fires, {} clusters, {:.1}% attributed ({}).",
            tier,
            hotspots.len(),
            clusters.len(),
            attribution.stubble_percentage,
            attribution.severity
        );

        let metadata = Metadata {
            timestamp,
            source: self.config.feed_name.clone(),
            status: tier,
        };

        let snapshot = BatchSnapshot::assemble(metadata, hotspots, clusters, attribution);
        self.store.save(&snapshot)?;

        Ok(snapshot)
    }
}
