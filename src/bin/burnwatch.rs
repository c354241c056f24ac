use burnwatch::{
    attribution::{DEFAULT_MAX_IMPACTFUL, DEFAULT_TARGET},
    cluster::{DEFAULT_MAX_CLUSTERS, DEFAULT_RADIUS_KM},
    pipeline::DEFAULT_SNAPSHOT_FILE,
    source::{
        live::{DEFAULT_FEED_NAME, DEFAULT_FEED_URL},
        DEFAULT_MIN_CONFIDENCE, DEFAULT_REGION,
    },
    BoundingBox, Coord, PipelineConfig, PipelineContext, SimulationParams, SnapshotArchive,
};
use clap::Parser;
use log::{info, LevelFilter};
use simple_logger::SimpleLogger;
use std::{
    error::Error,
    fmt::{self, Display},
    path::PathBuf,
    time::Duration,
};

/*-------------------------------------------------------------------------------------------------
 *                                     Command Line Options
 *-----------------------------------------------------------------------------------------------*/

///
/// Run a batch of fire analysis.
///
/// This program gets the latest fire hotspots, falling back to the last snapshot or a simulation
/// if the feed is unavailable, clusters them, estimates their contribution to the pollution in the
/// target city, and saves the result as a JSON snapshot.
///
#[derive(Debug, Parser)]
#[clap(bin_name = "burnwatch")]
#[clap(author, version, about)]
struct BurnWatchOptionsInit {
    /// The URL of the CSV fire feed.
    #[clap(short, long)]
    #[clap(env = "BURNWATCH_FEED_URL")]
    #[clap(default_value = DEFAULT_FEED_URL)]
    feed_url: String,

    /// The name of the feed recorded in the snapshot.
    #[clap(long)]
    #[clap(default_value = DEFAULT_FEED_NAME)]
    feed_name: String,

    /// The path to the snapshot file.
    ///
    /// The new snapshot is written here, and if the feed is unavailable the previous one is read
    /// from here.
    #[clap(short, long)]
    #[clap(env = "BURNWATCH_SNAPSHOT")]
    #[clap(default_value = DEFAULT_SNAPSHOT_FILE)]
    snapshot_file: PathBuf,

    /// The path to a database to archive every batch in.
    ///
    /// If this is not specified, then the program will check for it in the "BURNWATCH_ARCHIVE"
    /// environment variable. If neither is set, nothing is archived.
    #[clap(short, long)]
    #[clap(env = "BURNWATCH_ARCHIVE")]
    archive_file: Option<PathBuf>,

    /// The path to a KML file to produce from this run.
    #[clap(short, long)]
    kml_file: Option<PathBuf>,

    /// Bounding Box where as bottom_lat,left_lon,top_lat,right_lon
    #[clap(long)]
    #[clap(default_value_t = DEFAULT_REGION)]
    region: BoundingBox,

    /// The minimum detection confidence in percent.
    #[clap(long)]
    #[clap(default_value_t = DEFAULT_MIN_CONFIDENCE)]
    min_confidence: u8,

    /// How long to wait on the feed in seconds.
    #[clap(long)]
    #[clap(default_value_t = 10)]
    timeout: u64,

    /// The distance in km within which hotspots are linked into a cluster.
    #[clap(long)]
    #[clap(default_value_t = DEFAULT_RADIUS_KM)]
    radius: f64,

    /// How many clusters to report.
    #[clap(long)]
    #[clap(default_value_t = DEFAULT_MAX_CLUSTERS)]
    max_clusters: usize,

    /// The location of the target city as lat,lon
    #[clap(long)]
    #[clap(default_value_t = DEFAULT_TARGET)]
    target: Coord,

    /// Seed for simulated data, so a run can be repeated.
    #[clap(long)]
    seed: Option<u64>,

    /// Print the snapshot to standard output.
    #[clap(short, long)]
    print: bool,

    /// Verbose output
    #[clap(short, long)]
    verbose: bool,
}

#[derive(Debug)]
struct BurnWatchOptionsChecked {
    /// Everything needed to run the batch.
    config: PipelineConfig,

    /// The path to the archive database.
    archive_file: Option<PathBuf>,

    /// The path to a KML file to produce from this run.
    kml_file: Option<PathBuf>,

    /// Print the snapshot.
    print: bool,

    /// Verbose output
    verbose: bool,
}

impl Display for BurnWatchOptionsChecked {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        writeln!(f, "\n")?; // yes, two blank lines.
        writeln!(f, "{}", self.config)?;
        if let Some(archive_file) = &self.archive_file {
            writeln!(f, "         Archive: {}", archive_file.display())?;
        }
        if let Some(kml_file) = &self.kml_file {
            writeln!(f, "      Output KML: {}", kml_file.display())?;
        }
        writeln!(f, "\n")?; // yes, two blank lines.

        Ok(())
    }
}

/// Get the command line arguments and check them.
///
/// If there is missing data, try to fill it in with environment variables.
fn parse_args() -> Result<BurnWatchOptionsChecked, Box<dyn Error>> {
    let BurnWatchOptionsInit {
        feed_url,
        feed_name,
        snapshot_file,
        archive_file,
        kml_file,
        region,
        min_confidence,
        timeout,
        radius,
        max_clusters,
        target,
        seed,
        print,
        verbose,
    } = BurnWatchOptionsInit::parse();

    if min_confidence > 100 {
        return Err(format!("Minimum confidence must be a percentage: {}", min_confidence).into());
    }

    if !(radius > 0.0) {
        return Err(format!("Cluster radius must be positive: {}", radius).into());
    }

    let config = PipelineConfig {
        feed_url,
        feed_name,
        region,
        min_confidence,
        timeout: Duration::from_secs(timeout),
        snapshot_path: snapshot_file,
        radius_km: radius,
        max_clusters,
        target,
        max_impactful: DEFAULT_MAX_IMPACTFUL,
        simulation: SimulationParams {
            seed,
            ..SimulationParams::default()
        },
    };

    Ok(BurnWatchOptionsChecked {
        config,
        archive_file,
        kml_file,
        print,
        verbose,
    })
}

/*-------------------------------------------------------------------------------------------------
 *                                             MAIN
 *-----------------------------------------------------------------------------------------------*/
fn main() -> Result<(), Box<dyn Error>> {
    let opts = parse_args()?;

    let level = if opts.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    SimpleLogger::new().with_level(level).init()?;

    if opts.verbose {
        info!("{}", opts);
    }

    let BurnWatchOptionsChecked {
        config,
        archive_file,
        kml_file,
        print,
        ..
    } = opts;

    let mut ctx = PipelineContext::new(config)?;
    let snapshot = ctx.run()?;

    info!(
        "Saved {} batch to {}",
        snapshot.metadata.status,
        ctx.store().path().display()
    );

    if let Some(archive_file) = archive_file {
        let mut archive = SnapshotArchive::connect(&archive_file)?;
        let batch_id = archive.add(&snapshot)?;
        info!("Archived as batch {} in {}", batch_id, archive_file.display());
    }

    if let Some(kml_file) = kml_file {
        snapshot.save_kml(&kml_file)?;
        info!("Wrote {}", kml_file.display());
    }

    if print {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    }

    Ok(())
}
