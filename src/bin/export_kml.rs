use burnwatch::{pipeline::DEFAULT_SNAPSHOT_FILE, SnapshotStore};
use clap::Parser;
use log::{info, LevelFilter};
use simple_logger::SimpleLogger;
use std::{
    error::Error,
    fmt::{self, Display},
    path::PathBuf,
};

/*-------------------------------------------------------------------------------------------------
 *                                     Command Line Options
 *-----------------------------------------------------------------------------------------------*/

///
/// Export the latest batch into a KML file.
///
/// The clusters and every hotspot of the batch in the snapshot file are written out as placemarks.
///
#[derive(Debug, Parser)]
#[clap(bin_name = "export_kml")]
#[clap(author, version, about)]
struct ExportKmlOptionsInit {
    /// The path to the snapshot file.
    ///
    /// If this is not specified, then the program will check for it in the "BURNWATCH_SNAPSHOT"
    /// environment variable.
    #[clap(short, long)]
    #[clap(env = "BURNWATCH_SNAPSHOT")]
    #[clap(default_value = DEFAULT_SNAPSHOT_FILE)]
    snapshot_file: PathBuf,

    /// The path to a KML file to produce from this run.
    ///
    /// If this is not specified, then the program will create one automatically by replacing the
    /// file extension on the snapshot_file with "*.kml".
    #[clap(short, long)]
    kml_file: Option<PathBuf>,

    /// Verbose output
    #[clap(short, long)]
    verbose: bool,
}

#[derive(Debug)]
struct ExportKmlOptionsChecked {
    /// The path to the snapshot file.
    snapshot_file: PathBuf,

    /// The path to a KML file to produce from this run.
    kml_file: PathBuf,

    /// Verbose output
    verbose: bool,
}

impl Display for ExportKmlOptionsChecked {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        writeln!(f, "\n")?; // yes, two blank lines.
        writeln!(f, "    Snapshot: {}", self.snapshot_file.display())?;
        writeln!(f, "  Output KML: {}", self.kml_file.display())?;
        writeln!(f, "\n")?; // yes, two blank lines.

        Ok(())
    }
}

/// Get the command line arguments and check them.
fn parse_args() -> ExportKmlOptionsChecked {
    let ExportKmlOptionsInit {
        snapshot_file,
        kml_file,
        verbose,
    } = ExportKmlOptionsInit::parse();

    let kml_file = match kml_file {
        Some(v) => v,
        None => {
            let mut clone = snapshot_file.clone();
            clone.set_extension("kml");
            clone
        }
    };

    let checked = ExportKmlOptionsChecked {
        snapshot_file,
        kml_file,
        verbose,
    };

    if verbose {
        info!("{}", checked);
    }

    checked
}

/*-------------------------------------------------------------------------------------------------
 *                                             MAIN
 *-----------------------------------------------------------------------------------------------*/
fn main() -> Result<(), Box<dyn Error>> {
    SimpleLogger::new().with_level(LevelFilter::Info).init()?;

    let opts = parse_args();

    let snapshot = SnapshotStore::new(&opts.snapshot_file).load()?;

    if opts.verbose {
        info!(
            "Loaded {} batch from {} with {} fires and {} clusters.",
            snapshot.metadata.status,
            snapshot.metadata.timestamp,
            snapshot.all_fires.len(),
            snapshot.clusters.len()
        );
    }

    snapshot.save_kml(&opts.kml_file)?;

    info!("Wrote {}", opts.kml_file.display());

    Ok(())
}
