use burnwatch::SnapshotArchive;
use clap::Parser;
use log::LevelFilter;
use simple_logger::SimpleLogger;
use std::{error::Error, path::PathBuf};

///
/// Show the most recent batches in the archive.
///
#[derive(Debug, Parser)]
#[clap(bin_name = "showbatches")]
#[clap(author, version, about)]
struct ShowBatchesOptions {
    /// The path to the archive database.
    ///
    /// If this is not specified, then the program will check for it in the "BURNWATCH_ARCHIVE"
    /// environment variable.
    #[clap(short, long)]
    #[clap(env = "BURNWATCH_ARCHIVE")]
    archive_file: PathBuf,

    /// How many batches to show.
    #[clap(short, long)]
    #[clap(default_value_t = 10)]
    num: usize,
}

fn main() -> Result<(), Box<dyn Error>> {
    SimpleLogger::new().with_level(LevelFilter::Warn).init()?;

    let ShowBatchesOptions { archive_file, num } = ShowBatchesOptions::parse();

    if !archive_file.exists() {
        return Err(format!("No archive at {}", archive_file.display()).into());
    }

    let archive = SnapshotArchive::connect(&archive_file)?;
    let batches = archive.recent(num)?;

    if batches.is_empty() {
        log::warn!("The archive is empty.");
    }

    for batch in batches {
        println!("{}\n", batch);
    }

    Ok(())
}
