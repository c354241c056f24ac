use std::path::PathBuf;
use thiserror::Error;

/// Why a hotspot source tier could not provide data.
///
/// None of these are fatal on their own, they just mean the next tier down should be tried.
#[derive(Debug, Error)]
pub enum TierFailure {
    #[error("feed request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("feed returned HTTP status {0}")]
    Status(u16),

    #[error("feed header is missing the {0} column")]
    MissingColumn(&'static str),

    #[error("feed is not valid CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("no cached snapshot at {}", .0.display())]
    CacheMissing(PathBuf),

    #[error("unable to read cached snapshot {}: {source}", .path.display())]
    CacheRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("cached snapshot {} is corrupt: {source}", .path.display())]
    CacheCorrupt {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("invalid region for simulation: {0}")]
    InvalidRegion(String),
}

/// Errors that stop a batch from completing.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("every hotspot source failed, the last failure was: {0}")]
    AllTiersFailed(TierFailure),

    #[error("unable to build HTTP client: {0}")]
    HttpClient(reqwest::Error),

    #[error("unable to write snapshot {}: {source}", .path.display())]
    Persist {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("unable to serialize snapshot: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("archive error: {0}")]
    Archive(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type used throughout the library.
pub type BurnWatchResult<T> = Result<T, PipelineError>;
