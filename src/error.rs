use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ActivityError {
    #[error("failed to read file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unknown format for input file: {0}")]
    UnknownFormat(String),

    #[error("failed to parse FIT data: {0}")]
    FitDecode(String),

    /// The FIT payload decoded but does not describe an activity.
    #[error("failed to get activity from fit file")]
    MissingActivity,

    #[error("failed to parse GPX data: {0}")]
    GpxDecode(String),

    #[error("failed to parse TCX data: {0}")]
    TcxDecode(String),
}
