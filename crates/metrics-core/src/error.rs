use std::path::PathBuf;
use thiserror::Error;

use crate::models::Metric;

/// Coarse classification of a [`MetricsError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultKind {
    /// The snapshot directory or a snapshot file could not be read.
    Io,
    /// A snapshot file is not valid JSON or lacks an expected section.
    Parse,
    /// Two snapshot files disagree on the value of the same day.
    Consistency,
    /// A setting is invalid.
    Config,
}

/// All errors produced while aggregating analytics snapshots.
#[derive(Error, Debug)]
pub enum MetricsError {
    /// The snapshot directory does not exist.
    #[error("Data path not found: {0}")]
    DataPathNotFound(PathBuf),

    /// The snapshot path exists but is not a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// The snapshot directory could not be listed.
    #[error("Error listing directory {path}: {source}")]
    DirectoryRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A file could not be opened or read from disk.
    #[error("Unable to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A snapshot file is not a valid snapshot document.
    #[error("Unable to parse file {path}: {source}")]
    SnapshotParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A required series is absent from a snapshot file.
    #[error("No {metric} data in {path}")]
    MissingSeries { path: PathBuf, metric: Metric },

    /// A series has no points, so the day the file represents is unknown.
    #[error("Error empty {metric} in file {path}")]
    EmptySeries { path: PathBuf, metric: Metric },

    /// Two snapshot files recorded different values for the same day.
    #[error(
        "data mismatch on {date} ({metric}): {previous} from before and {found} found in file {path}"
    )]
    Mismatch {
        date: String,
        metric: Metric,
        previous: u64,
        found: u64,
        path: PathBuf,
    },

    /// A JSON document could not be produced.
    #[error("Failed to serialize JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl MetricsError {
    /// Map the error onto its fault class.
    pub fn kind(&self) -> FaultKind {
        match self {
            Self::DataPathNotFound(_)
            | Self::NotADirectory(_)
            | Self::DirectoryRead { .. }
            | Self::FileRead { .. }
            | Self::Io(_) => FaultKind::Io,
            Self::SnapshotParse { .. }
            | Self::MissingSeries { .. }
            | Self::EmptySeries { .. }
            | Self::JsonParse(_) => FaultKind::Parse,
            Self::Mismatch { .. } => FaultKind::Consistency,
            Self::Config(_) => FaultKind::Config,
        }
    }
}

/// Convenience alias used throughout the metrics crates.
pub type Result<T> = std::result::Result<T, MetricsError>;
