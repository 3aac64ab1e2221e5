use std::path::PathBuf;

use thiserror::Error;

/// Failures that make a threat database unusable
///
/// Row-level problems are never reported here; they are recorded as
/// [`LoadWarning`](super::index::LoadWarning)s and the row is skipped.
#[derive(Debug, Error)]
pub enum DatabaseLoadError {
    #[error("Failed to read threat database {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Threat database {source_name} contains no valid rows")]
    NoRows { source_name: String },

    #[error("Unknown threat '{name}': no {name}.csv in {dir}")]
    UnknownThreat { name: String, dir: PathBuf },

    #[error("No threat files (*.csv) found in {dir}")]
    EmptyDirectory { dir: PathBuf },
}

impl DatabaseLoadError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
