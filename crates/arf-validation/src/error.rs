//! Error types for the validation engine

use std::path::PathBuf;

/// Errors running validation experiments
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    /// Filesystem failure
    #[error("io error at {path}: {source}")]
    Io {
        /// The file involved
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Interpreter could not be started
    #[error("failed to spawn {interpreter}: {source}")]
    Spawn {
        /// Configured interpreter
        interpreter: String,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Dataset download failed
    #[error("dataset fetch failed for {url}: {source}")]
    Fetch {
        /// Dataset URL
        url: String,
        /// Underlying error
        #[source]
        source: reqwest::Error,
    },

    /// Dataset source not supported
    #[error("unsupported dataset source: {0}")]
    UnsupportedSource(String),
}

impl ValidationError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
