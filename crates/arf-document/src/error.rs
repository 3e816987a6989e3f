//! Error types for the document layer

use std::path::PathBuf;

/// Errors reading or writing document files
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    /// Filesystem failure
    #[error("io error at {path}: {source}")]
    Io {
        /// The file involved
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// comments.json / references.json malformed
    #[error("malformed store {path}: {reason}")]
    MalformedStore {
        /// The file involved
        path: PathBuf,
        /// Parse failure description
        reason: String,
    },
}

impl DocumentError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
