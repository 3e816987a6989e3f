//! Error types for source ingestion

/// Errors fetching external sources
#[derive(Debug, thiserror::Error, Clone)]
pub enum SourceError {
    /// Transport-level failure
    #[error("transport error fetching {url}: {reason}")]
    Transport {
        /// Source URL
        url: String,
        /// Failure description
        reason: String,
    },

    /// Source responded but with nothing usable
    #[error("no content for {url}")]
    NoContent {
        /// Source URL
        url: String,
    },

    /// URL is not an ingestible source
    #[error("unsupported source: {url}")]
    Unsupported {
        /// Source URL
        url: String,
    },
}
