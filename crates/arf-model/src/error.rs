//! Error types for the model layer

/// Errors from routing and completion
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// No configured model can take the request
    #[error("no model available (all providers missing keys or over limits)")]
    NoModelAvailable,

    /// Transport-level failure
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Provider returned a rate-limit response
    #[error("model {model} rate limited")]
    RateLimited {
        /// Model that refused the request
        model: String,
    },

    /// Provider returned a non-success status
    #[error("provider error {status}: {body}")]
    Provider {
        /// HTTP status code
        status: u16,
        /// Response body (truncated)
        body: String,
    },

    /// Provider response had no usable content
    #[error("empty completion from {model}")]
    EmptyCompletion {
        /// Model that answered
        model: String,
    },

    /// Ledger load/save failure
    #[error("usage ledger error: {0}")]
    Ledger(String),
}

impl ModelError {
    /// Whether retrying the same request can succeed
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::RateLimited { .. } => true,
            Self::Provider { status, .. } => *status >= 500,
            _ => false,
        }
    }
}
