//! Error types for the orchestra

use crate::task::TaskId;
use arf_model::ModelError;

/// Main orchestra error type
#[derive(Debug, thiserror::Error)]
pub enum OrchestraError {
    /// Model layer failure
    #[error("completion failed: {0}")]
    Completion(#[from] ModelError),

    /// A crew task failed, aborting the crew
    #[error("task {task_id} ({role}) failed: {reason}")]
    TaskFailed {
        /// The failing task
        task_id: TaskId,
        /// Agent role for the task
        role: String,
        /// Failure description
        reason: String,
    },

    /// Agent pool failure
    #[error("agent pool error: {0}")]
    Pool(#[from] PoolError),

    /// Chat export could not be parsed at all
    #[error("unreadable chat export: {0}")]
    ExportParse(String),
}

impl OrchestraError {
    /// Whether retrying the crew can succeed
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Completion(e) => e.is_retryable(),
            Self::Pool(PoolError::PoolExhausted(_)) => true,
            _ => false,
        }
    }
}

/// Agent pool errors
#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    /// Pool at capacity
    #[error("pool exhausted (max: {0})")]
    PoolExhausted(usize),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_exhaustion_is_retryable() {
        let err = OrchestraError::Pool(PoolError::PoolExhausted(8));
        assert!(err.is_retryable());
    }

    #[test]
    fn export_parse_not_retryable() {
        let err = OrchestraError::ExportParse("not json".to_string());
        assert!(!err.is_retryable());
    }
}
