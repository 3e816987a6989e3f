//! System state

use arf_document::{Comment, Question};
use arf_validation::ValidationRequest;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Everything the daemon needs to resume where it left off
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemState {
    /// When the state was last checkpointed
    pub last_checkpoint: DateTime<Utc>,
    /// When the last synthesis cycle ran
    pub last_synthesis: DateTime<Utc>,
    /// Export files already processed (absolute paths)
    pub processed_exports: Vec<String>,
    /// Hypotheses waiting for validation
    pub pending_validations: Vec<ValidationRequest>,
    /// Questions queued for the researcher
    pub pending_questions: Vec<Question>,
    /// Comments drained but not yet answered
    pub comment_queue: Vec<Comment>,
    /// Current framework version, e.g. "v1.0"
    pub current_framework_version: String,
    /// Names of experiments currently running
    pub active_experiments: Vec<String>,
}

impl SystemState {
    /// Fresh state for a first run
    #[must_use]
    pub fn initial() -> Self {
        let now = Utc::now();
        Self {
            last_checkpoint: now,
            last_synthesis: now,
            processed_exports: Vec::new(),
            pending_validations: Vec::new(),
            pending_questions: Vec::new(),
            comment_queue: Vec::new(),
            current_framework_version: "v1.0".to_string(),
            active_experiments: Vec::new(),
        }
    }

    /// Whether an export path was already processed
    #[must_use]
    pub fn is_processed(&self, path: &str) -> bool {
        self.processed_exports.iter().any(|p| p == path)
    }

    /// Record an export as processed
    pub fn mark_processed(&mut self, path: impl Into<String>) {
        let path = path.into();
        if !self.is_processed(&path) {
            self.processed_exports.push(path);
        }
    }

    /// Increment the last component of the framework version
    ///
    /// "v1.0" becomes "v1.1"; a malformed tail resets to ".1" rather
    /// than failing the synthesis cycle.
    pub fn bump_framework_version(&mut self) {
        let mut parts: Vec<String> = self
            .current_framework_version
            .split('.')
            .map(String::from)
            .collect();

        match parts.last_mut() {
            Some(last) => {
                let next = last.parse::<u64>().map(|n| n + 1).unwrap_or(1);
                *last = next.to_string();
            }
            None => parts.push("1".to_string()),
        }

        self.current_framework_version = parts.join(".");
    }

    /// Hours elapsed since the last synthesis cycle
    #[must_use]
    pub fn hours_since_synthesis(&self, now: DateTime<Utc>) -> f64 {
        (now - self.last_synthesis).num_seconds() as f64 / 3600.0
    }
}

impl Default for SystemState {
    fn default() -> Self {
        Self::initial()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_state_shape() {
        let state = SystemState::initial();
        assert_eq!(state.current_framework_version, "v1.0");
        assert!(state.processed_exports.is_empty());
        assert!(state.pending_validations.is_empty());
    }

    #[test]
    fn version_bump_increments_tail() {
        let mut state = SystemState::initial();
        state.bump_framework_version();
        assert_eq!(state.current_framework_version, "v1.1");
        state.bump_framework_version();
        assert_eq!(state.current_framework_version, "v1.2");
    }

    #[test]
    fn version_bump_survives_malformed_tail() {
        let mut state = SystemState::initial();
        state.current_framework_version = "v2.beta".to_string();
        state.bump_framework_version();
        assert_eq!(state.current_framework_version, "v2.1");
    }

    #[test]
    fn processed_exports_deduplicated() {
        let mut state = SystemState::initial();
        state.mark_processed("/input/a.json");
        state.mark_processed("/input/a.json");
        assert_eq!(state.processed_exports.len(), 1);
        assert!(state.is_processed("/input/a.json"));
        assert!(!state.is_processed("/input/b.json"));
    }

    #[test]
    fn hours_since_synthesis_counts_up() {
        let mut state = SystemState::initial();
        let now = state.last_synthesis + chrono::Duration::hours(7);
        assert!(state.hours_since_synthesis(now) > 6.0);

        state.last_synthesis = now;
        assert!(state.hours_since_synthesis(now) < 0.1);
    }
}
