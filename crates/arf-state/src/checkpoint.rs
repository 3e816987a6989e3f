//! Checkpoint store
//!
//! A save stamps `last_checkpoint` and writes through a temp file plus
//! rename, so the previous checkpoint survives a crash mid-write.

use crate::state::SystemState;
use chrono::Utc;
use std::path::{Path, PathBuf};

/// Errors persisting state
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    /// Filesystem failure
    #[error("io error at {path}: {source}")]
    Io {
        /// The file involved
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Checkpoint could not be serialized
    #[error("serialize failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Loads and saves the system state checkpoint
#[derive(Debug, Clone)]
pub struct CheckpointStore {
    path: PathBuf,
}

impl CheckpointStore {
    /// Create a store writing to the given file
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Checkpoint file path
    #[inline]
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the previous checkpoint, or start fresh
    ///
    /// A corrupt checkpoint is logged and replaced with initial state
    /// rather than refusing to start.
    #[must_use]
    pub fn load_or_init(&self) -> SystemState {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) => match serde_json::from_str::<SystemState>(&raw) {
                Ok(state) => {
                    tracing::info!(
                        checkpoint = %state.last_checkpoint,
                        version = %state.current_framework_version,
                        "resuming from checkpoint"
                    );
                    state
                }
                Err(e) => {
                    tracing::warn!("checkpoint corrupt, starting fresh: {}", e);
                    SystemState::initial()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => SystemState::initial(),
            Err(e) => {
                tracing::warn!("checkpoint unreadable, starting fresh: {}", e);
                SystemState::initial()
            }
        }
    }

    /// Persist the state, stamping the checkpoint time
    pub fn save(&self, state: &mut SystemState) -> Result<(), StateError> {
        state.last_checkpoint = Utc::now();

        let json = serde_json::to_string_pretty(state)?;

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| StateError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json).map_err(|e| StateError::Io {
            path: tmp.clone(),
            source: e,
        })?;
        std::fs::rename(&tmp, &self.path).map_err(|e| StateError::Io {
            path: self.path.clone(),
            source: e,
        })?;

        tracing::debug!(path = %self.path.display(), "state checkpointed");
        Ok(())
    }
}
