//! ARF State Persistence
//!
//! Checkpointed system state so the daemon can be stopped and resumed
//! at any point. Checkpoints are JSON, written atomically; a crash
//! mid-save never corrupts the previous checkpoint.

#![warn(unreachable_pub)]

pub mod checkpoint;
pub mod state;

pub use checkpoint::{CheckpointStore, StateError};
pub use state::SystemState;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
