//! ARF Validation Engine
//!
//! Brings hypotheses down to empirical reality:
//! - materializes agent-generated experiment scripts
//! - executes them in a subprocess sandbox with a hard timeout
//! - caches downloaded datasets
//! - cleans up stale sandbox leftovers

#![warn(unreachable_pub)]

pub mod error;
pub mod request;
pub mod sandbox;

pub use error::ValidationError;
pub use request::{ScriptSpec, ValidationId, ValidationOutcome, ValidationRequest};
pub use sandbox::{DatasetSpec, SandboxConfig, ValidationEngine};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
