//! ARF System - daemon assembly
//!
//! Wires the subsystems together:
//! - configuration (`config.yaml` with env-resolved API keys)
//! - the cycle loop with adaptive sleep and graceful shutdown
//! - the localhost dashboard
//!
//! The `arf` binary drives this crate; see `main.rs` for the CLI.

#![warn(unreachable_pub)]

pub mod config;
pub mod server;
pub mod system;

pub use config::{ArfConfig, ConfigError};
pub use server::AppState;
pub use system::{ArfSystem, CycleSummary, SystemError};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
