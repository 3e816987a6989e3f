//! ARF Model Manager
//!
//! Hybrid model access with usage governance:
//! - Ordered model table (configuration order is priority order)
//! - Daily token and requests-per-minute limits per model
//! - OpenAI-compatible API providers with local Ollama fallback
//! - Usage ledger persisted across restarts
//!
//! Agents talk to models through the [`Completer`] trait so the
//! pipeline can run against a scripted completer in tests.

#![warn(unreachable_pub)]

pub mod client;
pub mod config;
pub mod error;
pub mod ledger;
pub mod router;

pub use client::{CompletionRequest, CompletionResponse};
pub use config::{ModelConfig, ProviderKind};
pub use error::ModelError;
pub use ledger::UsageLedger;
pub use router::{Completer, ModelRouter};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
