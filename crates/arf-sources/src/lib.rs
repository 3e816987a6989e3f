//! ARF External Sources
//!
//! Bridge between external knowledge and the framework:
//! - classifies referenced URLs (YouTube, arXiv, other)
//! - fetches transcripts and paper abstracts
//! - caches fetches so repeated cycles cost one network round trip

#![warn(unreachable_pub)]

pub mod classify;
pub mod error;
pub mod fetch;

pub use classify::SourceKind;
pub use error::SourceError;
pub use fetch::{FetchedSource, SourceFetcher};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
