//! ARF Document Manager
//!
//! Owns everything under `output/`:
//! - `framework.tex`, the growing LaTeX research document
//! - technical appendices for validation runs
//! - the markdown technical summary and open-questions file
//! - user comments (inline `%% COMMENT:` markers and dashboard posts)
//! - the processed-references ledger

#![warn(unreachable_pub)]

pub mod comment;
pub mod error;
pub mod latex;
pub mod manager;

pub use comment::{Comment, CommentSource, CommentStatus};
pub use error::DocumentError;
pub use latex::AppendixRef;
pub use manager::{DocumentManager, Question};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
