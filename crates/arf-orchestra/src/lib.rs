//! ARF Agent Orchestra
//!
//! Coordinates the LLM-driven roles that turn raw conversations into
//! framework content:
//! - Agent profiles (role, goal, backstory) for each pipeline stage
//! - Sequential crews that thread each task's output into the next
//! - A bounded agent pool for reuse and concurrency limits
//! - Chat export parsing and the export/synthesis/comment pipelines
//!
//! # Example
//!
//! ```rust,ignore
//! use arf_orchestra::{pipelines::ExportPipeline, ChatExport};
//!
//! # async fn example(completer: &dyn arf_model::Completer) {
//! let export = ChatExport::from_json_str(raw).unwrap();
//! let pipeline = ExportPipeline::new(Default::default());
//! let report = pipeline.run(&export, completer).await.unwrap();
//! println!("{} concepts, {} hypotheses", report.concepts.len(), report.hypotheses.len());
//! # }
//! ```

#![warn(unreachable_pub)]

pub mod agent;
pub mod crew;
pub mod error;
pub mod export;
pub mod pipelines;
pub mod pool;
pub mod task;

pub use agent::{Agent, AgentRole};
pub use crew::{Crew, CrewProcess, CrewReport};
pub use error::{OrchestraError, PoolError};
pub use export::{ChatExport, ChatMessage};
pub use pipelines::{ExportPipeline, PipelineReport};
pub use pool::{AgentPool, PoolStats};
pub use task::{TaskId, TaskOutput, TaskSpec};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
