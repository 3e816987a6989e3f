//! ARF Philosophy - elegance evaluation
//!
//! The philosophical core of the framework:
//! - Evaluation criteria weights (what makes an idea elegant)
//! - Facet scoring and weighted combination
//! - Concepts mined from conversations
//! - Hypotheses derived from accepted, testable concepts
//!
//! # Example
//!
//! ```rust
//! use arf_philosophy::{EvaluationCriteria, FacetScores};
//!
//! let criteria = EvaluationCriteria::default();
//! let facets = FacetScores::new(0.9, 0.8, 0.85, 0.7);
//! let score = criteria.score(&facets);
//! assert!(score.is_accepted());
//! ```

#![warn(unreachable_pub)]

pub mod concept;
pub mod criteria;

pub use concept::{Concept, ConceptCategory, ConceptId, Hypothesis, HypothesisId};
pub use criteria::{
    CriteriaError, EleganceScore, EvaluationCriteria, FacetScores, ACCEPTANCE_THRESHOLD,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
