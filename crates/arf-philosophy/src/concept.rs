//! Concepts and hypotheses
//!
//! A concept is a mathematical idea mined from a conversation. Accepted
//! concepts that are testable become hypotheses and enter the
//! validation queue.

use crate::criteria::{EleganceScore, FacetScores};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Unique concept identifier (ULID for sortability)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ConceptId(pub Ulid);

impl ConceptId {
    /// Generate new concept ID
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for ConceptId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConceptId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique hypothesis identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct HypothesisId(pub Ulid);

impl HypothesisId {
    /// Generate new hypothesis ID
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for HypothesisId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for HypothesisId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What kind of idea a concept is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConceptCategory {
    /// A novel definition
    Definition,
    /// A testable claim
    Hypothesis,
    /// A claim believed true but not yet testable
    Conjecture,
    /// A method or construction
    Technique,
    /// A link between previously separate ideas
    Connection,
}

/// A mathematical idea extracted from a conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Concept {
    /// Concept identifier
    pub id: ConceptId,
    /// Short title
    pub title: String,
    /// Full statement of the idea
    pub statement: String,
    /// Category
    pub category: ConceptCategory,
    /// Per-criterion ratings
    pub facets: FacetScores,
    /// Combined elegance score
    pub score: EleganceScore,
    /// Whether the idea admits a computational test
    pub testable: bool,
}

impl Concept {
    /// Create a new concept
    #[must_use]
    pub fn new(
        title: impl Into<String>,
        statement: impl Into<String>,
        category: ConceptCategory,
        facets: FacetScores,
        score: EleganceScore,
    ) -> Self {
        Self {
            id: ConceptId::new(),
            title: title.into(),
            statement: statement.into(),
            category,
            facets,
            score,
            testable: false,
        }
    }

    /// Mark as testable
    #[inline]
    #[must_use]
    pub fn testable(mut self) -> Self {
        self.testable = true;
        self
    }

    /// Derive a hypothesis, if this concept is accepted and testable
    #[must_use]
    pub fn derive_hypothesis(&self) -> Option<Hypothesis> {
        if self.score.is_accepted() && self.testable {
            Some(Hypothesis {
                id: HypothesisId::new(),
                statement: self.statement.clone(),
                concept_id: self.id,
                proposed_at: Utc::now(),
            })
        } else {
            None
        }
    }
}

/// A testable claim queued for computational validation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hypothesis {
    /// Hypothesis identifier
    pub id: HypothesisId,
    /// The claim to test
    pub statement: String,
    /// Concept this was derived from
    pub concept_id: ConceptId,
    /// When it entered the queue
    pub proposed_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::criteria::EvaluationCriteria;

    fn scored_concept(facets: FacetScores) -> Concept {
        let criteria = EvaluationCriteria::default();
        let score = criteria.score(&facets);
        Concept::new(
            "Spectral pairing",
            "Eigenvalue gaps pair under the involution",
            ConceptCategory::Hypothesis,
            facets,
            score,
        )
    }

    #[test]
    fn concept_ids_unique() {
        assert_ne!(ConceptId::new(), ConceptId::new());
    }

    #[test]
    fn accepted_testable_concept_yields_hypothesis() {
        let concept = scored_concept(FacetScores::new(0.9, 0.8, 0.85, 0.7)).testable();

        let hypothesis = concept.derive_hypothesis().unwrap();
        assert_eq!(hypothesis.concept_id, concept.id);
        assert_eq!(hypothesis.statement, concept.statement);
    }

    #[test]
    fn rejected_concept_yields_none() {
        let concept = scored_concept(FacetScores::new(0.4, 0.4, 0.4, 0.4)).testable();
        assert!(concept.derive_hypothesis().is_none());
    }

    #[test]
    fn untestable_concept_yields_none() {
        let concept = scored_concept(FacetScores::new(0.9, 0.9, 0.9, 0.9));
        assert!(concept.derive_hypothesis().is_none());
    }

    #[test]
    fn concept_serde_round_trip() {
        let concept = scored_concept(FacetScores::new(0.9, 0.8, 0.85, 0.7)).testable();
        let json = serde_json::to_string(&concept).unwrap();
        let back: Concept = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, concept.id);
        assert_eq!(back.category, concept.category);
        assert!(back.testable);
    }
}
