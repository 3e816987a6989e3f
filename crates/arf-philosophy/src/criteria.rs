//! Evaluation criteria and scoring
//!
//! The weights encode what the framework considers elegant:
//! - Inevitability: does it feel necessary, not arbitrary?
//! - Symmetry: respects fundamental symmetries
//! - Parsimony: Occam's razor, minimal assumptions
//! - Explanatory power: unifies disparate concepts

use serde::{Deserialize, Serialize};

/// A concept whose score strictly exceeds this is accepted.
pub const ACCEPTANCE_THRESHOLD: f64 = 0.75;

/// Tolerance for the weight-sum invariant.
const WEIGHT_SUM_EPSILON: f64 = 1e-3;

/// Errors constructing or validating criteria
#[derive(Debug, thiserror::Error)]
pub enum CriteriaError {
    /// Weights do not sum to 1.0
    #[error("criteria weights must sum to 1.0, got {sum}")]
    WeightSum {
        /// The offending sum
        sum: f64,
    },

    /// A weight is outside [0, 1]
    #[error("weight {name} out of range: {value}")]
    WeightRange {
        /// Weight name
        name: &'static str,
        /// The offending value
        value: f64,
    },
}

/// Elegance criteria weights
///
/// Invariant: the four weights sum to 1.0 (within epsilon). Construct
/// with [`EvaluationCriteria::try_new`] or deserialize and call
/// [`EvaluationCriteria::validate`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvaluationCriteria {
    /// Does it feel necessary, not arbitrary?
    pub inevitability: f64,
    /// Respects fundamental symmetries
    pub symmetry: f64,
    /// Occam's razor, minimal assumptions
    pub parsimony: f64,
    /// Unifies disparate concepts
    pub explanatory_power: f64,
}

impl EvaluationCriteria {
    /// Create criteria, enforcing the weight-sum invariant
    ///
    /// # Errors
    /// - `CriteriaError::WeightRange` if any weight is outside [0, 1]
    /// - `CriteriaError::WeightSum` if the weights do not sum to 1.0
    pub fn try_new(
        inevitability: f64,
        symmetry: f64,
        parsimony: f64,
        explanatory_power: f64,
    ) -> Result<Self, CriteriaError> {
        let criteria = Self {
            inevitability,
            symmetry,
            parsimony,
            explanatory_power,
        };
        criteria.validate()?;
        Ok(criteria)
    }

    /// Validate the weight invariants without consuming
    pub fn validate(&self) -> Result<(), CriteriaError> {
        for (name, value) in [
            ("inevitability", self.inevitability),
            ("symmetry", self.symmetry),
            ("parsimony", self.parsimony),
            ("explanatory_power", self.explanatory_power),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(CriteriaError::WeightRange { name, value });
            }
        }

        let sum = self.sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_EPSILON {
            return Err(CriteriaError::WeightSum { sum });
        }

        Ok(())
    }

    /// Sum of the four weights
    #[inline]
    #[must_use]
    pub fn sum(&self) -> f64 {
        self.inevitability + self.symmetry + self.parsimony + self.explanatory_power
    }

    /// Combine facet ratings into a single elegance score
    #[inline]
    #[must_use]
    pub fn score(&self, facets: &FacetScores) -> EleganceScore {
        EleganceScore(
            facets.inevitability * self.inevitability
                + facets.symmetry * self.symmetry
                + facets.parsimony * self.parsimony
                + facets.explanatory_power * self.explanatory_power,
        )
    }
}

impl Default for EvaluationCriteria {
    fn default() -> Self {
        Self {
            inevitability: 0.30,
            symmetry: 0.25,
            parsimony: 0.25,
            explanatory_power: 0.20,
        }
    }
}

/// Per-criterion ratings for one concept, each in [0, 1]
///
/// Values are clamped on construction, so a score computed from any
/// `FacetScores` stays in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FacetScores {
    /// Inevitability rating
    pub inevitability: f64,
    /// Symmetry rating
    pub symmetry: f64,
    /// Parsimony rating
    pub parsimony: f64,
    /// Explanatory power rating
    pub explanatory_power: f64,
}

impl FacetScores {
    /// Create facet scores, clamping each rating into [0, 1]
    #[inline]
    #[must_use]
    pub fn new(inevitability: f64, symmetry: f64, parsimony: f64, explanatory_power: f64) -> Self {
        Self {
            inevitability: inevitability.clamp(0.0, 1.0),
            symmetry: symmetry.clamp(0.0, 1.0),
            parsimony: parsimony.clamp(0.0, 1.0),
            explanatory_power: explanatory_power.clamp(0.0, 1.0),
        }
    }
}

/// Weighted elegance score in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct EleganceScore(pub f64);

impl EleganceScore {
    /// Whether the score clears the acceptance threshold
    #[inline]
    #[must_use]
    pub fn is_accepted(&self) -> bool {
        self.0 > ACCEPTANCE_THRESHOLD
    }

    /// Raw value
    #[inline]
    #[must_use]
    pub fn value(&self) -> f64 {
        self.0
    }
}

impl std::fmt::Display for EleganceScore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.3}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn default_weights_sum_to_one() {
        let criteria = EvaluationCriteria::default();
        assert!((criteria.sum() - 1.0).abs() < WEIGHT_SUM_EPSILON);
        criteria.validate().unwrap();
    }

    #[test]
    fn elegant_idea_clears_threshold() {
        let criteria = EvaluationCriteria::default();
        let facets = FacetScores::new(0.9, 0.8, 0.85, 0.7);

        let score = criteria.score(&facets);
        assert!(score.is_accepted());
    }

    #[test]
    fn mediocre_idea_rejected() {
        let criteria = EvaluationCriteria::default();
        let facets = FacetScores::new(0.5, 0.5, 0.5, 0.5);

        assert!(!criteria.score(&facets).is_accepted());
    }

    #[test]
    fn bad_weight_sum_rejected() {
        let result = EvaluationCriteria::try_new(0.9, 0.3, 0.2, 0.1);
        assert!(matches!(result, Err(CriteriaError::WeightSum { .. })));
    }

    #[test]
    fn out_of_range_weight_rejected() {
        let result = EvaluationCriteria::try_new(1.3, -0.1, -0.1, -0.1);
        assert!(matches!(result, Err(CriteriaError::WeightRange { .. })));
    }

    #[test]
    fn facets_clamped() {
        let facets = FacetScores::new(1.5, -0.2, 0.5, 0.5);
        assert_eq!(facets.inevitability, 1.0);
        assert_eq!(facets.symmetry, 0.0);
    }

    proptest! {
        #[test]
        fn score_stays_in_unit_interval(
            a in -2.0f64..3.0,
            b in -2.0f64..3.0,
            c in -2.0f64..3.0,
            d in -2.0f64..3.0,
        ) {
            let criteria = EvaluationCriteria::default();
            let facets = FacetScores::new(a, b, c, d);
            let score = criteria.score(&facets).value();
            prop_assert!((0.0..=1.0).contains(&score));
        }
    }
}
