//! Validation requests and outcomes

use arf_philosophy::Hypothesis;
use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Unique validation run identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ValidationId(pub Ulid);

impl ValidationId {
    /// Generate new validation ID
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for ValidationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ValidationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A queued validation experiment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationRequest {
    /// Run identifier
    pub id: ValidationId,
    /// The hypothesis under test
    pub hypothesis: Hypothesis,
}

impl ValidationRequest {
    /// Queue a hypothesis for validation
    #[must_use]
    pub fn new(hypothesis: Hypothesis) -> Self {
        Self {
            id: ValidationId::new(),
            hypothesis,
        }
    }
}

/// Agent-generated experiment script, section by section
///
/// The sections mirror the experiment skeleton: load data, run the
/// test, report results, save outputs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScriptSpec {
    /// Dataset loading code
    pub dataset_loading: String,
    /// The validation logic itself
    pub validation_code: String,
    /// Results generation
    pub results_generation: String,
    /// Output saving
    pub output_saving: String,
}

impl ScriptSpec {
    /// Render the full script for a hypothesis
    #[must_use]
    pub fn render(&self, hypothesis: &str) -> String {
        format!(
            "import pandas as pd\n\
             import numpy as np\n\
             import matplotlib.pyplot as plt\n\
             from scipy import stats\n\
             \n\
             # Hypothesis: {hypothesis}\n\
             \n\
             # Load datasets\n\
             {dataset_loading}\n\
             \n\
             # Validation logic\n\
             {validation_code}\n\
             \n\
             # Generate results\n\
             {results_generation}\n\
             \n\
             # Save outputs\n\
             {output_saving}\n",
            dataset_loading = self.dataset_loading,
            validation_code = self.validation_code,
            results_generation = self.results_generation,
            output_saving = self.output_saving,
        )
    }
}

/// What happened when a validation script ran
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationOutcome {
    /// Run identifier
    pub id: ValidationId,
    /// Exit success (false on nonzero exit or timeout)
    pub success: bool,
    /// Captured stdout
    pub stdout: String,
    /// Captured stderr
    pub stderr: String,
    /// Wall-clock duration in milliseconds
    pub duration_ms: u64,
    /// Whether the run hit the timeout and was killed
    pub timed_out: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use arf_philosophy::{ConceptId, HypothesisId};
    use chrono::Utc;

    fn hypothesis() -> Hypothesis {
        Hypothesis {
            id: HypothesisId::new(),
            statement: "eigenvalue gaps pair".to_string(),
            concept_id: ConceptId::new(),
            proposed_at: Utc::now(),
        }
    }

    #[test]
    fn request_ids_unique() {
        let h = hypothesis();
        let a = ValidationRequest::new(h.clone());
        let b = ValidationRequest::new(h);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn script_render_includes_all_sections() {
        let spec = ScriptSpec {
            dataset_loading: "df = pd.read_csv('data.csv')".to_string(),
            validation_code: "gaps = np.diff(df['eig'])".to_string(),
            results_generation: "p = stats.ttest_1samp(gaps, 0).pvalue".to_string(),
            output_saving: "print(p)".to_string(),
        };

        let script = spec.render("eigenvalue gaps pair");
        assert!(script.contains("# Hypothesis: eigenvalue gaps pair"));
        assert!(script.contains("pd.read_csv"));
        assert!(script.contains("ttest_1samp"));
        assert!(script.starts_with("import pandas as pd"));
    }
}
