//! Daemon configuration
//!
//! Loaded from `config.yaml`. Every section has serde defaults, so a
//! minimal config is just a models table; API keys are resolved from
//! the environment variables the config names, never stored in the
//! file itself.

use arf_model::ModelConfig;
use arf_philosophy::EvaluationCriteria;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Errors loading or validating configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file unreadable
    #[error("cannot read config {path}: {source}")]
    Read {
        /// Config path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Config file malformed
    #[error("cannot parse config {path}: {source}")]
    Parse {
        /// Config path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: serde_yaml::Error,
    },

    /// Philosophy weights invalid
    #[error("philosophy weights invalid: {0}")]
    Philosophy(#[from] arf_philosophy::CriteriaError),

    /// No models configured
    #[error("no models configured")]
    NoModels,
}

/// Top-level daemon configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ArfConfig {
    /// Elegance criteria weights
    pub philosophy: EvaluationCriteria,
    /// Model table; order is routing priority
    pub models: IndexMap<String, ModelConfig>,
    /// Web monitoring switches
    pub monitoring: MonitoringConfig,
    /// Dashboard settings
    pub dashboard: DashboardConfig,
    /// Runtime directory layout
    pub paths: PathsConfig,
    /// Validation engine settings
    pub validation: ValidationConfig,
    /// Cycle loop sleeps
    pub cycle: CycleConfig,
    /// Synthesis trigger
    pub synthesis: SynthesisConfig,
}

/// Web monitoring switches
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitoringConfig {
    /// Monitor live web conversations (not available in this build)
    pub active_chats: bool,
}

/// Dashboard settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Enable the HTTP dashboard
    pub enabled: bool,
    /// Bind address
    pub bind_addr: String,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bind_addr: "127.0.0.1:5000".to_string(),
        }
    }
}

/// Runtime directory layout
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Where chat exports are dropped
    pub input: PathBuf,
    /// Where the framework document and companions live
    pub output: PathBuf,
    /// Where checkpoints and the usage ledger live
    pub state: PathBuf,
    /// Sandbox base for validation scripts, results, and data
    pub validation: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from("./input"),
            output: PathBuf::from("./output"),
            state: PathBuf::from("./state"),
            validation: PathBuf::from("."),
        }
    }
}

impl PathsConfig {
    /// Checkpoint file path
    #[must_use]
    pub fn checkpoint_file(&self) -> PathBuf {
        self.state.join("system_state.json")
    }

    /// Usage ledger file path
    #[must_use]
    pub fn usage_file(&self) -> PathBuf {
        self.state.join("model_usage.json")
    }
}

/// Validation engine settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Concurrent validation experiments per cycle
    pub max_parallel: usize,
    /// Hard per-run timeout in seconds
    pub timeout_secs: u64,
    /// Interpreter for experiment scripts
    pub interpreter: String,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            max_parallel: 3,
            timeout_secs: 300,
            interpreter: "python3".to_string(),
        }
    }
}

/// Cycle loop sleeps, in seconds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CycleConfig {
    /// Sleep when validations are pending
    pub validation_sleep_secs: u64,
    /// Sleep when comments are pending
    pub comment_sleep_secs: u64,
    /// Sleep when quiet
    pub idle_sleep_secs: u64,
    /// Wait before retrying after a cycle error
    pub error_backoff_secs: u64,
}

impl Default for CycleConfig {
    fn default() -> Self {
        Self {
            validation_sleep_secs: 300,
            comment_sleep_secs: 600,
            idle_sleep_secs: 1800,
            error_backoff_secs: 60,
        }
    }
}

/// Synthesis trigger
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthesisConfig {
    /// Run synthesis when more validations than this are pending
    pub pending_threshold: usize,
    /// Or when this many hours passed since the last synthesis
    pub max_hours_between: f64,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            pending_threshold: 5,
            max_hours_between: 6.0,
        }
    }
}

impl ArfConfig {
    /// Load and validate a config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;

        let mut config: Self = serde_yaml::from_str(&raw).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;

        // The map key is the model name unless the entry names itself
        for (key, model) in config.models.iter_mut() {
            if model.name.is_empty() {
                model.name = key.clone();
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate invariants that serde cannot express
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.philosophy.validate()?;
        if self.models.is_empty() {
            return Err(ConfigError::NoModels);
        }
        Ok(())
    }

    /// The model table in priority order
    #[must_use]
    pub fn model_list(&self) -> Vec<ModelConfig> {
        self.models.values().cloned().collect()
    }

    /// Weight labels for the seeded framework document
    #[must_use]
    pub fn weight_labels(&self) -> [(&'static str, f64); 4] {
        [
            ("Inevitability and naturalness", self.philosophy.inevitability),
            ("Symmetry and invariance", self.philosophy.symmetry),
            ("Parsimony - Occam's Razor", self.philosophy.parsimony),
            ("Explanatory power", self.philosophy.explanatory_power),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arf_model::ProviderKind;

    const SAMPLE: &str = r#"
philosophy:
  inevitability: 0.30
  symmetry: 0.25
  parsimony: 0.25
  explanatory_power: 0.20
models:
  gpt-4o:
    type: api
    base_url: https://api.openai.com/v1
    api_key_env: OPENAI_API_KEY
    preferred_tasks: [evaluate]
  llama2:
    type: local
dashboard:
  bind_addr: 127.0.0.1:5000
validation:
  max_parallel: 3
"#;

    fn write_config(content: &str) -> (PathBuf, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, content).unwrap();
        (path, dir)
    }

    #[test]
    fn sample_config_loads() {
        let (path, _dir) = write_config(SAMPLE);
        let config = ArfConfig::load(&path).unwrap();

        let models = config.model_list();
        assert_eq!(models.len(), 2);
        assert_eq!(models[0].name, "gpt-4o");
        assert_eq!(models[0].kind, ProviderKind::Api);
        assert_eq!(models[1].name, "llama2");
        assert_eq!(models[1].kind, ProviderKind::Local);

        assert_eq!(config.validation.max_parallel, 3);
        assert_eq!(config.cycle.idle_sleep_secs, 1800);
        assert_eq!(config.synthesis.pending_threshold, 5);
    }

    #[test]
    fn model_order_preserved() {
        let (path, _dir) = write_config(
            r#"
models:
  first: { type: local }
  second: { type: local }
  third: { type: local }
"#,
        );
        let config = ArfConfig::load(&path).unwrap();
        let names: Vec<String> = config.model_list().into_iter().map(|m| m.name).collect();
        assert_eq!(names, vec!["first", "second", "third"]);
    }

    #[test]
    fn bad_weights_rejected() {
        let (path, _dir) = write_config(
            r#"
philosophy:
  inevitability: 0.9
  symmetry: 0.3
  parsimony: 0.2
  explanatory_power: 0.1
models:
  llama2: { type: local }
"#,
        );
        assert!(matches!(
            ArfConfig::load(&path),
            Err(ConfigError::Philosophy(_))
        ));
    }

    #[test]
    fn empty_models_rejected() {
        let (path, _dir) = write_config("monitoring:\n  active_chats: false\n");
        assert!(matches!(ArfConfig::load(&path), Err(ConfigError::NoModels)));
    }

    #[test]
    fn defaults_match_reference_behavior() {
        let config = ArfConfig::default();
        assert_eq!(config.cycle.validation_sleep_secs, 300);
        assert_eq!(config.cycle.comment_sleep_secs, 600);
        assert_eq!(config.cycle.error_backoff_secs, 60);
        assert_eq!(config.validation.timeout_secs, 300);
        assert_eq!(config.synthesis.max_hours_between, 6.0);
        assert_eq!(config.dashboard.bind_addr, "127.0.0.1:5000");
    }
}
