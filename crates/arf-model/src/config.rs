//! Per-model configuration

use serde::{Deserialize, Serialize};

/// How a model is reached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// OpenAI-compatible chat completions endpoint, key from env
    Api,
    /// Local Ollama generate endpoint, no key
    Local,
}

/// Configuration for one model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Model name as the provider knows it
    ///
    /// May be left empty in configuration files where the name is the
    /// map key; the loader fills it in.
    #[serde(default)]
    pub name: String,
    /// Provider kind
    #[serde(rename = "type")]
    pub kind: ProviderKind,
    /// Endpoint base URL
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Environment variable holding the API key (Api kind only)
    #[serde(default)]
    pub api_key_env: Option<String>,
    /// Daily token budget
    #[serde(default = "default_daily_limit")]
    pub daily_token_limit: u64,
    /// Requests per minute
    #[serde(default = "default_rpm_limit")]
    pub rpm_limit: u32,
    /// Task hints this model is preferred for
    #[serde(default)]
    pub preferred_tasks: Vec<String>,
    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://127.0.0.1:11434".to_string()
}

fn default_daily_limit() -> u64 {
    1_000_000
}

fn default_rpm_limit() -> u32 {
    60
}

fn default_timeout_secs() -> u64 {
    120
}

impl ModelConfig {
    /// Create an API model config
    #[must_use]
    pub fn api(name: impl Into<String>, base_url: impl Into<String>, key_env: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ProviderKind::Api,
            base_url: base_url.into(),
            api_key_env: Some(key_env.into()),
            daily_token_limit: default_daily_limit(),
            rpm_limit: default_rpm_limit(),
            preferred_tasks: Vec::new(),
            timeout_secs: default_timeout_secs(),
        }
    }

    /// Create a local Ollama model config
    #[must_use]
    pub fn local(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ProviderKind::Local,
            base_url: default_base_url(),
            api_key_env: None,
            daily_token_limit: default_daily_limit(),
            rpm_limit: default_rpm_limit(),
            preferred_tasks: Vec::new(),
            timeout_secs: default_timeout_secs(),
        }
    }

    /// With preferred task hints
    #[inline]
    #[must_use]
    pub fn with_preferred_tasks(mut self, tasks: Vec<String>) -> Self {
        self.preferred_tasks = tasks;
        self
    }

    /// With daily token limit
    #[inline]
    #[must_use]
    pub fn with_daily_limit(mut self, limit: u64) -> Self {
        self.daily_token_limit = limit;
        self
    }

    /// With requests-per-minute limit
    #[inline]
    #[must_use]
    pub fn with_rpm_limit(mut self, rpm: u32) -> Self {
        self.rpm_limit = rpm;
        self
    }

    /// Resolve the API key from the environment
    ///
    /// `None` for local models or when the variable is unset/empty.
    #[must_use]
    pub fn resolve_key(&self) -> Option<String> {
        let var = self.api_key_env.as_deref()?;
        match std::env::var(var) {
            Ok(key) if !key.trim().is_empty() => Some(key),
            _ => None,
        }
    }

    /// Whether this model prefers the given task hint
    #[inline]
    #[must_use]
    pub fn prefers(&self, hint: &str) -> bool {
        self.preferred_tasks.iter().any(|t| t == hint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yaml_defaults_applied() {
        let yaml = r#"
name: gpt-4o
type: api
api_key_env: OPENAI_API_KEY
"#;
        let config: ModelConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.daily_token_limit, 1_000_000);
        assert_eq!(config.rpm_limit, 60);
        assert!(config.preferred_tasks.is_empty());
    }

    #[test]
    fn prefers_matches_hint() {
        let config = ModelConfig::local("llama2")
            .with_preferred_tasks(vec!["summarize".to_string()]);
        assert!(config.prefers("summarize"));
        assert!(!config.prefers("evaluate"));
    }

    #[test]
    fn missing_key_env_resolves_none() {
        let config = ModelConfig::api(
            "gpt-4o",
            "https://api.openai.com/v1",
            "ARF_TEST_KEY_THAT_DOES_NOT_EXIST",
        );
        assert!(config.resolve_key().is_none());
    }
}
