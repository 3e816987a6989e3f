//! Model routing
//!
//! Chooses which model answers a request. Configuration order is
//! priority order: API providers first choice, local Ollama the
//! fallback. A model over its daily token budget or minute window is
//! never routed to.

use crate::client::{CompletionClient, CompletionRequest, CompletionResponse};
use crate::config::{ModelConfig, ProviderKind};
use crate::error::ModelError;
use crate::ledger::UsageLedger;
use chrono::Utc;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;

/// Anything that can answer a completion request
///
/// The router is the production implementation; tests use a scripted
/// completer so crews run offline.
#[async_trait::async_trait]
pub trait Completer: Send + Sync {
    /// Answer a completion request
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, ModelError>;
}

/// Priority-ordered model router with usage governance
pub struct ModelRouter {
    models: Vec<ModelConfig>,
    ledger: Arc<UsageLedger>,
    client: CompletionClient,
}

impl ModelRouter {
    /// Create a router over an ordered model table
    #[must_use]
    pub fn new(models: Vec<ModelConfig>, ledger: Arc<UsageLedger>) -> Self {
        Self {
            models,
            ledger,
            client: CompletionClient::new(),
        }
    }

    /// Shared usage ledger
    #[inline]
    #[must_use]
    pub fn ledger(&self) -> &Arc<UsageLedger> {
        &self.ledger
    }

    /// Pick the model that would answer a request right now
    ///
    /// Selection order:
    /// 1. API models preferring the task hint, in config order
    /// 2. remaining API models, in config order
    /// 3. local models, same two passes
    ///
    /// API models without a resolvable key are skipped silently.
    ///
    /// # Errors
    /// `ModelError::NoModelAvailable` when every model is excluded.
    pub fn route(&self, task_hint: Option<&str>) -> Result<&ModelConfig, ModelError> {
        self.candidates(task_hint)
            .into_iter()
            .next()
            .ok_or(ModelError::NoModelAvailable)
    }

    /// All currently routable models, best first
    fn candidates(&self, task_hint: Option<&str>) -> Vec<&ModelConfig> {
        let now = Utc::now();

        let usable = |m: &&ModelConfig| -> bool {
            if m.kind == ProviderKind::Api && m.resolve_key().is_none() {
                return false;
            }
            self.ledger.within_limits(m, now)
        };
        let preferred = |m: &&ModelConfig| -> bool {
            task_hint.is_some_and(|hint| m.prefers(hint))
        };

        let mut out: Vec<&ModelConfig> = Vec::new();
        for kind in [ProviderKind::Api, ProviderKind::Local] {
            out.extend(
                self.models
                    .iter()
                    .filter(|m| m.kind == kind)
                    .filter(usable)
                    .filter(preferred),
            );
            out.extend(
                self.models
                    .iter()
                    .filter(|m| m.kind == kind)
                    .filter(usable)
                    .filter(|m| !preferred(m)),
            );
        }
        out
    }

    async fn try_model(
        &self,
        model: &ModelConfig,
        request: &CompletionRequest,
    ) -> Result<CompletionResponse, ModelError> {
        let key = model.resolve_key();

        match self.client.send(model, key.as_deref(), request).await {
            Ok(response) => Ok(response),
            Err(e) if e.is_retryable() && !matches!(e, ModelError::RateLimited { .. }) => {
                let jitter = rand::rng().random_range(100..400);
                tracing::warn!(model = %model.name, "retrying after {}: backoff {}ms", e, jitter);
                tokio::time::sleep(Duration::from_millis(jitter)).await;
                self.client.send(model, key.as_deref(), request).await
            }
            Err(e) => Err(e),
        }
    }
}

#[async_trait::async_trait]
impl Completer for ModelRouter {
    /// Route and complete, falling through saturated providers
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, ModelError> {
        let candidates: Vec<String> = self
            .candidates(request.task_hint.as_deref())
            .into_iter()
            .map(|m| m.name.clone())
            .collect();

        if candidates.is_empty() {
            return Err(ModelError::NoModelAvailable);
        }

        let mut last_err = ModelError::NoModelAvailable;

        for name in candidates {
            let Some(model) = self.models.iter().find(|m| m.name == name) else {
                continue;
            };

            match self.try_model(model, &request).await {
                Ok(response) => {
                    self.ledger.record(&model.name, response.tokens_used, Utc::now());
                    if let Err(e) = self.ledger.save() {
                        tracing::warn!("failed to persist usage ledger: {}", e);
                    }
                    tracing::debug!(
                        model = %model.name,
                        tokens = response.tokens_used,
                        "completion ok"
                    );
                    return Ok(response);
                }
                Err(ModelError::RateLimited { model: name }) => {
                    tracing::warn!(model = %name, "rate limited, falling through");
                    self.ledger.saturate(&name, Utc::now());
                    last_err = ModelError::RateLimited { model: name };
                }
                Err(e) => {
                    tracing::warn!(model = %model.name, "model failed: {}", e);
                    last_err = e;
                }
            }
        }

        Err(last_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn router(models: Vec<ModelConfig>) -> (ModelRouter, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let ledger = Arc::new(UsageLedger::load(dir.path().join("usage.json")));
        (ModelRouter::new(models, ledger), dir)
    }

    #[test]
    fn api_model_without_key_skipped() {
        let (r, _dir) = router(vec![
            ModelConfig::api("gpt-4o", "https://api.example.com/v1", "ARF_NO_SUCH_KEY"),
            ModelConfig::local("llama2"),
        ]);

        let chosen = r.route(None).unwrap();
        assert_eq!(chosen.name, "llama2");
    }

    #[test]
    fn exhausted_model_skipped() {
        let (r, _dir) = router(vec![
            ModelConfig::local("llama2").with_daily_limit(100),
            ModelConfig::local("mistral"),
        ]);
        r.ledger.record("llama2", 100, Utc::now());

        let chosen = r.route(None).unwrap();
        assert_eq!(chosen.name, "mistral");
    }

    #[test]
    fn preferred_task_wins_over_order() {
        let (r, _dir) = router(vec![
            ModelConfig::local("llama2"),
            ModelConfig::local("mistral")
                .with_preferred_tasks(vec!["evaluate".to_string()]),
        ]);

        assert_eq!(r.route(Some("evaluate")).unwrap().name, "mistral");
        assert_eq!(r.route(None).unwrap().name, "llama2");
    }

    #[test]
    fn no_models_is_an_error() {
        let (r, _dir) = router(vec![]);
        assert!(matches!(r.route(None), Err(ModelError::NoModelAvailable)));
    }

    #[test]
    fn local_preferred_only_after_api() {
        std::env::set_var("ARF_ROUTER_TEST_KEY", "sk-test");
        let (r, _dir) = router(vec![
            ModelConfig::local("llama2"),
            ModelConfig::api("gpt-4o", "https://api.example.com/v1", "ARF_ROUTER_TEST_KEY"),
        ]);

        // API model outranks the local one despite config order
        assert_eq!(r.route(None).unwrap().name, "gpt-4o");
        std::env::remove_var("ARF_ROUTER_TEST_KEY");
    }
}
