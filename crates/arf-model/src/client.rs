//! Completion clients
//!
//! Two wire shapes:
//! - OpenAI-compatible `/chat/completions` for API providers
//! - Ollama `/api/generate` for the local fallback

use crate::config::{ModelConfig, ProviderKind};
use crate::error::ModelError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A prompt for one agent task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// The user prompt
    pub prompt: String,
    /// System prompt (agent role, goal, backstory)
    #[serde(default)]
    pub system: Option<String>,
    /// Routing hint (e.g. "evaluate", "summarize")
    #[serde(default)]
    pub task_hint: Option<String>,
}

impl CompletionRequest {
    /// Create a bare request
    #[must_use]
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            system: None,
            task_hint: None,
        }
    }

    /// With system prompt
    #[inline]
    #[must_use]
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// With routing hint
    #[inline]
    #[must_use]
    pub fn with_task_hint(mut self, hint: impl Into<String>) -> Self {
        self.task_hint = Some(hint.into());
        self
    }
}

/// A model's answer plus accounting
#[derive(Debug, Clone)]
pub struct CompletionResponse {
    /// Model that produced the answer
    pub model: String,
    /// Answer text
    pub content: String,
    /// Tokens consumed (reported, or estimated for local models)
    pub tokens_used: u64,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatCompletionBody<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Deserialize)]
struct ChatCompletionReply {
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReplyMessage,
}

#[derive(Deserialize)]
struct ChatReplyMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ChatUsage {
    total_tokens: u64,
}

#[derive(Serialize)]
struct OllamaBody<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Deserialize)]
struct OllamaReply {
    response: Option<String>,
}

/// Stateless HTTP client for both provider kinds
#[derive(Debug, Clone)]
pub(crate) struct CompletionClient {
    http: reqwest::Client,
}

impl CompletionClient {
    pub(crate) fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
        }
    }

    /// Send a completion to the given model
    pub(crate) async fn send(
        &self,
        config: &ModelConfig,
        key: Option<&str>,
        request: &CompletionRequest,
    ) -> Result<CompletionResponse, ModelError> {
        match config.kind {
            ProviderKind::Api => self.send_api(config, key, request).await,
            ProviderKind::Local => self.send_local(config, request).await,
        }
    }

    async fn send_api(
        &self,
        config: &ModelConfig,
        key: Option<&str>,
        request: &CompletionRequest,
    ) -> Result<CompletionResponse, ModelError> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = request.system.as_deref() {
            messages.push(ChatMessage {
                role: "system",
                content: system,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: &request.prompt,
        });

        let body = ChatCompletionBody {
            model: &config.name,
            messages,
        };

        let url = format!("{}/chat/completions", config.base_url.trim_end_matches('/'));
        let mut req = self
            .http
            .post(&url)
            .timeout(Duration::from_secs(config.timeout_secs))
            .json(&body);
        if let Some(key) = key {
            req = req.bearer_auth(key);
        }

        let response = req.send().await?;
        let status = response.status();

        if status.as_u16() == 429 {
            return Err(ModelError::RateLimited {
                model: config.name.clone(),
            });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ModelError::Provider {
                status: status.as_u16(),
                body: truncate(&body, 512),
            });
        }

        let reply: ChatCompletionReply = response.json().await?;
        let content = reply
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();

        if content.is_empty() {
            return Err(ModelError::EmptyCompletion {
                model: config.name.clone(),
            });
        }

        let tokens_used = reply
            .usage
            .map(|u| u.total_tokens)
            .unwrap_or_else(|| estimate_tokens(&request.prompt, &content));

        Ok(CompletionResponse {
            model: config.name.clone(),
            content,
            tokens_used,
        })
    }

    async fn send_local(
        &self,
        config: &ModelConfig,
        request: &CompletionRequest,
    ) -> Result<CompletionResponse, ModelError> {
        // Ollama has no system slot in /api/generate; fold it into the prompt
        let prompt = match request.system.as_deref() {
            Some(system) => format!("{system}\n\n{}", request.prompt),
            None => request.prompt.clone(),
        };

        let body = OllamaBody {
            model: &config.name,
            prompt: &prompt,
            stream: false,
        };

        let url = format!("{}/api/generate", config.base_url.trim_end_matches('/'));
        let response = self
            .http
            .post(&url)
            .timeout(Duration::from_secs(config.timeout_secs))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ModelError::Provider {
                status: status.as_u16(),
                body: truncate(&body, 512),
            });
        }

        let reply: OllamaReply = response.json().await?;
        let content = reply.response.unwrap_or_default();

        if content.is_empty() {
            return Err(ModelError::EmptyCompletion {
                model: config.name.clone(),
            });
        }

        let tokens_used = estimate_tokens(&prompt, &content);

        Ok(CompletionResponse {
            model: config.name.clone(),
            content,
            tokens_used,
        })
    }
}

/// Rough token estimate when the provider reports no usage
fn estimate_tokens(prompt: &str, content: &str) -> u64 {
    ((prompt.len() + content.len()) / 4).max(1) as u64
}

fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        s.to_string()
    } else {
        let mut end = max;
        while !s.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}…", &s[..end])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_estimate_never_zero() {
        assert_eq!(estimate_tokens("", ""), 1);
        assert_eq!(estimate_tokens("abcd", "efgh"), 2);
    }

    #[test]
    fn chat_reply_parses_with_and_without_usage() {
        let with_usage = r#"{
            "choices": [{"message": {"content": "hello"}}],
            "usage": {"total_tokens": 42}
        }"#;
        let reply: ChatCompletionReply = serde_json::from_str(with_usage).unwrap();
        assert_eq!(reply.usage.unwrap().total_tokens, 42);

        let without_usage = r#"{"choices": [{"message": {"content": "hello"}}]}"#;
        let reply: ChatCompletionReply = serde_json::from_str(without_usage).unwrap();
        assert!(reply.usage.is_none());
        assert_eq!(reply.choices[0].message.content.as_deref(), Some("hello"));
    }

    #[test]
    fn ollama_reply_parses() {
        let raw = r#"{"model": "llama2", "response": "the answer", "done": true}"#;
        let reply: OllamaReply = serde_json::from_str(raw).unwrap();
        assert_eq!(reply.response.as_deref(), Some("the answer"));
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        let s = "αβγδε";
        let t = truncate(s, 3);
        assert!(t.starts_with('α'));
    }
}
