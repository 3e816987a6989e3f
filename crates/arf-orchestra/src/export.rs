//! Chat export parsing
//!
//! ChatGPT exports are JSON conversations with a `mapping` of message
//! nodes keyed by id, not ordered on disk. The archivist stage
//! flattens them into a chronologically ordered transcript. Malformed
//! nodes are skipped with a warning; an export is only rejected when
//! nothing in it parses.

use crate::error::OrchestraError;
use serde::Deserialize;

/// One message of a conversation
#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    /// Author role ("user", "assistant", "system", ...)
    pub role: String,
    /// Message text, content parts joined
    pub text: String,
    /// Creation time, seconds since epoch
    pub timestamp: Option<f64>,
}

/// A parsed chat export
#[derive(Debug, Clone)]
pub struct ChatExport {
    /// Conversation title
    pub title: String,
    /// Messages in chronological order
    pub messages: Vec<ChatMessage>,
}

#[derive(Deserialize)]
struct RawConversation {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    mapping: serde_json::Map<String, serde_json::Value>,
}

#[derive(Deserialize)]
struct RawNode {
    #[serde(default)]
    message: Option<RawMessage>,
}

#[derive(Deserialize)]
struct RawMessage {
    #[serde(default)]
    author: Option<RawAuthor>,
    #[serde(default)]
    content: Option<RawContent>,
    #[serde(default)]
    create_time: Option<f64>,
}

#[derive(Deserialize)]
struct RawAuthor {
    #[serde(default)]
    role: Option<String>,
}

#[derive(Deserialize)]
struct RawContent {
    #[serde(default)]
    parts: Option<Vec<serde_json::Value>>,
}

impl ChatExport {
    /// Parse an export file's contents
    ///
    /// Accepts either a single conversation object or an array of
    /// conversations (both shapes appear in the wild); an array is
    /// merged into one export, conversation order preserved.
    pub fn from_json_str(raw: &str) -> Result<Self, OrchestraError> {
        let value: serde_json::Value =
            serde_json::from_str(raw).map_err(|e| OrchestraError::ExportParse(e.to_string()))?;

        let conversations: Vec<RawConversation> = match value {
            serde_json::Value::Array(items) => items
                .into_iter()
                .filter_map(|v| match serde_json::from_value(v) {
                    Ok(c) => Some(c),
                    Err(e) => {
                        tracing::warn!("skipping malformed conversation: {}", e);
                        None
                    }
                })
                .collect(),
            other => vec![serde_json::from_value(other)
                .map_err(|e| OrchestraError::ExportParse(e.to_string()))?],
        };

        if conversations.is_empty() {
            return Err(OrchestraError::ExportParse(
                "no conversations in export".to_string(),
            ));
        }

        let title = conversations
            .iter()
            .find_map(|c| c.title.clone())
            .unwrap_or_else(|| "Untitled conversation".to_string());

        let mut messages = Vec::new();
        for conversation in conversations {
            let mut batch: Vec<ChatMessage> = conversation
                .mapping
                .into_iter()
                .filter_map(|(id, node)| parse_node(&id, node))
                .collect();
            // Sort within the conversation; undated messages sink to the end
            batch.sort_by(|a, b| {
                match (a.timestamp, b.timestamp) {
                    (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(std::cmp::Ordering::Equal),
                    (Some(_), None) => std::cmp::Ordering::Less,
                    (None, Some(_)) => std::cmp::Ordering::Greater,
                    (None, None) => std::cmp::Ordering::Equal,
                }
            });
            messages.extend(batch);
        }

        Ok(Self { title, messages })
    }

    /// Render the chronologically ordered transcript
    #[must_use]
    pub fn transcript(&self) -> String {
        let mut out = format!("# {}\n\n", self.title);
        for message in &self.messages {
            out.push_str(&format!("[{}] {}\n", message.role, message.text));
        }
        out
    }

    /// Whether the export holds any usable messages
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

fn parse_node(id: &str, node: serde_json::Value) -> Option<ChatMessage> {
    let node: RawNode = match serde_json::from_value(node) {
        Ok(n) => n,
        Err(e) => {
            tracing::warn!(node = id, "skipping malformed node: {}", e);
            return None;
        }
    };

    let message = node.message?;
    let role = message.author.and_then(|a| a.role)?;
    let parts = message.content.and_then(|c| c.parts)?;

    let text = parts
        .iter()
        .filter_map(|p| p.as_str())
        .collect::<Vec<_>>()
        .join("\n");

    if text.trim().is_empty() {
        return None;
    }

    Some(ChatMessage {
        role,
        text,
        timestamp: message.create_time,
    })
}
