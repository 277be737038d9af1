//! Scoring engine contract.
//!
//! The engine is opaque: it receives a stored document path plus free-text
//! instructions and answers with a chat-style message whose content is either
//! a plain string or a list of parts. `EngineResponse::text` reads both.

pub mod llm;
pub mod prompts;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineResponse {
    pub message: EngineMessage,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineMessage {
    pub content: MessageContent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentPart {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
}

impl EngineResponse {
    #[allow(dead_code)]
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            message: EngineMessage {
                content: MessageContent::Text(text.into()),
            },
        }
    }

    pub fn from_parts(parts: Vec<ContentPart>) -> Self {
        Self {
            message: EngineMessage {
                content: MessageContent::Parts(parts),
            },
        }
    }

    /// The response text: the string itself, or the first part's text.
    pub fn text(&self) -> Option<&str> {
        match &self.message.content {
            MessageContent::Text(text) => Some(text),
            MessageContent::Parts(parts) => parts.first().and_then(|p| p.text.as_deref()),
        }
    }
}

#[async_trait]
pub trait ScoringEngine: Send + Sync {
    /// `Ok(None)` means the engine produced no feedback.
    async fn feedback(&self, document_path: &str, instructions: &str)
        -> Result<Option<EngineResponse>>;
}
