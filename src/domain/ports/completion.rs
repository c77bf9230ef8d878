use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::errors::AssistantResult;
use crate::domain::models::{CallParams, TokenUsage};

/// A single role-tagged chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// "system", "user" or "assistant"
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Ordered messages plus sampling budget.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl CompletionRequest {
    /// System prompt followed by the user's text.
    pub fn prompt(system: impl Into<String>, user: impl Into<String>, params: CallParams) -> Self {
        Self {
            messages: vec![ChatMessage::system(system), ChatMessage::user(user)],
            temperature: params.temperature,
            max_tokens: params.max_tokens,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionResponse {
    pub text: String,
    pub usage: TokenUsage,
}

/// Chat completion provider.
///
/// Implementations must not retry; a transport or provider failure is
/// returned as [`crate::domain::AssistantError::DownstreamProvider`].
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> AssistantResult<CompletionResponse>;
}
