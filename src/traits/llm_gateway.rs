use async_trait::async_trait;

use crate::errors::{MiraError, MiraResult};
use crate::models::common::{ChatMessage, PipelineStage};

/// One chat-completion call
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    /// Stage issuing the call, used for tracing only
    pub stage: PipelineStage,
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: usize,
}

impl CompletionRequest {
    pub fn new(stage: PipelineStage, model: &str, messages: Vec<ChatMessage>) -> Self {
        Self {
            stage,
            model: model.to_string(),
            messages,
            temperature: 0.2,
            max_tokens: 4000,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Messages must be non-empty and temperature within [0, 2]
    pub fn validate(&self) -> MiraResult<()> {
        if self.messages.is_empty() {
            return Err(MiraError::Configuration("completion request has no messages".to_string()));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(MiraError::Configuration(
                format!("temperature {} is outside [0, 2]", self.temperature)
            ));
        }
        Ok(())
    }

    /// Text of the last user message, used for trace previews
    pub fn prompt(&self) -> &str {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == crate::models::common::Role::User)
            .or_else(|| self.messages.last())
            .map(|m| m.content.as_str())
            .unwrap_or("")
    }
}

/// Chat-completion capability the pipeline depends on.
///
/// Implementations never surface transport, auth or rate-limit failures:
/// any failure (including a timeout) is reported as an empty string, the one
/// uniform "no answer" signal every agent handles.
#[async_trait]
pub trait LlmGateway: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> String;
}
