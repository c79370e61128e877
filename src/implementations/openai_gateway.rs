use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::errors::{MiraError, MiraResult};
use crate::implementations::config::LlmApiConfig;
use crate::models::common::ChatMessage;
use crate::traits::llm_gateway::{CompletionRequest, LlmGateway};
use crate::traits::trace_sink::{LogTraceSink, TraceRecord, TraceSink};

/// OpenAI API request and response types
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: usize,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatResponseChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatResponseChoice>,
}

/// Gateway speaking the OpenAI-compatible chat completions protocol.
///
/// The API key is resolved per call (config first, then the provider
/// environment variables), so a missing key degrades to the empty response
/// like any other transport failure.
#[derive(Clone)]
pub struct OpenAiGateway {
    config: LlmApiConfig,
    http_client: reqwest::Client,
    timeout: Duration,
    trace_sink: Arc<dyn TraceSink>,
}

impl OpenAiGateway {
    pub fn new(config: LlmApiConfig, timeout: Duration) -> MiraResult<Self> {
        let http_client = reqwest::Client
            ::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| MiraError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            config,
            http_client,
            timeout,
            trace_sink: Arc::new(LogTraceSink),
        })
    }

    pub fn with_trace_sink(mut self, sink: Arc<dyn TraceSink>) -> Self {
        self.trace_sink = sink;
        self
    }

    async fn send(&self, request: &CompletionRequest) -> MiraResult<String> {
        request.validate()?;

        let (provider, api_key) = self.config.get_api_key()?;
        let endpoint = self.config.endpoint();

        let default_model;
        let model = if request.model.trim().is_empty() {
            default_model = self.config.model.clone().unwrap_or_else(|| "gpt-4o-mini".to_string());
            default_model.as_str()
        } else {
            request.model.as_str()
        };

        debug!("Making LLM API request to {} ({})", provider, endpoint);
        debug!("Model: {}", model);
        debug!("Temperature: {}", request.temperature);
        debug!("Max tokens: {}", request.max_tokens);
        debug!("Prompt length: {} characters", request.prompt().len());

        let body = ChatRequest {
            model,
            messages: &request.messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        let mut builder = self.http_client
            .post(&endpoint)
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Bearer {}", api_key))
            .json(&body);
        if let Some(org) = &self.config.organization_id {
            builder = builder.header("OpenAI-Organization", org);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                warn!("Request timed out");
            }
            if e.is_connect() {
                warn!("Connection error - check network connectivity");
            }
            MiraError::Transport(format!("Network error when calling LLM API: {}", e))
        })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let error_text = response
                .text().await
                .unwrap_or_else(|_| "Failed to get error message".to_string());
            return Err(MiraError::Transport(format!("HTTP {} - {}", status, error_text)));
        }

        let parsed: ChatResponse = response
            .json().await
            .map_err(|e| MiraError::Transport(format!("Invalid JSON response: {}", e)))?;

        let content = parsed.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| MiraError::Transport("Response has no message content".to_string()))?;

        debug!("Content length: {} characters", content.len());
        Ok(content)
    }
}

#[async_trait]
impl LlmGateway for OpenAiGateway {
    async fn complete(&self, request: CompletionRequest) -> String {
        let started = Instant::now();

        let content = match tokio::time::timeout(self.timeout, self.send(&request)).await {
            Ok(Ok(content)) => {
                info!("[{}] LLM response received", request.stage);
                content
            }
            Ok(Err(e)) => {
                warn!("[{}] LLM call failed: {}", request.stage, e);
                String::new()
            }
            Err(_) => {
                warn!("[{}] LLM call timed out after {:?}", request.stage, self.timeout);
                String::new()
            }
        };

        self.trace_sink.record(
            TraceRecord::new(request.stage, &request.model, request.prompt(), started.elapsed(), &content)
        );

        content
    }
}
