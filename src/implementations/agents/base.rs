use std::sync::Arc;
use std::time::Duration;

use log::{debug, warn};

use crate::errors::MiraResult;
use crate::implementations::templates::PromptTemplates;
use crate::models::common::{ChatMessage, PipelineStage, SourceType};
use crate::models::retrieval::MetadataFilter;
use crate::traits::llm_gateway::{CompletionRequest, LlmGateway};
use crate::traits::retrieval_provider::RetrievalProvider;

/// A retrieval provider bound to one collection and source type
#[derive(Clone)]
pub struct RetrievalBinding {
    pub provider: Arc<dyn RetrievalProvider>,
    pub collection: String,
    pub source_type: SourceType,
    pub k: usize,
    pub timeout: Duration,
}

impl RetrievalBinding {
    /// Filter `{source_type, class, subject}`; blank values are left out
    pub fn filter(&self, grade: &str, subject: &str) -> MetadataFilter {
        MetadataFilter::new()
            .with("source_type", self.source_type.as_str())
            .with("class", grade)
            .with("subject", subject)
    }
}

/// Construction parameters shared by every agent: persona rendering, model
/// call settings and an optional retrieval binding.
#[derive(Clone)]
pub struct AgentCore {
    gateway: Arc<dyn LlmGateway>,
    templates: Arc<PromptTemplates>,
    model: String,
    temperature: f32,
    max_tokens: usize,
    llm_timeout: Duration,
    retrieval: Option<RetrievalBinding>,
}

impl AgentCore {
    pub fn new(gateway: Arc<dyn LlmGateway>, templates: Arc<PromptTemplates>, model: &str) -> Self {
        Self {
            gateway,
            templates,
            model: model.to_string(),
            temperature: 0.2,
            max_tokens: 4000,
            llm_timeout: Duration::from_secs(120),
            retrieval: None,
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

    pub fn with_llm_timeout(mut self, timeout: Duration) -> Self {
        self.llm_timeout = timeout;
        self
    }

    pub fn with_retrieval(mut self, binding: RetrievalBinding) -> Self {
        self.retrieval = Some(binding);
        self
    }

    pub fn render(&self, name: &str, params: &std::collections::HashMap<String, String>) -> MiraResult<String> {
        self.templates.render(name, params)
    }

    /// One system + user exchange. Empty string on failure or timeout.
    pub async fn call_llm(&self, stage: PipelineStage, system: &str, user: String) -> String {
        self.call_messages(stage, vec![ChatMessage::system(system), ChatMessage::user(user)]).await
    }

    pub async fn call_messages(&self, stage: PipelineStage, messages: Vec<ChatMessage>) -> String {
        let request = CompletionRequest::new(stage, &self.model, messages)
            .with_temperature(self.temperature)
            .with_max_tokens(self.max_tokens);

        if let Err(e) = request.validate() {
            warn!("[{}] Invalid completion request: {}", stage, e);
            return String::new();
        }

        match tokio::time::timeout(self.llm_timeout, self.gateway.complete(request)).await {
            Ok(text) => text,
            Err(_) => {
                warn!("[{}] LLM call exceeded {:?}, treating as empty", stage, self.llm_timeout);
                String::new()
            }
        }
    }

    /// Retrieved chunk texts for the bound collection, or an empty string when
    /// nothing is bound, nothing matches, or the search times out
    pub async fn retrieve_context(&self, query: &str, grade: &str, subject: &str) -> String {
        let Some(binding) = &self.retrieval else {
            return String::new();
        };

        let filter = binding.filter(grade, subject);
        let search = binding.provider.search(&binding.collection, query, binding.k, &filter);
        match tokio::time::timeout(binding.timeout, search).await {
            Ok(result) => {
                debug!(
                    "Retrieved {} chunks from {} via {}",
                    result.len(),
                    binding.collection,
                    binding.provider.name()
                );
                result.joined()
            }
            Err(_) => {
                warn!("Retrieval from {} timed out after {:?}", binding.collection, binding.timeout);
                String::new()
            }
        }
    }
}

/// Labelled context sections for prompts; blank sections are dropped
pub fn combine_context(sections: &[(&str, &str)]) -> String {
    let combined = sections
        .iter()
        .filter(|(_, text)| !text.trim().is_empty())
        .map(|(label, text)| format!("{}:\n{}", label, text.trim()))
        .collect::<Vec<_>>()
        .join("\n\n");
    if combined.is_empty() {
        "No additional context available.".to_string()
    } else {
        combined
    }
}
