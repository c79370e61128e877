use std::sync::Arc;

use log::{info, warn};

use crate::config::PipelineOptions;
use crate::errors::MiraResult;
use crate::implementations::agents::AgentCore;
use crate::implementations::templates::{
    params,
    PromptTemplates,
    SUMMARY_EXAMPLES,
    SUMMARY_FORMAT,
    SUMMARY_TOPICS,
};
use crate::models::artifact::{Artifact, ArtifactMetadata, Component};
use crate::models::common::{ChatMessage, PipelineStage};
use crate::models::summary::{SummaryOutput, SummaryRequest};
use crate::traits::llm_gateway::LlmGateway;

const EXTRACT_MAX_TOKENS: usize = 1500;
const FORMAT_MAX_TOKENS: usize = 3000;

/// Three-call summarisation chain: topics and terminology, then examples and
/// problems (both from the source text), then a pedagogical formatter over
/// the two intermediate results.
pub struct Summarizer {
    extractor: AgentCore,
    formatter: AgentCore,
}

impl Summarizer {
    pub fn new(gateway: Arc<dyn LlmGateway>, templates: Arc<PromptTemplates>, options: &PipelineOptions) -> Self {
        let core = AgentCore::new(gateway, templates, &options.model)
            .with_temperature(options.summary_temperature)
            .with_llm_timeout(options.llm_timeout());
        Self {
            extractor: core.clone().with_max_tokens(EXTRACT_MAX_TOKENS),
            formatter: core.with_max_tokens(FORMAT_MAX_TOKENS),
        }
    }

    /// Summary artifact with a single "Summary" component
    pub async fn summarize(&self, request: SummaryRequest) -> MiraResult<Artifact> {
        let request = request.validated()?;
        let output = self.summarize_parts(&request).await?;

        let title = format!("{} - {} Summary for {}", request.topic, request.subject, request.grade);
        let metadata = ArtifactMetadata::new(&request.subject, &request.grade, &request.topic, Vec::new());
        Ok(Artifact::new(title, metadata, vec![Component::new("Summary", output.summary, 1)]))
    }

    /// All three texts of the chain; `request` must already be validated
    pub async fn summarize_parts(&self, request: &SummaryRequest) -> MiraResult<SummaryOutput> {
        info!("Summarising {} characters of {} material", request.text.len(), request.subject);

        let topics_prompt = self.extractor.render(SUMMARY_TOPICS, &params([("text", request.text.clone())]))?;
        let examples_prompt = self.extractor.render(SUMMARY_EXAMPLES, &params([("text", request.text.clone())]))?;

        let (topics, examples) = tokio::join!(
            self.extractor.call_messages(PipelineStage::Summarize, vec![ChatMessage::system(topics_prompt)]),
            self.extractor.call_messages(PipelineStage::Summarize, vec![ChatMessage::system(examples_prompt)])
        );

        let topics = if topics.trim().is_empty() {
            warn!("Topic extraction returned nothing, using default");
            format!("- **{}**", request.topic)
        } else {
            topics
        };
        let examples = if examples.trim().is_empty() {
            warn!("Example extraction returned nothing, using default");
            "No worked examples were found in the material.".to_string()
        } else {
            examples
        };

        let format_prompt = self.formatter.render(
            SUMMARY_FORMAT,
            &params([
                ("grade", request.grade.clone()),
                ("subject", request.subject.clone()),
                ("topics", topics.clone()),
                ("examples", examples.clone()),
            ])
        )?;
        let summary = self.formatter
            .call_messages(PipelineStage::Summarize, vec![ChatMessage::system(format_prompt)]).await;

        let summary = if summary.trim().is_empty() {
            warn!("Summary formatting returned nothing, assembling from extracted parts");
            format!("### Topics and Terminology\n\n{}\n\n### Examples and Problems\n\n{}", topics, examples)
        } else {
            summary
        };

        Ok(SummaryOutput {
            topics_and_terminology: topics,
            examples_and_problems: examples,
            summary,
        })
    }
}
