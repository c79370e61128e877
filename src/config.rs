use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::implementations::config::{ConfigError, LlmApiConfig};
use crate::models::common::EnrichmentFocus;

/// Configuration for the Mira system. Constructed explicitly and handed to the
/// orchestrator; nothing here is read from process-wide state after construction.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct MiraConfig {
    pub llm: LlmApiConfig,
    pub pipeline: PipelineOptions,
    pub retrieval: RetrievalOptions,
    /// Prompt templates overriding the built-in ones by name
    pub prompt_templates: HashMap<String, String>,
}

/// Options for the lesson pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineOptions {
    pub model: String,
    pub max_tokens: usize,
    pub curriculum_temperature: f32,
    pub content_temperature: f32,
    pub enrichment_temperature: f32,
    pub quality_temperature: f32,
    pub refinement_temperature: f32,
    pub summary_temperature: f32,
    pub exam_temperature: f32,
    pub enrichment_focus: EnrichmentFocus,
    /// Adds the QA and refinement stages after enrichment
    pub quality_review: bool,
    /// Upper bound on concurrent per-component enrichment calls
    pub enrichment_concurrency: usize,
    pub llm_timeout_secs: u64,
    pub retrieval_timeout_secs: u64,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            max_tokens: 4000,
            curriculum_temperature: 0.1,
            content_temperature: 0.3,
            enrichment_temperature: 0.2,
            quality_temperature: 0.1,
            refinement_temperature: 0.3,
            summary_temperature: 0.2,
            exam_temperature: 0.3,
            enrichment_focus: EnrichmentFocus::NumericalProblems,
            quality_review: false,
            enrichment_concurrency: 4,
            llm_timeout_secs: 120,
            retrieval_timeout_secs: 30,
        }
    }
}

impl PipelineOptions {
    pub fn llm_timeout(&self) -> Duration {
        Duration::from_secs(self.llm_timeout_secs.max(1))
    }

    pub fn retrieval_timeout(&self) -> Duration {
        Duration::from_secs(self.retrieval_timeout_secs.max(1))
    }
}

/// Collections and sizes used for retrieval-augmented context
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalOptions {
    pub curriculum_collection: String,
    pub content_collection: String,
    pub question_bank_collection: String,
    pub curriculum_k: usize,
    pub content_k: usize,
    pub question_bank_k: usize,
    pub source_k: usize,
    /// Curriculum chunks consulted when validating an exam topic
    pub exam_validation_k: usize,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for RetrievalOptions {
    fn default() -> Self {
        Self {
            curriculum_collection: "curriculum".to_string(),
            content_collection: "content".to_string(),
            question_bank_collection: "question_bank".to_string(),
            curriculum_k: 5,
            content_k: 5,
            question_bank_k: 3,
            source_k: 5,
            exam_validation_k: 3,
            chunk_size: 500,
            chunk_overlap: 50,
        }
    }
}

impl MiraConfig {
    /// Load configuration from a YAML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config: MiraConfig = serde_yaml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the pipeline cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        let temperatures = [
            ("curriculum_temperature", self.pipeline.curriculum_temperature),
            ("content_temperature", self.pipeline.content_temperature),
            ("enrichment_temperature", self.pipeline.enrichment_temperature),
            ("quality_temperature", self.pipeline.quality_temperature),
            ("refinement_temperature", self.pipeline.refinement_temperature),
            ("summary_temperature", self.pipeline.summary_temperature),
            ("exam_temperature", self.pipeline.exam_temperature),
        ];
        for (field, value) in temperatures {
            if !(0.0..=2.0).contains(&value) {
                return Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    message: format!("{} is outside [0, 2]", value),
                });
            }
        }

        if self.pipeline.max_tokens == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_tokens".to_string(),
                message: "must be positive".to_string(),
            });
        }

        if self.retrieval.chunk_size == 0 || self.retrieval.chunk_overlap >= self.retrieval.chunk_size {
            return Err(ConfigError::InvalidValue {
                field: "chunk_overlap".to_string(),
                message: "chunk_size must be positive and larger than chunk_overlap".to_string(),
            });
        }

        Ok(())
    }
}
