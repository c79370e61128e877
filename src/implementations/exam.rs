use std::sync::Arc;

use futures_util::stream::{self, StreamExt};
use log::{info, warn};

use crate::config::MiraConfig;
use crate::errors::{ErrorSeverity, MiraResult};
use crate::implementations::agents::{AgentCore, RetrievalBinding};
use crate::implementations::repair::{decode_with_repair, Decoded};
use crate::implementations::templates::{
    exam_section_template,
    params,
    PromptTemplates,
    EXAM_DEFAULT_HEADER,
    EXAM_DISTRIBUTION,
    EXAM_HEADER,
    EXAM_VALIDATION,
};
use crate::models::artifact::{Artifact, ArtifactMetadata, Component};
use crate::models::common::{PipelineStage, SourceType};
use crate::models::exam::{ExamPaper, ExamRequest, QuestionDistribution, QuestionType, TopicValidation};
use crate::models::run_log::RunLog;
use crate::traits::llm_gateway::LlmGateway;
use crate::traits::retrieval_provider::RetrievalProvider;
use crate::traits::structured_output::DecodeTier;

const STAGE: PipelineStage = PipelineStage::ExamPaper;

pub const HEADER_COMPONENT: &str = "Paper Header";

/// Builds an exam paper: checks the topic against the curriculum and plans
/// the question mix, then writes the header and one section per requested
/// question type. Every model call has a default, so a valid request always
/// yields a paper.
pub struct ExamPaperGenerator {
    validator: AgentCore,
    writer: AgentCore,
    concurrency: usize,
}

impl ExamPaperGenerator {
    pub fn new(
        config: &MiraConfig,
        gateway: Arc<dyn LlmGateway>,
        retrieval: Arc<dyn RetrievalProvider>
    ) -> MiraResult<Self> {
        config.validate()?;
        let options = &config.pipeline;
        let templates = Arc::new(PromptTemplates::with_overrides(&config.prompt_templates));

        let writer = AgentCore::new(gateway, templates, &options.model)
            .with_temperature(options.exam_temperature)
            .with_max_tokens(options.max_tokens)
            .with_llm_timeout(options.llm_timeout());
        let validator = writer.clone().with_retrieval(RetrievalBinding {
            provider: retrieval,
            collection: config.retrieval.curriculum_collection.clone(),
            source_type: SourceType::Curriculum,
            k: config.retrieval.exam_validation_k,
            timeout: options.retrieval_timeout(),
        });

        Ok(Self {
            validator,
            writer,
            concurrency: options.enrichment_concurrency.max(1),
        })
    }

    pub async fn generate(&self, request: ExamRequest) -> MiraResult<ExamPaper> {
        let request = request.validated()?;
        let mut log = RunLog::default();
        log.progress(
            STAGE,
            format!(
                "Starting {} minute paper on {} in {} for grade {}",
                request.duration_minutes,
                request.topic,
                request.subject,
                request.grade
            )
        );

        let (validation, distribution) = tokio::join!(self.validate_topic(&request), self.plan(&request));

        if validation.tier.is_degraded() {
            log.degraded(STAGE);
        }
        let validation = validation.value;
        if !validation.valid || !validation.curriculum_aligned {
            log.error(
                STAGE,
                format!("{} may not be part of the grade {} curriculum: {}", request.topic, request.grade, validation.suggestion),
                ErrorSeverity::Warning
            );
        }

        if distribution.tier.is_degraded() {
            log.degraded(STAGE);
        }
        let mut distribution = distribution.value.restricted_to(&request.question_types);
        if distribution.total() == 0 {
            warn!("Planned distribution has no requested question types, using default");
            distribution = QuestionDistribution::default().restricted_to(&request.question_types);
        }

        let sections: Vec<QuestionType> = QuestionType::ALL.into_iter()
            .filter(|t| distribution.count(*t) > 0)
            .collect();
        log.progress(
            STAGE,
            format!("Writing {} sections for {} planned questions", sections.len(), distribution.total())
        );

        let writes: Vec<_> = sections
            .iter()
            .map(|question_type| self.write_section(*question_type, distribution.count(*question_type), &request))
            .collect();
        let (header, written) = tokio::join!(
            self.write_header(&request),
            stream::iter(writes).buffered(self.concurrency).collect::<Vec<_>>()
        );

        let defaulted = written
            .iter()
            .filter(|(_, generated)| !generated)
            .count();
        if defaulted > 0 {
            log.error(STAGE, format!("{} sections used default questions", defaulted), ErrorSeverity::Warning);
            log.degraded(STAGE);
        }

        let mut components = vec![Component::new(HEADER_COMPONENT, header, 1)];
        for (position, (question_type, (content, _))) in sections.iter().zip(written).enumerate() {
            let mut component = Component::new(question_type.section_title(), content, (position as i32) + 2);
            component.metadata.insert("question_type".to_string(), question_type.as_str().into());
            component.metadata.insert("planned_questions".to_string(), distribution.count(*question_type).into());
            components.push(component);
        }

        let mut metadata = ArtifactMetadata::new(&request.subject, &request.grade, &request.topic, Vec::new());
        metadata.difficulty_level = request.difficulty.to_string();
        metadata.estimated_duration = format!("{} minutes", request.duration_minutes);

        let mut artifact = Artifact::new(request.title(), metadata, components);
        if !validation.curriculum_aligned && !validation.suggestion.trim().is_empty() {
            artifact.feedback.push(format!("Curriculum: {}", validation.suggestion.trim()));
        }

        log.progress(STAGE, format!("Exam paper generated with {} components", artifact.components.len()));
        Ok(ExamPaper { artifact, validation, distribution, log })
    }

    /// Never fails; an unusable answer counts as a valid topic
    pub async fn validate_topic(&self, request: &ExamRequest) -> Decoded<TopicValidation> {
        let query = format!("{} {} {}", request.grade, request.subject, request.topic);
        let context = self.validator.retrieve_context(&query, &request.grade, &request.subject).await;
        let context = if context.trim().is_empty() {
            "No curriculum context available.".to_string()
        } else {
            context
        };

        let system = match self.validator.render(EXAM_VALIDATION, &params([("context", context)])) {
            Ok(system) => system,
            Err(e) => {
                warn!("Could not build validation prompt: {}", e);
                return Decoded { value: TopicValidation::assumed(), tier: DecodeTier::Default };
            }
        };
        let user = format!("Grade: {}, Subject: {}, Topic: {}", request.grade, request.subject, request.topic);
        let raw = self.validator.call_llm(STAGE, &system, user).await;
        decode_with_repair(&raw, TopicValidation::assumed)
    }

    /// Question counts per type; the default plan when the answer is unusable
    pub async fn plan(&self, request: &ExamRequest) -> Decoded<QuestionDistribution> {
        let values = params([
            ("duration", request.duration_minutes.to_string()),
            ("total_marks", request.total_marks.to_string()),
            ("question_types", request.type_list()),
            ("grade", request.grade.clone()),
            ("subject", request.subject.clone()),
        ]);
        let system = match self.writer.render(EXAM_DISTRIBUTION, &values) {
            Ok(system) => system,
            Err(e) => {
                warn!("Could not build distribution prompt: {}", e);
                return Decoded { value: QuestionDistribution::default(), tier: DecodeTier::Default };
            }
        };
        let user = format!(
            "Calculate question distribution for {} minutes, {} marks, types: {}",
            request.duration_minutes,
            request.total_marks,
            request.type_list()
        );
        let raw = self.writer.call_llm(STAGE, &system, user).await;
        decode_with_repair(&raw, QuestionDistribution::default)
    }

    async fn write_header(&self, request: &ExamRequest) -> String {
        let values = params([
            ("grade", request.grade.clone()),
            ("subject", request.subject.clone()),
            ("subject_upper", request.subject.to_uppercase()),
            ("topic", request.topic.clone()),
            ("duration", request.duration_minutes.to_string()),
            ("total_marks", request.total_marks.to_string()),
        ]);

        let header = match self.writer.render(EXAM_HEADER, &values) {
            Ok(system) => {
                let user = format!(
                    "Create header for Grade {} {} exam on {}",
                    request.grade,
                    request.subject,
                    request.topic
                );
                self.writer.call_llm(STAGE, &system, user).await
            }
            Err(e) => {
                warn!("Could not build header prompt: {}", e);
                String::new()
            }
        };
        if !header.trim().is_empty() {
            return header;
        }

        warn!("No header generated, using default");
        self.writer
            .render(EXAM_DEFAULT_HEADER, &values)
            .unwrap_or_else(|_| format!("CLASS {} - {}", request.grade, request.subject.to_uppercase()))
    }

    /// Section text and whether the model wrote it
    async fn write_section(&self, question_type: QuestionType, count: u32, request: &ExamRequest) -> (String, bool) {
        let values = params([
            ("grade", request.grade.clone()),
            ("subject", request.subject.clone()),
            ("topic", request.topic.clone()),
            ("difficulty", request.difficulty.to_string()),
            ("duration", request.duration_minutes.to_string()),
            ("remarks", request.remarks().to_string()),
            ("count", count.to_string()),
        ]);

        let content = match self.writer.render(&exam_section_template(question_type), &values) {
            Ok(system) => {
                let user = format!(
                    "Create {} for {} for Grade {} {}",
                    question_type.request_phrase(),
                    request.topic,
                    request.grade,
                    request.subject
                );
                self.writer.call_llm(STAGE, &system, user).await
            }
            Err(e) => {
                warn!("Could not build {} prompt: {}", question_type, e);
                String::new()
            }
        };

        if content.trim().is_empty() {
            warn!("No {} generated, using default section", question_type.request_phrase());
            (default_section(question_type, count, request), false)
        } else {
            info!("Generated {} section", question_type);
            (content, true)
        }
    }
}

fn default_section(question_type: QuestionType, count: u32, request: &ExamRequest) -> String {
    format!(
        "{} {} on {} for grade {} ({} each) are to be added to this section.",
        count,
        question_type.request_phrase(),
        request.topic,
        request.grade,
        question_type.marks_each()
    )
}
