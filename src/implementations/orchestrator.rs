use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use log::{debug, info};

use crate::config::MiraConfig;
use crate::errors::{ErrorSeverity, MiraError, MiraResult, RecoverableError};
use crate::implementations::agents::{
    AgentCore,
    ContentAgent,
    CurriculumAgent,
    EnrichmentAgent,
    QualityAgent,
    RefinementAgent,
    RetrievalBinding,
};
use crate::implementations::memory_retrieval::NoopRetrieval;
use crate::implementations::templates::PromptTemplates;
use crate::implementations::text_splitter::TextSplitter;
use crate::models::artifact::{Artifact, ArtifactMetadata, Component};
use crate::models::common::{EnrichmentFocus, PipelineStage, SourceType};
use crate::models::content::ContentInput;
use crate::models::curriculum::{CurriculumAnalysis, CurriculumInput, LessonRequest};
use crate::models::enrichment::EnrichmentInput;
use crate::models::quality::{QualityInput, RefinementInput};
use crate::models::retrieval::{MetadataFilter, RetrievalResult, RetrievedChunk};
use crate::models::run_log::{PipelineRun, RunLog};
use crate::traits::agent::Agent;
use crate::traits::llm_gateway::LlmGateway;
use crate::traits::retrieval_provider::RetrievalProvider;

/// Shared flag checked between pipeline stages
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Collection name for an ingested source document, stable per text
pub fn source_collection_name(text: &str) -> String {
    let mut hasher = DefaultHasher::new();
    text.hash(&mut hasher);
    format!("source_{:016x}", hasher.finish())
}

/// Composes the agents of a pipeline from configuration. Whether the QA and
/// refinement pair runs is fixed here, not decided per run.
pub struct PipelineBuilder {
    config: MiraConfig,
    gateway: Arc<dyn LlmGateway>,
    retrieval: Arc<dyn RetrievalProvider>,
    cancellation: Option<CancellationFlag>,
}

impl PipelineBuilder {
    pub fn new(config: MiraConfig, gateway: Arc<dyn LlmGateway>) -> Self {
        Self {
            config,
            gateway,
            retrieval: Arc::new(NoopRetrieval),
            cancellation: None,
        }
    }

    pub fn with_retrieval(mut self, retrieval: Arc<dyn RetrievalProvider>) -> Self {
        self.retrieval = retrieval;
        self
    }

    pub fn with_quality_review(mut self, enabled: bool) -> Self {
        self.config.pipeline.quality_review = enabled;
        self
    }

    pub fn with_enrichment_focus(mut self, focus: EnrichmentFocus) -> Self {
        self.config.pipeline.enrichment_focus = focus;
        self
    }

    pub fn with_cancellation(mut self, flag: CancellationFlag) -> Self {
        self.cancellation = Some(flag);
        self
    }

    pub fn build(self) -> MiraResult<PipelineOrchestrator> {
        self.config.validate()?;

        let options = &self.config.pipeline;
        let retrieval = &self.config.retrieval;
        let templates = Arc::new(PromptTemplates::with_overrides(&self.config.prompt_templates));

        let core = |temperature: f32| {
            AgentCore::new(self.gateway.clone(), templates.clone(), &options.model)
                .with_temperature(temperature)
                .with_max_tokens(options.max_tokens)
                .with_llm_timeout(options.llm_timeout())
        };
        let binding = |collection: &str, source_type: SourceType, k: usize| RetrievalBinding {
            provider: self.retrieval.clone(),
            collection: collection.to_string(),
            source_type,
            k,
            timeout: options.retrieval_timeout(),
        };

        let curriculum = CurriculumAgent::new(
            core(options.curriculum_temperature).with_retrieval(
                binding(&retrieval.curriculum_collection, SourceType::Curriculum, retrieval.curriculum_k)
            )
        );
        let content = ContentAgent::new(
            core(options.content_temperature).with_retrieval(
                binding(&retrieval.content_collection, SourceType::Ncert, retrieval.content_k)
            )
        );
        let enrichment = EnrichmentAgent::new(
            core(options.enrichment_temperature).with_retrieval(
                binding(&retrieval.question_bank_collection, SourceType::QuestionBank, retrieval.question_bank_k)
            ),
            options.enrichment_focus
        ).with_concurrency(options.enrichment_concurrency);

        let review = if options.quality_review {
            Some((
                QualityAgent::new(core(options.quality_temperature)),
                RefinementAgent::new(core(options.refinement_temperature))
                    .with_concurrency(options.enrichment_concurrency),
            ))
        } else {
            None
        };

        let splitter = TextSplitter::new(retrieval.chunk_size, retrieval.chunk_overlap)?;

        info!(
            "Built lesson pipeline: focus={:?}, quality_review={}, retrieval={}",
            options.enrichment_focus,
            options.quality_review,
            self.retrieval.name()
        );

        Ok(PipelineOrchestrator {
            curriculum,
            content,
            enrichment,
            review,
            retrieval: self.retrieval.clone(),
            splitter,
            source_k: retrieval.source_k,
            retrieval_timeout: options.retrieval_timeout(),
            cancellation: self.cancellation.clone(),
        })
    }
}

/// Runs the fixed stage sequence
/// INIT → RETRIEVE_CONTEXT → CURRICULUM → CONTENT → ENRICH → [QA → REFINE] → FINALIZE → DONE.
///
/// Stages run strictly in order. A recoverable stage failure is logged and the
/// agent's fallback output is used instead, so a run with valid inputs always
/// ends in an artifact. Only configuration errors and cancellation escape.
pub struct PipelineOrchestrator {
    curriculum: CurriculumAgent,
    content: ContentAgent,
    enrichment: EnrichmentAgent,
    review: Option<(QualityAgent, RefinementAgent)>,
    retrieval: Arc<dyn RetrievalProvider>,
    splitter: TextSplitter,
    source_k: usize,
    retrieval_timeout: Duration,
    cancellation: Option<CancellationFlag>,
}

impl PipelineOrchestrator {
    pub fn has_quality_review(&self) -> bool {
        self.review.is_some()
    }

    /// Run the pipeline and return only the artifact
    pub async fn run(&self, request: LessonRequest) -> MiraResult<Artifact> {
        Ok(self.run_with_report(request).await?.artifact)
    }

    /// Run the pipeline and return the artifact with the run's log
    pub async fn run_with_report(&self, request: LessonRequest) -> MiraResult<PipelineRun> {
        let request = request.validated()?;
        let mut log = RunLog::default();

        log.progress(
            PipelineStage::Init,
            format!("Starting lesson on {} in {} for grade {}", request.topic, request.subject, request.grade)
        );

        self.checkpoint(PipelineStage::RetrieveContext)?;
        let source_context = self.source_context(&request, &mut log).await;

        self.checkpoint(PipelineStage::Curriculum)?;
        log.progress(PipelineStage::Curriculum, "Analyzing curriculum requirements");
        let curriculum_input = CurriculumInput::from_request(&request, &source_context);
        let curriculum = run_stage(&self.curriculum, &curriculum_input, &mut log).await?;
        if curriculum.decode_tier.is_degraded() {
            log.degraded(PipelineStage::Curriculum);
        }
        let analysis = curriculum.analysis;

        self.checkpoint(PipelineStage::Content)?;
        log.progress(PipelineStage::Content, "Creating lesson content");
        let content_input = ContentInput::from_analysis(&request, &analysis, &source_context);
        let content = run_stage(&self.content, &content_input, &mut log).await?;
        if content.decode_tier.is_degraded() {
            log.degraded(PipelineStage::Content);
        }

        self.checkpoint(PipelineStage::Enrich)?;
        log.progress(
            PipelineStage::Enrich,
            format!("Enriching {} components ({:?})", content.components.len(), self.enrichment.focus())
        );
        let enrichment_input = EnrichmentInput::from_content(
            &request,
            &analysis,
            content.components,
            &source_context
        );
        let enriched = run_stage(&self.enrichment, &enrichment_input, &mut log).await?;
        if enriched.failed_transforms > 0 {
            log.error(
                PipelineStage::Enrich,
                format!("{} component transforms kept their original content", enriched.failed_transforms),
                ErrorSeverity::Warning
            );
        }

        let mut components = enriched.components;
        let mut quality_score = None;
        let mut feedback = Vec::new();

        if let Some((quality, refinement)) = &self.review {
            self.checkpoint(PipelineStage::QualityReview)?;
            log.progress(PipelineStage::QualityReview, "Evaluating lesson quality");
            let quality_input = QualityInput {
                subject: request.subject.clone(),
                topic: request.topic.clone(),
                grade: request.grade.clone(),
                learning_objectives: analysis.learning_objectives.clone(),
                components: components.clone(),
            };
            let review = run_stage(quality, &quality_input, &mut log).await?;
            if review.decode_tier.is_degraded() {
                log.degraded(PipelineStage::QualityReview);
            }

            self.checkpoint(PipelineStage::Refine)?;
            log.progress(
                PipelineStage::Refine,
                format!("Refining components against {} feedback items", review.feedback.len())
            );
            let refinement_input = RefinementInput {
                subject: request.subject.clone(),
                topic: request.topic.clone(),
                grade: request.grade.clone(),
                learning_objectives: analysis.learning_objectives.clone(),
                components,
                feedback: review.feedback.clone(),
            };
            components = run_stage(refinement, &refinement_input, &mut log).await?.components;
            quality_score = Some(review.quality_score);
            feedback = review.feedback;
        }

        self.checkpoint(PipelineStage::Finalize)?;
        log.progress(PipelineStage::Finalize, "Assembling final lesson");
        let mut artifact = assemble(&request, &analysis, components);
        artifact.quality_score = quality_score;
        artifact.feedback = feedback;

        log.progress(
            PipelineStage::Done,
            format!("Lesson generated with {} components", artifact.components.len())
        );

        Ok(PipelineRun { artifact, log })
    }

    fn checkpoint(&self, next: PipelineStage) -> MiraResult<()> {
        match &self.cancellation {
            Some(flag) if flag.is_cancelled() => Err(MiraError::Cancelled { stage: next.label().to_string() }),
            _ => Ok(()),
        }
    }

    /// Ingest the request's source document and retrieve the chunks most
    /// relevant to the request. Indexing completes before the search starts.
    async fn source_context(&self, request: &LessonRequest, log: &mut RunLog) -> String {
        if request.source_context.trim().is_empty() {
            log.progress(PipelineStage::RetrieveContext, "No source document provided");
            return String::new();
        }

        let chunks = self.splitter.split_into_chunks(&request.source_context, "request");
        let collection = source_collection_name(&request.source_context);
        log.progress(
            PipelineStage::RetrieveContext,
            format!("Indexing {} source chunks into {}", chunks.len(), collection)
        );

        let leading = RetrievalResult { chunks: leading_chunks(&chunks, self.source_k) };
        let indexed = tokio::time::timeout(self.retrieval_timeout, self.retrieval.index(&collection, chunks)).await;

        let result = match indexed {
            Ok(Ok(count)) if count > 0 => {
                debug!("Indexed {} chunks, searching {}", count, collection);
                let query = request.search_query();
                let filter = MetadataFilter::new();
                let search = self.retrieval.search(&collection, &query, self.source_k, &filter);
                match tokio::time::timeout(self.retrieval_timeout, search).await {
                    Ok(found) if !found.is_empty() => found,
                    Ok(_) => leading,
                    Err(_) => {
                        log.error(PipelineStage::RetrieveContext, "Source search timed out", ErrorSeverity::Warning);
                        leading
                    }
                }
            }
            Ok(Ok(_)) => {
                debug!("Provider {} does not index, using leading chunks", self.retrieval.name());
                leading
            }
            Ok(Err(e)) => {
                log.error(PipelineStage::RetrieveContext, format!("Indexing failed: {}", e), e.severity());
                leading
            }
            Err(_) => {
                log.error(PipelineStage::RetrieveContext, "Indexing timed out", ErrorSeverity::Warning);
                leading
            }
        };

        // the source collection lives for this run only
        match tokio::time::timeout(self.retrieval_timeout, self.retrieval.drop_collection(&collection)).await {
            Ok(Ok(())) => debug!("Dropped source collection {}", collection),
            Ok(Err(e)) => {
                log.error(PipelineStage::RetrieveContext, format!("Dropping {} failed: {}", collection, e), e.severity())
            }
            Err(_) => {
                log.error(
                    PipelineStage::RetrieveContext,
                    format!("Dropping {} timed out", collection),
                    ErrorSeverity::Warning
                )
            }
        }

        log.progress(
            PipelineStage::RetrieveContext,
            format!("Using {} source chunks as context", result.len())
        );
        result.joined()
    }
}

/// Run one agent, substituting its fallback output for recoverable failures
pub(crate) async fn run_stage<A: Agent>(agent: &A, input: &A::Input, log: &mut RunLog) -> MiraResult<A::Output> {
    match agent.process(input).await {
        Ok(output) => Ok(output),
        Err(e) if e.is_recoverable() => {
            log.error(agent.stage(), format!("{} failed: {}", agent.name(), e), e.severity());
            log.degraded(agent.stage());
            Ok(agent.fallback(input))
        }
        Err(e) => Err(e),
    }
}

fn leading_chunks(chunks: &[RetrievedChunk], k: usize) -> Vec<RetrievedChunk> {
    chunks.iter().take(k).cloned().collect()
}

/// Build the artifact from the final components and the curriculum analysis
fn assemble(request: &LessonRequest, analysis: &CurriculumAnalysis, components: Vec<Component>) -> Artifact {
    let mut metadata = ArtifactMetadata::new(
        &request.subject,
        &request.grade,
        &request.topic,
        request.subtopic_list()
    );
    metadata.learning_objectives = analysis.learning_objectives.clone();
    metadata.standards_alignment = analysis.standards_alignment.clone();
    metadata.prerequisites = analysis.prerequisites.clone();
    metadata.target_skills = analysis.essential_skills.clone();

    Artifact::new(request.title(), metadata, components)
}
