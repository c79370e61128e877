pub mod models;
pub mod traits;
pub mod errors;
pub mod config;
pub mod implementations;
#[cfg(test)]
pub mod tests;

// Re-export core components
pub use config::{MiraConfig, PipelineOptions, RetrievalOptions};
pub use errors::{ErrorSeverity, MiraError, MiraResult, RecoverableError};
pub use implementations::{
    CancellationFlag,
    ExamPaperGenerator,
    InMemoryRetrieval,
    NoopRetrieval,
    OpenAiGateway,
    PipelineBuilder,
    PipelineOrchestrator,
    PromptTemplates,
    Summarizer,
    TextSplitter,
};
pub use models::{
    common::{ChatMessage, EnrichmentFocus, PipelineStage, Role},
    artifact::{Artifact, ArtifactMetadata, Component},
    curriculum::{CurriculumAnalysis, LessonRequest},
    retrieval::{MetadataFilter, RetrievalResult, RetrievedChunk},
    summary::SummaryRequest,
    exam::{Difficulty, ExamPaper, ExamRequest, QuestionDistribution, QuestionType, TopicValidation},
    run_log::{PipelineRun, RunLog},
};
pub use traits::{
    Agent,
    ChannelTraceSink,
    CompletionRequest,
    DecodeTier,
    LlmGateway,
    LogTraceSink,
    RetrievalProvider,
    StructuredOutput,
    TraceRecord,
    TraceSink,
};
