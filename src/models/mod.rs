pub mod common;
pub mod artifact;
pub mod curriculum;
pub mod content;
pub mod enrichment;
pub mod quality;
pub mod retrieval;
pub mod summary;
pub mod exam;
pub mod run_log;

// Re-export common model types
pub use common::{ChatMessage, EnrichmentFocus, PipelineStage, Role, SourceType};
pub use artifact::{Artifact, ArtifactMetadata, Component};
pub use curriculum::{CurriculumAnalysis, CurriculumInput, CurriculumOutput, LessonRequest};
pub use content::{ContentBlocks, ContentInput, ContentOutput};
pub use enrichment::{EnrichmentInput, EnrichmentOutput};
pub use quality::{
    QualityEvaluation,
    QualityInput,
    QualityOutput,
    RefinementInput,
    RefinementOutput,
    RubricScore,
};
pub use retrieval::{MetadataFilter, RetrievalResult, RetrievedChunk};
pub use summary::{SummaryOutput, SummaryRequest};
pub use exam::{Difficulty, ExamPaper, ExamRequest, QuestionDistribution, QuestionType, TopicValidation};
pub use run_log::{PipelineRun, ProgressRecord, RunLog, StageErrorRecord};
