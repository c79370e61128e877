pub mod base;
pub mod curriculum;
pub mod content;
pub mod enrichment;
pub mod quality;
pub mod refinement;

pub use base::{combine_context, AgentCore, RetrievalBinding};
pub use curriculum::CurriculumAgent;
pub use content::ContentAgent;
pub use enrichment::{EnrichmentAgent, ASSESSMENT_ORDER, STRATEGIES_ORDER};
pub use quality::QualityAgent;
pub use refinement::RefinementAgent;
