pub mod config;
pub mod templates;
pub mod repair;
pub mod text_splitter;
pub mod openai_gateway;
pub mod memory_retrieval;
pub mod agents;
pub mod summarizer;
pub mod exam;
pub mod orchestrator;

pub use config::{ConfigError, LlmApiConfig};
pub use templates::PromptTemplates;
pub use repair::{decode_with_repair, Decoded};
pub use text_splitter::TextSplitter;
pub use openai_gateway::OpenAiGateway;
pub use memory_retrieval::{InMemoryRetrieval, NoopRetrieval};
pub use summarizer::Summarizer;
pub use exam::ExamPaperGenerator;
pub use orchestrator::{CancellationFlag, PipelineBuilder, PipelineOrchestrator};
