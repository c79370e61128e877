pub mod llm_gateway;
pub mod retrieval_provider;
pub mod agent;
pub mod trace_sink;
pub mod structured_output;

// Re-export traits
pub use llm_gateway::{CompletionRequest, LlmGateway};
pub use retrieval_provider::RetrievalProvider;
pub use agent::Agent;
pub use trace_sink::{ChannelTraceSink, LogTraceSink, TraceRecord, TraceSink};
pub use structured_output::{DecodeTier, StructuredOutput};
