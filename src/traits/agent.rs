use async_trait::async_trait;

use crate::errors::MiraResult;
use crate::models::common::PipelineStage;

/// A unit of work wrapping one persona and its LLM calls behind a typed
/// input/output contract.
///
/// `process` degrades malformed or empty model output to defaults itself; an
/// `Err` means something unexpected happened at the stage level, and the
/// orchestrator then substitutes `fallback` for the whole stage.
#[async_trait]
pub trait Agent: Send + Sync {
    type Input: Send + Sync;
    type Output: Send;

    /// Human readable agent name
    fn name(&self) -> &'static str;

    /// Pipeline stage this agent backs
    fn stage(&self) -> PipelineStage;

    async fn process(&self, input: &Self::Input) -> MiraResult<Self::Output>;

    /// Minimal well-formed output built without any model call
    fn fallback(&self, input: &Self::Input) -> Self::Output;
}
