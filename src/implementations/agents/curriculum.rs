use async_trait::async_trait;
use log::info;

use crate::errors::MiraResult;
use crate::implementations::agents::base::{combine_context, AgentCore};
use crate::implementations::repair::decode_with_repair;
use crate::implementations::templates::{params, CURRICULUM_ANALYSIS, CURRICULUM_SYSTEM};
use crate::models::common::PipelineStage;
use crate::models::curriculum::{CurriculumAnalysis, CurriculumInput, CurriculumOutput};
use crate::traits::agent::Agent;
use crate::traits::structured_output::DecodeTier;

/// Turns the request into a structured curriculum analysis
pub struct CurriculumAgent {
    core: AgentCore,
}

impl CurriculumAgent {
    pub fn new(core: AgentCore) -> Self {
        Self { core }
    }
}

#[async_trait]
impl Agent for CurriculumAgent {
    type Input = CurriculumInput;
    type Output = CurriculumOutput;

    fn name(&self) -> &'static str {
        "CurriculumExpert"
    }

    fn stage(&self) -> PipelineStage {
        PipelineStage::Curriculum
    }

    async fn process(&self, input: &CurriculumInput) -> MiraResult<CurriculumOutput> {
        let query = format!("{} {} {}", input.subject, input.topic, input.subtopics);
        let retrieved = self.core.retrieve_context(query.trim(), &input.grade, &input.subject).await;
        let context = combine_context(
            &[
                ("Curriculum database context", retrieved.as_str()),
                ("Source document context", input.context.as_str()),
            ]
        );

        let system = self.core.render(CURRICULUM_SYSTEM, &params([]))?;
        let prompt = self.core.render(
            CURRICULUM_ANALYSIS,
            &params([
                ("subject", input.subject.clone()),
                ("topic", input.topic.clone()),
                ("subtopics", input.subtopics.clone()),
                ("grade", input.grade.clone()),
                ("special_requirements", input.special_requirements.clone()),
                ("context", context),
            ])
        )?;

        let raw = self.core.call_llm(self.stage(), &system, prompt).await;
        let decoded = decode_with_repair(&raw, || CurriculumAnalysis::default_for(&input.topic));
        info!(
            "{} produced {} learning objectives ({:?})",
            self.name(),
            decoded.value.learning_objectives.len(),
            decoded.tier
        );

        Ok(CurriculumOutput {
            analysis: decoded.value,
            decode_tier: decoded.tier,
        })
    }

    fn fallback(&self, input: &CurriculumInput) -> CurriculumOutput {
        CurriculumOutput {
            analysis: CurriculumAnalysis::default_for(&input.topic),
            decode_tier: DecodeTier::Default,
        }
    }
}
