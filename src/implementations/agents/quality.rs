use async_trait::async_trait;
use log::info;

use crate::errors::MiraResult;
use crate::implementations::agents::base::AgentCore;
use crate::implementations::repair::decode_with_repair;
use crate::implementations::templates::{params, QUALITY_EVALUATION, QUALITY_SYSTEM};
use crate::models::common::{bullet_list, PipelineStage};
use crate::models::quality::{QualityEvaluation, QualityInput, QualityOutput, RUBRIC_CRITERIA};
use crate::traits::agent::Agent;
use crate::traits::structured_output::DecodeTier;

/// Scores the enriched lesson against the rubric
pub struct QualityAgent {
    core: AgentCore,
}

impl QualityAgent {
    pub fn new(core: AgentCore) -> Self {
        Self { core }
    }
}

fn lesson_text(input: &QualityInput) -> String {
    let mut components: Vec<_> = input.components.iter().collect();
    components.sort_by_key(|c| c.order);
    components
        .iter()
        .map(|c| format!("## {}\n\n{}\n\n", c.component_type, c.content))
        .collect()
}

fn output_from(evaluation: QualityEvaluation, decode_tier: DecodeTier) -> QualityOutput {
    let evaluation = evaluation.clamped();
    QualityOutput {
        feedback: evaluation.feedback(),
        quality_score: evaluation.quality_score,
        evaluation,
        decode_tier,
    }
}

#[async_trait]
impl Agent for QualityAgent {
    type Input = QualityInput;
    type Output = QualityOutput;

    fn name(&self) -> &'static str {
        "QualityAssurance"
    }

    fn stage(&self) -> PipelineStage {
        PipelineStage::QualityReview
    }

    async fn process(&self, input: &QualityInput) -> MiraResult<QualityOutput> {
        let system = self.core.render(QUALITY_SYSTEM, &params([]))?;
        let prompt = self.core.render(
            QUALITY_EVALUATION,
            &params([
                ("subject", input.subject.clone()),
                ("topic", input.topic.clone()),
                ("grade", input.grade.clone()),
                ("objectives", bullet_list(&input.learning_objectives)),
                ("lesson", lesson_text(input)),
                ("criteria", RUBRIC_CRITERIA.join(", ")),
            ])
        )?;

        let raw = self.core.call_llm(self.stage(), &system, prompt).await;
        let decoded = decode_with_repair(&raw, || QualityEvaluation::default_for(&input.topic));
        let output = output_from(decoded.value, decoded.tier);
        info!("Lesson quality score: {}/10 ({} feedback items)", output.quality_score, output.feedback.len());

        Ok(output)
    }

    fn fallback(&self, input: &QualityInput) -> QualityOutput {
        output_from(QualityEvaluation::default_for(&input.topic), DecodeTier::Default)
    }
}
