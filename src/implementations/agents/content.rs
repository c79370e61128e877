use async_trait::async_trait;

use crate::errors::MiraResult;
use crate::implementations::agents::base::{combine_context, AgentCore};
use crate::implementations::repair::decode_with_repair;
use crate::implementations::templates::{params, CONTENT_CREATION, CONTENT_SYSTEM};
use crate::models::common::{bullet_list, PipelineStage};
use crate::models::content::{ContentBlocks, ContentInput, ContentOutput};
use crate::traits::agent::Agent;
use crate::traits::structured_output::DecodeTier;

/// Writes the five base lesson blocks
pub struct ContentAgent {
    core: AgentCore,
}

impl ContentAgent {
    pub fn new(core: AgentCore) -> Self {
        Self { core }
    }
}

#[async_trait]
impl Agent for ContentAgent {
    type Input = ContentInput;
    type Output = ContentOutput;

    fn name(&self) -> &'static str {
        "ContentCreator"
    }

    fn stage(&self) -> PipelineStage {
        PipelineStage::Content
    }

    async fn process(&self, input: &ContentInput) -> MiraResult<ContentOutput> {
        let query = format!("{} {} {}", input.subject, input.topic, input.subtopics);
        let retrieved = self.core.retrieve_context(query.trim(), &input.grade, &input.subject).await;
        let context = combine_context(
            &[
                ("Textbook context", retrieved.as_str()),
                ("Source document context", input.context.as_str()),
            ]
        );

        let system = self.core.render(CONTENT_SYSTEM, &params([]))?;
        let prompt = self.core.render(
            CONTENT_CREATION,
            &params([
                ("subject", input.subject.clone()),
                ("topic", input.topic.clone()),
                ("subtopics", input.subtopics.clone()),
                ("grade", input.grade.clone()),
                ("objectives", bullet_list(&input.learning_objectives)),
                ("concepts", bullet_list(&input.key_concepts)),
                ("sequence", bullet_list(&input.sequence)),
                ("context", context),
            ])
        )?;

        let raw = self.core.call_llm(self.stage(), &system, prompt).await;
        let decoded = decode_with_repair(&raw, || ContentBlocks::default_for(&input.topic));

        Ok(ContentOutput {
            components: decoded.value.fill_blank(&input.topic).into_components(),
            decode_tier: decoded.tier,
        })
    }

    fn fallback(&self, input: &ContentInput) -> ContentOutput {
        ContentOutput {
            components: ContentBlocks::default_for(&input.topic).into_components(),
            decode_tier: DecodeTier::Default,
        }
    }
}
