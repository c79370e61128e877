use async_trait::async_trait;
use futures_util::stream::{self, StreamExt};
use log::{debug, info, warn};

use crate::errors::MiraResult;
use crate::implementations::agents::base::AgentCore;
use crate::implementations::templates::{params, REFINEMENT_SYSTEM, REFINE_COMPONENT};
use crate::models::artifact::Component;
use crate::models::common::{bullet_list, PipelineStage};
use crate::models::quality::{RefinementInput, RefinementOutput};
use crate::traits::agent::Agent;

/// Rewrites the components the quality feedback mentions by type.
/// Components no feedback line refers to are returned untouched.
pub struct RefinementAgent {
    core: AgentCore,
    concurrency: usize,
}

impl RefinementAgent {
    pub fn new(core: AgentCore) -> Self {
        Self { core, concurrency: 4 }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    async fn refine(&self, system: &str, component: &Component, input: &RefinementInput) -> Option<Component> {
        let specific = input.feedback_for(&component.component_type);
        if specific.is_empty() {
            debug!("No feedback mentions {}, keeping it", component.component_type);
            return None;
        }

        let prompt = self.core.render(
            REFINE_COMPONENT,
            &params([
                ("component_type", component.component_type.to_lowercase()),
                ("subject", input.subject.clone()),
                ("topic", input.topic.clone()),
                ("grade", input.grade.clone()),
                ("objectives", bullet_list(&input.learning_objectives)),
                ("content", component.content.clone()),
                ("feedback", bullet_list(&input.feedback)),
                ("component_feedback", bullet_list(&specific)),
            ])
        );
        let prompt = match prompt {
            Ok(prompt) => prompt,
            Err(e) => {
                warn!("Could not build refinement prompt for {}: {}", component.component_type, e);
                return None;
            }
        };

        let refined = self.core.call_llm(self.stage(), system, prompt).await;
        if refined.trim().is_empty() {
            warn!("Refinement of {} returned nothing, keeping original", component.component_type);
            None
        } else {
            Some(component.with_content(refined))
        }
    }
}

#[async_trait]
impl Agent for RefinementAgent {
    type Input = RefinementInput;
    type Output = RefinementOutput;

    fn name(&self) -> &'static str {
        "Refinement"
    }

    fn stage(&self) -> PipelineStage {
        PipelineStage::Refine
    }

    async fn process(&self, input: &RefinementInput) -> MiraResult<RefinementOutput> {
        let system = self.core.render(REFINEMENT_SYSTEM, &params([]))?;

        let refinements: Vec<_> = input.components
            .iter()
            .map(|component| self.refine(&system, component, input))
            .collect();
        let results: Vec<Option<Component>> = stream
            ::iter(refinements)
            .buffered(self.concurrency)
            .collect().await;

        let mut refined = 0;
        let components = input.components
            .iter()
            .zip(results)
            .map(|(original, result)| match result {
                Some(component) => {
                    refined += 1;
                    component
                }
                None => original.clone(),
            })
            .collect();

        info!("{} refined {} of {} components", self.name(), refined, input.components.len());
        Ok(RefinementOutput { components, refined })
    }

    fn fallback(&self, input: &RefinementInput) -> RefinementOutput {
        RefinementOutput {
            components: input.components.clone(),
            refined: 0,
        }
    }
}
