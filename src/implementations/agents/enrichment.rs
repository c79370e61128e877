use async_trait::async_trait;
use futures_util::stream::{self, StreamExt};
use log::{info, warn};

use crate::errors::MiraResult;
use crate::implementations::agents::base::{combine_context, AgentCore};
use crate::implementations::templates::{
    enrichment_template,
    params,
    ENRICHMENT_SYSTEM,
    ENRICH_ASSESSMENT,
    ENRICH_COMPONENT,
    ENRICH_STRATEGIES,
};
use crate::models::artifact::Component;
use crate::models::common::{bullet_list, EnrichmentFocus, PipelineStage};
use crate::models::enrichment::{EnrichmentInput, EnrichmentOutput};
use crate::traits::agent::Agent;

pub const STRATEGIES_ORDER: i32 = 6;
pub const ASSESSMENT_ORDER: i32 = 7;

/// Rewrites every component with worked problems, then appends a strategies
/// and an assessment component. Per-component rewrites run concurrently up
/// to `concurrency` at a time; results keep input order.
pub struct EnrichmentAgent {
    core: AgentCore,
    focus: EnrichmentFocus,
    concurrency: usize,
}

impl EnrichmentAgent {
    pub fn new(core: AgentCore, focus: EnrichmentFocus) -> Self {
        Self { core, focus, concurrency: 4 }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn focus(&self) -> EnrichmentFocus {
        self.focus
    }

    fn base_params(&self, input: &EnrichmentInput, context: &str) -> Vec<(&'static str, String)> {
        vec![
            ("subject", input.subject.clone()),
            ("topic", input.topic.clone()),
            ("subtopics", input.subtopics.clone()),
            ("grade", input.grade.clone()),
            ("objectives", bullet_list(&input.learning_objectives)),
            ("context", context.to_string())
        ]
    }

    /// Returns `None` when the rewrite produced nothing usable
    async fn transform(
        &self,
        system: &str,
        component: &Component,
        input: &EnrichmentInput,
        context: &str
    ) -> Option<Component> {
        let mut values = self.base_params(input, context);
        values.push(("component_type", component.component_type.to_lowercase()));
        values.push(("content", component.content.clone()));
        let template = enrichment_template(ENRICH_COMPONENT, self.focus);
        let prompt = match self.core.render(&template, &to_map(values)) {
            Ok(prompt) => prompt,
            Err(e) => {
                warn!("Could not build enrichment prompt for {}: {}", component.component_type, e);
                return None;
            }
        };

        let enriched = self.core.call_llm(self.stage(), system, prompt).await;
        if enriched.trim().is_empty() {
            None
        } else {
            Some(component.with_content(enriched))
        }
    }

    async fn appended(
        &self,
        system: &str,
        template: &str,
        label: &str,
        order: i32,
        input: &EnrichmentInput,
        context: &str
    ) -> Component {
        let values = to_map(self.base_params(input, context));
        let content = match self.core.render(&enrichment_template(template, self.focus), &values) {
            Ok(prompt) => self.core.call_llm(self.stage(), system, prompt).await,
            Err(e) => {
                warn!("Could not build {} prompt: {}", label, e);
                String::new()
            }
        };

        if content.trim().is_empty() {
            warn!("No content generated for {}, using default", label);
            Component::new(label, default_appended(label, &input.topic), order)
        } else {
            Component::new(label, content, order)
        }
    }

    fn appended_defaults(&self, topic: &str) -> [Component; 2] {
        let strategies = self.focus.strategies_label();
        let assessment = self.focus.assessment_label();
        [
            Component::new(strategies, default_appended(strategies, topic), STRATEGIES_ORDER),
            Component::new(assessment, default_appended(assessment, topic), ASSESSMENT_ORDER),
        ]
    }
}

fn to_map(values: Vec<(&'static str, String)>) -> std::collections::HashMap<String, String> {
    values
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}

fn default_appended(label: &str, topic: &str) -> String {
    format!("{} for {}", label, topic)
}

#[async_trait]
impl Agent for EnrichmentAgent {
    type Input = EnrichmentInput;
    type Output = EnrichmentOutput;

    fn name(&self) -> &'static str {
        match self.focus {
            EnrichmentFocus::NumericalProblems => "PedagogyExpert",
            EnrichmentFocus::ProblemSolving => "ProblemSolvingExpert",
        }
    }

    fn stage(&self) -> PipelineStage {
        PipelineStage::Enrich
    }

    async fn process(&self, input: &EnrichmentInput) -> MiraResult<EnrichmentOutput> {
        let query = format!("{} {} {}", input.subject, input.topic, input.subtopics);
        let retrieved = self.core.retrieve_context(query.trim(), &input.grade, &input.subject).await;
        let context = combine_context(
            &[
                ("Question bank context", retrieved.as_str()),
                ("Source document context", input.context.as_str()),
            ]
        );
        let system = self.core.render(&enrichment_template(ENRICHMENT_SYSTEM, self.focus), &params([]))?;

        let transforms: Vec<_> = input.components
            .iter()
            .map(|component| self.transform(&system, component, input, &context))
            .collect();
        let results: Vec<Option<Component>> = stream
            ::iter(transforms)
            .buffered(self.concurrency)
            .collect().await;

        let mut failed_transforms = 0;
        let mut components: Vec<Component> = input.components
            .iter()
            .zip(results)
            .map(|(original, enriched)| {
                enriched.unwrap_or_else(|| {
                    warn!("Enrichment of {} failed, keeping original content", original.component_type);
                    failed_transforms += 1;
                    original.clone()
                })
            })
            .collect();

        let (strategies, assessment) = tokio::join!(
            self.appended(
                &system,
                ENRICH_STRATEGIES,
                self.focus.strategies_label(),
                STRATEGIES_ORDER,
                input,
                &context
            ),
            self.appended(
                &system,
                ENRICH_ASSESSMENT,
                self.focus.assessment_label(),
                ASSESSMENT_ORDER,
                input,
                &context
            )
        );
        components.push(strategies);
        components.push(assessment);

        info!(
            "{} enriched {} of {} components",
            self.name(),
            input.components.len() - failed_transforms,
            input.components.len()
        );

        Ok(EnrichmentOutput { components, failed_transforms })
    }

    fn fallback(&self, input: &EnrichmentInput) -> EnrichmentOutput {
        let mut components = input.components.clone();
        components.extend(self.appended_defaults(&input.topic));
        EnrichmentOutput {
            components,
            failed_transforms: input.components.len(),
        }
    }
}
