//! Scripted collaborators shared by the test modules

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::config::MiraConfig;
use crate::errors::MiraResult;
use crate::implementations::agents::AgentCore;
use crate::implementations::memory_retrieval::InMemoryRetrieval;
use crate::implementations::templates::PromptTemplates;
use crate::models::common::PipelineStage;
use crate::models::retrieval::{MetadataFilter, RetrievalResult, RetrievedChunk};
use crate::traits::llm_gateway::{CompletionRequest, LlmGateway};
use crate::traits::retrieval_provider::RetrievalProvider;

pub const CURRICULUM_JSON: &str = r#"{
    "learning_objectives": ["Solve quadratic equations by factorisation", "Apply the quadratic formula"],
    "key_concepts": ["Standard form", "Discriminant", "Roots"],
    "essential_skills": ["Factorising trinomials", "Completing the square"],
    "standards_alignment": ["CBSE Class 10 Chapter 4"],
    "prerequisites": ["Linear equations", "Polynomials"],
    "scope": "Solving quadratic equations in one variable",
    "sequence": ["Standard form", "Factorisation", "Quadratic formula", "Nature of roots"],
    "potential_misconceptions": ["Dividing both sides by x loses a root"]
}"#;

pub const CONTENT_JSON: &str = r#"{
    "introduction": "A quadratic equation has the form ax^2 + bx + c = 0.",
    "core_content": "Roots can be found by factorisation or with the quadratic formula.",
    "examples": "Solve x^2 - 5x + 6 = 0. Factorising gives (x - 2)(x - 3) = 0.",
    "practice_activities": "Solve 2x^2 + x - 6 = 0.",
    "summary": "The discriminant b^2 - 4ac decides the nature of the roots."
}"#;

pub const QUALITY_JSON: &str = r#"{
    "overall_summary": "Solid lesson overall",
    "quality_score": 8.5,
    "concept_clarity": {"score": 4, "strengths": ["Clear definitions"], "areas_for_improvement": [], "recommendations": []},
    "problem_exposure": {"score": 3, "strengths": [], "areas_for_improvement": ["Too few problems"], "recommendations": ["Add more solved examples"]},
    "step_by_step_learning": {"score": 4, "strengths": [], "areas_for_improvement": [], "recommendations": []},
    "real_world_relevance": {"score": 3, "strengths": [], "areas_for_improvement": [], "recommendations": []},
    "confidence_building": {"score": 4, "strengths": [], "areas_for_improvement": [], "recommendations": []},
    "exam_preparation": {"score": 5, "strengths": [], "areas_for_improvement": [], "recommendations": []},
    "fear_reduction": {"score": 4, "strengths": [], "areas_for_improvement": [], "recommendations": []},
    "curriculum_compliance": {"score": 5, "strengths": [], "areas_for_improvement": [], "recommendations": []}
}"#;

/// Prompt fragment unique to the enrichment rewrite of the examples component
pub const ENRICH_EXAMPLES_MARKER: &str = "following examples for";

/// Gateway that answers from a script instead of a model.
///
/// Responses are looked up by prompt fragment first, then by stage. Anything
/// unscripted, and any prompt containing a failure fragment, gets `""`.
#[derive(Default)]
pub struct ScriptedGateway {
    by_prompt: Vec<(String, String)>,
    by_stage: HashMap<PipelineStage, String>,
    failures: Vec<String>,
    delay: Option<Duration>,
    delays_by_prompt: Vec<(String, Duration)>,
    calls: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedGateway {
    /// Answers every call with an empty string
    pub fn silent() -> Self {
        Self::default()
    }

    /// Valid curriculum and content JSON, and `Enriched content` for every enrichment call
    pub fn lesson() -> Self {
        Self::default()
            .respond(PipelineStage::Curriculum, CURRICULUM_JSON)
            .respond(PipelineStage::Content, CONTENT_JSON)
            .respond(PipelineStage::Enrich, "Enriched content")
    }

    pub fn respond(mut self, stage: PipelineStage, response: &str) -> Self {
        self.by_stage.insert(stage, response.to_string());
        self
    }

    pub fn respond_when(mut self, fragment: &str, response: &str) -> Self {
        self.by_prompt.push((fragment.to_string(), response.to_string()));
        self
    }

    pub fn fail_when(mut self, fragment: &str) -> Self {
        self.failures.push(fragment.to_string());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Delays only prompts containing `fragment`, on top of any uniform delay
    pub fn delay_when(mut self, fragment: &str, delay: Duration) -> Self {
        self.delays_by_prompt.push((fragment.to_string(), delay));
        self
    }

    pub fn calls(&self) -> Vec<CompletionRequest> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls_for(&self, stage: PipelineStage) -> Vec<CompletionRequest> {
        self.calls()
            .into_iter()
            .filter(|call| call.stage == stage)
            .collect()
    }
}

#[async_trait]
impl LlmGateway for ScriptedGateway {
    async fn complete(&self, request: CompletionRequest) -> String {
        self.calls.lock().unwrap().push(request.clone());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let prompt = request.prompt();
        if let Some((_, delay)) = self.delays_by_prompt.iter().find(|(fragment, _)| prompt.contains(fragment.as_str())) {
            tokio::time::sleep(*delay).await;
        }
        if self.failures.iter().any(|fragment| prompt.contains(fragment.as_str())) {
            return String::new();
        }
        if let Some((_, response)) = self.by_prompt.iter().find(|(fragment, _)| prompt.contains(fragment.as_str())) {
            return response.clone();
        }
        self.by_stage.get(&request.stage).cloned().unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RetrievalEvent {
    Index {
        collection: String,
        count: usize,
    },
    Search {
        collection: String,
        query: String,
        k: usize,
        filter: MetadataFilter,
    },
    Drop {
        collection: String,
    },
}

/// In-memory retrieval that records every call in order
#[derive(Default)]
pub struct RecordingRetrieval {
    inner: InMemoryRetrieval,
    indexing: bool,
    events: Mutex<Vec<RetrievalEvent>>,
}

impl RecordingRetrieval {
    pub fn new() -> Self {
        Self { indexing: true, ..Default::default() }
    }

    pub fn with_collections(collections: HashMap<String, Vec<RetrievedChunk>>) -> Self {
        Self {
            inner: InMemoryRetrieval::from_collections(collections),
            indexing: true,
            events: Mutex::new(Vec::new()),
        }
    }

    /// Reports 0 from `index` like a read-only backend
    pub fn read_only(mut self) -> Self {
        self.indexing = false;
        self
    }

    pub async fn collection_len(&self, collection: &str) -> usize {
        self.inner.collection_len(collection).await
    }

    pub fn events(&self) -> Vec<RetrievalEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn searches(&self) -> Vec<RetrievalEvent> {
        self.events()
            .into_iter()
            .filter(|event| matches!(event, RetrievalEvent::Search { .. }))
            .collect()
    }

    pub fn search_for(&self, collection: &str) -> Option<RetrievalEvent> {
        self.searches()
            .into_iter()
            .find(|event| matches!(event, RetrievalEvent::Search { collection: c, .. } if c == collection))
    }
}

#[async_trait]
impl RetrievalProvider for RecordingRetrieval {
    async fn search(
        &self,
        collection: &str,
        query: &str,
        k: usize,
        filter: &MetadataFilter
    ) -> RetrievalResult {
        self.events.lock().unwrap().push(RetrievalEvent::Search {
            collection: collection.to_string(),
            query: query.to_string(),
            k,
            filter: filter.clone(),
        });
        self.inner.search(collection, query, k, filter).await
    }

    async fn index(&self, collection: &str, chunks: Vec<RetrievedChunk>) -> MiraResult<usize> {
        let count = if self.indexing { self.inner.index(collection, chunks).await? } else { 0 };
        self.events.lock().unwrap().push(RetrievalEvent::Index {
            collection: collection.to_string(),
            count,
        });
        Ok(count)
    }

    async fn drop_collection(&self, collection: &str) -> MiraResult<()> {
        self.inner.drop_collection(collection).await?;
        self.events.lock().unwrap().push(RetrievalEvent::Drop { collection: collection.to_string() });
        Ok(())
    }

    fn name(&self) -> &str {
        "recording"
    }
}

/// Provider whose every call outlasts any sensible timeout
pub struct StalledRetrieval {
    pub stall: Duration,
}

#[async_trait]
impl RetrievalProvider for StalledRetrieval {
    async fn search(
        &self,
        _collection: &str,
        _query: &str,
        _k: usize,
        _filter: &MetadataFilter
    ) -> RetrievalResult {
        tokio::time::sleep(self.stall).await;
        RetrievalResult::empty()
    }

    async fn index(&self, _collection: &str, chunks: Vec<RetrievedChunk>) -> MiraResult<usize> {
        tokio::time::sleep(self.stall).await;
        Ok(chunks.len())
    }

    fn name(&self) -> &str {
        "stalled"
    }
}

/// Curriculum, content and question bank collections for mathematics, class 10
pub fn maths_corpus() -> HashMap<String, Vec<RetrievedChunk>> {
    let chunk = |text: &str, source_type: &str| {
        RetrievedChunk::new(text)
            .with_metadata("source_type", source_type)
            .with_metadata("class", "10")
            .with_metadata("subject", "Mathematics")
    };
    HashMap::from([
        (
            "curriculum".to_string(),
            vec![chunk("Quadratic Equations: standard form, solution by factorisation and formula.", "curriculum")],
        ),
        (
            "content".to_string(),
            vec![chunk("NCERT: the roots of a quadratic equation are the zeroes of the polynomial.", "ncert")],
        ),
        (
            "question_bank".to_string(),
            vec![chunk("Find the roots of the quadratic equation 2x^2 - 7x + 3 = 0.", "question_bank")],
        ),
    ])
}

pub fn agent_core(gateway: Arc<dyn LlmGateway>) -> AgentCore {
    AgentCore::new(gateway, Arc::new(PromptTemplates::default()), &MiraConfig::default().pipeline.model)
}
