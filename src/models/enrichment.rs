use crate::models::artifact::Component;
use crate::models::curriculum::{CurriculumAnalysis, LessonRequest};

/// Input record of the enrichment stage
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichmentInput {
    pub subject: String,
    pub topic: String,
    pub subtopics: String,
    pub grade: String,
    pub learning_objectives: Vec<String>,
    pub components: Vec<Component>,
    pub context: String,
}

impl EnrichmentInput {
    pub fn from_content(
        request: &LessonRequest,
        analysis: &CurriculumAnalysis,
        components: Vec<Component>,
        context: &str
    ) -> Self {
        Self {
            subject: request.subject.clone(),
            topic: request.topic.clone(),
            subtopics: request.subtopics.clone(),
            grade: request.grade.clone(),
            learning_objectives: analysis.learning_objectives.clone(),
            components,
            context: context.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnrichmentOutput {
    /// Transformed components in input order, then the appended ones
    pub components: Vec<Component>,
    /// Components whose transform failed and kept their original content
    pub failed_transforms: usize,
}
