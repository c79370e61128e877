use serde::{Deserialize, Serialize};

use crate::models::artifact::Component;
use crate::models::common::flexible_text;
use crate::models::curriculum::{CurriculumAnalysis, LessonRequest};
use crate::traits::structured_output::{DecodeTier, StructuredOutput};

/// Input record of the content creation stage
#[derive(Debug, Clone, PartialEq)]
pub struct ContentInput {
    pub subject: String,
    pub topic: String,
    pub subtopics: String,
    pub grade: String,
    pub learning_objectives: Vec<String>,
    pub key_concepts: Vec<String>,
    pub sequence: Vec<String>,
    pub context: String,
}

impl ContentInput {
    pub fn from_analysis(request: &LessonRequest, analysis: &CurriculumAnalysis, context: &str) -> Self {
        Self {
            subject: request.subject.clone(),
            topic: request.topic.clone(),
            subtopics: request.subtopics.clone(),
            grade: request.grade.clone(),
            learning_objectives: analysis.learning_objectives.clone(),
            key_concepts: analysis.key_concepts.clone(),
            sequence: analysis.sequence.clone(),
            context: context.to_string(),
        }
    }
}

/// The five named content blocks the content agent asks for
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentBlocks {
    #[serde(deserialize_with = "flexible_text")]
    pub introduction: String,
    #[serde(deserialize_with = "flexible_text")]
    pub core_content: String,
    #[serde(deserialize_with = "flexible_text")]
    pub examples: String,
    #[serde(deserialize_with = "flexible_text")]
    pub practice_activities: String,
    #[serde(deserialize_with = "flexible_text")]
    pub summary: String,
}

impl ContentBlocks {
    pub fn default_for(topic: &str) -> Self {
        Self {
            introduction: format!("Introduction to {}", topic),
            core_content: format!("Explanation of {}", topic),
            examples: format!("Examples of {}", topic),
            practice_activities: format!("Practice activities for {}", topic),
            summary: format!("Summary of {}", topic),
        }
    }

    /// Replaces blank blocks with their per-block default
    pub fn fill_blank(mut self, topic: &str) -> Self {
        let defaults = Self::default_for(topic);
        let pairs = [
            (&mut self.introduction, defaults.introduction),
            (&mut self.core_content, defaults.core_content),
            (&mut self.examples, defaults.examples),
            (&mut self.practice_activities, defaults.practice_activities),
            (&mut self.summary, defaults.summary),
        ];
        for (block, default) in pairs {
            if block.trim().is_empty() {
                *block = default;
            }
        }
        self
    }

    /// Components at orders 1..=5 in block order
    pub fn into_components(self) -> Vec<Component> {
        vec![
            Component::new("Introduction", self.introduction, 1),
            Component::new("Core Content", self.core_content, 2),
            Component::new("Examples", self.examples, 3),
            Component::new("Practice Activities", self.practice_activities, 4),
            Component::new("Summary", self.summary, 5)
        ]
    }
}

impl StructuredOutput for ContentBlocks {
    const SCHEMA: &'static str = "content blocks";
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContentOutput {
    pub components: Vec<Component>,
    pub decode_tier: DecodeTier,
}
