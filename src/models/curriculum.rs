use serde::{Deserialize, Serialize};

use crate::errors::{MiraError, MiraResult};
use crate::traits::structured_output::{DecodeTier, StructuredOutput};

/// Top-level request for one lesson pipeline run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LessonRequest {
    pub subject: String,
    pub topic: String,
    pub grade: String,
    /// Comma-separated subtopics
    #[serde(default)]
    pub subtopics: String,
    #[serde(default)]
    pub special_requirements: String,
    /// Raw text of an optional source document
    #[serde(default)]
    pub source_context: String,
}

impl LessonRequest {
    pub fn new(subject: &str, topic: &str, grade: &str) -> Self {
        Self {
            subject: subject.to_string(),
            topic: topic.to_string(),
            grade: grade.to_string(),
            ..Default::default()
        }
    }

    pub fn with_subtopics(mut self, subtopics: &str) -> Self {
        self.subtopics = subtopics.to_string();
        self
    }

    pub fn with_special_requirements(mut self, requirements: &str) -> Self {
        self.special_requirements = requirements.to_string();
        self
    }

    pub fn with_source_context(mut self, text: &str) -> Self {
        self.source_context = text.to_string();
        self
    }

    /// Trims the required fields and rejects blank ones
    pub fn validated(mut self) -> MiraResult<Self> {
        for (field, value) in [
            ("subject", &mut self.subject),
            ("topic", &mut self.topic),
            ("grade", &mut self.grade),
        ] {
            let trimmed = value.trim().to_string();
            if trimmed.is_empty() {
                return Err(MiraError::Configuration(format!("{} is required", field)));
            }
            *value = trimmed;
        }
        Ok(self)
    }

    pub fn subtopic_list(&self) -> Vec<String> {
        self.subtopics
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }

    /// Query used against the per-request source collection
    pub fn search_query(&self) -> String {
        format!("{} {} {}", self.subject, self.topic, self.subtopics).trim().to_string()
    }

    pub fn title(&self) -> String {
        format!("{} - {} Lesson for {}", self.topic, self.subject, self.grade)
    }
}

/// Input record of the curriculum analysis stage
#[derive(Debug, Clone, PartialEq)]
pub struct CurriculumInput {
    pub subject: String,
    pub topic: String,
    pub subtopics: String,
    pub grade: String,
    pub special_requirements: String,
    /// Context retrieved from the source document, possibly empty
    pub context: String,
}

impl CurriculumInput {
    pub fn from_request(request: &LessonRequest, context: &str) -> Self {
        Self {
            subject: request.subject.clone(),
            topic: request.topic.clone(),
            subtopics: request.subtopics.clone(),
            grade: request.grade.clone(),
            special_requirements: request.special_requirements.clone(),
            context: context.to_string(),
        }
    }
}

/// Structured curriculum analysis. Every key is required when decoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurriculumAnalysis {
    pub learning_objectives: Vec<String>,
    pub key_concepts: Vec<String>,
    pub essential_skills: Vec<String>,
    pub standards_alignment: Vec<String>,
    pub prerequisites: Vec<String>,
    pub scope: String,
    pub sequence: Vec<String>,
    pub potential_misconceptions: Vec<String>,
}

impl CurriculumAnalysis {
    pub const KEYS: [&'static str; 8] = [
        "learning_objectives",
        "key_concepts",
        "essential_skills",
        "standards_alignment",
        "prerequisites",
        "scope",
        "sequence",
        "potential_misconceptions",
    ];

    /// Minimal analysis seeded only with the topic name
    pub fn default_for(topic: &str) -> Self {
        Self {
            learning_objectives: vec![format!("Understand {}", topic)],
            key_concepts: vec![topic.to_string()],
            essential_skills: vec![format!("Understanding of {}", topic)],
            standards_alignment: Vec::new(),
            prerequisites: Vec::new(),
            scope: format!("Single lesson on {}", topic),
            sequence: vec![topic.to_string()],
            potential_misconceptions: Vec::new(),
        }
    }
}

impl StructuredOutput for CurriculumAnalysis {
    const SCHEMA: &'static str = "curriculum analysis";
}

#[derive(Debug, Clone, PartialEq)]
pub struct CurriculumOutput {
    pub analysis: CurriculumAnalysis,
    pub decode_tier: DecodeTier,
}
