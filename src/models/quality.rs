use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::artifact::Component;
use crate::traits::structured_output::{DecodeTier, StructuredOutput};

/// Rubric dimensions the quality agent scores
pub const RUBRIC_CRITERIA: [&str; 8] = [
    "concept_clarity",
    "problem_exposure",
    "step_by_step_learning",
    "real_world_relevance",
    "confidence_building",
    "exam_preparation",
    "fear_reduction",
    "curriculum_compliance",
];

/// Input record of the quality review stage
#[derive(Debug, Clone, PartialEq)]
pub struct QualityInput {
    pub subject: String,
    pub topic: String,
    pub grade: String,
    pub learning_objectives: Vec<String>,
    pub components: Vec<Component>,
}

/// Score for one rubric dimension
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RubricScore {
    pub score: f64,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default, alias = "gaps")]
    pub areas_for_improvement: Vec<String>,
    #[serde(default)]
    pub recommendations: Vec<String>,
}

impl RubricScore {
    pub fn neutral() -> Self {
        Self {
            score: 3.0,
            strengths: Vec::new(),
            areas_for_improvement: Vec::new(),
            recommendations: Vec::new(),
        }
    }
}

/// Full evaluation: named rubric dimensions plus an aggregate score. Top-level
/// keys that do not decode as a rubric score are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawEvaluation")]
pub struct QualityEvaluation {
    #[serde(default)]
    pub overall_summary: String,
    pub quality_score: f64,
    #[serde(flatten)]
    pub criteria: BTreeMap<String, RubricScore>,
}

#[derive(Deserialize)]
struct RawEvaluation {
    #[serde(default)]
    overall_summary: String,
    quality_score: f64,
    #[serde(flatten)]
    rest: BTreeMap<String, Value>,
}

impl From<RawEvaluation> for QualityEvaluation {
    fn from(raw: RawEvaluation) -> Self {
        let criteria = raw.rest
            .into_iter()
            .filter_map(|(name, value)| {
                serde_json::from_value::<RubricScore>(value).ok().map(|rubric| (name, rubric))
            })
            .collect();
        Self {
            overall_summary: raw.overall_summary,
            quality_score: raw.quality_score,
            criteria,
        }
    }
}

impl QualityEvaluation {
    pub fn default_for(topic: &str) -> Self {
        Self {
            overall_summary: format!("Basic evaluation of {} lesson", topic),
            quality_score: 6.0,
            criteria: RUBRIC_CRITERIA.iter()
                .map(|name| (name.to_string(), RubricScore::neutral()))
                .collect(),
        }
    }

    /// Clamps rubric scores to 1..=5 and the aggregate to 1..=10
    pub fn clamped(mut self) -> Self {
        self.quality_score = self.quality_score.clamp(1.0, 10.0);
        for rubric in self.criteria.values_mut() {
            rubric.score = rubric.score.clamp(1.0, 5.0);
        }
        self
    }

    /// Feedback lines `"<Criterion Title>: <recommendation>"` then `"Overall: <summary>"`
    pub fn feedback(&self) -> Vec<String> {
        let mut feedback: Vec<String> = self.criteria
            .iter()
            .flat_map(|(name, rubric)| {
                let title = title_case(name);
                rubric.recommendations
                    .iter()
                    .map(move |rec| format!("{}: {}", title, rec))
            })
            .collect();
        if !self.overall_summary.trim().is_empty() {
            feedback.push(format!("Overall: {}", self.overall_summary));
        }
        feedback
    }
}

impl StructuredOutput for QualityEvaluation {
    const SCHEMA: &'static str = "quality evaluation";

    fn validate(&self) -> Result<(), String> {
        if !(6..=8).contains(&self.criteria.len()) {
            return Err(format!("expected 6 to 8 rubric criteria, found {}", self.criteria.len()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct QualityOutput {
    pub evaluation: QualityEvaluation,
    pub feedback: Vec<String>,
    pub quality_score: f64,
    pub decode_tier: DecodeTier,
}

/// Input record of the refinement stage
#[derive(Debug, Clone, PartialEq)]
pub struct RefinementInput {
    pub subject: String,
    pub topic: String,
    pub grade: String,
    pub learning_objectives: Vec<String>,
    pub components: Vec<Component>,
    pub feedback: Vec<String>,
}

impl RefinementInput {
    /// Feedback lines that mention a component type, case-insensitively
    pub fn feedback_for(&self, component_type: &str) -> Vec<String> {
        let needle = component_type.to_lowercase();
        self.feedback
            .iter()
            .filter(|item| item.to_lowercase().contains(&needle))
            .cloned()
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RefinementOutput {
    pub components: Vec<Component>,
    pub refined: usize,
}

fn title_case(snake: &str) -> String {
    snake
        .split('_')
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
