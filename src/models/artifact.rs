use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::MiraResult;

/// Descriptive metadata of an artifact. Subject, grade and topic come from the
/// request; everything else is filled once from the curriculum analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactMetadata {
    pub subject: String,
    pub grade_level: String,
    pub topic: String,
    #[serde(default)]
    pub subtopics: Vec<String>,
    #[serde(default)]
    pub learning_objectives: Vec<String>,
    #[serde(default)]
    pub standards_alignment: Vec<String>,
    #[serde(default)]
    pub prerequisites: Vec<String>,
    #[serde(default)]
    pub target_skills: Vec<String>,
    #[serde(default = "default_difficulty")]
    pub difficulty_level: String,
    #[serde(default = "default_duration")]
    pub estimated_duration: String,
}

fn default_difficulty() -> String {
    "intermediate".to_string()
}

fn default_duration() -> String {
    "45 minutes".to_string()
}

impl ArtifactMetadata {
    pub fn new(subject: &str, grade_level: &str, topic: &str, subtopics: Vec<String>) -> Self {
        Self {
            subject: subject.to_string(),
            grade_level: grade_level.to_string(),
            topic: topic.to_string(),
            subtopics,
            learning_objectives: Vec::new(),
            standards_alignment: Vec::new(),
            prerequisites: Vec::new(),
            target_skills: Vec::new(),
            difficulty_level: default_difficulty(),
            estimated_duration: default_duration(),
        }
    }
}

/// One labelled, ordered content block of an artifact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    pub component_type: String,
    pub content: String,
    pub order: i32,
    #[serde(default)]
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl Component {
    pub fn new(component_type: impl Into<String>, content: impl Into<String>, order: i32) -> Self {
        Self {
            component_type: component_type.into(),
            content: content.into(),
            order,
            metadata: BTreeMap::new(),
        }
    }

    /// Same type, order and metadata with replaced content
    pub fn with_content(&self, content: impl Into<String>) -> Self {
        Self {
            component_type: self.component_type.clone(),
            content: content.into(),
            order: self.order,
            metadata: self.metadata.clone(),
        }
    }
}

/// The produced document: metadata plus ordered components
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    pub title: String,
    pub metadata: ArtifactMetadata,
    pub components: Vec<Component>,
    pub version: String,
    pub created_at: DateTime<Utc>,
    pub quality_score: Option<f64>,
    #[serde(default)]
    pub feedback: Vec<String>,
}

impl Artifact {
    pub fn new(title: String, metadata: ArtifactMetadata, components: Vec<Component>) -> Self {
        Self {
            title,
            metadata,
            components,
            version: "1.0".to_string(),
            created_at: Utc::now(),
            quality_score: None,
            feedback: Vec::new(),
        }
    }

    /// Components sorted ascending by `order`; ties keep insertion order
    pub fn sorted_components(&self) -> Vec<&Component> {
        let mut components: Vec<&Component> = self.components.iter().collect();
        components.sort_by_key(|c| c.order);
        components
    }

    /// Human-readable rendering
    pub fn to_markdown(&self) -> String {
        let meta = &self.metadata;
        let mut md = format!("# {}\n\n", self.title);

        md.push_str("## Metadata\n\n");
        md.push_str(&format!("- **Subject:** {}\n", meta.subject));
        md.push_str(&format!("- **Grade Level:** {}\n", meta.grade_level));
        md.push_str(&format!("- **Topic:** {}\n", meta.topic));
        if !meta.subtopics.is_empty() {
            md.push_str(&format!("- **Subtopics:** {}\n", meta.subtopics.join(", ")));
        }
        md.push_str(&format!("- **Difficulty Level:** {}\n", meta.difficulty_level));
        md.push_str(&format!("- **Estimated Duration:** {}\n", meta.estimated_duration));
        if let Some(score) = self.quality_score {
            md.push_str(&format!("- **Quality Score:** {}/10\n", score));
        }
        md.push('\n');

        md.push_str("### Learning Objectives\n\n");
        for (i, objective) in meta.learning_objectives.iter().enumerate() {
            md.push_str(&format!("{}. {}\n", i + 1, objective));
        }
        md.push('\n');

        if !meta.standards_alignment.is_empty() {
            md.push_str("### Standards Alignment\n\n");
            for standard in &meta.standards_alignment {
                md.push_str(&format!("- {}\n", standard));
            }
            md.push('\n');
        }

        if !meta.prerequisites.is_empty() {
            md.push_str("### Prerequisites\n\n");
            for prereq in &meta.prerequisites {
                md.push_str(&format!("- {}\n", prereq));
            }
            md.push('\n');
        }

        for component in self.sorted_components() {
            md.push_str(&format!("## {}\n\n{}\n\n", component.component_type, component.content));
        }

        md
    }

    /// Machine-readable rendering; `from_json` reverses it field for field
    pub fn to_json(&self) -> MiraResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> MiraResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
