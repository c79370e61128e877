use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Speaker of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One message of a chat-completion conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }
}

/// Stages of the lesson pipeline, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Init,
    RetrieveContext,
    Curriculum,
    Content,
    Enrich,
    QualityReview,
    Refine,
    Finalize,
    Done,
    /// Stand-alone summarisation chain
    Summarize,
    /// Stand-alone exam paper generation
    ExamPaper,
}

impl PipelineStage {
    pub fn label(&self) -> &'static str {
        match self {
            PipelineStage::Init => "Initialization",
            PipelineStage::RetrieveContext => "Context Retrieval",
            PipelineStage::Curriculum => "Curriculum Analysis",
            PipelineStage::Content => "Content Creation",
            PipelineStage::Enrich => "Enrichment",
            PipelineStage::QualityReview => "Quality Assurance",
            PipelineStage::Refine => "Refinement",
            PipelineStage::Finalize => "Finalization",
            PipelineStage::Done => "Completion",
            PipelineStage::Summarize => "Summarization",
            PipelineStage::ExamPaper => "Exam Paper Generation",
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Flavour of the enrichment stage, selected statically at construction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrichmentFocus {
    /// Worked numerical problems and application questions
    NumericalProblems,
    /// Problem-solving frameworks and critical-thinking exercises
    ProblemSolving,
}

impl EnrichmentFocus {
    pub fn strategies_label(&self) -> &'static str {
        match self {
            EnrichmentFocus::NumericalProblems => "Numerical Problem-Solving Strategies",
            EnrichmentFocus::ProblemSolving => "Problem-Solving Techniques",
        }
    }

    pub fn assessment_label(&self) -> &'static str {
        match self {
            EnrichmentFocus::NumericalProblems => "Numerical Assessment",
            EnrichmentFocus::ProblemSolving => "Problem-Based Assessment",
        }
    }

    /// Suffix used to pick the focus-specific prompt templates
    pub fn template_suffix(&self) -> &'static str {
        match self {
            EnrichmentFocus::NumericalProblems => "numerical",
            EnrichmentFocus::ProblemSolving => "problem_solving",
        }
    }
}

impl std::str::FromStr for EnrichmentFocus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "numerical" | "numerical_problems" => Ok(EnrichmentFocus::NumericalProblems),
            "problem_solving" | "problemsolving" => Ok(EnrichmentFocus::ProblemSolving),
            other => Err(format!("Unknown enrichment focus: {}", other)),
        }
    }
}

/// Value of the `source_type` metadata field in the fixed collections
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceType {
    Curriculum,
    Ncert,
    QuestionBank,
}

impl SourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Curriculum => "curriculum",
            SourceType::Ncert => "ncert",
            SourceType::QuestionBank => "question_bank",
        }
    }
}

/// Format items as a markdown bullet list
pub fn bullet_list(items: &[String]) -> String {
    items
        .iter()
        .map(|item| format!("- {}", item))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format items as a numbered list
pub fn numbered_list(items: &[String]) -> String {
    items
        .iter()
        .enumerate()
        .map(|(i, item)| format!("{}. {}", i + 1, item))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Accepts a string, or renders arrays/objects into text. Models often return
/// a list of paragraphs where a single text block was requested.
pub fn flexible_text<'de, D>(deserializer: D) -> Result<String, D::Error>
    where D: Deserializer<'de>
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(value_to_text(&value))
}

fn value_to_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => String::new(),
        serde_json::Value::Array(items) =>
            items
                .iter()
                .map(value_to_text)
                .filter(|s| !s.trim().is_empty())
                .collect::<Vec<_>>()
                .join("\n\n"),
        serde_json::Value::Object(map) =>
            map
                .iter()
                .map(|(key, v)| format!("**{}:** {}", key, value_to_text(v)))
                .collect::<Vec<_>>()
                .join("\n"),
        other => other.to_string(),
    }
}
