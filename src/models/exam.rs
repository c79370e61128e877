use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::{MiraError, MiraResult};
use crate::models::artifact::Artifact;
use crate::models::run_log::RunLog;
use crate::traits::structured_output::StructuredOutput;

/// Kinds of question an exam paper section can hold, in section order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    Mcq,
    ShortAnswer,
    LongAnswer,
    Numerical,
}

impl QuestionType {
    pub const ALL: [QuestionType; 4] = [
        QuestionType::Mcq,
        QuestionType::ShortAnswer,
        QuestionType::LongAnswer,
        QuestionType::Numerical,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionType::Mcq => "mcq",
            QuestionType::ShortAnswer => "short_answer",
            QuestionType::LongAnswer => "long_answer",
            QuestionType::Numerical => "numerical",
        }
    }

    /// Section heading, lettered by the fixed section order
    pub fn section_title(&self) -> &'static str {
        match self {
            QuestionType::Mcq => "Section A - Multiple Choice Questions",
            QuestionType::ShortAnswer => "Section B - Short Answer Questions",
            QuestionType::LongAnswer => "Section C - Long Answer Questions",
            QuestionType::Numerical => "Section D - Numerical Questions",
        }
    }

    /// Phrase used when asking for questions of this kind
    pub fn request_phrase(&self) -> &'static str {
        match self {
            QuestionType::Mcq => "MCQ questions",
            QuestionType::ShortAnswer => "short answer questions",
            QuestionType::LongAnswer => "long answer questions",
            QuestionType::Numerical => "numerical questions",
        }
    }

    pub fn marks_each(&self) -> &'static str {
        match self {
            QuestionType::Mcq => "1 mark",
            QuestionType::ShortAnswer => "2-3 marks",
            QuestionType::LongAnswer => "5-8 marks",
            QuestionType::Numerical => "3-5 marks",
        }
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuestionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['-', ' '], "_").as_str() {
            "mcq" | "multiple_choice" => Ok(QuestionType::Mcq),
            "short_answer" | "short" => Ok(QuestionType::ShortAnswer),
            "long_answer" | "long" => Ok(QuestionType::LongAnswer),
            "numerical" | "numeric" => Ok(QuestionType::Numerical),
            other => Err(format!("Unknown question type: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
    Mixed,
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
            Difficulty::Mixed => "mixed",
        };
        f.write_str(label)
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            "mixed" => Ok(Difficulty::Mixed),
            other => Err(format!("Unknown difficulty: {}", other)),
        }
    }
}

/// Request for one exam paper
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExamRequest {
    pub subject: String,
    pub topic: String,
    pub grade: String,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default = "default_question_types")]
    pub question_types: Vec<QuestionType>,
    #[serde(default = "default_duration")]
    pub duration_minutes: u32,
    #[serde(default = "default_total_marks")]
    pub total_marks: u32,
    #[serde(default)]
    pub special_remarks: String,
}

fn default_question_types() -> Vec<QuestionType> {
    vec![QuestionType::Mcq]
}

fn default_duration() -> u32 {
    60
}

fn default_total_marks() -> u32 {
    100
}

impl ExamRequest {
    pub fn new(subject: &str, topic: &str, grade: &str) -> Self {
        Self {
            subject: subject.to_string(),
            topic: topic.to_string(),
            grade: grade.to_string(),
            difficulty: Difficulty::default(),
            question_types: default_question_types(),
            duration_minutes: default_duration(),
            total_marks: default_total_marks(),
            special_remarks: String::new(),
        }
    }

    pub fn with_question_types(mut self, types: &[QuestionType]) -> Self {
        self.question_types = types.to_vec();
        self
    }

    pub fn with_difficulty(mut self, difficulty: Difficulty) -> Self {
        self.difficulty = difficulty;
        self
    }

    pub fn with_duration(mut self, minutes: u32) -> Self {
        self.duration_minutes = minutes;
        self
    }

    pub fn with_total_marks(mut self, marks: u32) -> Self {
        self.total_marks = marks;
        self
    }

    pub fn with_special_remarks(mut self, remarks: &str) -> Self {
        self.special_remarks = remarks.to_string();
        self
    }

    /// Trims the required fields, rejects blank or zero values and drops
    /// repeated question types
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
        if self.duration_minutes == 0 {
            return Err(MiraError::Configuration("duration must be positive".to_string()));
        }
        if self.total_marks == 0 {
            return Err(MiraError::Configuration("total marks must be positive".to_string()));
        }

        let mut types = Vec::with_capacity(self.question_types.len());
        for question_type in self.question_types {
            if !types.contains(&question_type) {
                types.push(question_type);
            }
        }
        if types.is_empty() {
            return Err(MiraError::Configuration("at least one question type is required".to_string()));
        }
        self.question_types = types;
        Ok(self)
    }

    pub fn title(&self) -> String {
        format!("{} - {} Exam Paper for {}", self.topic, self.subject, self.grade)
    }

    pub fn remarks(&self) -> &str {
        if self.special_remarks.trim().is_empty() {
            "None"
        } else {
            self.special_remarks.trim()
        }
    }

    pub fn type_list(&self) -> String {
        self.question_types
            .iter()
            .map(QuestionType::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Whether the topic belongs to the curriculum for the grade and subject
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicValidation {
    #[serde(default = "yes")]
    pub valid: bool,
    #[serde(default = "yes")]
    pub curriculum_aligned: bool,
    #[serde(default)]
    pub suggestion: String,
    #[serde(default)]
    pub explanation: String,
}

fn yes() -> bool {
    true
}

impl TopicValidation {
    /// Used when the check cannot be made; the topic is taken as given
    pub fn assumed() -> Self {
        Self {
            valid: true,
            curriculum_aligned: true,
            suggestion: String::new(),
            explanation: "Validation completed".to_string(),
        }
    }
}

impl StructuredOutput for TopicValidation {
    const SCHEMA: &'static str = "topic validation";
}

/// Planned number of questions per type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionDistribution {
    #[serde(default)]
    pub mcq: u32,
    #[serde(default)]
    pub short_answer: u32,
    #[serde(default)]
    pub long_answer: u32,
    #[serde(default)]
    pub numerical: u32,
}

impl Default for QuestionDistribution {
    fn default() -> Self {
        Self { mcq: 5, short_answer: 3, long_answer: 2, numerical: 2 }
    }
}

impl QuestionDistribution {
    pub fn count(&self, question_type: QuestionType) -> u32 {
        match question_type {
            QuestionType::Mcq => self.mcq,
            QuestionType::ShortAnswer => self.short_answer,
            QuestionType::LongAnswer => self.long_answer,
            QuestionType::Numerical => self.numerical,
        }
    }

    pub fn total(&self) -> u32 {
        QuestionType::ALL.iter().map(|t| self.count(*t)).sum()
    }

    /// Zeroes every type not in `types`
    pub fn restricted_to(self, types: &[QuestionType]) -> Self {
        let keep = |question_type: QuestionType, count: u32| {
            if types.contains(&question_type) { count } else { 0 }
        };
        Self {
            mcq: keep(QuestionType::Mcq, self.mcq),
            short_answer: keep(QuestionType::ShortAnswer, self.short_answer),
            long_answer: keep(QuestionType::LongAnswer, self.long_answer),
            numerical: keep(QuestionType::Numerical, self.numerical),
        }
    }
}

impl StructuredOutput for QuestionDistribution {
    const SCHEMA: &'static str = "question distribution";

    fn validate(&self) -> Result<(), String> {
        if self.total() == 0 {
            return Err("distribution plans no questions".to_string());
        }
        Ok(())
    }
}

/// A generated paper with the checks and plan it was built from
#[derive(Debug, Clone)]
pub struct ExamPaper {
    pub artifact: Artifact,
    pub validation: TopicValidation,
    pub distribution: QuestionDistribution,
    pub log: RunLog,
}
