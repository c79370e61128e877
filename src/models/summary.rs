use serde::{Deserialize, Serialize};

use crate::errors::{MiraError, MiraResult};

/// Request to summarise a piece of source material
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SummaryRequest {
    pub subject: String,
    pub grade: String,
    /// Used for the title; falls back to the subject when blank
    #[serde(default)]
    pub topic: String,
    pub text: String,
}

impl SummaryRequest {
    pub fn validated(self) -> MiraResult<Self> {
        if self.subject.trim().is_empty() {
            return Err(MiraError::Configuration("subject is required".to_string()));
        }
        if self.grade.trim().is_empty() {
            return Err(MiraError::Configuration("grade is required".to_string()));
        }
        if self.text.trim().is_empty() {
            return Err(MiraError::Configuration("text to summarise is empty".to_string()));
        }
        let topic = if self.topic.trim().is_empty() {
            self.subject.trim().to_string()
        } else {
            self.topic.trim().to_string()
        };
        Ok(Self {
            subject: self.subject.trim().to_string(),
            grade: self.grade.trim().to_string(),
            topic,
            text: self.text,
        })
    }
}

/// Intermediate and final texts of the summarisation chain
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryOutput {
    pub topics_and_terminology: String,
    pub examples_and_problems: String,
    pub summary: String,
}
