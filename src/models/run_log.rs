use chrono::{DateTime, Utc};
use log::{error, info, warn};
use serde::{Deserialize, Serialize};

use crate::errors::ErrorSeverity;
use crate::models::artifact::Artifact;
use crate::models::common::PipelineStage;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressRecord {
    pub stage: PipelineStage,
    pub message: String,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageErrorRecord {
    pub stage: PipelineStage,
    pub message: String,
    pub severity: ErrorSeverity,
}

/// Progress and error records of one pipeline run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunLog {
    pub progress: Vec<ProgressRecord>,
    pub errors: Vec<StageErrorRecord>,
    /// Stages whose output came from a fallback rather than the model
    pub degraded_stages: Vec<PipelineStage>,
}

impl RunLog {
    pub fn progress(&mut self, stage: PipelineStage, message: impl Into<String>) {
        let message = message.into();
        info!("[{}] {}", stage, message);
        self.progress.push(ProgressRecord { stage, message, at: Utc::now() });
    }

    pub fn error(&mut self, stage: PipelineStage, message: impl Into<String>, severity: ErrorSeverity) {
        let message = message.into();
        match severity {
            ErrorSeverity::Warning => warn!("[{}] {}", stage, message),
            _ => error!("[{}] {}", stage, message),
        }
        self.errors.push(StageErrorRecord { stage, message, severity });
    }

    pub fn degraded(&mut self, stage: PipelineStage) {
        if !self.degraded_stages.contains(&stage) {
            self.degraded_stages.push(stage);
        }
    }

    /// Stages visited, in order, without repeats
    pub fn stages(&self) -> Vec<PipelineStage> {
        let mut stages: Vec<PipelineStage> = Vec::new();
        for record in &self.progress {
            if stages.last() != Some(&record.stage) && !stages.contains(&record.stage) {
                stages.push(record.stage);
            }
        }
        stages
    }
}

/// An artifact together with the log of the run that produced it
#[derive(Debug, Clone)]
pub struct PipelineRun {
    pub artifact: Artifact,
    pub log: RunLog,
}
