use thiserror::Error;

use crate::implementations::config::ConfigError;

/// Custom error types for the Mira pipeline
#[derive(Debug, Error)]
pub enum MiraError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Template error: {0}")]
    Template(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Retrieval error: {0}")]
    Retrieval(String),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Stage {stage} failed: {message}")]
    Stage { stage: String, message: String },

    #[error("Pipeline cancelled before stage {stage}")]
    Cancelled { stage: String },
}

/// Result type specific to Mira operations
pub type MiraResult<T> = Result<T, MiraError>;

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ErrorSeverity {
    Fatal,
    Error,
    Warning,
}

/// Recoverable vs. non-recoverable errors
pub trait RecoverableError {
    fn is_recoverable(&self) -> bool;
    fn severity(&self) -> ErrorSeverity;
}

impl RecoverableError for MiraError {
    fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            MiraError::Configuration(_) | MiraError::Config(_) | MiraError::Cancelled { .. }
        )
    }

    fn severity(&self) -> ErrorSeverity {
        match self {
            MiraError::Configuration(_) | MiraError::Config(_) | MiraError::Cancelled { .. } =>
                ErrorSeverity::Fatal,
            MiraError::Transport(_) | MiraError::Retrieval(_) => ErrorSeverity::Warning,
            _ => ErrorSeverity::Error,
        }
    }
}
