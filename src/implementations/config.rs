use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] serde_yaml::Error),

    #[error("Missing required API key: {0}")]
    MissingApiKey(String),

    #[error("Invalid configuration value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

/// Connection settings for the chat-completion backend
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LlmApiConfig {
    /// API key for LLM service
    pub api_key: Option<String>,

    /// API endpoint for LLM service
    pub api_endpoint: Option<String>,

    /// Default model, used when an agent does not name one
    pub model: Option<String>,

    /// API organization ID (if applicable)
    pub organization_id: Option<String>,
}

impl Default for LlmApiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_endpoint: Some("https://api.openai.com/v1/chat/completions".to_string()),
            model: Some("gpt-4o-mini".to_string()),
            organization_id: None,
        }
    }
}

impl LlmApiConfig {
    /// Get the API key, checking environment variables if not in config.
    /// Returns the provider name alongside the key.
    pub fn get_api_key(&self) -> Result<(String, String), ConfigError> {
        use log::{debug, info};

        if let Some(api_key) = &self.api_key {
            debug!("Using API key from config");
            return Ok(("configured".to_string(), api_key.clone()));
        }

        let providers = [
            ("openai", "OPENAI_API_KEY"),
            ("azure", "AZURE_OPENAI_API_KEY"),
            ("mistral", "MISTRAL_API_KEY"),
            ("together", "TOGETHER_API_KEY"),
        ];

        for (provider, env_var) in providers {
            match std::env::var(env_var) {
                Ok(key) if !key.trim().is_empty() => {
                    info!("Using API key for provider: {}", provider);
                    return Ok((provider.to_string(), key));
                }
                _ => {
                    debug!("Provider {} not available", provider);
                }
            }
        }

        Err(ConfigError::MissingApiKey("No API keys found for any provider".to_string()))
    }

    /// Endpoint to post chat completions to
    pub fn endpoint(&self) -> String {
        self.api_endpoint
            .clone()
            .unwrap_or_else(|| "https://api.openai.com/v1/chat/completions".to_string())
    }
}
