use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// A record an agent expects the model to return as JSON
pub trait StructuredOutput: DeserializeOwned {
    /// Name used in log lines
    const SCHEMA: &'static str;

    /// Shape checks serde cannot express. An `Err` makes the decode tier fail.
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}

/// Which tier of the repair policy produced a value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecodeTier {
    /// The whole response decoded as-is
    Strict,
    /// Decoded from the span between the first `{` and the last `}`
    Extracted,
    /// Synthesized from the default builder
    Default,
}

impl DecodeTier {
    pub fn is_degraded(&self) -> bool {
        matches!(self, DecodeTier::Default)
    }
}
