use log::{debug, warn};

use crate::traits::structured_output::{DecodeTier, StructuredOutput};

/// A decoded value and the tier that produced it
#[derive(Debug, Clone, PartialEq)]
pub struct Decoded<T> {
    pub value: T,
    pub tier: DecodeTier,
}

/// Three-tier structured decode shared by every agent:
/// 1. decode the whole text,
/// 2. decode the span from the first `{` to the last `}`,
/// 3. build the value with `default`.
///
/// A tier only succeeds if the decoded value also passes `validate`. Never fails.
pub fn decode_with_repair<T, F>(raw: &str, default: F) -> Decoded<T>
    where T: StructuredOutput, F: FnOnce() -> T
{
    if raw.trim().is_empty() {
        warn!("Empty model response for {}, using default", T::SCHEMA);
        return Decoded { value: default(), tier: DecodeTier::Default };
    }

    match try_decode::<T>(raw.trim()) {
        Ok(value) => {
            return Decoded { value, tier: DecodeTier::Strict };
        }
        Err(e) => debug!("Strict decode of {} failed: {}", T::SCHEMA, e),
    }

    if let Some(span) = extract_object(raw) {
        match try_decode::<T>(span) {
            Ok(value) => {
                warn!("Recovered {} from embedded JSON object", T::SCHEMA);
                return Decoded { value, tier: DecodeTier::Extracted };
            }
            Err(e) => debug!("Extracted decode of {} failed: {}", T::SCHEMA, e),
        }
    }

    warn!("Could not decode {} from model response, using default", T::SCHEMA);
    Decoded { value: default(), tier: DecodeTier::Default }
}

fn try_decode<T: StructuredOutput>(text: &str) -> Result<T, String> {
    let value: T = serde_json::from_str(text).map_err(|e| e.to_string())?;
    value.validate()?;
    Ok(value)
}

/// Span from the first `{` to the last `}`, inclusive
pub fn extract_object(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end <= start {
        return None;
    }
    Some(&raw[start..=end])
}
