use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A text chunk with the metadata it was indexed under
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedChunk {
    pub text: String,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl RetrievedChunk {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into(), metadata: BTreeMap::new() }
    }

    pub fn with_metadata(mut self, key: &str, value: impl Into<String>) -> Self {
        self.metadata.insert(key.to_string(), value.into());
        self
    }
}

/// Ordered search hits, best first. Lives for one pipeline run only.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RetrievalResult {
    pub chunks: Vec<RetrievedChunk>,
}

impl RetrievalResult {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// Chunk texts joined for prompt injection
    pub fn joined(&self) -> String {
        self.chunks
            .iter()
            .map(|c| c.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// Exact-match conjunction over named metadata fields
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataFilter {
    fields: BTreeMap<String, String>,
}

impl MetadataFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a field constraint; blank values add nothing
    pub fn with(mut self, key: &str, value: &str) -> Self {
        if !value.trim().is_empty() {
            self.fields.insert(key.to_string(), value.to_string());
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    pub fn matches(&self, metadata: &BTreeMap<String, String>) -> bool {
        self.fields
            .iter()
            .all(|(key, value)| metadata.get(key) == Some(value))
    }
}
