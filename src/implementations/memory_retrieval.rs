use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, info};
use tokio::sync::RwLock;

use crate::errors::MiraResult;
use crate::models::retrieval::{MetadataFilter, RetrievalResult, RetrievedChunk};
use crate::traits::retrieval_provider::RetrievalProvider;

/// Retrieval over collections held in memory. Chunks are ranked by how many
/// distinct query terms they contain; ties keep indexing order.
#[derive(Clone, Default)]
pub struct InMemoryRetrieval {
    collections: Arc<RwLock<HashMap<String, Vec<RetrievedChunk>>>>,
}

impl InMemoryRetrieval {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_collections(collections: HashMap<String, Vec<RetrievedChunk>>) -> Self {
        Self {
            collections: Arc::new(RwLock::new(collections)),
        }
    }

    /// Load a corpus file shaped as `{ "<collection>": [ { "text": .., "metadata": {..} } ] }`
    pub fn from_corpus_file(path: &Path) -> MiraResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        let collections: HashMap<String, Vec<RetrievedChunk>> = serde_json::from_str(&contents)?;
        info!(
            "Loaded retrieval corpus with {} collections from {}",
            collections.len(),
            path.display()
        );
        Ok(Self::from_collections(collections))
    }

    pub async fn collection_len(&self, collection: &str) -> usize {
        self.collections.read().await.get(collection).map_or(0, Vec::len)
    }

    pub async fn collection_count(&self) -> usize {
        self.collections.read().await.len()
    }
}

fn terms(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

#[async_trait]
impl RetrievalProvider for InMemoryRetrieval {
    async fn search(
        &self,
        collection: &str,
        query: &str,
        k: usize,
        filter: &MetadataFilter
    ) -> RetrievalResult {
        let collections = self.collections.read().await;
        let Some(chunks) = collections.get(collection) else {
            debug!("Collection {} does not exist", collection);
            return RetrievalResult::empty();
        };

        let query_terms = terms(query);
        let mut scored: Vec<(usize, &RetrievedChunk)> = chunks
            .iter()
            .filter(|chunk| filter.matches(&chunk.metadata))
            .map(|chunk| {
                let chunk_terms = terms(&chunk.text);
                (query_terms.intersection(&chunk_terms).count(), chunk)
            })
            .collect();
        scored.sort_by(|a, b| b.0.cmp(&a.0));

        RetrievalResult {
            chunks: scored
                .into_iter()
                .take(k)
                .map(|(_, chunk)| chunk.clone())
                .collect(),
        }
    }

    async fn index(&self, collection: &str, chunks: Vec<RetrievedChunk>) -> MiraResult<usize> {
        let count = chunks.len();
        let mut collections = self.collections.write().await;
        collections.insert(collection.to_string(), chunks);
        debug!("Indexed {} chunks into {}", count, collection);
        Ok(count)
    }

    async fn drop_collection(&self, collection: &str) -> MiraResult<()> {
        if self.collections.write().await.remove(collection).is_some() {
            debug!("Dropped collection {}", collection);
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "in-memory"
    }
}

/// Provider that knows no collections and indexes nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopRetrieval;

#[async_trait]
impl RetrievalProvider for NoopRetrieval {
    async fn search(
        &self,
        _collection: &str,
        _query: &str,
        _k: usize,
        _filter: &MetadataFilter
    ) -> RetrievalResult {
        RetrievalResult::empty()
    }

    fn name(&self) -> &str {
        "noop"
    }
}
