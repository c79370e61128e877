use async_trait::async_trait;

use crate::errors::MiraResult;
use crate::models::retrieval::{MetadataFilter, RetrievalResult, RetrievedChunk};

/// Similarity search over named document collections
#[async_trait]
pub trait RetrievalProvider: Send + Sync {
    /// Returns at most `k` chunks matching `filter`, best first. A missing
    /// collection or an unreachable backend yields an empty result.
    async fn search(
        &self,
        collection: &str,
        query: &str,
        k: usize,
        filter: &MetadataFilter
    ) -> RetrievalResult;

    /// Makes `chunks` searchable under `collection`, replacing its previous
    /// contents. Returns once the chunks are queryable, with the number indexed.
    /// Providers that cannot index report 0.
    async fn index(&self, _collection: &str, _chunks: Vec<RetrievedChunk>) -> MiraResult<usize> {
        Ok(0)
    }

    /// Removes `collection` and everything indexed under it. Removing an
    /// unknown collection is not an error.
    async fn drop_collection(&self, _collection: &str) -> MiraResult<()> {
        Ok(())
    }

    /// Provider name for log lines
    fn name(&self) -> &str;
}
