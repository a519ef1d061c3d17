//! Retrieval: question in, threshold-filtered ranked chunks out.

use std::sync::Arc;

use ragmill_index::{ScoredChunk, SearchFilter, VectorStore};

use crate::error::{PipelineError, Result};

/// Finds the chunks most relevant to a question.
///
/// Thin layer over [`VectorStore::search_text`]: it validates parameters,
/// embeds the question once (inside the store), and drops results below the
/// relevance threshold. An empty result is a normal outcome, not an error.
pub struct Retriever {
    store: Arc<VectorStore>,
}

impl Retriever {
    pub fn new(store: Arc<VectorStore>) -> Self {
        Self { store }
    }

    /// Retrieve up to `k` chunks scoring at least `threshold`, best first.
    pub async fn retrieve(
        &self,
        question: &str,
        k: usize,
        threshold: f32,
        filter: Option<&SearchFilter>,
    ) -> Result<Vec<ScoredChunk>> {
        if k == 0 {
            return Err(PipelineError::invalid_parameter("k must be > 0"));
        }
        if !(0.0..=1.0).contains(&threshold) {
            return Err(PipelineError::invalid_parameter(format!(
                "relevance threshold must be in [0, 1], got {threshold}"
            )));
        }

        let results = self.store.search_text(question, k, filter).await?;
        let kept: Vec<ScoredChunk> = results
            .into_iter()
            .filter(|scored| scored.score >= threshold)
            .collect();

        tracing::debug!(k, threshold, kept = kept.len(), "retrieval complete");
        Ok(kept)
    }
}
