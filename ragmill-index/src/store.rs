//! The vector store: embedding-aware chunk storage and similarity search.

use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use half::f16;
use ragmill_chunk::DraftChunk;
use ragmill_embed::EmbeddingProvider;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::db::ChunkDb;
use crate::error::{IndexError, Result};
use crate::record::{ChunkRecord, ChunkSummary, ScoredChunk, SearchFilter, StatsSnapshot};

/// Cosine similarity between two f16 vectors, computed in f32.
///
/// Returns 0.0 when either vector has zero magnitude.
pub fn cosine_similarity(a: &[f16], b: &[f16]) -> f32 {
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for (x, y) in a.iter().zip(b.iter()) {
        let x = x.to_f32();
        let y = y.to_f32();
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

/// Rescale a cosine similarity from `[-1, 1]` to a relevance score in
/// `[0, 1]`. Clamped against f16 rounding drift.
pub fn relevance_score(cosine: f32) -> f32 {
    ((cosine + 1.0) / 2.0).clamp(0.0, 1.0)
}

/// Embedding-aware chunk store over SQLite.
///
/// Inserts embed the whole batch first, then write it in one transaction
/// under an exclusive write lock; a failure at either stage leaves the store
/// unchanged. Searches and stats take no lock; they see the last committed
/// state.
pub struct VectorStore {
    db: ChunkDb,
    embedder: Arc<dyn EmbeddingProvider>,
    write_lock: Mutex<()>,
}

impl std::fmt::Debug for VectorStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VectorStore")
            .field("db", &self.db)
            .field("embedder", &self.embedder.provider_name())
            .finish()
    }
}

impl VectorStore {
    /// Open a store persisted under `base_dir`.
    pub async fn open(base_dir: &Path, embedder: Arc<dyn EmbeddingProvider>) -> Result<Self> {
        let db = ChunkDb::open(base_dir).await?;
        Ok(Self {
            db,
            embedder,
            write_lock: Mutex::new(()),
        })
    }

    /// Open an in-memory store, for tests.
    pub async fn open_memory(embedder: Arc<dyn EmbeddingProvider>) -> Result<Self> {
        let db = ChunkDb::open_memory().await?;
        Ok(Self {
            db,
            embedder,
            write_lock: Mutex::new(()),
        })
    }

    /// Embed and store a batch of chunks, returning their assigned ids in
    /// input order.
    ///
    /// The batch is all-or-nothing: if any embedding fails nothing is
    /// written, and the SQLite transaction covers the writes themselves.
    pub async fn insert(&self, chunks: &[DraftChunk]) -> Result<Vec<String>> {
        if chunks.is_empty() {
            return Ok(Vec::new());
        }

        // Embed before taking the lock; inference is the slow part and
        // failures here must not touch the database.
        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let embedded = self.embedder.embed_texts(&texts).await?;
        if embedded.len() != chunks.len() {
            return Err(IndexError::invalid_record(format!(
                "embedder returned {} vectors for {} chunks",
                embedded.len(),
                chunks.len()
            )));
        }

        let now = Utc::now();
        let records: Vec<ChunkRecord> = chunks
            .iter()
            .zip(embedded.embeddings)
            .map(|(chunk, embedding)| ChunkRecord {
                id: Uuid::new_v4().to_string(),
                text: chunk.text.clone(),
                embedding,
                source: chunk.source.clone(),
                source_kind: chunk.source_kind,
                chunk_index: chunk.chunk_index,
                created_at: now,
            })
            .collect();

        let _guard = self.write_lock.lock().await;
        self.db.insert_batch(&records).await?;

        tracing::debug!(count = records.len(), "inserted chunk batch");
        Ok(records.into_iter().map(|r| r.id).collect())
    }

    /// Find the `k` chunks most similar to a query embedding.
    ///
    /// Results are sorted by score descending; equal scores keep insertion
    /// order. Fewer than `k` results come back when the store is small or a
    /// filter excludes rows. `k == 0` is rejected.
    pub async fn search(
        &self,
        query: &[f16],
        k: usize,
        filter: Option<&SearchFilter>,
    ) -> Result<Vec<ScoredChunk>> {
        if k == 0 {
            return Err(IndexError::invalid_parameter("search requires k > 0"));
        }

        let candidates = self.db.fetch_all().await?;
        let mut scored: Vec<ScoredChunk> = candidates
            .into_iter()
            .filter(|record| filter.is_none_or(|f| f.matches(record)))
            .map(|chunk| {
                let score = relevance_score(cosine_similarity(query, &chunk.embedding));
                ScoredChunk { chunk, score }
            })
            .collect();

        // Stable sort: ties resolve to insertion order.
        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(k);
        Ok(scored)
    }

    /// Embed a query text and search with it.
    pub async fn search_text(
        &self,
        query: &str,
        k: usize,
        filter: Option<&SearchFilter>,
    ) -> Result<Vec<ScoredChunk>> {
        let embedding = self.embedder.embed_text(query).await?;
        self.search(&embedding, k, filter).await
    }

    /// Delete one chunk by id. Returns whether it existed.
    pub async fn delete_by_id(&self, id: &str) -> Result<bool> {
        let _guard = self.write_lock.lock().await;
        self.db.delete_by_id(id).await
    }

    /// Delete every chunk from a source. Returns the number removed.
    pub async fn delete_by_source(&self, source: &str) -> Result<u64> {
        let _guard = self.write_lock.lock().await;
        let removed = self.db.delete_by_source(source).await?;
        tracing::debug!(source, removed, "deleted chunks by source");
        Ok(removed)
    }

    /// Delete everything. Returns the number removed.
    pub async fn clear(&self) -> Result<u64> {
        let _guard = self.write_lock.lock().await;
        self.db.clear().await
    }

    /// Snapshot of the store's contents.
    pub async fn stats(&self) -> Result<StatsSnapshot> {
        let total_chunks = self.db.count().await?;
        let sources: std::collections::BTreeSet<String> =
            self.db.distinct_sources().await?.into_iter().collect();
        Ok(StatsSnapshot {
            total_chunks,
            unique_sources: sources.len(),
            sources,
        })
    }

    /// List every stored chunk in insertion order, without embeddings.
    pub async fn list(&self) -> Result<Vec<ChunkSummary>> {
        let records = self.db.fetch_all().await?;
        Ok(records.into_iter().map(ChunkSummary::from).collect())
    }

    /// Fetch a chunk by id, for inspection.
    pub async fn get(&self, id: &str) -> Result<Option<ChunkRecord>> {
        self.db.get_by_id(id).await
    }

    /// Flush and close the underlying database. The store is unusable
    /// afterwards; call once at process shutdown.
    pub async fn close(&self) {
        self.db.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use ragmill_chunk::SourceKind;
    use ragmill_embed::provider::EmbeddingResult;
    use ragmill_embed::EmbedError;
    use std::collections::HashMap;

    /// Deterministic embedder: known texts get fixed vectors, anything else
    /// gets a byte-derived one.
    struct StubEmbedder {
        vectors: HashMap<String, Vec<f32>>,
    }

    impl StubEmbedder {
        fn new(pairs: &[(&str, [f32; 3])]) -> Self {
            Self {
                vectors: pairs
                    .iter()
                    .map(|(text, v)| (text.to_string(), v.to_vec()))
                    .collect(),
            }
        }

        fn vector_for(&self, text: &str) -> ragmill_embed::Result<Vec<f16>> {
            if text.contains("EMBEDFAIL") {
                return Err(EmbedError::invalid_config("stub failure"));
            }
            let raw = self.vectors.get(text).cloned().unwrap_or_else(|| {
                let sum: u32 = text.bytes().map(u32::from).sum();
                vec![(sum % 97) as f32 + 1.0, (sum % 31) as f32, 1.0]
            });
            Ok(raw.into_iter().map(f16::from_f32).collect())
        }
    }

    #[async_trait]
    impl EmbeddingProvider for StubEmbedder {
        async fn embed_text(&self, text: &str) -> ragmill_embed::Result<Vec<f16>> {
            self.vector_for(text)
        }

        async fn embed_texts(&self, texts: &[String]) -> ragmill_embed::Result<EmbeddingResult> {
            let embeddings = texts
                .iter()
                .map(|t| self.vector_for(t))
                .collect::<ragmill_embed::Result<Vec<_>>>()?;
            Ok(EmbeddingResult::new(embeddings))
        }

        fn dimension(&self) -> usize {
            3
        }

        fn provider_name(&self) -> &str {
            "stub"
        }
    }

    fn draft(text: &str, source: &str, chunk_index: usize) -> DraftChunk {
        DraftChunk {
            text: text.to_string(),
            source: source.to_string(),
            source_kind: SourceKind::Pdf,
            chunk_index,
        }
    }

    async fn store_with(pairs: &[(&str, [f32; 3])]) -> VectorStore {
        let embedder = Arc::new(StubEmbedder::new(pairs));
        VectorStore::open_memory(embedder).await.unwrap()
    }

    #[test]
    fn relevance_score_rescales_cosine() {
        assert_eq!(relevance_score(1.0), 1.0);
        assert_eq!(relevance_score(-1.0), 0.0);
        assert_eq!(relevance_score(0.0), 0.5);
        // rounding drift outside [-1, 1] clamps
        assert_eq!(relevance_score(1.001), 1.0);
    }

    #[test]
    fn cosine_of_zero_vector_is_zero() {
        let zero = vec![f16::from_f32(0.0); 3];
        let unit = vec![f16::from_f32(1.0), f16::from_f32(0.0), f16::from_f32(0.0)];
        assert_eq!(cosine_similarity(&zero, &unit), 0.0);
    }

    #[tokio::test]
    async fn insert_assigns_unique_ids_in_input_order() {
        let store = store_with(&[]).await;
        let ids = store
            .insert(&[draft("first", "doc.pdf", 0), draft("second", "doc.pdf", 1)])
            .await
            .unwrap();

        assert_eq!(ids.len(), 2);
        assert_ne!(ids[0], ids[1]);

        let first = store.get(&ids[0]).await.unwrap().unwrap();
        assert_eq!(first.text, "first");
        assert_eq!(first.chunk_index, 0);
    }

    #[tokio::test]
    async fn insert_of_empty_batch_is_a_noop() {
        let store = store_with(&[]).await;
        assert!(store.insert(&[]).await.unwrap().is_empty());
        assert_eq!(store.stats().await.unwrap().total_chunks, 0);
    }

    #[tokio::test]
    async fn failed_embedding_leaves_store_unchanged() {
        let store = store_with(&[]).await;
        let result = store
            .insert(&[draft("fine", "doc.pdf", 0), draft("EMBEDFAIL here", "doc.pdf", 1)])
            .await;

        assert!(matches!(result, Err(IndexError::Embedding(_))));
        assert_eq!(store.stats().await.unwrap().total_chunks, 0);
    }

    #[tokio::test]
    async fn search_orders_by_score_descending() {
        let store = store_with(&[
            ("north", [0.0, 1.0, 0.0]),
            ("east", [1.0, 0.0, 0.0]),
            ("northeast", [1.0, 1.0, 0.0]),
            ("query", [0.0, 1.0, 0.0]),
        ])
        .await;

        store
            .insert(&[
                draft("east", "doc.pdf", 0),
                draft("northeast", "doc.pdf", 1),
                draft("north", "doc.pdf", 2),
            ])
            .await
            .unwrap();

        let results = store.search_text("query", 3, None).await.unwrap();
        let texts: Vec<&str> = results.iter().map(|r| r.chunk.text.as_str()).collect();
        assert_eq!(texts, vec!["north", "northeast", "east"]);

        assert!((results[0].score - 1.0).abs() < 1e-3);
        assert!((results[2].score - 0.5).abs() < 1e-3);
    }

    #[tokio::test]
    async fn equal_scores_keep_insertion_order() {
        let store = store_with(&[
            ("twin a", [1.0, 0.0, 0.0]),
            ("twin b", [1.0, 0.0, 0.0]),
            ("query", [1.0, 0.0, 0.0]),
        ])
        .await;

        store
            .insert(&[draft("twin a", "doc.pdf", 0), draft("twin b", "doc.pdf", 1)])
            .await
            .unwrap();

        let results = store.search_text("query", 2, None).await.unwrap();
        assert_eq!(results[0].chunk.text, "twin a");
        assert_eq!(results[1].chunk.text, "twin b");
        assert_eq!(results[0].score, results[1].score);
    }

    #[tokio::test]
    async fn search_truncates_to_k_and_rejects_zero() {
        let store = store_with(&[]).await;
        store
            .insert(&[
                draft("one", "doc.pdf", 0),
                draft("two", "doc.pdf", 1),
                draft("three", "doc.pdf", 2),
            ])
            .await
            .unwrap();

        let results = store.search_text("one", 2, None).await.unwrap();
        assert_eq!(results.len(), 2);

        let err = store.search_text("one", 0, None).await.unwrap_err();
        assert!(matches!(err, IndexError::InvalidParameter { .. }));
    }

    #[tokio::test]
    async fn filter_restricts_candidates_before_scoring() {
        let store = store_with(&[]).await;
        store
            .insert(&[draft("from a", "a.pdf", 0), draft("from b", "b.pdf", 0)])
            .await
            .unwrap();

        let filter = SearchFilter::for_source("b.pdf");
        let results = store.search_text("from a", 5, Some(&filter)).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].chunk.source, "b.pdf");
    }

    #[tokio::test]
    async fn deletes_and_stats_agree() {
        let store = store_with(&[]).await;
        let ids = store
            .insert(&[
                draft("one", "a.pdf", 0),
                draft("two", "a.pdf", 1),
                draft("three", "b.pdf", 0),
            ])
            .await
            .unwrap();

        let stats = store.stats().await.unwrap();
        assert_eq!(stats.total_chunks, 3);
        assert_eq!(stats.unique_sources, 2);
        assert!(stats.sources.contains("a.pdf"));

        assert!(store.delete_by_id(&ids[2]).await.unwrap());
        assert!(!store.delete_by_id(&ids[2]).await.unwrap());
        assert_eq!(store.delete_by_source("a.pdf").await.unwrap(), 2);

        let stats = store.stats().await.unwrap();
        assert_eq!(stats.total_chunks, 0);
        assert_eq!(stats.unique_sources, 0);
    }

    #[tokio::test]
    async fn list_returns_stored_chunks_in_insertion_order() {
        let store = store_with(&[]).await;
        let ids = store
            .insert(&[
                draft("one", "a.pdf", 0),
                draft("two", "a.pdf", 1),
                draft("three", "b.pdf", 0),
            ])
            .await
            .unwrap();

        let listed = store.list().await.unwrap();
        assert_eq!(listed.len(), 3);
        let listed_ids: Vec<&str> = listed.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(listed_ids, ids.iter().map(String::as_str).collect::<Vec<_>>());
        assert_eq!(listed[1].text, "two");
        assert_eq!(listed[2].source, "b.pdf");
        assert_eq!(listed[2].chunk_index, 0);
    }

    #[tokio::test]
    async fn closed_store_rejects_operations() {
        let store = store_with(&[]).await;
        store.insert(&[draft("one", "a.pdf", 0)]).await.unwrap();

        store.close().await;
        assert!(matches!(store.stats().await, Err(IndexError::Storage(_))));
    }

    #[tokio::test]
    async fn clear_removes_everything() {
        let store = store_with(&[]).await;
        store
            .insert(&[draft("one", "a.pdf", 0), draft("two", "b.pdf", 0)])
            .await
            .unwrap();

        assert_eq!(store.clear().await.unwrap(), 2);
        assert_eq!(store.clear().await.unwrap(), 0);
        assert!(store.search_text("one", 1, None).await.unwrap().is_empty());
    }
}
