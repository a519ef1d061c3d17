//! The answer orchestrator: retrieval, context assembly, and generation.

use std::sync::Arc;

use ragmill_chunk::{Document, TextSplitter};
use ragmill_index::{ChunkSummary, SearchFilter, StatsSnapshot, VectorStore};
use serde::Serialize;
use tokio::sync::Semaphore;

use crate::config::PipelineConfig;
use crate::context::{self, ContextBlock};
use crate::error::{PipelineError, Result};
use crate::generate::{GenerateError, TextGenerator};
use crate::retriever::Retriever;

const SYSTEM_INSTRUCTION: &str = "You are a helpful AI assistant that answers questions based on the provided context.\n\n\
Instructions:\n\
- Answer the question using ONLY the information provided in the context below\n\
- Be concise and accurate\n\
- If the context doesn't contain enough information to answer the question, say \"I don't have enough information to answer that question based on the provided documents.\"\n\
- Do not make up information or use knowledge outside of the provided context\n\
- If appropriate, cite which document or source the information comes from";

const NO_CONTEXT_MARKER: &str = "No relevant context found.";

/// How much chunk text a source attribution carries at most.
const SOURCE_PREVIEW_CHARS: usize = 500;

/// A generated answer plus the sources that grounded it.
#[derive(Debug, Clone, Serialize)]
pub struct Answer {
    /// The generator's output, verbatim.
    pub text: String,
    /// The chunks that entered the context, in context order. Empty when
    /// sources were not requested or nothing was retrieved.
    pub sources: Vec<SourceRef>,
}

/// Attribution for one chunk that contributed to an answer.
#[derive(Debug, Clone, Serialize)]
pub struct SourceRef {
    pub id: String,
    pub source: String,
    pub source_kind: ragmill_chunk::SourceKind,
    pub chunk_index: usize,
    pub score: f32,
    /// Leading text of the chunk, capped for transport.
    pub text: String,
}

/// Result of one ingestion call.
#[derive(Debug, Clone, Serialize)]
pub struct InsertResult {
    pub ids: Vec<String>,
    pub count: usize,
}

/// Result of a delete-by-source or clear call.
#[derive(Debug, Clone, Serialize)]
pub struct DeleteResult {
    pub count: u64,
}

/// Per-query options for [`RagPipeline::answer`].
#[derive(Debug, Clone, Default)]
pub struct QueryOptions {
    /// Override the configured retrieval k.
    pub n_results: Option<usize>,
    /// Override the configured relevance threshold.
    pub relevance_threshold: Option<f32>,
    /// Whether to populate `Answer.sources`.
    pub return_sources: bool,
    /// Restrict retrieval to matching chunks.
    pub filter: Option<SearchFilter>,
}

impl QueryOptions {
    pub fn with_sources() -> Self {
        Self {
            return_sources: true,
            ..Self::default()
        }
    }
}

/// The full retrieval-augmented answer pipeline.
///
/// Holds long-lived handles to the vector store and the generation
/// collaborator; construct once at process start and share. Retrieval and
/// context assembly for concurrent queries run in parallel, but generation
/// is a single-capacity resource: calls queue on a fair semaphore and run
/// one at a time in arrival order.
pub struct RagPipeline {
    store: Arc<VectorStore>,
    retriever: Retriever,
    generator: Arc<dyn TextGenerator>,
    generation_slot: Semaphore,
    config: PipelineConfig,
}

impl RagPipeline {
    pub fn new(
        store: Arc<VectorStore>,
        generator: Arc<dyn TextGenerator>,
        config: PipelineConfig,
    ) -> Self {
        tracing::info!(generator = generator.generator_name(), "pipeline ready");
        Self {
            retriever: Retriever::new(Arc::clone(&store)),
            store,
            generator,
            generation_slot: Semaphore::new(1),
            config,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Chunk a document and store it. Independent calls fail independently;
    /// within one call the chunk batch is all-or-nothing.
    pub async fn ingest(&self, document: &Document) -> Result<InsertResult> {
        let splitter = TextSplitter::new(self.config.chunk_size, self.config.chunk_overlap)?;
        let chunks = splitter.split_document(document);
        if chunks.is_empty() {
            tracing::debug!(source = %document.source, "document produced no chunks");
            return Ok(InsertResult {
                ids: Vec::new(),
                count: 0,
            });
        }

        let ids = self.store.insert(&chunks).await?;
        tracing::info!(source = %document.source, count = ids.len(), "document ingested");
        Ok(InsertResult {
            count: ids.len(),
            ids,
        })
    }

    /// Answer a question from the indexed corpus.
    ///
    /// Retrieval yielding nothing is a valid outcome: the generator is still
    /// invoked, with the prompt stating that no relevant context was found.
    pub async fn answer(&self, question: &str, opts: &QueryOptions) -> Result<Answer> {
        let k = opts.n_results.unwrap_or(self.config.retrieval_k);
        let threshold = opts
            .relevance_threshold
            .unwrap_or(self.config.relevance_threshold);

        let retrieved = self
            .retriever
            .retrieve(question, k, threshold, opts.filter.as_ref())
            .await?;
        let block = context::assemble(&retrieved, self.config.max_context_chars)?;
        if block.is_empty() {
            tracing::warn!(question, "no chunks cleared the relevance threshold");
        }

        let prompt = build_prompt(question, &block);

        let _permit = self
            .generation_slot
            .acquire()
            .await
            .map_err(|_| GenerateError::unavailable("generation queue closed"))?;

        let text = self
            .generator
            .generate(&prompt, self.config.max_tokens, self.config.temperature)
            .await?;

        let sources = if opts.return_sources {
            block
                .segments
                .iter()
                .map(|segment| {
                    let chunk = &segment.chunk.chunk;
                    SourceRef {
                        id: chunk.id.clone(),
                        source: chunk.source.clone(),
                        source_kind: chunk.source_kind,
                        chunk_index: chunk.chunk_index,
                        score: segment.chunk.score,
                        text: chunk.text.chars().take(SOURCE_PREVIEW_CHARS).collect(),
                    }
                })
                .collect()
        } else {
            Vec::new()
        };

        tracing::info!(sources = sources.len(), "answer generated");
        Ok(Answer { text, sources })
    }

    /// Delete every chunk from a source.
    pub async fn delete_source(&self, source: &str) -> Result<DeleteResult> {
        let count = self.store.delete_by_source(source).await?;
        Ok(DeleteResult { count })
    }

    /// Delete one chunk by id. Returns whether it existed.
    pub async fn delete_chunk(&self, id: &str) -> Result<bool> {
        Ok(self.store.delete_by_id(id).await?)
    }

    /// Delete everything in the index.
    pub async fn clear(&self) -> Result<DeleteResult> {
        let count = self.store.clear().await?;
        Ok(DeleteResult { count })
    }

    /// List every stored chunk (text and metadata, no embeddings), in
    /// insertion order.
    pub async fn list_chunks(&self) -> Result<Vec<ChunkSummary>> {
        Ok(self.store.list().await?)
    }

    /// Index statistics, forwarded from the store.
    pub async fn stats(&self) -> Result<StatsSnapshot> {
        Ok(self.store.stats().await?)
    }

    /// Tear down the pipeline's long-lived handles. In-flight writes finish
    /// first (the store's pool drains); call once at process shutdown.
    pub async fn shutdown(&self) {
        tracing::info!("shutting down pipeline");
        self.store.close().await;
    }
}

fn build_prompt(question: &str, block: &ContextBlock) -> String {
    let context = if block.is_empty() {
        NO_CONTEXT_MARKER.to_string()
    } else {
        block
            .segments
            .iter()
            .enumerate()
            .map(|(i, segment)| {
                format!(
                    "[Document {} - Source: {}]\n{}",
                    i + 1,
                    segment.chunk.chunk.source,
                    segment.text
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    };

    format!(
        "{SYSTEM_INSTRUCTION}\n\nContext:\n{context}\n\nQuestion: {question}\n\n\
         Please provide a clear and accurate answer based on the context above."
    )
}
