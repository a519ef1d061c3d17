//! Stored chunk records and search-facing value types.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use half::f16;
use ragmill_chunk::SourceKind;
use serde::Serialize;

/// A chunk as stored in the index: text, embedding, and provenance.
///
/// The `id` is a UUIDv4 assigned at insertion time; `created_at` is the
/// insertion timestamp. Embeddings are half-precision to keep the database
/// compact.
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkRecord {
    /// Unique identifier assigned when the chunk was inserted.
    pub id: String,
    /// The chunk's text content.
    pub text: String,
    /// The chunk's embedding vector.
    pub embedding: Vec<f16>,
    /// Name or URL of the originating source.
    pub source: String,
    /// Kind of the originating source.
    pub source_kind: SourceKind,
    /// Position of this chunk within its source.
    pub chunk_index: usize,
    /// When the chunk was inserted.
    pub created_at: DateTime<Utc>,
}

/// A chunk returned from a similarity search, with its relevance score.
///
/// Scores are cosine similarity rescaled to `[0, 1]` (1 = identical
/// direction, 0.5 = orthogonal, 0 = opposite).
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    pub chunk: ChunkRecord,
    pub score: f32,
}

/// Optional constraints applied before scoring during a search.
#[derive(Debug, Clone, Default)]
pub struct SearchFilter {
    /// Only consider chunks from this source.
    pub source: Option<String>,
    /// Only consider chunks of this source kind.
    pub source_kind: Option<SourceKind>,
}

impl SearchFilter {
    pub fn for_source(source: impl Into<String>) -> Self {
        Self {
            source: Some(source.into()),
            source_kind: None,
        }
    }

    /// Whether a record satisfies every constraint in the filter.
    pub fn matches(&self, record: &ChunkRecord) -> bool {
        if let Some(source) = &self.source {
            if &record.source != source {
                return false;
            }
        }
        if let Some(kind) = self.source_kind {
            if record.source_kind != kind {
                return false;
            }
        }
        true
    }
}

/// A stored chunk as exposed by listings: everything but the embedding,
/// which is an internal detail callers have no use for.
#[derive(Debug, Clone, Serialize)]
pub struct ChunkSummary {
    pub id: String,
    pub text: String,
    pub source: String,
    pub source_kind: SourceKind,
    pub chunk_index: usize,
    pub created_at: DateTime<Utc>,
}

impl From<ChunkRecord> for ChunkSummary {
    fn from(record: ChunkRecord) -> Self {
        Self {
            id: record.id,
            text: record.text,
            source: record.source,
            source_kind: record.source_kind,
            chunk_index: record.chunk_index,
            created_at: record.created_at,
        }
    }
}

/// A snapshot of index contents, for status reporting.
#[derive(Debug, Clone, Serialize)]
pub struct StatsSnapshot {
    /// Total number of stored chunks.
    pub total_chunks: usize,
    /// Number of distinct sources.
    pub unique_sources: usize,
    /// The distinct source names, sorted.
    pub sources: BTreeSet<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(source: &str, kind: SourceKind) -> ChunkRecord {
        ChunkRecord {
            id: "id".into(),
            text: "text".into(),
            embedding: vec![],
            source: source.into(),
            source_kind: kind,
            chunk_index: 0,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn empty_filter_matches_everything() {
        let filter = SearchFilter::default();
        assert!(filter.matches(&record("a.pdf", SourceKind::Pdf)));
        assert!(filter.matches(&record("https://b", SourceKind::Web)));
    }

    #[test]
    fn filter_constrains_source_and_kind() {
        let filter = SearchFilter {
            source: Some("a.pdf".into()),
            source_kind: Some(SourceKind::Pdf),
        };
        assert!(filter.matches(&record("a.pdf", SourceKind::Pdf)));
        assert!(!filter.matches(&record("b.pdf", SourceKind::Pdf)));

        let kind_only = SearchFilter {
            source: None,
            source_kind: Some(SourceKind::Web),
        };
        assert!(!kind_only.matches(&record("a.pdf", SourceKind::Pdf)));
    }
}
