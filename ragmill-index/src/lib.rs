//! ragmill-index: the persistent vector store for the ragmill pipeline.
//!
//! Chunks and their f16 embeddings live in a single SQLite table;
//! similarity search is a brute-force cosine scan, which is plenty for the
//! corpus sizes this pipeline targets. See [`store::VectorStore`] for the
//! main entry point.

pub mod db;
pub mod error;
pub mod record;
pub mod store;

pub use db::ChunkDb;
pub use error::{IndexError, Result};
pub use record::{ChunkRecord, ChunkSummary, ScoredChunk, SearchFilter, StatsSnapshot};
pub use store::{cosine_similarity, relevance_score, VectorStore};
