//! ragmill-chunk: overlapping text chunking for the ragmill pipeline.
//!
//! This crate turns extracted document text into [`DraftChunk`]s suitable for
//! embedding and semantic retrieval. See [`text`] for the windowing rules.

pub mod error;
pub mod text;

pub use error::{ChunkError, Result};
pub use text::{Document, DraftChunk, SourceKind, TextSplitter};
