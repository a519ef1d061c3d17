//! ragmill-pipeline: the answer orchestrator for the ragmill pipeline.
//!
//! Composes the other crates into the two user-facing flows:
//!
//! - ingestion: text → [`ragmill_chunk::TextSplitter`] → vector store
//! - query: question → [`retriever::Retriever`] → [`context::assemble`] →
//!   prompt → [`generate::TextGenerator`] → [`pipeline::Answer`]
//!
//! Construct one [`RagPipeline`] at process start with a store and a
//! generator, then share it; it serializes generation internally.

pub mod config;
pub mod context;
pub mod error;
pub mod generate;
pub mod pipeline;
pub mod retriever;

pub use config::PipelineConfig;
pub use context::{assemble, ContextBlock, ContextSegment};
pub use error::{PipelineError, Result};
pub use generate::{GenerateError, OpenAiGenerator, TextGenerator};
pub use pipeline::{Answer, DeleteResult, InsertResult, QueryOptions, RagPipeline, SourceRef};
pub use retriever::Retriever;
