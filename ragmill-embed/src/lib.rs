//! ragmill-embed: the embedding collaborator for the ragmill pipeline.
//!
//! Defines the [`EmbeddingProvider`] trait consumed by the vector index and
//! the retriever, plus a local-ONNX implementation backed by fastembed.
//! Embeddings are half-precision (f16) to keep the on-disk index compact.
//!
//! ```no_run
//! use ragmill_embed::{EmbedConfig, EmbeddingProvider, FastEmbedProvider};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let provider = FastEmbedProvider::create(EmbedConfig::default()).await?;
//! let embedding = provider.embed_text("hello world").await?;
//! assert_eq!(embedding.len(), provider.dimension());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod provider;

pub use config::EmbedConfig;
pub use error::{EmbedError, Result};
pub use provider::{EmbeddingProvider, EmbeddingResult, FastEmbedProvider};
