//! Configuration for embedding providers.

use serde::{Deserialize, Serialize};

/// Configuration for a [`FastEmbedProvider`](crate::provider::FastEmbedProvider).
///
/// Defaults match the pipeline's stock model (all-MiniLM-L6-v2, 384
/// dimensions) with normalized embeddings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbedConfig {
    /// Name of the embedding model, for logging and stats.
    pub model_name: String,
    /// Maximum number of texts embedded per inference call.
    pub batch_size: usize,
    /// Whether to L2-normalize embeddings after generation.
    pub normalize: bool,
}

impl Default for EmbedConfig {
    fn default() -> Self {
        Self {
            model_name: "all-MiniLM-L6-v2".to_string(),
            batch_size: 16,
            normalize: true,
        }
    }
}

impl EmbedConfig {
    pub fn new(model_name: impl Into<String>) -> Self {
        Self {
            model_name: model_name.into(),
            ..Self::default()
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_normalize(mut self, normalize: bool) -> Self {
        self.normalize = normalize;
        self
    }
}
