//! Pipeline configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

/// Tunable parameters for the whole pipeline.
///
/// Every field has a working default, so a config file only needs to name
/// the values it overrides.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// How many chunks to retrieve per query.
    pub retrieval_k: usize,
    /// Minimum relevance score a retrieved chunk must reach, in [0, 1].
    pub relevance_threshold: f32,
    /// Character budget for the assembled context block.
    pub max_context_chars: usize,
    /// Chunk window size in characters.
    pub chunk_size: usize,
    /// Overlap between consecutive chunks in characters.
    pub chunk_overlap: usize,
    /// Maximum tokens the generator may produce per answer.
    pub max_tokens: u32,
    /// Sampling temperature passed to the generator.
    pub temperature: f32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            retrieval_k: 5,
            relevance_threshold: 0.5,
            max_context_chars: 4000,
            chunk_size: 512,
            chunk_overlap: 100,
            max_tokens: 512,
            temperature: 0.7,
        }
    }
}

impl PipelineConfig {
    /// Parse a config from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| PipelineError::config(format!("invalid config: {e}")))
    }

    /// Load a config from a TOML file.
    pub async fn load(path: &Path) -> Result<Self> {
        let text = tokio::fs::read_to_string(path).await.map_err(|e| {
            PipelineError::config(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&text)
    }

    pub fn with_retrieval_k(mut self, k: usize) -> Self {
        self.retrieval_k = k;
        self
    }

    pub fn with_relevance_threshold(mut self, threshold: f32) -> Self {
        self.relevance_threshold = threshold;
        self
    }

    pub fn with_max_context_chars(mut self, chars: usize) -> Self {
        self.max_context_chars = chars;
        self
    }
}
