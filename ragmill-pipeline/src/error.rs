//! Error types for the answer pipeline.

use ragmill_chunk::ChunkError;
use ragmill_embed::EmbedError;
use ragmill_index::IndexError;

use crate::generate::GenerateError;

/// Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Errors surfaced to the pipeline's caller.
///
/// Collaborator failures pass through unmodified and are never retried here;
/// retries, if wanted, belong to the transport layer above.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// A caller-supplied parameter was rejected before any state change.
    #[error("invalid parameter: {message}")]
    InvalidParameter { message: String },

    /// The embedding collaborator failed.
    #[error("embedding failed: {0}")]
    Embedding(#[from] EmbedError),

    /// The generation collaborator failed; retrieval work is discarded.
    #[error("generation failed: {0}")]
    Generation(#[from] GenerateError),

    /// The vector index failed at the storage layer.
    #[error("index error: {0}")]
    Index(IndexError),

    /// Configuration could not be read or parsed.
    #[error("configuration error: {message}")]
    Config { message: String },
}

impl PipelineError {
    pub fn invalid_parameter<S: Into<String>>(message: S) -> Self {
        Self::InvalidParameter {
            message: message.into(),
        }
    }

    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}

impl From<ChunkError> for PipelineError {
    fn from(err: ChunkError) -> Self {
        match err {
            ChunkError::InvalidParameter { message } => Self::InvalidParameter { message },
        }
    }
}

// Flatten index errors into the pipeline taxonomy so callers see an
// embedding failure as an embedding failure regardless of which layer hit it.
impl From<IndexError> for PipelineError {
    fn from(err: IndexError) -> Self {
        match err {
            IndexError::InvalidParameter { message } => Self::InvalidParameter { message },
            IndexError::Embedding(e) => Self::Embedding(e),
            other => Self::Index(other),
        }
    }
}
