//! Error types for the vector index.

use ragmill_embed::EmbedError;

/// Result type for index operations.
pub type Result<T> = std::result::Result<T, IndexError>;

/// Errors produced while storing or searching chunks.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    /// A caller-supplied parameter was rejected before any work happened.
    #[error("invalid parameter: {message}")]
    InvalidParameter { message: String },

    /// Embedding the batch failed; the index was left unchanged.
    #[error("embedding failed: {0}")]
    Embedding(#[from] EmbedError),

    /// The underlying SQLite database reported an error.
    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),

    /// The filesystem rejected an operation while preparing storage.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A stored row could not be decoded back into a chunk.
    #[error("invalid stored record: {message}")]
    InvalidRecord { message: String },
}

impl IndexError {
    pub fn invalid_parameter<S: Into<String>>(message: S) -> Self {
        Self::InvalidParameter {
            message: message.into(),
        }
    }

    pub fn invalid_record<S: Into<String>>(message: S) -> Self {
        Self::InvalidRecord {
            message: message.into(),
        }
    }
}
