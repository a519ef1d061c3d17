//! Error types for chunking.

/// Result type for chunking operations.
pub type Result<T> = std::result::Result<T, ChunkError>;

/// Errors produced while configuring or running the text splitter.
///
/// Chunking itself is pure; the only failure mode is a caller-supplied
/// parameter that makes the window arithmetic meaningless.
#[derive(Debug, thiserror::Error)]
pub enum ChunkError {
    /// A chunking parameter was rejected before any work was done.
    #[error("invalid parameter: {message}")]
    InvalidParameter { message: String },
}
