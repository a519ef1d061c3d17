//! Error types for the embedding collaborator.

/// Result type for embedding operations.
pub type Result<T> = std::result::Result<T, EmbedError>;

/// Errors produced while loading an embedding model or generating embeddings.
///
/// Failures here are surfaced to callers unmodified: a failed embed aborts
/// the whole insert batch (leaving the index unchanged) or fails the query,
/// and is never retried inside the pipeline.
#[derive(Debug, thiserror::Error)]
pub enum EmbedError {
    /// The provider configuration was rejected.
    #[error("invalid embedding configuration: {message}")]
    InvalidConfig { message: String },

    /// The model failed to load or produced unusable output during setup.
    #[error("embedding model initialization failed: {source}")]
    ModelInitialization {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Embedding generation failed at inference time.
    #[error("embedding generation failed: {source}")]
    EmbeddingGeneration {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A blocking inference task panicked or was cancelled.
    #[error("async task failed: {source}")]
    AsyncTask {
        #[from]
        source: tokio::task::JoinError,
    },

    /// Errors bubbled up from the underlying embedding library.
    #[error("external error: {source}")]
    External {
        #[from]
        source: anyhow::Error,
    },
}

impl EmbedError {
    /// Create an invalid configuration error with a custom message.
    pub fn invalid_config<S: Into<String>>(message: S) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Wrap any error as a model initialization failure.
    pub fn model_init<E>(source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::ModelInitialization {
            source: Box::new(source),
        }
    }
}
