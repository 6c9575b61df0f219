//! Error types for the Gaussian embedding engine.

use thiserror::Error;

/// The main error type for embedding operations.
#[derive(Error, Debug)]
pub enum EmbeddingError {
    /// Invalid configuration or shape mismatch at construction.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Word id or neighbor count outside the valid range.
    #[error("Index out of bounds: {index} >= {max}")]
    OutOfRange {
        /// The index that was out of bounds.
        index: usize,
        /// The maximum allowed index.
        max: usize,
    },

    /// A computed energy, gradient, or covariance became non-finite or
    /// non-positive.
    #[error("Numeric degeneracy: {0}")]
    Degenerate(String),

    /// Error in the training scheduler.
    #[error("Training error: {0}")]
    Training(String),
}

/// Result type alias for embedding operations.
pub type Result<T> = std::result::Result<T, EmbeddingError>;
