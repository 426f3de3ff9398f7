//! Error types for Tiffin.
//!
//! All fallible operations return [`Result`], whose error side is the
//! [`TiffinError`] enum. The variants mirror the failure classes of the
//! pipeline: configuration problems are fatal at startup, training data
//! problems abort training, and a missing model fails only the calling
//! operation.
//!
//! # Examples
//!
//! ```
//! use tiffin::error::{Result, TiffinError};
//!
//! fn example_operation() -> Result<()> {
//!     Err(TiffinError::configuration("no handler bound to label 'Order'"))
//! }
//!
//! match example_operation() {
//!     Ok(_) => println!("Success"),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

use std::io;

use thiserror::Error;

/// The main error type for Tiffin operations.
#[derive(Error, Debug)]
pub enum TiffinError {
    /// I/O errors (corpus files, dictionaries, model artifacts)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Missing or malformed corpus/dictionary files, unbound intent labels
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The cleaned training set is unusable
    #[error("Training data error: {0}")]
    TrainingData(String),

    /// Predict was called before train or load
    #[error("Model not trained: {0}")]
    ModelNotTrained(String),

    /// Analysis-related errors (tokenization, filtering, etc.)
    #[error("Analysis error: {0}")]
    Analysis(String),

    /// Resource exhausted
    #[error("Resource exhausted: {0}")]
    ResourceExhausted(String),

    /// Invalid argument
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Binary artifact encoding errors
    #[error("Binary encoding error: {0}")]
    Bincode(#[from] bincode::Error),

    /// Generic error for other cases
    #[error("Error: {0}")]
    Other(String),
}

/// Result type alias for operations that may fail with TiffinError.
pub type Result<T> = std::result::Result<T, TiffinError>;

impl TiffinError {
    /// Create a new configuration error.
    pub fn configuration<S: Into<String>>(msg: S) -> Self {
        TiffinError::Configuration(msg.into())
    }

    /// Create a new training data error.
    pub fn training_data<S: Into<String>>(msg: S) -> Self {
        TiffinError::TrainingData(msg.into())
    }

    /// Create a new model-not-trained error.
    pub fn model_not_trained<S: Into<String>>(msg: S) -> Self {
        TiffinError::ModelNotTrained(msg.into())
    }

    /// Create a new analysis error.
    pub fn analysis<S: Into<String>>(msg: S) -> Self {
        TiffinError::Analysis(msg.into())
    }

    /// Create a new resource exhausted error.
    pub fn resource_exhausted<S: Into<String>>(msg: S) -> Self {
        TiffinError::ResourceExhausted(msg.into())
    }

    /// Create a new invalid argument error.
    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        TiffinError::InvalidArgument(msg.into())
    }

    /// Create a new serialization error.
    pub fn serialization<S: Into<String>>(msg: S) -> Self {
        TiffinError::SerializationError(msg.into())
    }

    /// Create a new generic error.
    pub fn other<S: Into<String>>(msg: S) -> Self {
        TiffinError::Other(msg.into())
    }

    /// Whether this error should abort the whole process rather than the
    /// single operation that raised it.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            TiffinError::Configuration(_) | TiffinError::TrainingData(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_construction() {
        let error = TiffinError::configuration("missing intents.json");
        assert_eq!(
            error.to_string(),
            "Configuration error: missing intents.json"
        );

        let error = TiffinError::training_data("no examples left");
        assert_eq!(error.to_string(), "Training data error: no examples left");

        let error = TiffinError::model_not_trained("predict before train");
        assert_eq!(error.to_string(), "Model not trained: predict before train");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "File not found");
        let error = TiffinError::from(io_error);

        match error {
            TiffinError::Io(_) => {} // Expected
            _ => panic!("Expected IO error variant"),
        }
    }

    #[test]
    fn test_fatal_classification() {
        assert!(TiffinError::configuration("x").is_fatal());
        assert!(TiffinError::training_data("x").is_fatal());
        assert!(!TiffinError::model_not_trained("x").is_fatal());
        assert!(!TiffinError::resource_exhausted("x").is_fatal());
    }
}
