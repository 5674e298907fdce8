//! Error types for the page persistence layer

use crate::request::RequestKind;
use thiserror::Error;
use uuid::Uuid;

/// Result type alias for persistence operations
pub type Result<T> = std::result::Result<T, PersistenceError>;

/// Errors that can occur in the page persistence layer
#[derive(Error, Debug)]
pub enum PersistenceError {
    /// I/O errors (file operations)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Errors raised while reading configuration sources
    #[error("Configuration source error: {0}")]
    ConfigSource(#[from] config::ConfigError),

    /// Invalid configuration values
    #[error("Configuration error: {0}")]
    Config(String),

    /// An adaptor could not persist a request. The worker reports it and moves on.
    #[error("{kind} write failed for document {document_id}{}: {source}", page_suffix(.page_index))]
    AdaptorFailure {
        kind: RequestKind,
        document_id: Uuid,
        page_index: Option<usize>,
        #[source]
        source: Box<PersistenceError>,
    },

    /// The worker thread could not be created
    #[error("Resource exhausted: {0}")]
    ResourceExhausted(std::io::Error),

    /// The worker thread panicked before reaching its terminal state
    #[error("Persistence worker panicked")]
    WorkerPanicked,

    /// Adaptor-specific failure with context
    #[error("Adaptor error: {0}")]
    Adaptor(String),
}

fn page_suffix(page_index: &Option<usize>) -> String {
    match page_index {
        Some(index) => format!(" (page {index})"),
        None => String::new(),
    }
}

impl PersistenceError {
    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new adaptor error
    pub fn adaptor(msg: impl Into<String>) -> Self {
        Self::Adaptor(msg.into())
    }

    /// Wrap an adaptor error with the request that triggered it
    pub fn adaptor_failure(
        kind: RequestKind,
        document_id: Uuid,
        page_index: Option<usize>,
        source: PersistenceError,
    ) -> Self {
        Self::AdaptorFailure { kind, document_id, page_index, source: Box::new(source) }
    }
}
