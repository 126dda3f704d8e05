//! Error types for polymat.

use thiserror::Error;

/// Result type alias using polymat's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for polymat operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation failed (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Paragraph not found
    #[error("Paragraph not found: {0}")]
    ParagraphNotFound(i64),

    /// NER tagger call failed
    #[error("Tagger error: {0}")]
    Tagger(String),

    /// LLM inference/generation failed
    #[error("Inference error: {0}")]
    Inference(String),

    /// Tag/token alignment failed for a paragraph
    #[error("Alignment error: {0}")]
    Alignment(String),

    /// A property-value string could not be parsed
    #[error("Value parse error: {0}")]
    ValueParse(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error (missing method, missing property metadata)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// HTTP/network request failed
    #[error("Request error: {0}")]
    Request(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether this error indicates a setup problem that must abort the
    /// batch rather than be skipped (spec: missing method definitions and
    /// missing property metadata are fatal, data errors are not).
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::Config(_))
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Request(e.to_string())
    }
}
