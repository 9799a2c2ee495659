//! SDK error types

use thiserror::Error;

/// SDK error type
#[derive(Error, Debug)]
pub enum SdkError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Value registry error
    #[error("Value set error: {0}")]
    CoreError(#[from] prefill_core::CoreError),

    /// Parser error
    #[error("Parser error: {0}")]
    ParseError(#[from] prefill_parser::ParseError),

    /// Runtime error
    #[error("Runtime error: {0}")]
    RuntimeError(#[from] prefill_runtime::RuntimeError),

    /// I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// No schema declared for a document type
    #[error("Unknown document type: {0}")]
    UnknownDocumentType(String),

    /// The input cannot be treated as a document at all
    #[error("Document error: {0}")]
    DocumentError(String),
}

/// Result type for SDK operations
pub type Result<T> = std::result::Result<T, SdkError>;
