//! Runtime error types

use prefill_core::CoreError;
use prefill_parser::ParseError;
use thiserror::Error;

/// Runtime error
#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Two fields of one schema share a name
    #[error("Duplicate field: {0}")]
    DuplicateField(String),

    /// Reference to a field that is not (yet) part of the schema
    #[error("Unknown field: {0}")]
    UnknownField(String),

    /// Identifier left in a rule after rewriting
    #[error("Unbound identifier: {0}")]
    UnboundIdentifier(String),

    /// Type error
    #[error("Type error: {0}")]
    TypeError(String),

    /// Division by zero
    #[error("Division by zero")]
    DivisionByZero,

    /// Rule evaluation ran out of steps
    #[error("Evaluation budget of {0} steps exceeded")]
    BudgetExceeded(usize),

    /// Invalid operation
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// Document is not well-formed XML
    #[error("XML error: {0}")]
    Xml(#[from] roxmltree::Error),
}

/// Result type for runtime operations
pub type Result<T> = std::result::Result<T, RuntimeError>;
