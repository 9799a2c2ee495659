//! Error types for Prefill Core

use thiserror::Error;

/// Core error type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    /// A value set code or name is already registered
    #[error("Duplicate key: {0}")]
    DuplicateKey(String),

    /// A code entry is missing a required attribute
    #[error("Invalid entry: {0}")]
    InvalidEntry(String),

    /// A code is already present in the value set
    #[error("Duplicate code '{code}' in value set '{value_set}'")]
    DuplicateCode { value_set: String, code: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid value: {0}")]
    InvalidValue(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_code_message() {
        let err = CoreError::DuplicateCode {
            value_set: "CHLAMYDIA".to_string(),
            code: "12345".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Duplicate code '12345' in value set 'CHLAMYDIA'"
        );
    }

    #[test]
    fn test_not_found_message() {
        let err = CoreError::NotFound("value set 'X'".to_string());
        assert!(err.to_string().contains("Not found"));
    }
}
