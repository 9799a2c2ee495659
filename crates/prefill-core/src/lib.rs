//! Prefill Core - Core types and definitions for the Prefill document rule engine
//!
//! This crate provides the fundamental types used across the Prefill workspace:
//! - Value types for rule evaluation
//! - Value sets and the coded-value registry
//! - The path evaluator contract for the document substrate
//! - Rule expression AST definitions
//! - Declaration types for schemas and value-set bundles
//! - Error types

pub mod ast;
pub mod document;
pub mod error;
pub mod types;
pub mod valueset;

// Re-export commonly used types
pub use document::{Bindings, PathEvaluator};
pub use error::CoreError;
pub use types::Value;
pub use valueset::{CodeEntry, ValueRegistry, ValueRegistryBuilder, ValueSet};
