//! Prefill Runtime - extraction and rule evaluation
//!
//! This crate runs a document schema against a document:
//! - field extraction for every field variant
//! - sequences filtered by triggers
//! - function fields whose value comes from a rewritten rule
//! - parameter flattening and template population
//! - a reference XML document implementing the path evaluator contract

pub mod document;
pub mod error;
pub mod field;
pub mod function;
pub mod options;
pub mod resolver;
pub mod schema;
pub mod sequence;
pub mod trigger;

// Re-export main types
pub use document::XmlDocument;
pub use error::{Result, RuntimeError};
pub use field::{ExtractionContext, Field, FieldId, FieldKind, FieldMeta};
pub use function::{Evaluator, FunctionSpec, Variable};
pub use options::EngineOptions;
pub use resolver::{ParameterResolver, Parameters};
pub use schema::{DocumentSchema, PassSummary};
pub use trigger::{Trigger, ValueSetMatcher};
