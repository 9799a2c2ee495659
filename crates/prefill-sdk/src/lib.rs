//! Prefill SDK
//!
//! High-level API for pre-filling forms from clinical documents:
//! load value sets once, build schemas from declarations, and run a fresh
//! schema per document.

pub mod builder;
pub mod config;
pub mod engine;
pub mod error;
pub mod loader;
pub mod logging;

// Re-export main types
pub use builder::SchemaBuilder;
pub use config::EngineConfig;
pub use engine::{PrefillEngine, PrefillResult};
pub use error::{Result, SdkError};
pub use loader::{load_schemas, ValueSetLoader};
pub use logging::init_tracing;

// Re-export commonly used types from dependencies
pub use prefill_core::ast::SchemaDeclaration;
pub use prefill_core::{ValueRegistry, Value};
pub use prefill_runtime::{DocumentSchema, EngineOptions, Parameters, XmlDocument};
