//! Prefill Parser - rule text and declaration parsing
//!
//! This crate turns authored text into engine structures:
//! - the pseudo-English rewrite steps applied to function rules
//! - a tokenizer and recursive-descent parser for the rewritten rule language
//! - YAML / JSON parsers for schema declarations and value-set bundles

pub mod error;
pub mod lexer;
pub mod placeholder;
pub mod rewrite;
pub mod rule_parser;
pub mod schema_parser;
pub mod valueset_parser;

// Re-export main parser types
pub use error::{ParseError, Result};
pub use lexer::{Lexer, Token};
pub use placeholder::substitute_placeholders;
pub use rewrite::{apply_rewrites, apply_token_table, TOKEN_TABLE};
pub use rule_parser::RuleParser;
pub use schema_parser::SchemaParser;
pub use valueset_parser::ValueSetParser;
