//! Reference document substrate
//!
//! The engine only talks to documents through
//! [`PathEvaluator`](prefill_core::PathEvaluator). `XmlDocument` implements it
//! over `roxmltree` with a small path dialect (see [`path`]).

pub mod path;
mod xml;

pub use xml::XmlDocument;
