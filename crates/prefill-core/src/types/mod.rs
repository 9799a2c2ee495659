//! Type system for Prefill
//!
//! Rule evaluation works on a small dynamically typed value model.

pub mod value;

pub use value::Value;
