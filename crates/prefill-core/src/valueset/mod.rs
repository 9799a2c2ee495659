//! Coded value sets
//!
//! A value set is a named, versioned collection of recognised codes, each
//! carrying a display name and the OID of its coding system. Value sets are
//! registered once through a [`ValueRegistryBuilder`] and then frozen into an
//! immutable [`ValueRegistry`] shared by every schema built afterwards.

mod definition;
mod registry;
mod set;

pub use definition::{CodeDefinition, ValueSetBundle, ValueSetDefinition};
pub use registry::{ValueRegistry, ValueRegistryBuilder};
pub use set::{CodeEntry, ValueSet};
