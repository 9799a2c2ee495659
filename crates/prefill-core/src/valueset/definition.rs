//! Declarative value set definitions
//!
//! These are the tuples a bulk loader hands to the registry. The tabular
//! sources they originate from are never parsed here.

use serde::{Deserialize, Serialize};

/// A batch of value sets coming from one source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueSetBundle {
    /// Identifies the source (file name, sheet, ...); used as the load guard
    pub source: String,

    #[serde(default)]
    pub value_sets: Vec<ValueSetDefinition>,
}

/// One value set with its codes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueSetDefinition {
    pub code: String,
    pub name: String,
    pub oid: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub version: String,

    #[serde(default)]
    pub codes: Vec<CodeDefinition>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeDefinition {
    pub code: String,
    pub display_name: String,
    pub code_system: String,
}

impl ValueSetDefinition {
    pub fn new(
        code: impl Into<String>,
        name: impl Into<String>,
        oid: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            oid: oid.into(),
            description: String::new(),
            version: String::new(),
            codes: Vec::new(),
        }
    }

    /// Append a code definition
    pub fn with_code(
        mut self,
        code: impl Into<String>,
        display_name: impl Into<String>,
        code_system: impl Into<String>,
    ) -> Self {
        self.codes.push(CodeDefinition {
            code: code.into(),
            display_name: display_name.into(),
            code_system: code_system.into(),
        });
        self
    }
}
