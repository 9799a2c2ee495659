//! Variant payloads
//!
//! Each payload mixes configuration (shared, cheap to clone) with extracted
//! data. `reset` clears the extracted part only.

use std::sync::Arc;

use indexmap::IndexMap;
use prefill_core::ast::IntervalPrecision;

use super::Field;
use crate::function::FunctionSpec;
use crate::trigger::Trigger;

/// `translation` of a coded value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alias {
    pub code: String,
    pub code_system: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct CodedPayload {
    pub display_name: Option<String>,
    pub code_system: Option<String>,
    pub code_system_name: Option<String>,
    pub aliases: Vec<Alias>,
}

impl CodedPayload {
    pub(crate) fn reset(&mut self) {
        *self = Self::default();
    }
}

#[derive(Debug, Clone, Default)]
pub struct IdentifierPayload {
    pub extension: Option<String>,
}

#[derive(Debug, Clone)]
pub struct IntervalPayload {
    pub precision: IntervalPrecision,
    pub high_value: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct PersonNamePayload {
    pub prefix: Option<String>,
    pub given: Option<String>,
    pub family: Option<String>,
    pub suffix: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct AddressPayload {
    pub street: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
}

/// Cause of death observation; the cause text is the field value
#[derive(Debug, Clone)]
pub struct CauseOfDeathPayload {
    /// Path of the cause, relative to the located observation
    pub cause_path: Arc<str>,
    /// Path of the onset-to-death interval, relative to the located observation
    pub onset_path: Arc<str>,
    pub onset_interval: Option<String>,
}

impl CauseOfDeathPayload {
    pub const DEFAULT_CAUSE_PATH: &'static str = "value";
    pub const DEFAULT_ONSET_PATH: &'static str = "entryRelationship/observation/value";
}

#[derive(Debug, Clone)]
pub struct AttributeBagPayload {
    pub attributes: Arc<[String]>,
    /// Extracted values, in declaration order
    pub values: IndexMap<String, Option<String>>,
}

impl AttributeBagPayload {
    pub(crate) fn reset(&mut self) {
        self.values = self.attributes.iter().map(|a| (a.clone(), None)).collect();
    }
}

/// Act-level attributes plus nested fields read from the same node
#[derive(Debug, Clone)]
pub struct CompositePayload {
    pub fields: Vec<Field>,
    pub class_code: Option<String>,
    pub mood_code: Option<String>,
    pub reference: Option<String>,
    pub status_code: Option<String>,
}

impl CompositePayload {
    pub(crate) fn reset(&mut self) {
        for field in &mut self.fields {
            field.reset();
        }
        self.class_code = None;
        self.mood_code = None;
        self.reference = None;
        self.status_code = None;
    }

    /// Nested field by name
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name() == name)
    }
}

/// Repeated extraction of a prototype
#[derive(Debug, Clone)]
pub struct SequencePayload {
    /// Never populated; each candidate gets a fresh clone
    pub prototype: Arc<Field>,
    pub trigger: Option<Arc<Trigger>>,
    pub accepted: Vec<Field>,
    /// Candidates selected by the path during the last extraction
    pub examined: usize,
    /// Per value-set flags contributed by the trigger, keyed by set code
    pub side_channel: IndexMap<String, bool>,
}

impl SequencePayload {
    pub fn count(&self) -> usize {
        self.accepted.len()
    }

    pub(crate) fn reset(&mut self) {
        self.accepted.clear();
        self.examined = 0;
        self.side_channel = self
            .trigger
            .as_ref()
            .map(|t| t.initial_side_channel())
            .unwrap_or_default();
    }
}

#[derive(Debug, Clone)]
pub struct FunctionPayload {
    pub spec: Arc<FunctionSpec>,
    /// Rule text after the last rewrite pass
    pub rewritten: Option<String>,
    /// Whether the last evaluation fell back to the default
    pub failed: bool,
}

impl FunctionPayload {
    pub(crate) fn reset(&mut self) {
        self.rewritten = None;
        self.failed = false;
    }
}
