//! Field hierarchy
//!
//! A [`Field`] pairs shared configuration ([`FieldMeta`], behind an `Arc`)
//! with an extracted value and a variant payload ([`FieldKind`]). Cloning a
//! field for a sequence match shares the configuration and copies the
//! payload, so the prototype itself is never populated.

mod extract;
pub mod payload;
pub mod timestamp;

use std::sync::Arc;

use indexmap::IndexMap;
use prefill_core::ast::IntervalPrecision;
use prefill_core::{PathEvaluator, ValueRegistry};

use crate::function::FunctionSpec;
use crate::options::EngineOptions;
use crate::trigger::Trigger;
pub use payload::{
    AddressPayload, Alias, AttributeBagPayload, CauseOfDeathPayload, CodedPayload,
    CompositePayload, FunctionPayload, IdentifierPayload, IntervalPayload, PersonNamePayload,
    SequencePayload,
};

/// Index of a field inside its [`DocumentSchema`](crate::DocumentSchema)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldId(pub(crate) usize);

impl FieldId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// `$placeholder` in a path, filled from another field's parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathBinding {
    pub placeholder: String,
    pub field: FieldId,
    pub suffix: String,
}

/// Configuration shared by a field and all of its clones
#[derive(Debug, Clone)]
pub struct FieldMeta {
    pub name: String,
    pub label: String,
    pub description: String,
    pub path: String,
    pub include_in_template: bool,
    pub include_in_extraction: bool,
    /// Markup fragment rendered for `${nameSnippet}`
    pub snippet: Option<String>,
    pub bindings: Vec<PathBinding>,
}

impl FieldMeta {
    fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: String::new(),
            description: String::new(),
            path: path.into(),
            include_in_template: true,
            include_in_extraction: true,
            snippet: None,
            bindings: vec![],
        }
    }
}

/// Variant payload of a field
#[derive(Debug, Clone)]
pub enum FieldKind {
    Scalar {
        /// Attribute read instead of `@value` / element text
        attribute: Option<Arc<str>>,
    },
    Coded(CodedPayload),
    Identifier(IdentifierPayload),
    Interval(IntervalPayload),
    PersonName(PersonNamePayload),
    Address(AddressPayload),
    CauseOfDeath(CauseOfDeathPayload),
    AttributeBag(AttributeBagPayload),
    Composite(CompositePayload),
    Sequence(SequencePayload),
    Function(FunctionPayload),
}

impl FieldKind {
    pub fn name(&self) -> &'static str {
        match self {
            FieldKind::Scalar { .. } => "scalar",
            FieldKind::Coded(_) => "coded",
            FieldKind::Identifier(_) => "identifier",
            FieldKind::Interval(_) => "interval",
            FieldKind::PersonName(_) => "person_name",
            FieldKind::Address(_) => "address",
            FieldKind::CauseOfDeath(_) => "cause_of_death",
            FieldKind::AttributeBag(_) => "attribute_bag",
            FieldKind::Composite(_) => "composite",
            FieldKind::Sequence(_) => "sequence",
            FieldKind::Function(_) => "function",
        }
    }
}

/// Named extraction unit bound to a document location
#[derive(Debug, Clone)]
pub struct Field {
    meta: Arc<FieldMeta>,
    value: Option<String>,
    kind: FieldKind,
}

impl Field {
    fn with_kind(name: impl Into<String>, path: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            meta: Arc::new(FieldMeta::new(name, path)),
            value: None,
            kind,
        }
    }

    pub fn scalar(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self::with_kind(name, path, FieldKind::Scalar { attribute: None })
    }

    /// Scalar read from a named attribute of the located node
    pub fn scalar_attribute(
        name: impl Into<String>,
        path: impl Into<String>,
        attribute: impl Into<String>,
    ) -> Self {
        let attribute: String = attribute.into();
        Self::with_kind(
            name,
            path,
            FieldKind::Scalar {
                attribute: Some(Arc::from(attribute)),
            },
        )
    }

    pub fn coded(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self::with_kind(name, path, FieldKind::Coded(CodedPayload::default()))
    }

    pub fn identifier(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self::with_kind(name, path, FieldKind::Identifier(IdentifierPayload::default()))
    }

    pub fn interval(
        name: impl Into<String>,
        path: impl Into<String>,
        precision: IntervalPrecision,
    ) -> Self {
        Self::with_kind(
            name,
            path,
            FieldKind::Interval(IntervalPayload {
                precision,
                high_value: None,
            }),
        )
    }

    pub fn person_name(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self::with_kind(name, path, FieldKind::PersonName(PersonNamePayload::default()))
    }

    pub fn address(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self::with_kind(name, path, FieldKind::Address(AddressPayload::default()))
    }

    pub fn cause_of_death(
        name: impl Into<String>,
        path: impl Into<String>,
        cause_path: Option<&str>,
        onset_path: Option<&str>,
    ) -> Self {
        Self::with_kind(
            name,
            path,
            FieldKind::CauseOfDeath(CauseOfDeathPayload {
                cause_path: Arc::from(cause_path.unwrap_or(CauseOfDeathPayload::DEFAULT_CAUSE_PATH)),
                onset_path: Arc::from(onset_path.unwrap_or(CauseOfDeathPayload::DEFAULT_ONSET_PATH)),
                onset_interval: None,
            }),
        )
    }

    pub fn attribute_bag(
        name: impl Into<String>,
        path: impl Into<String>,
        attributes: Vec<String>,
    ) -> Self {
        let mut payload = AttributeBagPayload {
            attributes: Arc::from(attributes),
            values: IndexMap::new(),
        };
        payload.reset();
        Self::with_kind(name, path, FieldKind::AttributeBag(payload))
    }

    pub fn composite(name: impl Into<String>, path: impl Into<String>, fields: Vec<Field>) -> Self {
        Self::with_kind(
            name,
            path,
            FieldKind::Composite(CompositePayload {
                fields,
                class_code: None,
                mood_code: None,
                reference: None,
                status_code: None,
            }),
        )
    }

    pub fn sequence(
        name: impl Into<String>,
        path: impl Into<String>,
        prototype: Field,
        trigger: Option<Trigger>,
    ) -> Self {
        let mut payload = SequencePayload {
            prototype: Arc::new(prototype.fresh_clone()),
            trigger: trigger.map(Arc::new),
            accepted: vec![],
            examined: 0,
            side_channel: IndexMap::new(),
        };
        payload.reset();
        Self::with_kind(name, path, FieldKind::Sequence(payload))
    }

    /// Function fields have no path; their value comes from a rule
    pub fn function(name: impl Into<String>, spec: FunctionSpec) -> Self {
        Self::with_kind(
            name,
            "",
            FieldKind::Function(FunctionPayload {
                spec: Arc::new(spec),
                rewritten: None,
                failed: false,
            }),
        )
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.meta).label = label.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.meta).description = description.into();
        self
    }

    pub fn with_snippet(mut self, snippet: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.meta).snippet = Some(snippet.into());
        self
    }

    pub fn with_binding(
        mut self,
        placeholder: impl Into<String>,
        field: FieldId,
        suffix: impl Into<String>,
    ) -> Self {
        Arc::make_mut(&mut self.meta).bindings.push(PathBinding {
            placeholder: placeholder.into(),
            field,
            suffix: suffix.into(),
        });
        self
    }

    /// Skip this field in `extract_all`; it is populated upstream
    pub fn excluded_from_extraction(mut self) -> Self {
        Arc::make_mut(&mut self.meta).include_in_extraction = false;
        self
    }

    pub fn excluded_from_template(mut self) -> Self {
        Arc::make_mut(&mut self.meta).include_in_template = false;
        self
    }

    pub fn meta(&self) -> &FieldMeta {
        &self.meta
    }

    pub fn name(&self) -> &str {
        &self.meta.name
    }

    pub fn path(&self) -> &str {
        &self.meta.path
    }

    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    pub fn kind(&self) -> &FieldKind {
        &self.kind
    }

    pub(crate) fn kind_mut(&mut self) -> &mut FieldKind {
        &mut self.kind
    }

    pub(crate) fn set_value(&mut self, value: Option<String>) {
        self.value = value;
    }

    pub fn is_function(&self) -> bool {
        matches!(self.kind, FieldKind::Function(_))
    }

    /// Clear the value and every extracted part of the payload
    pub fn reset(&mut self) {
        self.value = None;
        match &mut self.kind {
            FieldKind::Scalar { .. } => {}
            FieldKind::Coded(p) => p.reset(),
            FieldKind::Identifier(p) => p.extension = None,
            FieldKind::Interval(p) => p.high_value = None,
            FieldKind::PersonName(p) => *p = PersonNamePayload::default(),
            FieldKind::Address(p) => *p = AddressPayload::default(),
            FieldKind::CauseOfDeath(p) => p.onset_interval = None,
            FieldKind::AttributeBag(p) => p.reset(),
            FieldKind::Composite(p) => p.reset(),
            FieldKind::Sequence(p) => p.reset(),
            FieldKind::Function(p) => p.reset(),
        }
    }

    /// Unpopulated copy sharing this field's configuration
    pub fn fresh_clone(&self) -> Field {
        let mut clone = self.clone();
        clone.reset();
        clone
    }

    /// Path bindings of this field and of every nested field
    pub fn collect_bindings<'a>(&'a self, out: &mut Vec<&'a PathBinding>) {
        out.extend(self.meta.bindings.iter());
        match &self.kind {
            FieldKind::Composite(p) => {
                for field in &p.fields {
                    field.collect_bindings(out);
                }
            }
            FieldKind::Sequence(p) => p.prototype.collect_bindings(out),
            _ => {}
        }
    }
}

/// Everything a field needs while extracting
pub struct ExtractionContext<'a, E: PathEvaluator> {
    pub evaluator: &'a E,
    pub registry: &'a ValueRegistry,
    pub options: &'a EngineOptions,
}

impl<'a, E: PathEvaluator> ExtractionContext<'a, E> {
    pub fn new(evaluator: &'a E, registry: &'a ValueRegistry, options: &'a EngineOptions) -> Self {
        Self {
            evaluator,
            registry,
            options,
        }
    }
}
