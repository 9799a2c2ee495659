//! Document schema declarations
//!
//! A schema declaration is configuration data: the ordered list of fields a
//! document type exposes, where each field lives in the document, and how
//! derived fields are computed. The runtime turns a declaration into a
//! populated schema; nothing here evaluates anything.

use serde::{Deserialize, Serialize};

/// Declaration of one document type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaDeclaration {
    pub document_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Fields in declaration order; a field may only reference fields
    /// declared before it
    #[serde(default)]
    pub fields: Vec<FieldDeclaration>,
}

/// Declaration of one field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDeclaration {
    pub name: String,

    #[serde(default)]
    pub label: String,

    #[serde(default)]
    pub description: String,

    /// Path expression relative to the context node
    #[serde(default)]
    pub path: String,

    /// Contribute to template population
    #[serde(default = "default_true")]
    pub template: bool,

    /// Extract as part of the whole-document pass
    #[serde(default = "default_true")]
    pub extraction: bool,

    /// Reusable markup fragment rendered for `${<name>Snippet}`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,

    /// Values of earlier fields substituted into `path`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bindings: Vec<BindingDeclaration>,

    #[serde(flatten)]
    pub kind: FieldKindDeclaration,
}

/// Variant-specific part of a field declaration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldKindDeclaration {
    Scalar {
        /// Attribute to read instead of `value` / element text
        #[serde(default, skip_serializing_if = "Option::is_none")]
        attribute: Option<String>,
    },
    Coded,
    Identifier,
    Interval {
        #[serde(default)]
        precision: IntervalPrecision,
    },
    PersonName,
    Address,
    CauseOfDeath {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        cause_path: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        onset_path: Option<String>,
    },
    AttributeBag {
        attributes: Vec<String>,
    },
    Composite {
        fields: Vec<FieldDeclaration>,
    },
    Sequence {
        prototype: Box<FieldDeclaration>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        trigger: Option<TriggerDeclaration>,
    },
    Function {
        rule: String,
        /// Value used when the rule cannot be evaluated
        #[serde(default)]
        default: String,
        #[serde(default)]
        rewrites: Vec<RewriteDeclaration>,
        #[serde(default)]
        variables: Vec<VariableDeclaration>,
    },
}

/// Precision kept by interval fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntervalPrecision {
    /// Truncate timestamps to `YYYYMMDD`
    #[default]
    Date,
    /// Keep timestamps as written
    DateTime,
}

/// Binding of a path placeholder to another field's parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BindingDeclaration {
    /// Name used as `$placeholder` inside the path expression
    pub placeholder: String,
    /// Field the value comes from
    pub field: String,
    /// Parameter suffix, e.g. `Extension` for an identifier
    #[serde(default)]
    pub suffix: String,
}

/// Literal `from` -> `to` substring rewrite
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewriteDeclaration {
    pub from: String,
    pub to: String,
}

/// Field a function depends on, with its own rewrites
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableDeclaration {
    pub field: String,
    #[serde(default)]
    pub rewrites: Vec<RewriteDeclaration>,
}

/// How a sequence decides to keep a candidate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TriggerDeclaration {
    /// Keep candidates whose code belongs to one of the value sets
    ValueSet {
        value_sets: Vec<String>,
        #[serde(default)]
        match_code_system: bool,
        /// Nested coded field holding the code, for composite prototypes
        #[serde(default, skip_serializing_if = "Option::is_none")]
        code_field: Option<String>,
    },
    /// Membership plus an ordering between two interval fields of the candidate
    Composite {
        value_sets: Vec<String>,
        #[serde(default)]
        match_code_system: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        code_field: Option<String>,
        first: String,
        second: String,
        relation: TemporalRelation,
    },
}

/// Required relation between `first` and `second`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemporalRelation {
    Before,
    OnOrBefore,
    After,
    OnOrAfter,
    SameDay,
}

fn default_true() -> bool {
    true
}

impl FieldDeclaration {
    /// Declaration with default flags and no label
    pub fn new(name: impl Into<String>, path: impl Into<String>, kind: FieldKindDeclaration) -> Self {
        Self {
            name: name.into(),
            label: String::new(),
            description: String::new(),
            path: path.into(),
            template: true,
            extraction: true,
            snippet: None,
            bindings: Vec::new(),
            kind,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_snippet(mut self, snippet: impl Into<String>) -> Self {
        self.snippet = Some(snippet.into());
        self
    }

    pub fn with_binding(
        mut self,
        placeholder: impl Into<String>,
        field: impl Into<String>,
        suffix: impl Into<String>,
    ) -> Self {
        self.bindings.push(BindingDeclaration {
            placeholder: placeholder.into(),
            field: field.into(),
            suffix: suffix.into(),
        });
        self
    }

    pub fn excluded_from_extraction(mut self) -> Self {
        self.extraction = false;
        self
    }

    pub fn excluded_from_template(mut self) -> Self {
        self.template = false;
        self
    }
}

impl RewriteDeclaration {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}
