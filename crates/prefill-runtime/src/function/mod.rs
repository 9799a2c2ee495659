//! Function fields: values derived from authored rules
//!
//! A rule is written in a pseudo-English form such as
//! `IF ($A CONTAINS ValueSet (X)) THEN 'Z' SHALL = 'Y' ELSE 'N'`, rewritten
//! into the expression language (see [`pipeline`]) and evaluated by
//! [`Evaluator`].

mod evaluator;
mod operators;
pub mod pipeline;

pub use evaluator::Evaluator;

use prefill_core::ast::RewriteDeclaration;

use crate::field::FieldId;

/// Dependency of a function on another field of the schema
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub field: FieldId,
    /// Applied to the rule text, in order, after the function's own rewrites
    pub rewrites: Vec<RewriteDeclaration>,
}

impl Variable {
    pub fn new(field: FieldId) -> Self {
        Self {
            field,
            rewrites: vec![],
        }
    }

    pub fn with_rewrite(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.rewrites.push(RewriteDeclaration::new(from, to));
        self
    }
}

/// Rule, rewrites and dependencies of a function field
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FunctionSpec {
    pub rule: String,
    /// Value used when the rule cannot be evaluated
    pub default: String,
    pub rewrites: Vec<RewriteDeclaration>,
    pub variables: Vec<Variable>,
}

impl FunctionSpec {
    pub fn new(rule: impl Into<String>) -> Self {
        Self {
            rule: rule.into(),
            ..Default::default()
        }
    }

    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = default.into();
        self
    }

    pub fn with_rewrite(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.rewrites.push(RewriteDeclaration::new(from, to));
        self
    }

    pub fn with_variable(mut self, variable: Variable) -> Self {
        self.variables.push(variable);
        self
    }
}
