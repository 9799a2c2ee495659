//! Document schema
//!
//! Owns the ordered fields of one document type. Fields reference each other
//! by [`FieldId`], and a field may only reference fields added before it, so
//! `extract_all` in declaration order always sees its dependencies resolved.

use std::collections::HashMap;
use std::sync::Arc;

use indexmap::IndexMap;
use prefill_core::{Bindings, PathEvaluator, ValueRegistry};

use crate::error::{Result, RuntimeError};
use crate::field::{ExtractionContext, Field, FieldId, FieldKind};
use crate::function::pipeline::{evaluate_rule, rewrite_rule};
use crate::options::EngineOptions;
use crate::resolver::{ParameterResolver, Parameters};

/// Counters of one extraction pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassSummary {
    /// Non-function fields extracted
    pub extracted: usize,
    pub functions_evaluated: usize,
    /// Functions that fell back to their default
    pub functions_failed: usize,
}

/// Fields already handled in the current pass
struct Pass {
    done: Vec<bool>,
    summary: PassSummary,
}

impl Pass {
    fn new(len: usize) -> Self {
        Self {
            done: vec![false; len],
            summary: PassSummary::default(),
        }
    }
}

/// Ordered fields of one document type
#[derive(Debug)]
pub struct DocumentSchema {
    document_type: String,
    fields: Vec<Field>,
    index: HashMap<String, FieldId>,
    registry: Arc<ValueRegistry>,
    options: EngineOptions,
    resolver: ParameterResolver,
}

impl DocumentSchema {
    pub fn new(
        document_type: impl Into<String>,
        registry: Arc<ValueRegistry>,
        options: EngineOptions,
    ) -> Self {
        Self {
            document_type: document_type.into(),
            fields: Vec::new(),
            index: HashMap::new(),
            registry,
            options,
            resolver: ParameterResolver::from_options(&options),
        }
    }

    pub fn document_type(&self) -> &str {
        &self.document_type
    }

    pub fn registry(&self) -> &Arc<ValueRegistry> {
        &self.registry
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    pub fn resolver(&self) -> &ParameterResolver {
        &self.resolver
    }

    /// Append a field.
    ///
    /// Fails with `DuplicateField` if the name is taken and with
    /// `UnknownField` if a path binding or function variable refers to a
    /// field that has not been added yet.
    pub fn add_field(&mut self, field: Field) -> Result<FieldId> {
        if self.index.contains_key(field.name()) {
            return Err(RuntimeError::DuplicateField(field.name().to_string()));
        }

        let mut bindings = Vec::new();
        field.collect_bindings(&mut bindings);
        for binding in bindings {
            if binding.field.0 >= self.fields.len() {
                return Err(RuntimeError::UnknownField(format!(
                    "binding ${} of '{}' refers to field #{}",
                    binding.placeholder,
                    field.name(),
                    binding.field.0
                )));
            }
        }

        if let FieldKind::Function(payload) = field.kind() {
            for variable in &payload.spec.variables {
                if variable.field.0 >= self.fields.len() {
                    return Err(RuntimeError::UnknownField(format!(
                        "variable of '{}' refers to field #{}",
                        field.name(),
                        variable.field.0
                    )));
                }
            }
        }

        let id = FieldId(self.fields.len());
        self.index.insert(field.name().to_string(), id);
        self.fields.push(field);
        Ok(id)
    }

    /// Id of a field; fails with `UnknownField` when absent
    pub fn by_name(&self, name: &str) -> Result<FieldId> {
        self.index
            .get(name)
            .copied()
            .ok_or_else(|| RuntimeError::UnknownField(name.to_string()))
    }

    pub fn field(&self, id: FieldId) -> Option<&Field> {
        self.fields.get(id.0)
    }

    pub fn field_by_name(&self, name: &str) -> Result<&Field> {
        let id = self.by_name(name)?;
        self.field(id)
            .ok_or_else(|| RuntimeError::UnknownField(name.to_string()))
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Clear every field
    pub fn reset(&mut self) {
        for field in &mut self.fields {
            field.reset();
        }
    }

    /// Extract every extraction-enabled field, in declaration order.
    ///
    /// Each field is extracted at most once per pass; a function finds its
    /// dependencies already done.
    pub fn extract_all<E: PathEvaluator>(&mut self, evaluator: &E, root: E::Node) -> PassSummary {
        self.reset();
        let mut pass = Pass::new(self.fields.len());
        for index in 0..self.fields.len() {
            if self.fields[index].meta().include_in_extraction {
                self.extract_in_pass(evaluator, root, FieldId(index), &mut pass);
            }
        }
        tracing::debug!(
            "Extracted {} fields for '{}' ({} functions, {} failed)",
            pass.summary.extracted,
            self.document_type,
            pass.summary.functions_evaluated,
            pass.summary.functions_failed
        );
        pass.summary
    }

    /// Extract (or evaluate, for a function) one field.
    ///
    /// A function first re-extracts its extraction-enabled dependencies,
    /// each of them once.
    pub fn extract_field<E: PathEvaluator>(
        &mut self,
        evaluator: &E,
        root: E::Node,
        id: FieldId,
    ) -> PassSummary {
        let mut pass = Pass::new(self.fields.len());
        self.extract_in_pass(evaluator, root, id, &mut pass);
        pass.summary
    }

    fn extract_in_pass<E: PathEvaluator>(
        &mut self,
        evaluator: &E,
        root: E::Node,
        id: FieldId,
        pass: &mut Pass,
    ) {
        let is_function = match self.fields.get(id.0) {
            Some(field) => field.is_function(),
            None => {
                tracing::warn!("No field #{} in '{}'", id.0, self.document_type);
                return;
            }
        };
        if pass.done[id.0] {
            return;
        }

        if is_function {
            self.evaluate_function(evaluator, root, id, pass);
        } else {
            let bindings = self.bindings_for(id);
            let ctx = ExtractionContext::new(evaluator, &self.registry, &self.options);
            self.fields[id.0].extract(&ctx, root, &bindings);
            pass.summary.extracted += 1;
        }
        pass.done[id.0] = true;
    }

    /// Resolve the path bindings of a field and its nested fields
    fn bindings_for(&self, id: FieldId) -> Bindings {
        let mut declared = Vec::new();
        self.fields[id.0].collect_bindings(&mut declared);

        let mut bindings = Bindings::new();
        for binding in declared {
            let value = self
                .fields
                .get(binding.field.0)
                .and_then(|source| self.resolver.parameter(source, &binding.suffix))
                .filter(|value| !value.is_empty());
            match value {
                Some(value) => {
                    bindings.insert(binding.placeholder.clone(), value);
                }
                None => tracing::debug!(
                    "Binding ${} of '{}' has no value",
                    binding.placeholder,
                    self.fields[id.0].name()
                ),
            }
        }
        bindings
    }

    fn evaluate_function<E: PathEvaluator>(
        &mut self,
        evaluator: &E,
        root: E::Node,
        id: FieldId,
        pass: &mut Pass,
    ) {
        let spec = match self.fields[id.0].kind() {
            FieldKind::Function(payload) => Arc::clone(&payload.spec),
            _ => return,
        };

        // Dependencies always precede the function, so this terminates
        for variable in &spec.variables {
            let extract = self
                .fields
                .get(variable.field.0)
                .is_some_and(|dependency| dependency.meta().include_in_extraction);
            if extract && variable.field < id {
                self.extract_in_pass(evaluator, root, variable.field, pass);
            }
        }

        let dependencies = spec
            .variables
            .iter()
            .filter_map(|variable| self.fields.get(variable.field.0));
        let rewritten = rewrite_rule(&spec, dependencies, &self.resolver);
        let outcome = evaluate_rule(&rewritten, &self.options);

        let field = &mut self.fields[id.0];
        let (value, failed) = match outcome {
            Ok(value) => (value.render(), false),
            Err(e) => {
                tracing::warn!(
                    "Function '{}' failed, using default '{}': {} (rule: {:?}, rewritten: {:?})",
                    field.name(),
                    spec.default,
                    e,
                    spec.rule,
                    rewritten
                );
                (Some(spec.default.clone()), true)
            }
        };

        pass.summary.functions_evaluated += 1;
        if failed {
            pass.summary.functions_failed += 1;
        }

        field.set_value(value);
        if let FieldKind::Function(payload) = field.kind_mut() {
            payload.rewritten = Some(rewritten);
            payload.failed = failed;
        }
    }

    /// Parameters of every field
    pub fn parameters(&self) -> Parameters {
        self.resolver.flatten_all(&self.fields)
    }

    /// Parameters of template-enabled fields
    pub fn template_parameters(&self) -> Parameters {
        self.resolver.flatten_all(self.template_fields())
    }

    fn template_fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter().filter(|f| f.meta().include_in_template)
    }

    /// Fill a template from template-enabled fields, snippets first
    pub fn populate(&self, template: &str) -> String {
        self.resolver.resolve(template, self.template_fields())
    }

    /// Field name -> extracted value
    pub fn values(&self) -> IndexMap<String, Option<String>> {
        self.fields
            .iter()
            .map(|f| (f.name().to_string(), f.value().map(str::to_string)))
            .collect()
    }
}
