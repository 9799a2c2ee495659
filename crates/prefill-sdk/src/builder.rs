//! Builds a [`DocumentSchema`] from a declaration
//!
//! Construction is where configuration defects surface: unknown value sets,
//! references to fields not declared earlier, and duplicate field names all
//! fail the build instead of degrading extraction later.

use std::sync::Arc;

use prefill_core::ast::{FieldDeclaration, FieldKindDeclaration, SchemaDeclaration, TriggerDeclaration};
use prefill_core::ValueRegistry;
use prefill_parser::SchemaParser;
use prefill_runtime::{
    DocumentSchema, EngineOptions, Field, FunctionSpec, Trigger, ValueSetMatcher, Variable,
};

use crate::error::{Result, SdkError};

/// Turns schema declarations into document schemas
pub struct SchemaBuilder<'a> {
    registry: &'a ValueRegistry,
    schema: DocumentSchema,
}

impl<'a> SchemaBuilder<'a> {
    /// Build a schema for one document type.
    ///
    /// Fields are added in declaration order, so bindings and function
    /// variables may only name fields declared before them.
    pub fn build(
        declaration: &SchemaDeclaration,
        registry: Arc<ValueRegistry>,
        options: EngineOptions,
    ) -> Result<DocumentSchema> {
        SchemaParser::validate(declaration)?;

        let schema = DocumentSchema::new(&declaration.document_type, registry.clone(), options);
        let mut builder = SchemaBuilder {
            registry: &registry,
            schema,
        };

        for field in &declaration.fields {
            let built = builder.field(field, true)?;
            builder.schema.add_field(built)?;
        }

        tracing::debug!(
            "Built schema '{}' with {} fields",
            declaration.document_type,
            builder.schema.len()
        );
        Ok(builder.schema)
    }

    fn field(&self, decl: &FieldDeclaration, top_level: bool) -> Result<Field> {
        let name = decl.name.as_str();
        let path = decl.path.as_str();

        let mut field = match &decl.kind {
            FieldKindDeclaration::Scalar { attribute } => match attribute {
                Some(attribute) => Field::scalar_attribute(name, path, attribute.as_str()),
                None => Field::scalar(name, path),
            },
            FieldKindDeclaration::Coded => Field::coded(name, path),
            FieldKindDeclaration::Identifier => Field::identifier(name, path),
            FieldKindDeclaration::Interval { precision } => Field::interval(name, path, *precision),
            FieldKindDeclaration::PersonName => Field::person_name(name, path),
            FieldKindDeclaration::Address => Field::address(name, path),
            FieldKindDeclaration::CauseOfDeath {
                cause_path,
                onset_path,
            } => Field::cause_of_death(name, path, cause_path.as_deref(), onset_path.as_deref()),
            FieldKindDeclaration::AttributeBag { attributes } => {
                Field::attribute_bag(name, path, attributes.clone())
            }
            FieldKindDeclaration::Composite { fields } => {
                let nested = fields
                    .iter()
                    .map(|f| self.field(f, false))
                    .collect::<Result<Vec<_>>>()?;
                Field::composite(name, path, nested)
            }
            FieldKindDeclaration::Sequence { prototype, trigger } => {
                let prototype = self.field(prototype, false)?;
                let trigger = trigger.as_ref().map(|t| self.trigger(t)).transpose()?;
                Field::sequence(name, path, prototype, trigger)
            }
            FieldKindDeclaration::Function {
                rule,
                default,
                rewrites,
                variables,
            } => {
                if !top_level {
                    return Err(SdkError::ConfigError(format!(
                        "function field '{}' must be declared at the top level",
                        name
                    )));
                }
                let mut spec = FunctionSpec::new(rule.as_str()).with_default(default.as_str());
                spec.rewrites = rewrites.clone();
                for variable in variables {
                    let mut var = Variable::new(self.schema.by_name(&variable.field)?);
                    var.rewrites = variable.rewrites.clone();
                    spec = spec.with_variable(var);
                }
                Field::function(name, spec)
            }
        };

        field = field.with_label(decl.label.as_str()).with_description(decl.description.as_str());
        if let Some(snippet) = &decl.snippet {
            field = field.with_snippet(snippet.as_str());
        }
        for binding in &decl.bindings {
            let source = self.schema.by_name(&binding.field)?;
            field = field.with_binding(binding.placeholder.as_str(), source, binding.suffix.as_str());
        }
        if !decl.extraction {
            field = field.excluded_from_extraction();
        }
        if !decl.template {
            field = field.excluded_from_template();
        }

        Ok(field)
    }

    fn trigger(&self, decl: &TriggerDeclaration) -> Result<Trigger> {
        let trigger = match decl {
            TriggerDeclaration::ValueSet {
                value_sets,
                match_code_system,
                code_field,
            } => Trigger::ValueSet(ValueSetMatcher::from_names(
                self.registry,
                value_sets,
                *match_code_system,
                code_field.clone(),
            )?),
            TriggerDeclaration::Composite {
                value_sets,
                match_code_system,
                code_field,
                first,
                second,
                relation,
            } => Trigger::Composite {
                membership: ValueSetMatcher::from_names(
                    self.registry,
                    value_sets,
                    *match_code_system,
                    code_field.clone(),
                )?,
                first: first.clone(),
                second: second.clone(),
                relation: *relation,
            },
        };
        Ok(trigger)
    }
}
