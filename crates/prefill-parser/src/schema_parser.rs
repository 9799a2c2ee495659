//! Schema declaration parser
//!
//! Parses YAML or JSON schema declarations and checks the parts of a
//! declaration that can be validated without a value registry.

use crate::error::{ParseError, Result};
use prefill_core::ast::{FieldDeclaration, FieldKindDeclaration, SchemaDeclaration};
use serde::Deserialize;

/// Schema declaration parser
pub struct SchemaParser;

impl SchemaParser {
    /// Parse a single YAML schema declaration
    pub fn parse_yaml(yaml_str: &str) -> Result<SchemaDeclaration> {
        let schema: SchemaDeclaration = serde_yaml::from_str(yaml_str)?;
        Self::validate(&schema)?;
        Ok(schema)
    }

    /// Parse every declaration of a multi-document YAML stream (`---` separated)
    pub fn parse_yaml_documents(yaml_str: &str) -> Result<Vec<SchemaDeclaration>> {
        let mut schemas = Vec::new();
        for document in serde_yaml::Deserializer::from_str(yaml_str) {
            let schema = SchemaDeclaration::deserialize(document)?;
            Self::validate(&schema)?;
            schemas.push(schema);
        }
        Ok(schemas)
    }

    /// Parse a single JSON schema declaration
    pub fn parse_json(json_str: &str) -> Result<SchemaDeclaration> {
        let schema: SchemaDeclaration = serde_json::from_str(json_str)?;
        Self::validate(&schema)?;
        Ok(schema)
    }

    /// Structural checks on a declaration
    pub fn validate(schema: &SchemaDeclaration) -> Result<()> {
        if schema.document_type.trim().is_empty() {
            return Err(ParseError::MissingField {
                field: "document_type".to_string(),
            });
        }
        for field in &schema.fields {
            Self::validate_field(field)?;
        }
        Ok(())
    }

    fn validate_field(field: &FieldDeclaration) -> Result<()> {
        if field.name.trim().is_empty() {
            return Err(ParseError::MissingField {
                field: "name".to_string(),
            });
        }

        for binding in &field.bindings {
            if binding.placeholder.trim().is_empty() || binding.field.trim().is_empty() {
                return Err(ParseError::InvalidValue {
                    field: field.name.clone(),
                    message: "bindings need a placeholder and a field".to_string(),
                });
            }
        }

        match &field.kind {
            FieldKindDeclaration::AttributeBag { attributes } if attributes.is_empty() => {
                Err(ParseError::InvalidValue {
                    field: field.name.clone(),
                    message: "attribute_bag needs at least one attribute".to_string(),
                })
            }
            FieldKindDeclaration::Composite { fields } => {
                fields.iter().try_for_each(Self::validate_field)
            }
            FieldKindDeclaration::Sequence { prototype, .. } => {
                if matches!(prototype.kind, FieldKindDeclaration::Function { .. }) {
                    return Err(ParseError::InvalidValue {
                        field: field.name.clone(),
                        message: "a function cannot be a sequence prototype".to_string(),
                    });
                }
                Self::validate_field(prototype)
            }
            FieldKindDeclaration::Function { rule, variables, .. } => {
                if rule.trim().is_empty() {
                    return Err(ParseError::MissingField {
                        field: format!("{}.rule", field.name),
                    });
                }
                if variables.iter().any(|v| v.field.trim().is_empty()) {
                    return Err(ParseError::InvalidValue {
                        field: field.name.clone(),
                        message: "variables must name a field".to_string(),
                    });
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prefill_core::ast::TriggerDeclaration;

    const STI_SCHEMA: &str = r#"
document_type: sti_case_report
description: Sexually transmitted infection case report
fields:
  - name: patientName
    kind: person_name
    label: Patient name
    path: recordTarget/patientRole/patient/name
  - name: chlamydia
    kind: sequence
    path: //entry/observation
    prototype:
      name: chlamydiaResult
      kind: coded
      path: value
    trigger:
      kind: value_set
      value_sets: ["Chlamydia (NCHS)"]
      match_code_system: true
  - name: sti
    kind: function
    rule: "IF ($A CONTAINS ValueSet (X)) THEN 'Z' SHALL = 'Y' ELSE 'N'"
    default: U
    variables:
      - field: chlamydia
        rewrites:
          - from: "$A CONTAINS ValueSet (X)"
            to: "${chlamydiaCount} > 0"
"#;

    #[test]
    fn test_parse_schema_yaml() {
        let schema = SchemaParser::parse_yaml(STI_SCHEMA).unwrap();
        assert_eq!(schema.document_type, "sti_case_report");
        assert_eq!(schema.fields.len(), 3);

        match &schema.fields[1].kind {
            FieldKindDeclaration::Sequence { prototype, trigger } => {
                assert_eq!(prototype.name, "chlamydiaResult");
                assert!(matches!(
                    trigger,
                    Some(TriggerDeclaration::ValueSet { match_code_system: true, .. })
                ));
            }
            other => panic!("Expected sequence, got {:?}", other),
        }

        match &schema.fields[2].kind {
            FieldKindDeclaration::Function { default, variables, .. } => {
                assert_eq!(default, "U");
                assert_eq!(variables[0].rewrites[0].to, "${chlamydiaCount} > 0");
            }
            other => panic!("Expected function, got {:?}", other),
        }
    }

    #[test]
    fn test_function_without_rule_is_rejected() {
        let yaml = r#"
document_type: x
fields:
  - name: f
    kind: function
    rule: "  "
"#;
        let err = SchemaParser::parse_yaml(yaml).unwrap_err();
        assert!(matches!(err, ParseError::MissingField { .. }));
    }

    #[test]
    fn test_unknown_kind_is_yaml_error() {
        let yaml = r#"
document_type: x
fields:
  - name: f
    kind: hologram
"#;
        assert!(matches!(
            SchemaParser::parse_yaml(yaml).unwrap_err(),
            ParseError::YamlError(_)
        ));
    }

    #[test]
    fn test_multi_document() {
        let yaml = "document_type: a\n---\ndocument_type: b\n";
        let schemas = SchemaParser::parse_yaml_documents(yaml).unwrap();
        let types: Vec<&str> = schemas.iter().map(|s| s.document_type.as_str()).collect();
        assert_eq!(types, vec!["a", "b"]);
    }
}
