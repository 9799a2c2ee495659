//! Value set bundle parser

use crate::error::{ParseError, Result};
use prefill_core::valueset::ValueSetBundle;

/// Value set bundle parser
pub struct ValueSetParser;

impl ValueSetParser {
    pub fn parse_yaml(yaml_str: &str) -> Result<ValueSetBundle> {
        let bundle: ValueSetBundle = serde_yaml::from_str(yaml_str)?;
        Self::validate(&bundle)?;
        Ok(bundle)
    }

    pub fn parse_json(json_str: &str) -> Result<ValueSetBundle> {
        let bundle: ValueSetBundle = serde_json::from_str(json_str)?;
        Self::validate(&bundle)?;
        Ok(bundle)
    }

    fn validate(bundle: &ValueSetBundle) -> Result<()> {
        if bundle.source.trim().is_empty() {
            return Err(ParseError::MissingField {
                field: "source".to_string(),
            });
        }
        for set in &bundle.value_sets {
            if set.code.trim().is_empty() || set.name.trim().is_empty() {
                return Err(ParseError::InvalidValue {
                    field: "value_sets".to_string(),
                    message: format!("value set '{}' needs a code and a name", set.oid),
                });
            }
        }
        Ok(())
    }
}
