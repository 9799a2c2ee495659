//! Value set data model

use crate::error::{CoreError, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// One recognised code inside a value set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeEntry {
    pub code: String,
    pub display_name: String,
    /// OID of the coding system the code belongs to
    pub code_system: String,
}

/// Named, versioned collection of codes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueSet {
    /// Unique short code of the set (e.g. `CHLAMYDIA_NCHS`)
    pub code: String,
    /// Unique human readable name (e.g. `Chlamydia (NCHS)`)
    pub name: String,
    pub oid: String,
    pub description: String,
    pub version: String,
    codes: IndexMap<String, CodeEntry>,
}

impl ValueSet {
    /// Create an empty value set
    pub fn new(
        code: impl Into<String>,
        name: impl Into<String>,
        oid: impl Into<String>,
        description: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            oid: oid.into(),
            description: description.into(),
            version: version.into(),
            codes: IndexMap::new(),
        }
    }

    /// Add a code to the set.
    ///
    /// Blank attributes are rejected with `InvalidEntry`, an already present
    /// code with `DuplicateCode`.
    pub fn add_code(&mut self, code: &str, display_name: &str, code_system: &str) -> Result<()> {
        for (attribute, value) in [
            ("code", code),
            ("displayName", display_name),
            ("codeSystem", code_system),
        ] {
            if value.trim().is_empty() {
                return Err(CoreError::InvalidEntry(format!(
                    "value set '{}': {} must not be blank",
                    self.code, attribute
                )));
            }
        }

        if self.codes.contains_key(code) {
            return Err(CoreError::DuplicateCode {
                value_set: self.code.clone(),
                code: code.to_string(),
            });
        }

        self.codes.insert(
            code.to_string(),
            CodeEntry {
                code: code.to_string(),
                display_name: display_name.to_string(),
                code_system: code_system.to_string(),
            },
        );
        Ok(())
    }

    /// Membership test.
    ///
    /// Without a coding system the code only has to be present; with one the
    /// registered OID must match it, ignoring ASCII case. Unknown codes are
    /// simply not members.
    pub fn is_member(&self, code: &str, code_system: Option<&str>) -> bool {
        match (self.codes.get(code), code_system) {
            (None, _) => false,
            (Some(_), None) => true,
            (Some(entry), Some(system)) => entry.code_system.eq_ignore_ascii_case(system.trim()),
        }
    }

    pub fn entry(&self, code: &str) -> Option<&CodeEntry> {
        self.codes.get(code)
    }

    /// Codes in registration order
    pub fn entries(&self) -> impl Iterator<Item = &CodeEntry> {
        self.codes.values()
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}
