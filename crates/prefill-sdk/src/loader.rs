//! Loading value set bundles and schema declarations from disk
//!
//! Value sets are loaded once into a [`ValueRegistryBuilder`] and frozen
//! before any schema is built. A bundle whose `source` was already loaded is
//! skipped, so re-running a load over the same files adds nothing.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use prefill_core::ast::SchemaDeclaration;
use prefill_core::valueset::ValueSetBundle;
use prefill_core::{ValueRegistry, ValueRegistryBuilder};
use prefill_parser::{SchemaParser, ValueSetParser};
use tracing::{debug, info};

/// Accumulates value set bundles into a registry
#[derive(Debug, Default)]
pub struct ValueSetLoader {
    builder: ValueRegistryBuilder,
}

impl ValueSetLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a parsed bundle. Returns `false` if its source was already loaded.
    pub fn load_bundle(&mut self, bundle: &ValueSetBundle) -> crate::Result<bool> {
        Ok(self.builder.load_bundle(bundle)?)
    }

    /// Load a bundle from YAML text
    pub fn load_yaml_str(&mut self, yaml: &str) -> crate::Result<bool> {
        let bundle = ValueSetParser::parse_yaml(yaml)?;
        self.load_bundle(&bundle)
    }

    /// Load a bundle from JSON text
    pub fn load_json_str(&mut self, json: &str) -> crate::Result<bool> {
        let bundle = ValueSetParser::parse_json(json)?;
        self.load_bundle(&bundle)
    }

    /// Load one bundle file (`.json` as JSON, anything else as YAML)
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> Result<bool> {
        let path = path.as_ref();
        debug!("Loading value sets from: {}", path.display());

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read value set file: {}", path.display()))?;

        let loaded = if is_json(path) {
            self.load_json_str(&content)
        } else {
            self.load_yaml_str(&content)
        }
        .with_context(|| format!("Failed to load value set file: {}", path.display()))?;

        if !loaded {
            debug!("Value set bundle in {} was already loaded", path.display());
        }
        Ok(loaded)
    }

    /// Load every bundle file of a directory, in file name order.
    ///
    /// Returns the number of bundles that were not loaded before. Any invalid
    /// bundle aborts the load.
    pub fn load_directory(&mut self, dir: impl AsRef<Path>) -> Result<usize> {
        let dir = dir.as_ref();
        info!("Loading value sets from directory: {}", dir.display());

        let mut loaded = 0;
        for path in declaration_files(dir)? {
            if self.load_file(&path)? {
                loaded += 1;
            }
        }

        info!(
            "Loaded {} value set bundles from {} ({} value sets registered)",
            loaded,
            dir.display(),
            self.builder.len()
        );
        Ok(loaded)
    }

    /// Load a file or a directory
    pub fn load_path(&mut self, path: impl AsRef<Path>) -> Result<usize> {
        let path = path.as_ref();
        if path.is_dir() {
            self.load_directory(path)
        } else {
            Ok(usize::from(self.load_file(path)?))
        }
    }

    /// Value sets registered so far
    pub fn len(&self) -> usize {
        self.builder.len()
    }

    pub fn is_empty(&self) -> bool {
        self.builder.is_empty()
    }

    /// Freeze into the immutable registry shared by schemas
    pub fn finish(self) -> Arc<ValueRegistry> {
        self.builder.freeze()
    }
}

/// Load schema declarations from a file or directory.
///
/// A YAML file may hold several declarations separated by `---`.
pub fn load_schemas(path: impl AsRef<Path>) -> Result<Vec<SchemaDeclaration>> {
    let path = path.as_ref();

    if path.is_dir() {
        let mut schemas = Vec::new();
        for file in declaration_files(path)? {
            schemas.extend(load_schema_file(&file)?);
        }
        info!(
            "Loaded {} schema declarations from directory: {}",
            schemas.len(),
            path.display()
        );
        return Ok(schemas);
    }

    load_schema_file(path)
}

fn load_schema_file(path: &Path) -> Result<Vec<SchemaDeclaration>> {
    debug!("Loading schema declarations from: {}", path.display());

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read schema file: {}", path.display()))?;

    let schemas = if is_json(path) {
        SchemaParser::parse_json(&content).map(|schema| vec![schema])
    } else {
        SchemaParser::parse_yaml_documents(&content)
    }
    .with_context(|| format!("Failed to parse schema file: {}", path.display()))?;

    Ok(schemas)
}

/// `.yaml`, `.yml` and `.json` files of a directory, sorted by name
fn declaration_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(anyhow::anyhow!("Not a directory: {}", dir.display()));
    }

    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read directory: {}", dir.display()))?
    {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        if let Some(ext) = path.extension() {
            if ext == "yaml" || ext == "yml" || ext == "json" {
                files.push(path);
            }
        }
    }
    files.sort();
    Ok(files)
}

fn is_json(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "json")
}

#[cfg(test)]
mod tests {
    use super::*;

    const BUNDLE: &str = r#"
source: nchs-2024
value_sets:
  - code: X
    name: Chlamydia (NCHS)
    oid: 2.16.840.1.114222.4.11.7
    codes:
      - code: "12345"
        display_name: Chlamydia trachomatis
        code_system: "9.9"
"#;

    #[test]
    fn test_load_yaml_str_is_idempotent() {
        let mut loader = ValueSetLoader::new();
        assert!(loader.load_yaml_str(BUNDLE).unwrap());
        assert!(!loader.load_yaml_str(BUNDLE).unwrap());
        assert_eq!(loader.len(), 1);

        let registry = loader.finish();
        assert!(registry.is_member("Chlamydia (NCHS)", "12345", Some("9.9")));
    }

    #[test]
    fn test_load_json_str() {
        let json = r#"{"source": "json-bundle", "value_sets": [
            {"code": "Y", "name": "Gonorrhea", "oid": "1.2", "codes": [
                {"code": "55555", "display_name": "Gonorrhea", "code_system": "9.9"}
            ]}
        ]}"#;
        let mut loader = ValueSetLoader::new();
        assert!(loader.load_json_str(json).unwrap());
        assert!(loader.finish().is_member("Y", "55555", None));
    }

    #[test]
    fn test_missing_file() {
        let mut loader = ValueSetLoader::new();
        let err = loader.load_file("/nonexistent/valuesets.yaml").unwrap_err();
        assert!(err.to_string().contains("Failed to read value set file"));
    }
}
