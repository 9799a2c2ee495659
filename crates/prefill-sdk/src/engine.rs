//! PrefillEngine - the main entry point
//!
//! Holds the frozen value registry, runtime limits and one schema
//! declaration per document type. Every request gets a freshly built
//! [`DocumentSchema`], so one engine can serve concurrent requests.

use std::sync::Arc;

use indexmap::IndexMap;
use prefill_core::ast::SchemaDeclaration;
use prefill_core::{PathEvaluator, ValueRegistry};
use prefill_runtime::{DocumentSchema, EngineOptions, Parameters, XmlDocument};
use serde::Serialize;
use tracing::{debug, info};

use crate::builder::SchemaBuilder;
use crate::config::EngineConfig;
use crate::error::{Result, SdkError};
use crate::loader::{load_schemas, ValueSetLoader};

/// Outcome of one prefill request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PrefillResult {
    pub document_type: String,
    /// Every parameter of every field, in declaration order
    pub parameters: Parameters,
    /// The template with snippets and parameters substituted
    pub populated: String,
}

/// Document rule engine facade
#[derive(Debug)]
pub struct PrefillEngine {
    registry: Arc<ValueRegistry>,
    options: EngineOptions,
    declarations: IndexMap<String, SchemaDeclaration>,
}

impl PrefillEngine {
    pub fn new(registry: Arc<ValueRegistry>, options: EngineOptions) -> Self {
        Self {
            registry,
            options,
            declarations: IndexMap::new(),
        }
    }

    /// Load value sets, then schema declarations, as listed in the config.
    ///
    /// Every declaration is built once up front so configuration defects
    /// fail here rather than on the first request.
    pub fn from_config(config: &EngineConfig) -> Result<Self> {
        let mut loader = ValueSetLoader::new();
        for path in &config.value_set_paths {
            loader
                .load_path(path)
                .map_err(|e| SdkError::ConfigError(format!("{:#}", e)))?;
        }
        let registry = loader.finish();
        info!("Value registry ready with {} value sets", registry.len());

        let mut engine = Self::new(registry, config.options());
        for path in &config.schema_paths {
            let declarations =
                load_schemas(path).map_err(|e| SdkError::ConfigError(format!("{:#}", e)))?;
            for declaration in declarations {
                engine.add_declaration(declaration)?;
            }
        }

        info!(
            "Prefill engine ready for {} document types",
            engine.declarations.len()
        );
        Ok(engine)
    }

    /// Register the declaration of a document type
    pub fn add_declaration(&mut self, declaration: SchemaDeclaration) -> Result<()> {
        if self.declarations.contains_key(&declaration.document_type) {
            return Err(SdkError::ConfigError(format!(
                "document type '{}' declared twice",
                declaration.document_type
            )));
        }

        SchemaBuilder::build(&declaration, self.registry.clone(), self.options)?;
        debug!("Registered document type '{}'", declaration.document_type);
        self.declarations
            .insert(declaration.document_type.clone(), declaration);
        Ok(())
    }

    pub fn registry(&self) -> &Arc<ValueRegistry> {
        &self.registry
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    pub fn document_types(&self) -> impl Iterator<Item = &str> {
        self.declarations.keys().map(String::as_str)
    }

    /// A fresh, unpopulated schema for a document type
    pub fn schema(&self, document_type: &str) -> Result<DocumentSchema> {
        let declaration = self
            .declarations
            .get(document_type)
            .ok_or_else(|| SdkError::UnknownDocumentType(document_type.to_string()))?;
        SchemaBuilder::build(declaration, self.registry.clone(), self.options)
    }

    /// Extract a document with any path evaluator and fill the template
    pub fn prefill<E: PathEvaluator>(
        &self,
        document_type: &str,
        evaluator: &E,
        template: &str,
    ) -> Result<PrefillResult> {
        let mut schema = self.schema(document_type)?;
        let root = evaluator.root().ok_or_else(|| {
            SdkError::DocumentError(format!("document for '{}' has no root", document_type))
        })?;

        schema.extract_all(evaluator, root);

        Ok(PrefillResult {
            document_type: document_type.to_string(),
            parameters: schema.parameters(),
            populated: schema.populate(template),
        })
    }

    /// Parse an XML document, extract it and fill the template.
    ///
    /// Malformed XML is an error; anything missing inside a well-formed
    /// document only leaves the affected parameters empty.
    pub fn prefill_xml(&self, document_type: &str, xml: &str, template: &str) -> Result<PrefillResult> {
        let document = XmlDocument::parse(xml)?;
        self.prefill(document_type, &document, template)
    }
}
