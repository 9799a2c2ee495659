//! Configuration types for PrefillEngine

use std::path::{Path, PathBuf};

use prefill_runtime::EngineOptions;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SdkError};

/// Main engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Expression nodes a single rule may evaluate
    pub max_evaluation_steps: usize,

    /// Nesting accepted by the rule parser
    pub max_expression_depth: usize,

    /// Nesting followed when flattening parameters
    pub max_flatten_depth: usize,

    /// Value set bundle files or directories, loaded in order
    pub value_set_paths: Vec<PathBuf>,

    /// Schema declaration files or directories
    pub schema_paths: Vec<PathBuf>,

    /// Filter used by [`init_tracing`](crate::init_tracing) when `RUST_LOG` is unset
    pub log_filter: String,
}

impl EngineConfig {
    /// Create a new engine configuration
    pub fn new() -> Self {
        let options = EngineOptions::default();
        Self {
            max_evaluation_steps: options.max_evaluation_steps,
            max_expression_depth: options.max_expression_depth,
            max_flatten_depth: options.max_flatten_depth,
            value_set_paths: Vec::new(),
            schema_paths: Vec::new(),
            log_filter: "info".to_string(),
        }
    }

    /// Parse a YAML configuration
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: EngineConfig = serde_yaml::from_str(yaml)
            .map_err(|e| SdkError::ConfigError(format!("Invalid engine configuration: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a YAML configuration file.
    ///
    /// Relative value set and schema paths are resolved against the
    /// directory of the file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let mut config = Self::from_yaml_str(&content)?;

        if let Some(base) = path.parent() {
            for p in config
                .value_set_paths
                .iter_mut()
                .chain(config.schema_paths.iter_mut())
            {
                if p.is_relative() {
                    *p = base.join(&*p);
                }
            }
        }
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.max_evaluation_steps == 0 {
            return Err(SdkError::ConfigError(
                "max_evaluation_steps must be greater than 0".to_string(),
            ));
        }
        if self.max_expression_depth == 0 {
            return Err(SdkError::ConfigError(
                "max_expression_depth must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Add a value set bundle file or directory
    pub fn with_value_set_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.value_set_paths.push(path.into());
        self
    }

    /// Add a schema declaration file or directory
    pub fn with_schema_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.schema_paths.push(path.into());
        self
    }

    pub fn with_log_filter(mut self, filter: impl Into<String>) -> Self {
        self.log_filter = filter.into();
        self
    }

    /// Runtime limits carried by this configuration
    pub fn options(&self) -> EngineOptions {
        EngineOptions {
            max_evaluation_steps: self.max_evaluation_steps,
            max_expression_depth: self.max_expression_depth,
            max_flatten_depth: self.max_flatten_depth,
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&EngineConfig> for EngineOptions {
    fn from(config: &EngineConfig) -> Self {
        config.options()
    }
}
