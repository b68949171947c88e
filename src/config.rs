use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::diagnostics::CompileError;

/// Knobs consumed by the analysis driver. Every key is optional in TOML.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisConfig {
    /// Diagnostics collected before further reports are dropped.
    pub max_errors: usize,
    /// Directories searched for external class metadata.
    pub class_path: Vec<PathBuf>,
    /// Wildcard imports every unit starts with, in resolution order.
    pub default_imports: Vec<String>,
    /// Classes whose static methods are callable unqualified.
    pub static_imports: Vec<String>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            max_errors: 100,
            class_path: Vec::new(),
            default_imports: vec![
                "java.lang.*".to_string(),
                "java.io.*".to_string(),
                "java.util.*".to_string(),
            ],
            static_imports: vec![
                "java.lang.System".to_string(),
                "java.lang.Runtime".to_string(),
                "java.lang.Math".to_string(),
            ],
        }
    }
}

// ---- TOML deserialization types ----

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct TomlConfigFile {
    #[serde(default)]
    analysis: AnalysisConfig,
}

impl AnalysisConfig {
    /// Parse the `[analysis]` table of a config file. `origin` only labels errors.
    pub fn from_toml_str(content: &str, origin: &Path) -> Result<Self, CompileError> {
        let file: TomlConfigFile = toml::from_str(content).map_err(|e| {
            CompileError::config(format!("invalid syntax: {e}"), origin.to_path_buf())
        })?;
        let config = file.analysis;
        config.validate(origin)?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, CompileError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            CompileError::config(format!("could not read file: {e}"), path.to_path_buf())
        })?;
        let mut config = Self::from_toml_str(&content, path)?;
        // Relative class path entries are relative to the config file.
        if let Some(base) = path.parent() {
            for dir in &mut config.class_path {
                if dir.is_relative() {
                    *dir = base.join(&*dir);
                }
            }
        }
        tracing::debug!(path = %path.display(), max_errors = config.max_errors, "loaded analysis config");
        Ok(config)
    }

    fn validate(&self, origin: &Path) -> Result<(), CompileError> {
        if self.max_errors == 0 {
            return Err(CompileError::config("max_errors must be at least 1", origin.to_path_buf()));
        }
        for import in &self.default_imports {
            if !import.ends_with(".*") {
                return Err(CompileError::config(
                    format!("default import '{import}' must be a wildcard ending in '.*'"),
                    origin.to_path_buf(),
                ));
            }
        }
        if let Some(name) = self.static_imports.iter().find(|s| s.is_empty() || s.ends_with('*')) {
            return Err(CompileError::config(
                format!("static import '{name}' must name a single class"),
                origin.to_path_buf(),
            ));
        }
        Ok(())
    }
}
