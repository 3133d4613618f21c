//! # Engine Configuration
//!
//! Which modules to load and how strictly to bind.
//!
//! ```yaml
//! include_builtin: true        # load the bundled modules (default true)
//! module_dirs:                 # extra descriptor directories, in order
//!   - ./modules
//! strict_unknown_fields: false # reject unknown payload keys (default false)
//! ```
//!
//! Relative `module_dirs` are resolved against the directory holding the
//! configuration file when loaded through [`SchemaConfig::from_path`].

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use igs_core::SchemaError;

use crate::binder::Binder;
use crate::builtin::builtin_modules;
use crate::descriptor::ModuleLoader;
use crate::model::ModuleDescriptor;
use crate::registry::SchemaRegistry;

/// Engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaConfig {
    /// Load the bundled domain modules first.
    pub include_builtin: bool,
    /// Directories of additional descriptors, loaded after the bundled set.
    pub module_dirs: Vec<PathBuf>,
    /// Reject payload keys the schema does not declare.
    pub strict_unknown_fields: bool,
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            include_builtin: true,
            module_dirs: Vec::new(),
            strict_unknown_fields: false,
        }
    }
}

impl SchemaConfig {
    /// Parse a YAML configuration document.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::Parse`] for malformed YAML or unknown types.
    pub fn from_yaml_str(source_name: &str, text: &str) -> Result<Self, SchemaError> {
        serde_yaml::from_str(text).map_err(|e| SchemaError::Parse {
            source_name: source_name.to_string(),
            reason: e.to_string(),
        })
    }

    /// Read a YAML configuration file, resolving relative module
    /// directories against the file's parent directory.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::Parse`] if the file cannot be read or parsed.
    pub fn from_path(path: &Path) -> Result<Self, SchemaError> {
        let source_name = path.display().to_string();
        let text = std::fs::read_to_string(path).map_err(|e| SchemaError::Parse {
            source_name: source_name.clone(),
            reason: format!("cannot read file: {e}"),
        })?;
        let mut config = Self::from_yaml_str(&source_name, &text)?;
        if let Some(base) = path.parent() {
            for dir in &mut config.module_dirs {
                if dir.is_relative() {
                    *dir = base.join(&*dir);
                }
            }
        }
        Ok(config)
    }

    /// Every module this configuration names, in load order.
    ///
    /// # Errors
    ///
    /// Any descriptor error.
    pub fn modules(&self, loader: &ModuleLoader) -> Result<Vec<ModuleDescriptor>, SchemaError> {
        let mut modules = if self.include_builtin {
            builtin_modules(loader)?
        } else {
            Vec::new()
        };
        for dir in &self.module_dirs {
            modules.extend(loader.load_dir(dir)?);
        }
        Ok(modules)
    }

    /// Load and build the configured registry.
    ///
    /// # Errors
    ///
    /// Any descriptor, load-time or link-time error.
    pub fn build_registry(&self) -> Result<SchemaRegistry, SchemaError> {
        let loader = ModuleLoader::new()?;
        let modules = self.modules(&loader)?;
        tracing::info!(
            include_builtin = self.include_builtin,
            module_dirs = self.module_dirs.len(),
            modules = modules.len(),
            "building schema registry from configuration"
        );
        SchemaRegistry::from_modules(modules)
    }

    /// A binder over `registry` honouring `strict_unknown_fields`.
    pub fn binder<'r>(&self, registry: &'r SchemaRegistry) -> Binder<'r> {
        Binder::new(registry).strict(self.strict_unknown_fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_apply_to_empty_document() {
        let config = SchemaConfig::from_yaml_str("c.yaml", "{}").unwrap();
        assert_eq!(config, SchemaConfig::default());
        assert!(config.include_builtin);
        assert!(!config.strict_unknown_fields);
    }

    #[test]
    fn test_partial_document_keeps_other_defaults() {
        let config =
            SchemaConfig::from_yaml_str("c.yaml", "strict_unknown_fields: true\n").unwrap();
        assert!(config.strict_unknown_fields);
        assert!(config.include_builtin);
        assert!(config.module_dirs.is_empty());
    }

    #[test]
    fn test_wrong_types_are_parse_errors() {
        assert!(matches!(
            SchemaConfig::from_yaml_str("c.yaml", "include_builtin: maybe\n"),
            Err(SchemaError::Parse { .. })
        ));
    }

    #[test]
    fn test_nothing_configured_builds_an_empty_registry() {
        let config = SchemaConfig {
            include_builtin: false,
            ..SchemaConfig::default()
        };
        let reg = config.build_registry().unwrap();
        assert_eq!(reg.type_count(), 0);
    }

    #[test]
    fn test_binder_follows_strictness() {
        let config = SchemaConfig {
            include_builtin: false,
            strict_unknown_fields: true,
            ..SchemaConfig::default()
        };
        let reg = config.build_registry().unwrap();
        assert!(config.binder(&reg).is_strict());
    }
}
