//! # Descriptor Loading
//!
//! Reads module descriptor documents (YAML or JSON), checks them against
//! `schemas/module.schema.json` (Draft 2020-12), and deserializes them into
//! [`ModuleDescriptor`]s.
//!
//! Schema checking is the first gate: a document that fails it is rejected
//! with [`SchemaError::InvalidSchema`] carrying every violation, each as
//! `instance path: message`. Semantic checks (duplicate names, linking,
//! cycles) happen later in the registry.

use std::fmt;
use std::path::Path;

use jsonschema::Validator;
use serde_json::Value;

use igs_core::SchemaError;

use crate::model::ModuleDescriptor;

/// The descriptor format, embedded at compile time.
pub const MODULE_SCHEMA: &str = include_str!("../../../schemas/module.schema.json");

/// File extensions recognised by [`ModuleLoader::load_dir`].
const DESCRIPTOR_EXTENSIONS: [&str; 3] = ["yaml", "yml", "json"];

/// A compiled descriptor checker.
pub struct ModuleLoader {
    validator: Validator,
}

impl fmt::Debug for ModuleLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleLoader").finish_non_exhaustive()
    }
}

impl ModuleLoader {
    /// Compile the embedded descriptor schema.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::Parse`] if the embedded schema is not valid
    /// JSON or cannot be compiled.
    pub fn new() -> Result<Self, SchemaError> {
        let schema: Value =
            serde_json::from_str(MODULE_SCHEMA).map_err(|e| SchemaError::Parse {
                source_name: "module.schema.json".to_string(),
                reason: format!("invalid JSON: {e}"),
            })?;
        let validator = jsonschema::options()
            .with_draft(jsonschema::Draft::Draft202012)
            .build(&schema)
            .map_err(|e| SchemaError::Parse {
                source_name: "module.schema.json".to_string(),
                reason: e.to_string(),
            })?;
        Ok(Self { validator })
    }

    /// Check a parsed document against the descriptor schema.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::InvalidSchema`] listing every violation.
    pub fn check(&self, source_name: &str, document: &Value) -> Result<(), SchemaError> {
        let violations: Vec<String> = self
            .validator
            .iter_errors(document)
            .map(|e| {
                let path = e.instance_path.to_string();
                if path.is_empty() {
                    format!("(root): {e}")
                } else {
                    format!("{path}: {e}")
                }
            })
            .collect();

        if violations.is_empty() {
            Ok(())
        } else {
            Err(SchemaError::InvalidSchema {
                context: source_name.to_string(),
                reason: violations.join("; "),
            })
        }
    }

    /// Check and deserialize a parsed document.
    ///
    /// # Errors
    ///
    /// [`SchemaError::InvalidSchema`] on schema violations,
    /// [`SchemaError::Parse`] if the document does not deserialize.
    pub fn from_value(&self, source_name: &str, document: Value) -> Result<ModuleDescriptor, SchemaError> {
        self.check(source_name, &document)?;
        serde_json::from_value(document).map_err(|e| SchemaError::Parse {
            source_name: source_name.to_string(),
            reason: e.to_string(),
        })
    }

    /// Parse, check and deserialize a YAML descriptor.
    ///
    /// # Errors
    ///
    /// As [`ModuleLoader::from_value`], plus [`SchemaError::Parse`] for
    /// malformed YAML.
    pub fn parse_yaml(&self, source_name: &str, text: &str) -> Result<ModuleDescriptor, SchemaError> {
        let yaml: serde_yaml::Value =
            serde_yaml::from_str(text).map_err(|e| SchemaError::Parse {
                source_name: source_name.to_string(),
                reason: format!("invalid YAML: {e}"),
            })?;
        let json = yaml_to_json_value(&yaml).map_err(|reason| SchemaError::Parse {
            source_name: source_name.to_string(),
            reason,
        })?;
        self.from_value(source_name, json)
    }

    /// Parse, check and deserialize a JSON descriptor.
    ///
    /// # Errors
    ///
    /// As [`ModuleLoader::from_value`], plus [`SchemaError::Parse`] for
    /// malformed JSON.
    pub fn parse_json(&self, source_name: &str, text: &str) -> Result<ModuleDescriptor, SchemaError> {
        let json: Value = serde_json::from_str(text).map_err(|e| SchemaError::Parse {
            source_name: source_name.to_string(),
            reason: format!("invalid JSON: {e}"),
        })?;
        self.from_value(source_name, json)
    }

    /// Load one descriptor file. `.json` files are parsed as JSON, anything
    /// else as YAML.
    ///
    /// # Errors
    ///
    /// [`SchemaError::Parse`] if the file cannot be read, otherwise as
    /// [`ModuleLoader::parse_yaml`] / [`ModuleLoader::parse_json`].
    pub fn load_file(&self, path: &Path) -> Result<ModuleDescriptor, SchemaError> {
        let source_name = path.display().to_string();
        let text = std::fs::read_to_string(path).map_err(|e| SchemaError::Parse {
            source_name: source_name.clone(),
            reason: format!("cannot read file: {e}"),
        })?;
        let module = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => self.parse_json(&source_name, &text)?,
            _ => self.parse_yaml(&source_name, &text)?,
        };
        tracing::debug!(path = %source_name, module = %module.name, "descriptor file read");
        Ok(module)
    }

    /// Load every descriptor in a directory, sorted by file name.
    ///
    /// Subdirectories and files with other extensions are skipped.
    ///
    /// # Errors
    ///
    /// The first error from reading the directory or any descriptor.
    pub fn load_dir(&self, dir: &Path) -> Result<Vec<ModuleDescriptor>, SchemaError> {
        let entries = std::fs::read_dir(dir).map_err(|e| SchemaError::Parse {
            source_name: dir.display().to_string(),
            reason: format!("cannot read module directory: {e}"),
        })?;

        let mut paths = Vec::new();
        for entry in entries {
            let path = entry
                .map_err(|e| SchemaError::Parse {
                    source_name: dir.display().to_string(),
                    reason: e.to_string(),
                })?
                .path();
            let is_descriptor = path.is_file()
                && path
                    .extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|e| DESCRIPTOR_EXTENSIONS.contains(&e));
            if is_descriptor {
                paths.push(path);
            }
        }
        paths.sort();

        paths.iter().map(|p| self.load_file(p)).collect()
    }
}

/// Convert a `serde_yaml::Value` into a `serde_json::Value`.
///
/// YAML tags are dropped; only string, number and boolean map keys are
/// accepted.
pub fn yaml_to_json_value(yaml: &serde_yaml::Value) -> Result<Value, String> {
    match yaml {
        serde_yaml::Value::Null => Ok(Value::Null),
        serde_yaml::Value::Bool(b) => Ok(Value::Bool(*b)),
        serde_yaml::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(Value::Number(serde_json::Number::from(i)))
            } else if let Some(u) = n.as_u64() {
                Ok(Value::Number(serde_json::Number::from(u)))
            } else if let Some(f) = n.as_f64() {
                serde_json::Number::from_f64(f)
                    .map(Value::Number)
                    .ok_or_else(|| format!("cannot represent float {f} in JSON"))
            } else {
                Err(format!("unsupported YAML number: {n:?}"))
            }
        }
        serde_yaml::Value::String(s) => Ok(Value::String(s.clone())),
        serde_yaml::Value::Sequence(seq) => {
            let items: Result<Vec<Value>, String> = seq.iter().map(yaml_to_json_value).collect();
            Ok(Value::Array(items?))
        }
        serde_yaml::Value::Mapping(map) => {
            let mut json_map = serde_json::Map::new();
            for (k, v) in map {
                let key = match k {
                    serde_yaml::Value::String(s) => s.clone(),
                    serde_yaml::Value::Number(n) => n.to_string(),
                    serde_yaml::Value::Bool(b) => b.to_string(),
                    other => return Err(format!("unsupported YAML map key type: {other:?}")),
                };
                json_map.insert(key, yaml_to_json_value(v)?);
            }
            Ok(Value::Object(json_map))
        }
        serde_yaml::Value::Tagged(tagged) => yaml_to_json_value(&tagged.value),
    }
}
