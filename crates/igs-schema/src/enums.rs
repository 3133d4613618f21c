//! # Enumeration Catalog
//!
//! Holds every named enumeration (`Risk`, `Encode`, ...) shared across
//! modules. Modules may redeclare an enumeration for standalone
//! loadability; an identical redeclaration is accepted, a differing one is
//! rejected with [`SchemaError::DuplicateEnum`].
//!
//! Inline `values` lists on a property are represented by the same
//! [`EnumInfo`] type but are never registered here.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use igs_core::{EnumId, PrimitiveKind, SchemaError};

/// A closed set of allowed literals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumInfo {
    /// Name of the enumeration. Inline enumerations are named after the
    /// property that declares them (`Account.action`).
    pub local_name: String,
    /// The primitive this enumeration refines.
    pub base: PrimitiveKind,
    /// Allowed literals in declaration order.
    pub values: Vec<String>,
    /// Module that registered it; `None` for inline enumerations.
    pub module: Option<String>,
}

impl EnumInfo {
    /// A registered enumeration declared by `module`.
    pub fn named(
        module: impl Into<String>,
        local_name: impl Into<String>,
        base: PrimitiveKind,
        values: Vec<String>,
    ) -> Self {
        Self {
            local_name: local_name.into(),
            base,
            values,
            module: Some(module.into()),
        }
    }

    /// An anonymous enumeration scoped to one property.
    pub fn inline(owner: &str, property: &str, base: PrimitiveKind, values: Vec<String>) -> Self {
        Self {
            local_name: format!("{owner}.{property}"),
            base,
            values,
            module: None,
        }
    }

    /// Case-sensitive membership test.
    pub fn contains(&self, literal: &str) -> bool {
        self.values.iter().any(|v| v == literal)
    }

    /// Whether this enumeration is scoped to a single property.
    pub fn is_inline(&self) -> bool {
        self.module.is_none()
    }

    /// The values as a set; declaration order is not significant.
    pub fn value_set(&self) -> BTreeSet<&str> {
        self.values.iter().map(String::as_str).collect()
    }

    /// Two enumerations are the same logical enumeration when they refine
    /// the same primitive and allow the same literals.
    pub fn same_shape(&self, other: &EnumInfo) -> bool {
        self.base == other.base && self.value_set() == other.value_set()
    }
}

/// Registry of named enumerations.
#[derive(Debug, Clone, Default)]
pub struct EnumCatalog {
    entries: Vec<Arc<EnumInfo>>,
    by_name: HashMap<String, EnumId>,
}

impl EnumCatalog {
    /// An empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an enumeration.
    ///
    /// Registering an enumeration whose name already exists succeeds and
    /// returns the existing id when the value sets match.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::DuplicateEnum`] when the name is taken by an
    /// enumeration with a different value set.
    pub fn register(&mut self, info: EnumInfo) -> Result<EnumId, SchemaError> {
        if let Some(id) = self.by_name.get(&info.local_name) {
            let existing = &self.entries[id.index()];
            if existing.same_shape(&info) {
                tracing::debug!(
                    name = %info.local_name,
                    module = info.module.as_deref().unwrap_or("-"),
                    "identical enumeration redeclared; reusing existing entry"
                );
                return Ok(*id);
            }
            return Err(SchemaError::DuplicateEnum {
                name: info.local_name,
                existing_module: existing.module.clone().unwrap_or_default(),
                incoming_module: info.module.unwrap_or_default(),
            });
        }
        let id = EnumId(self.entries.len() as u32);
        self.by_name.insert(info.local_name.clone(), id);
        self.entries.push(Arc::new(info));
        Ok(id)
    }

    /// Whether `literal` belongs to the enumeration called `name`.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::UnknownEnum`] if `name` was never registered.
    pub fn membership(&self, name: &str, literal: &str) -> Result<bool, SchemaError> {
        self.get(name)
            .map(|info| info.contains(literal))
            .ok_or_else(|| SchemaError::UnknownEnum {
                name: name.to_string(),
            })
    }

    /// Look up an enumeration by name.
    pub fn get(&self, name: &str) -> Option<&Arc<EnumInfo>> {
        self.by_name.get(name).map(|id| &self.entries[id.index()])
    }

    /// Id assigned to `name`.
    pub fn id_of(&self, name: &str) -> Option<EnumId> {
        self.by_name.get(name).copied()
    }

    /// Look up an enumeration by id.
    pub fn by_id(&self, id: EnumId) -> Option<&Arc<EnumInfo>> {
        self.entries.get(id.index())
    }

    /// Number of registered enumerations.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registered names, sorted alphabetically.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.by_name.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn risk(module: &str, values: &[&str]) -> EnumInfo {
        EnumInfo::named(
            module,
            "Risk",
            PrimitiveKind::Token,
            values.iter().map(|v| v.to_string()).collect(),
        )
    }

    #[test]
    fn test_membership_of_registered_enum() {
        let mut catalog = EnumCatalog::new();
        catalog.register(risk("core", &["low", "medium", "high"])).unwrap();
        assert!(catalog.membership("Risk", "high").unwrap());
        assert!(!catalog.membership("Risk", "extreme").unwrap());
    }

    #[test]
    fn test_membership_is_case_sensitive() {
        let mut catalog = EnumCatalog::new();
        catalog.register(risk("core", &["low", "medium", "high"])).unwrap();
        assert!(!catalog.membership("Risk", "HIGH").unwrap());
    }

    #[test]
    fn test_unknown_enum_is_an_error() {
        let catalog = EnumCatalog::new();
        assert_eq!(
            catalog.membership("Risk", "high"),
            Err(SchemaError::UnknownEnum {
                name: "Risk".into()
            })
        );
    }

    #[test]
    fn test_identical_redeclaration_is_idempotent() {
        let mut catalog = EnumCatalog::new();
        let a = catalog.register(risk("core", &["low", "medium", "high"])).unwrap();
        // Order differs; the set is the same.
        let b = catalog.register(risk("account", &["high", "low", "medium"])).unwrap();
        assert_eq!(a, b);
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.get("Risk").unwrap().module.as_deref(), Some("core"));
    }

    #[test]
    fn test_differing_redeclaration_is_rejected() {
        let mut catalog = EnumCatalog::new();
        catalog.register(risk("core", &["low", "medium", "high"])).unwrap();
        let err = catalog
            .register(risk("role", &["low", "high"]))
            .unwrap_err();
        assert_eq!(
            err,
            SchemaError::DuplicateEnum {
                name: "Risk".into(),
                existing_module: "core".into(),
                incoming_module: "role".into(),
            }
        );
    }

    #[test]
    fn test_inline_enums_are_named_after_their_property() {
        let info = EnumInfo::inline(
            "Account",
            "action",
            PrimitiveKind::Token,
            vec!["create".into()],
        );
        assert_eq!(info.local_name, "Account.action");
        assert!(info.is_inline());
        assert!(info.contains("create"));
    }
}
