//! # Entity Validation
//!
//! Checks a typed [`Entity`] against its [`ResolvedType`] and reports every
//! problem as data. Validation never fails: callers receive a
//! [`ValidationViolations`] (possibly empty) and decide whether to reject
//! the entity.
//!
//! ## Rules
//!
//! | Rule                                         | Violation             |
//! |----------------------------------------------|-----------------------|
//! | required attribute / `minOccurs = 1` absent  | `MissingRequired`     |
//! | literal outside its enumeration              | `InvalidEnumValue`    |
//! | value shape disagrees with the declaration   | `ShapeMismatch`       |
//! | field the type does not declare              | `UndeclaredProperty`  |
//!
//! Nested entities and collection items are validated recursively. Each
//! violation carries the slash-separated path of the entity that holds the
//! offending property (`/roles/0`), empty for the root.

use std::fmt;

use igs_core::{PrimitiveKind, SchemaError};

use crate::entity::{Entity, Value};
use crate::registry::SchemaRegistry;
use crate::resolver::{ResolvedProperty, ResolvedType, ValueKind};

/// What went wrong.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViolationKind {
    /// A required property is absent.
    MissingRequired {
        /// Property name.
        property: String,
    },
    /// A literal is not a member of the property's enumeration.
    InvalidEnumValue {
        /// Property name.
        property: String,
        /// The offending literal.
        value: String,
    },
    /// A value's shape disagrees with its declaration.
    ShapeMismatch {
        /// Property name, with an item index for collection members.
        property: String,
        /// What the schema declares.
        expected: String,
        /// What the entity holds.
        found: String,
    },
    /// The entity carries a field its type does not declare.
    UndeclaredProperty {
        /// Field name.
        property: String,
    },
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingRequired { property } => {
                write!(f, "missing required property '{property}'")
            }
            Self::InvalidEnumValue { property, value } => {
                write!(f, "'{value}' is not an allowed value of '{property}'")
            }
            Self::ShapeMismatch {
                property,
                expected,
                found,
            } => write!(f, "'{property}' expected {expected}, found {found}"),
            Self::UndeclaredProperty { property } => {
                write!(f, "undeclared property '{property}'")
            }
        }
    }
}

/// A single validation violation with its location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// Path of the entity holding the property; empty for the root.
    pub path: String,
    /// What went wrong.
    pub kind: ViolationKind,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "  (root): {}", self.kind)
        } else {
            write!(f, "  {}: {}", self.path, self.kind)
        }
    }
}

/// Collection of validation violations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationViolations {
    violations: Vec<Violation>,
}

impl ValidationViolations {
    /// Returns the number of violations.
    pub fn len(&self) -> usize {
        self.violations.len()
    }

    /// Returns true if there are no violations.
    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    /// Returns a slice of all violations.
    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    /// Consumes self and returns the inner Vec.
    pub fn into_inner(self) -> Vec<Violation> {
        self.violations
    }

    /// Kinds only, in report order.
    pub fn kinds(&self) -> impl Iterator<Item = &ViolationKind> {
        self.violations.iter().map(|v| &v.kind)
    }

    fn push(&mut self, path: &str, kind: ViolationKind) {
        self.violations.push(Violation {
            path: path.to_string(),
            kind,
        });
    }
}

impl fmt::Display for ValidationViolations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, v) in self.violations.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{v}")?;
        }
        Ok(())
    }
}

/// Validates entities against a registry's resolved types.
#[derive(Debug, Clone, Copy)]
pub struct Validator<'r> {
    registry: &'r SchemaRegistry,
}

impl<'r> Validator<'r> {
    /// A validator reading from `registry`.
    pub fn new(registry: &'r SchemaRegistry) -> Self {
        Self { registry }
    }

    /// Report every violation of `entity` against `resolved`.
    pub fn validate(&self, entity: &Entity, resolved: &ResolvedType) -> ValidationViolations {
        let mut out = ValidationViolations::default();
        self.check_entity(entity, resolved, "", &mut out);
        out
    }

    /// Validate against the entity's own declared type.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::UnknownType`] if the registry has no class
    /// named `entity.type_name`.
    pub fn validate_as_declared(&self, entity: &Entity) -> Result<ValidationViolations, SchemaError> {
        let resolved = self.registry.resolve(&entity.type_name)?;
        Ok(self.validate(entity, &resolved))
    }

    fn check_entity(
        &self,
        entity: &Entity,
        resolved: &ResolvedType,
        path: &str,
        out: &mut ValidationViolations,
    ) {
        if entity.type_name != resolved.local_name {
            out.push(
                path,
                ViolationKind::ShapeMismatch {
                    property: String::new(),
                    expected: format!("entity {}", resolved.local_name),
                    found: format!("entity {}", entity.type_name),
                },
            );
            return;
        }

        for name in entity.fields.keys() {
            if resolved.property(name).is_none() {
                out.push(
                    path,
                    ViolationKind::UndeclaredProperty {
                        property: name.clone(),
                    },
                );
            }
        }

        for prop in &resolved.properties {
            let Some(value) = entity.get(&prop.name) else {
                if prop.is_required() {
                    out.push(
                        path,
                        ViolationKind::MissingRequired {
                            property: prop.name.clone(),
                        },
                    );
                }
                continue;
            };

            match (prop.collection, value) {
                (true, Value::List(items)) => {
                    if items.is_empty() && prop.is_required() {
                        out.push(
                            path,
                            ViolationKind::MissingRequired {
                                property: prop.name.clone(),
                            },
                        );
                    }
                    for (i, item) in items.iter().enumerate() {
                        let label = format!("{}/{i}", prop.name);
                        self.check_value(prop, &label, item, path, out);
                    }
                }
                (true, other) => out.push(
                    path,
                    ViolationKind::ShapeMismatch {
                        property: prop.name.clone(),
                        expected: format!("list of {}", prop.value_kind.describe()),
                        found: other.kind_name().to_string(),
                    },
                ),
                (false, Value::List(_)) => out.push(
                    path,
                    ViolationKind::ShapeMismatch {
                        property: prop.name.clone(),
                        expected: prop.value_kind.describe(),
                        found: "list".to_string(),
                    },
                ),
                (false, single) => self.check_value(prop, &prop.name, single, path, out),
            }
        }
    }

    /// Check one value; `label` is the property name, or `name/index` for
    /// collection members.
    fn check_value(
        &self,
        prop: &ResolvedProperty,
        label: &str,
        value: &Value,
        path: &str,
        out: &mut ValidationViolations,
    ) {
        let mismatch = |out: &mut ValidationViolations| {
            out.push(
                path,
                ViolationKind::ShapeMismatch {
                    property: label.to_string(),
                    expected: prop.value_kind.describe(),
                    found: value.kind_name().to_string(),
                },
            )
        };

        match (&prop.value_kind, value) {
            (ValueKind::Enum(info), Value::Text(literal)) => {
                if !info.contains(literal) {
                    out.push(
                        path,
                        ViolationKind::InvalidEnumValue {
                            property: prop.name.clone(),
                            value: literal.clone(),
                        },
                    );
                }
            }
            (ValueKind::Primitive(PrimitiveKind::Boolean), Value::Boolean(_)) => {}
            (ValueKind::Primitive(kind), Value::Integer(i)) if kind.is_integral() => {
                if let Some((min, max)) = kind.integer_range() {
                    if *i < min || *i > max {
                        out.push(
                            path,
                            ViolationKind::ShapeMismatch {
                                property: label.to_string(),
                                expected: format!("{kind} in [{min}, {max}]"),
                                found: i.to_string(),
                            },
                        );
                    }
                }
            }
            (ValueKind::Primitive(kind), Value::Text(_)) if kind.is_textual() => {}
            (ValueKind::Class { id, .. }, Value::Entity(child)) => {
                match self.registry.resolved(*id) {
                    Some(child_type) => {
                        let child_path = format!("{path}/{label}");
                        self.check_entity(child, child_type, &child_path, out);
                    }
                    None => mismatch(out),
                }
            }
            _ => mismatch(out),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ModuleDescriptor;

    const MODULE: &str = r#"
name: m
typeInfos:
  - type: enumInfo
    localName: Risk
    values: [low, medium, high]
  - localName: Item
    propertyInfos:
      - name: id
        type: attribute
        required: true
      - name: risk
        type: attribute
        typeInfo: .Risk
  - localName: Holder
    propertyInfos:
      - name: name
        type: attribute
        typeInfo: Token
        required: true
      - name: count
        type: attribute
        typeInfo: Int
      - name: flag
        type: attribute
        typeInfo: Boolean
      - name: items
        collection: true
        minOccurs: 0
        typeInfo: .Item
      - name: primary
        typeInfo: .Item
  - localName: Crate
    propertyInfos:
      - name: items
        collection: true
        minOccurs: 1
        typeInfo: .Item
"#;

    fn registry() -> SchemaRegistry {
        let module: ModuleDescriptor = serde_yaml::from_str(MODULE).unwrap();
        SchemaRegistry::from_modules([module]).unwrap()
    }

    fn item(id: &str, risk: &str) -> Entity {
        Entity::new("Item").with("id", id).with("risk", risk)
    }

    #[test]
    fn test_conforming_entity_has_no_violations() {
        let reg = registry();
        let holder = Entity::new("Holder")
            .with("name", "h")
            .with("count", 3i64)
            .with("flag", false)
            .with("items", vec![item("a", "low")])
            .with("primary", item("b", "high"));
        let v = Validator::new(&reg).validate(&holder, &reg.resolve("Holder").unwrap());
        assert!(v.is_empty(), "{v}");
    }

    #[test]
    fn test_missing_required_attribute_and_element() {
        let reg = registry();
        let v = Validator::new(&reg).validate(&Entity::new("Holder"), &reg.resolve("Holder").unwrap());
        let kinds: Vec<_> = v.kinds().cloned().collect();
        assert_eq!(
            kinds,
            vec![
                ViolationKind::MissingRequired {
                    property: "name".into()
                },
                ViolationKind::MissingRequired {
                    property: "primary".into()
                },
            ]
        );
    }

    #[test]
    fn test_empty_required_collection_is_missing() {
        let reg = registry();
        let resolved = reg.resolve("Crate").unwrap();
        let validator = Validator::new(&reg);

        let empty = Entity::new("Crate").with("items", Vec::<Value>::new());
        let kinds: Vec<_> = validator.validate(&empty, &resolved).kinds().cloned().collect();
        assert_eq!(
            kinds,
            vec![ViolationKind::MissingRequired {
                property: "items".into()
            }]
        );

        let absent = validator.validate(&Entity::new("Crate"), &resolved);
        assert_eq!(absent.len(), 1);

        let one = Entity::new("Crate").with("items", vec![item("a", "low")]);
        assert!(validator.validate(&one, &resolved).is_empty());
    }

    #[test]
    fn test_nested_violations_carry_paths() {
        let reg = registry();
        let holder = Entity::new("Holder")
            .with("name", "h")
            .with("items", vec![item("a", "low"), item("b", "extreme")])
            .with("primary", Entity::new("Item"));
        let v = Validator::new(&reg).validate(&holder, &reg.resolve("Holder").unwrap());
        assert_eq!(v.len(), 2);
        assert_eq!(v.violations()[0].path, "/items/1");
        assert_eq!(
            v.violations()[0].kind,
            ViolationKind::InvalidEnumValue {
                property: "risk".into(),
                value: "extreme".into()
            }
        );
        assert_eq!(v.violations()[1].path, "/primary");
        assert!(v.to_string().contains("/primary: missing required property 'id'"));
    }

    #[test]
    fn test_shape_mismatches_are_reported_not_thrown() {
        let reg = registry();
        let holder = Entity::new("Holder")
            .with("name", "h")
            .with("flag", "yes")
            .with("items", item("a", "low"))
            .with("primary", vec![item("b", "low")]);
        let v = Validator::new(&reg).validate(&holder, &reg.resolve("Holder").unwrap());
        assert_eq!(v.len(), 3);
        assert!(v
            .kinds()
            .all(|k| matches!(k, ViolationKind::ShapeMismatch { .. })));
    }

    #[test]
    fn test_int_range_is_checked() {
        let reg = registry();
        let holder = Entity::new("Holder")
            .with("name", "h")
            .with("count", i64::from(i32::MAX) + 1)
            .with("primary", item("b", "low"));
        let v = Validator::new(&reg).validate(&holder, &reg.resolve("Holder").unwrap());
        assert_eq!(v.len(), 1);
    }

    #[test]
    fn test_undeclared_and_wrong_type() {
        let reg = registry();
        let v = Validator::new(&reg).validate(&item("a", "low").with("colour", "red"), &reg.resolve("Item").unwrap());
        assert_eq!(
            v.into_inner()[0].kind,
            ViolationKind::UndeclaredProperty {
                property: "colour".into()
            }
        );

        let v = Validator::new(&reg).validate(&Entity::new("Holder"), &reg.resolve("Item").unwrap());
        assert_eq!(v.len(), 1);
        assert_eq!(v.violations()[0].to_string(), "  (root): '' expected entity Item, found entity Holder");
    }

    #[test]
    fn test_validate_as_declared_resolves_by_name() {
        let reg = registry();
        let v = Validator::new(&reg).validate_as_declared(&item("a", "medium")).unwrap();
        assert!(v.is_empty());
        assert!(Validator::new(&reg)
            .validate_as_declared(&Entity::new("Nope"))
            .is_err());
    }
}
