//! # Binding
//!
//! Converts between wire [`Payload`]s and typed [`Entity`] graphs using a
//! closed [`ResolvedType`].
//!
//! ## Rules
//!
//! - Attribute properties live at the node's attribute level under the
//!   wire local part; element properties live at the element level.
//! - A collection property is always a [`Payload::Sequence`] on the wire
//!   and a [`Value::List`] in the entity, even with zero or one item.
//! - Class-typed properties recurse with the target's resolved type.
//! - Scalars convert through the property's primitive kind. `Boolean`
//!   accepts exactly `true` and `false`.
//! - Enumeration literals are carried as text; membership is checked by
//!   the [`Validator`], which [`Binder::bind`] runs inline.
//!
//! Shape disagreements fail with [`BindError::TypeMismatch`]; absent
//! properties are simply not set, leaving required-ness to validation.
//!
//! Binding is pure: no I/O, no interior state. A `Binder` borrows a
//! registry snapshot and may be shared freely across threads.

use std::collections::HashSet;

use igs_core::{BindError, IgsError, PrimitiveKind};

use crate::entity::{Entity, Value};
use crate::payload::{Node, Payload, ATTRIBUTE_PREFIX};
use crate::registry::SchemaRegistry;
use crate::resolver::{ResolvedProperty, ResolvedType, ValueKind};
use crate::types::PropertyKind;
use crate::validate::{ValidationViolations, Validator};

/// The outcome of [`Binder::bind`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bound {
    /// The unmarshalled entity.
    pub entity: Entity,
    /// Everything the validator reported about it.
    pub violations: ValidationViolations,
}

impl Bound {
    /// Whether the entity passed validation.
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }
}

/// Marshals and unmarshals entities against a registry.
#[derive(Debug, Clone, Copy)]
pub struct Binder<'r> {
    registry: &'r SchemaRegistry,
    strict: bool,
}

impl<'r> Binder<'r> {
    /// A lenient binder: unknown payload keys are ignored.
    pub fn new(registry: &'r SchemaRegistry) -> Self {
        Self {
            registry,
            strict: false,
        }
    }

    /// Reject unknown payload keys with [`BindError::UnexpectedField`].
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Whether unknown payload keys are rejected.
    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// Entity to payload.
    ///
    /// # Errors
    ///
    /// - [`BindError::TypeMismatch`] when a field's shape disagrees with its
    ///   declaration, or the entity names a different type.
    /// - [`BindError::UnexpectedField`] for an undeclared field.
    pub fn marshal(&self, entity: &Entity, resolved: &ResolvedType) -> Result<Payload, BindError> {
        self.marshal_entity(entity, resolved, "").map(Payload::Node)
    }

    /// Payload to entity.
    ///
    /// # Errors
    ///
    /// - [`BindError::TypeMismatch`] when the payload's shape disagrees with
    ///   the resolved type.
    /// - [`BindError::UnexpectedField`] for unknown keys in strict mode.
    pub fn unmarshal(&self, payload: &Payload, resolved: &ResolvedType) -> Result<Entity, BindError> {
        self.unmarshal_entity(payload, resolved, "")
    }

    /// Unmarshal, then validate the result.
    ///
    /// # Errors
    ///
    /// As [`Binder::unmarshal`]. Validation problems are returned in
    /// [`Bound::violations`], never as errors.
    pub fn bind(&self, payload: &Payload, resolved: &ResolvedType) -> Result<Bound, BindError> {
        let entity = self.unmarshal(payload, resolved)?;
        let violations = Validator::new(self.registry).validate(&entity, resolved);
        tracing::debug!(
            type_name = %resolved.local_name,
            violations = violations.len(),
            "payload bound"
        );
        Ok(Bound { entity, violations })
    }

    /// Resolve a top-level element and bind a JSON document against it.
    ///
    /// # Errors
    ///
    /// [`IgsError::Schema`] if no module binds `element`, otherwise
    /// [`IgsError::Bind`] as for [`Binder::bind`].
    pub fn bind_element_json(
        &self,
        element: &str,
        json: &serde_json::Value,
    ) -> Result<Bound, IgsError> {
        let resolved = self.registry.resolve_element(element)?;
        let payload = Payload::from_json(json)?;
        Ok(self.bind(&payload, &resolved)?)
    }

    fn child_type(&self, kind: &ValueKind) -> Result<Option<&'r ResolvedType>, BindError> {
        match kind {
            ValueKind::Class { id, name } => self
                .registry
                .resolved(*id)
                .map(|rt| Some(&**rt))
                .ok_or_else(|| BindError::UnknownType {
                    type_name: name.clone(),
                }),
            _ => Ok(None),
        }
    }

    // ─── Marshal ─────────────────────────────────────────────────────

    fn marshal_entity(
        &self,
        entity: &Entity,
        resolved: &ResolvedType,
        path: &str,
    ) -> Result<Node, BindError> {
        if entity.type_name != resolved.local_name {
            return Err(BindError::TypeMismatch {
                path: path.to_string(),
                expected: format!("entity {}", resolved.local_name),
                found: format!("entity {}", entity.type_name),
            });
        }
        if let Some(field) = entity.fields.keys().find(|f| resolved.property(f).is_none()) {
            return Err(BindError::UnexpectedField {
                path: path.to_string(),
                field: field.clone(),
            });
        }

        let mut node = Node::new();
        for prop in &resolved.properties {
            let Some(value) = entity.get(&prop.name) else {
                continue;
            };
            let field_path = format!("{path}/{}", prop.name);
            match prop.kind {
                PropertyKind::Attribute => {
                    let text = scalar_to_text(prop, value, &field_path)?;
                    node.set_attribute(prop.wire_key(), text);
                }
                PropertyKind::Element => {
                    let payload = match (prop.collection, value) {
                        (true, Value::List(items)) => Payload::Sequence(
                            items
                                .iter()
                                .enumerate()
                                .map(|(i, item)| {
                                    self.marshal_single(prop, item, &format!("{field_path}/{i}"))
                                })
                                .collect::<Result<_, _>>()?,
                        ),
                        (true, other) => return Err(mismatch(&field_path, prop, other.kind_name(), true)),
                        (false, Value::List(_)) => {
                            return Err(mismatch(&field_path, prop, "list", false))
                        }
                        (false, single) => self.marshal_single(prop, single, &field_path)?,
                    };
                    node.set_element(prop.wire_key(), payload);
                }
            }
        }
        Ok(node)
    }

    fn marshal_single(
        &self,
        prop: &ResolvedProperty,
        value: &Value,
        path: &str,
    ) -> Result<Payload, BindError> {
        match self.child_type(&prop.value_kind)? {
            Some(child) => match value {
                Value::Entity(e) => self.marshal_entity(e, child, path).map(Payload::Node),
                other => Err(mismatch(path, prop, other.kind_name(), false)),
            },
            None => scalar_to_text(prop, value, path).map(Payload::Text),
        }
    }

    // ─── Unmarshal ───────────────────────────────────────────────────

    fn unmarshal_entity(
        &self,
        payload: &Payload,
        resolved: &ResolvedType,
        path: &str,
    ) -> Result<Entity, BindError> {
        let Payload::Node(node) = payload else {
            return Err(BindError::TypeMismatch {
                path: path.to_string(),
                expected: format!("entity {}", resolved.local_name),
                found: payload.kind_name().to_string(),
            });
        };

        if self.strict {
            reject_unknown_keys(node, resolved, path)?;
        }

        let mut entity = Entity::new(resolved.local_name.clone());
        for prop in &resolved.properties {
            let field_path = format!("{path}/{}", prop.name);
            let value = match prop.kind {
                PropertyKind::Attribute => match node.attribute(prop.wire_key()) {
                    Some(text) => text_to_scalar(prop, text, &field_path)?,
                    None => continue,
                },
                PropertyKind::Element => match (prop.collection, node.element(prop.wire_key())) {
                    (_, None) => continue,
                    (true, Some(Payload::Sequence(items))) => Value::List(
                        items
                            .iter()
                            .enumerate()
                            .map(|(i, item)| {
                                self.unmarshal_single(prop, item, &format!("{field_path}/{i}"))
                            })
                            .collect::<Result<_, _>>()?,
                    ),
                    (true, Some(other)) => {
                        return Err(mismatch(&field_path, prop, other.kind_name(), true))
                    }
                    (false, Some(Payload::Sequence(_))) => {
                        return Err(mismatch(&field_path, prop, "sequence", false))
                    }
                    (false, Some(single)) => self.unmarshal_single(prop, single, &field_path)?,
                },
            };
            entity.fields.insert(prop.name.clone(), value);
        }
        Ok(entity)
    }

    fn unmarshal_single(
        &self,
        prop: &ResolvedProperty,
        payload: &Payload,
        path: &str,
    ) -> Result<Value, BindError> {
        match self.child_type(&prop.value_kind)? {
            Some(child) => self.unmarshal_entity(payload, child, path).map(Value::Entity),
            None => match payload {
                Payload::Text(text) => text_to_scalar(prop, text, path),
                other => Err(mismatch(path, prop, other.kind_name(), false)),
            },
        }
    }
}

fn reject_unknown_keys(node: &Node, resolved: &ResolvedType, path: &str) -> Result<(), BindError> {
    let attributes: HashSet<&str> = resolved.attributes().map(|p| p.wire_key()).collect();
    let elements: HashSet<&str> = resolved.elements().map(|p| p.wire_key()).collect();

    if let Some((key, _)) = node.attributes().find(|(k, _)| !attributes.contains(k)) {
        return Err(BindError::UnexpectedField {
            path: path.to_string(),
            field: format!("{ATTRIBUTE_PREFIX}{key}"),
        });
    }
    if let Some((key, _)) = node.elements().find(|(k, _)| !elements.contains(k)) {
        return Err(BindError::UnexpectedField {
            path: path.to_string(),
            field: key.to_string(),
        });
    }
    Ok(())
}

fn mismatch(path: &str, prop: &ResolvedProperty, found: &str, collection: bool) -> BindError {
    let expected = if collection {
        format!("sequence of {}", prop.value_kind.describe())
    } else {
        prop.value_kind.describe()
    };
    BindError::TypeMismatch {
        path: path.to_string(),
        expected,
        found: found.to_string(),
    }
}

/// The primitive a scalar property converts through.
fn scalar_kind(prop: &ResolvedProperty) -> Option<PrimitiveKind> {
    match &prop.value_kind {
        ValueKind::Primitive(kind) => Some(*kind),
        ValueKind::Enum(info) => Some(info.base),
        ValueKind::Class { .. } => None,
    }
}

fn text_to_scalar(prop: &ResolvedProperty, text: &str, path: &str) -> Result<Value, BindError> {
    let fail = || BindError::TypeMismatch {
        path: path.to_string(),
        expected: prop.value_kind.describe(),
        found: format!("'{text}'"),
    };
    let kind = scalar_kind(prop).ok_or_else(fail)?;
    match kind {
        PrimitiveKind::Boolean => match text {
            "true" => Ok(Value::Boolean(true)),
            "false" => Ok(Value::Boolean(false)),
            _ => Err(fail()),
        },
        k if k.is_integral() => {
            let n: i64 = text.parse().map_err(|_| fail())?;
            match k.integer_range() {
                Some((min, max)) if n < min || n > max => Err(fail()),
                _ => Ok(Value::Integer(n)),
            }
        }
        _ => Ok(Value::Text(text.to_string())),
    }
}

fn scalar_to_text(prop: &ResolvedProperty, value: &Value, path: &str) -> Result<String, BindError> {
    let fail = || mismatch(path, prop, value.kind_name(), false);
    let kind = scalar_kind(prop).ok_or_else(fail)?;
    match (kind, value) {
        (PrimitiveKind::Boolean, Value::Boolean(b)) => Ok(b.to_string()),
        (k, Value::Integer(n)) if k.is_integral() => match k.integer_range() {
            Some((min, max)) if *n < min || *n > max => Err(BindError::TypeMismatch {
                path: path.to_string(),
                expected: format!("{k} in [{min}, {max}]"),
                found: n.to_string(),
            }),
            _ => Ok(n.to_string()),
        },
        (k, Value::Text(s)) if k.is_textual() => Ok(s.clone()),
        _ => Err(fail()),
    }
}
