//! # Type Resolution
//!
//! Closes a [`TypeInfo`] over its inheritance chain, producing the flat
//! [`ResolvedType`] the binder and validator work from.
//!
//! ## Merge order
//!
//! Ancestors are merged root-first. A derived type's own properties come
//! after every inherited one, in declaration order. Redeclaring an
//! inherited property name shadows the ancestor's declaration: the
//! ancestor's entry is dropped and the derived one takes its place among
//! the derived type's own properties.
//!
//! ```text
//! Entity   [id, attributes]
//! Account  base Entity, own [entitlements, action]
//! closed   [id, attributes, entitlements, action]
//! ```
//!
//! ## Cycles
//!
//! The chain walk keeps a visited set, so a `baseTypeInfo` loop is
//! reported as [`SchemaError::CyclicInheritance`] after at most one pass
//! over the arena, never as unbounded recursion.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use igs_core::{PrimitiveKind, QName, SchemaError, TypeId, TypeRef};

use crate::enums::{EnumCatalog, EnumInfo};
use crate::types::{PropertyInfo, PropertyKind, TypeInfo};

/// What a property's values look like once resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueKind {
    /// A scalar primitive.
    Primitive(PrimitiveKind),
    /// A literal constrained to a closed set (named or inline).
    Enum(Arc<EnumInfo>),
    /// A nested structured entity.
    Class {
        /// Arena id of the target class.
        id: TypeId,
        /// Local name of the target class.
        name: String,
    },
}

impl ValueKind {
    /// Short human-readable description used in error messages.
    pub fn describe(&self) -> String {
        match self {
            Self::Primitive(kind) => kind.to_string(),
            Self::Enum(info) => format!("enumeration {}", info.local_name),
            Self::Class { name, .. } => format!("entity {name}"),
        }
    }

    /// Whether values of this kind are scalars.
    pub fn is_scalar(&self) -> bool {
        !matches!(self, Self::Class { .. })
    }
}

/// One property of a closed type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedProperty {
    /// Field identifier on the typed entity.
    pub name: String,
    /// Attribute or element.
    pub kind: PropertyKind,
    /// Wire name; the local part is the payload key.
    pub wire_name: QName,
    /// Resolved value shape.
    pub value_kind: ValueKind,
    /// Always a sequence when true.
    pub collection: bool,
    /// Element lower bound.
    pub min_occurs: u32,
    /// Attribute presence requirement.
    pub required: bool,
    /// Local name of the type that declared this property.
    pub declared_by: String,
}

impl ResolvedProperty {
    /// Whether an entity must carry this property.
    pub fn is_required(&self) -> bool {
        match self.kind {
            PropertyKind::Attribute => self.required,
            PropertyKind::Element => self.min_occurs >= 1,
        }
    }

    /// The payload key for this property.
    pub fn wire_key(&self) -> &str {
        &self.wire_name.local_part
    }
}

/// A type after inheritance has been merged into one flat property list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedType {
    /// Arena id of the closed type.
    pub id: TypeId,
    /// Local name of the closed type.
    pub local_name: String,
    /// Qualified wire name, if any.
    pub type_name: Option<QName>,
    /// Local names from the root ancestor down to this type.
    pub lineage: Vec<String>,
    /// Inherited properties first, then own properties.
    pub properties: Vec<ResolvedProperty>,
}

impl ResolvedType {
    /// Look up a property by field name.
    pub fn property(&self, name: &str) -> Option<&ResolvedProperty> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// Field names in resolution order.
    pub fn property_names(&self) -> Vec<&str> {
        self.properties.iter().map(|p| p.name.as_str()).collect()
    }

    /// Attribute-typed properties in resolution order.
    pub fn attributes(&self) -> impl Iterator<Item = &ResolvedProperty> {
        self.properties
            .iter()
            .filter(|p| p.kind == PropertyKind::Attribute)
    }

    /// Element-typed properties in resolution order.
    pub fn elements(&self) -> impl Iterator<Item = &ResolvedProperty> {
        self.properties
            .iter()
            .filter(|p| p.kind == PropertyKind::Element)
    }

    /// Whether this type is `name` or derives from it.
    pub fn is_a(&self, name: &str) -> bool {
        self.lineage.iter().any(|n| n == name)
    }
}

/// Closes type declarations over their inheritance chains.
#[derive(Debug, Clone, Copy)]
pub struct TypeResolver<'a> {
    types: &'a [TypeInfo],
    enums: &'a EnumCatalog,
}

impl<'a> TypeResolver<'a> {
    /// A resolver over a linked arena of types and the enumerations they
    /// reference.
    pub fn new(types: &'a [TypeInfo], enums: &'a EnumCatalog) -> Self {
        Self { types, enums }
    }

    /// Ancestors of `info` from the root down to `info` itself.
    ///
    /// # Errors
    ///
    /// [`SchemaError::CyclicInheritance`] if the chain loops, and
    /// [`SchemaError::UnknownType`] if a base id is outside the arena.
    pub fn chain(&self, info: &'a TypeInfo) -> Result<Vec<&'a TypeInfo>, SchemaError> {
        let mut chain: Vec<&TypeInfo> = Vec::new();
        let mut visited: HashSet<TypeId> = HashSet::new();
        let mut current = Some(info);

        while let Some(t) = current {
            if !visited.insert(t.id) {
                let start = chain.iter().position(|c| c.id == t.id).unwrap_or(0);
                let mut cycle: Vec<String> =
                    chain[start..].iter().map(|c| c.local_name.clone()).collect();
                cycle.push(t.local_name.clone());
                return Err(SchemaError::CyclicInheritance { cycle });
            }
            chain.push(t);
            current = match t.base {
                Some(base) => Some(self.type_at(base, &t.local_name)?),
                None => None,
            };
        }

        chain.reverse();
        Ok(chain)
    }

    /// Produce the closed projection of `info`.
    ///
    /// # Errors
    ///
    /// Everything [`TypeResolver::chain`] reports, plus
    /// [`SchemaError::InvalidSchema`] when two properties of the closed type
    /// end up on the same wire key.
    pub fn close(&self, info: &'a TypeInfo) -> Result<ResolvedType, SchemaError> {
        let chain = self.chain(info)?;
        let mut properties: Vec<ResolvedProperty> = Vec::new();

        for ancestor in &chain {
            for prop in &ancestor.properties {
                if let Some(pos) = properties.iter().position(|p| p.name == prop.name) {
                    tracing::trace!(
                        type_name = %info.local_name,
                        property = %prop.name,
                        shadowed = %properties[pos].declared_by,
                        by = %ancestor.local_name,
                        "property override"
                    );
                    properties.remove(pos);
                }
                properties.push(self.resolve_property(ancestor, prop)?);
            }
        }

        check_wire_keys(&info.local_name, &properties)?;

        Ok(ResolvedType {
            id: info.id,
            local_name: info.local_name.clone(),
            type_name: info.type_name.clone(),
            lineage: chain.iter().map(|t| t.local_name.clone()).collect(),
            properties,
        })
    }

    fn type_at(&self, id: TypeId, referrer: &str) -> Result<&'a TypeInfo, SchemaError> {
        self.types
            .get(id.index())
            .ok_or_else(|| SchemaError::UnknownType {
                reference: id.to_string(),
                referrer: referrer.to_string(),
            })
    }

    fn resolve_property(
        &self,
        owner: &TypeInfo,
        prop: &PropertyInfo,
    ) -> Result<ResolvedProperty, SchemaError> {
        let value_kind = match (&prop.values, prop.type_ref) {
            (Some(inline), _) => ValueKind::Enum(Arc::clone(inline)),
            (None, TypeRef::Primitive(kind)) => ValueKind::Primitive(kind),
            (None, TypeRef::Enum(id)) => {
                let info = self.enums.by_id(id).ok_or_else(|| SchemaError::UnknownEnum {
                    name: id.to_string(),
                })?;
                ValueKind::Enum(Arc::clone(info))
            }
            (None, TypeRef::Class(id)) => {
                let target = self.type_at(id, &owner.local_name)?;
                ValueKind::Class {
                    id,
                    name: target.local_name.clone(),
                }
            }
        };

        Ok(ResolvedProperty {
            name: prop.name.clone(),
            kind: prop.kind,
            wire_name: prop.wire_name.clone(),
            value_kind,
            collection: prop.collection,
            min_occurs: prop.min_occurs,
            required: prop.required,
            declared_by: owner.local_name.clone(),
        })
    }
}

fn check_wire_keys(type_name: &str, properties: &[ResolvedProperty]) -> Result<(), SchemaError> {
    let mut seen: HashMap<(PropertyKind, &str), &str> = HashMap::new();
    for p in properties {
        if let Some(other) = seen.insert((p.kind, p.wire_key()), &p.name) {
            return Err(SchemaError::InvalidSchema {
                context: format!("type {type_name}"),
                reason: format!(
                    "properties '{other}' and '{}' share the {} name '{}'",
                    p.name,
                    p.kind,
                    p.wire_key()
                ),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use igs_core::{fingerprint, CanonicalBytes};

    fn fp() -> igs_core::Fingerprint {
        fingerprint(&CanonicalBytes::new(&serde_json::json!({})).unwrap())
    }

    fn prop(name: &str, kind: PropertyKind, type_ref: TypeRef) -> PropertyInfo {
        PropertyInfo {
            name: name.into(),
            kind,
            wire_name: QName::local(name),
            type_ref,
            collection: false,
            min_occurs: 0,
            required: false,
            values: None,
        }
    }

    fn class(id: u32, name: &str, base: Option<u32>, props: Vec<PropertyInfo>) -> TypeInfo {
        TypeInfo {
            id: TypeId(id),
            local_name: name.into(),
            type_name: None,
            base: base.map(TypeId),
            module: "test".into(),
            redeclared_in: Vec::new(),
            default_element_namespace_uri: None,
            properties: props,
            fingerprint: fp(),
        }
    }

    fn token() -> TypeRef {
        TypeRef::Primitive(PrimitiveKind::Token)
    }

    #[test]
    fn test_inherited_properties_come_first() {
        let types = vec![
            class(
                0,
                "Entity",
                None,
                vec![
                    prop("id", PropertyKind::Attribute, token()),
                    prop("attributes", PropertyKind::Element, token()),
                ],
            ),
            class(
                1,
                "Account",
                Some(0),
                vec![
                    prop("entitlements", PropertyKind::Element, token()),
                    prop("action", PropertyKind::Attribute, token()),
                ],
            ),
        ];
        let enums = EnumCatalog::new();
        let resolver = TypeResolver::new(&types, &enums);
        let closed = resolver.close(&types[1]).unwrap();
        assert_eq!(
            closed.property_names(),
            vec!["id", "attributes", "entitlements", "action"]
        );
        assert_eq!(closed.lineage, vec!["Entity", "Account"]);
        assert_eq!(closed.property("id").unwrap().declared_by, "Entity");
    }

    #[test]
    fn test_derived_declaration_shadows_ancestor() {
        let mut own_id = prop("id", PropertyKind::Attribute, token());
        own_id.required = false;
        let types = vec![
            class(
                0,
                "Base",
                None,
                vec![
                    {
                        let mut p = prop("id", PropertyKind::Attribute, token());
                        p.required = true;
                        p
                    },
                    prop("name", PropertyKind::Element, token()),
                ],
            ),
            class(
                1,
                "Derived",
                Some(0),
                vec![own_id, prop("extra", PropertyKind::Element, token())],
            ),
        ];
        let enums = EnumCatalog::new();
        let closed = TypeResolver::new(&types, &enums).close(&types[1]).unwrap();
        assert_eq!(closed.property_names(), vec!["name", "id", "extra"]);
        let id = closed.property("id").unwrap();
        assert_eq!(id.declared_by, "Derived");
        assert!(!id.required);
    }

    #[test]
    fn test_two_type_cycle_is_rejected() {
        let types = vec![
            class(0, "A", Some(1), vec![]),
            class(1, "B", Some(0), vec![]),
        ];
        let enums = EnumCatalog::new();
        let err = TypeResolver::new(&types, &enums)
            .close(&types[0])
            .unwrap_err();
        assert_eq!(
            err,
            SchemaError::CyclicInheritance {
                cycle: vec!["A".into(), "B".into(), "A".into()]
            }
        );
    }

    #[test]
    fn test_self_cycle_is_rejected() {
        let types = vec![class(0, "Loop", Some(0), vec![])];
        let enums = EnumCatalog::new();
        let err = TypeResolver::new(&types, &enums).chain(&types[0]).unwrap_err();
        assert!(matches!(err, SchemaError::CyclicInheritance { .. }));
    }

    #[test]
    fn test_cycle_above_the_start_names_only_the_loop() {
        // C -> A -> B -> A
        let types = vec![
            class(0, "A", Some(1), vec![]),
            class(1, "B", Some(0), vec![]),
            class(2, "C", Some(0), vec![]),
        ];
        let enums = EnumCatalog::new();
        let err = TypeResolver::new(&types, &enums).chain(&types[2]).unwrap_err();
        assert_eq!(
            err,
            SchemaError::CyclicInheritance {
                cycle: vec!["A".into(), "B".into(), "A".into()]
            }
        );
    }

    #[test]
    fn test_enum_reference_resolves_through_catalog() {
        let mut enums = EnumCatalog::new();
        let risk = enums
            .register(EnumInfo::named(
                "core",
                "Risk",
                PrimitiveKind::Token,
                vec!["low".into(), "high".into()],
            ))
            .unwrap();
        let types = vec![class(
            0,
            "Role",
            None,
            vec![prop("risk", PropertyKind::Attribute, TypeRef::Enum(risk))],
        )];
        let closed = TypeResolver::new(&types, &enums).close(&types[0]).unwrap();
        match &closed.property("risk").unwrap().value_kind {
            ValueKind::Enum(info) => assert_eq!(info.local_name, "Risk"),
            other => panic!("expected enum, got {other:?}"),
        }
    }

    #[test]
    fn test_shared_wire_key_is_invalid() {
        let mut b = prop("b", PropertyKind::Element, token());
        b.wire_name = QName::local("a");
        let types = vec![class(
            0,
            "T",
            None,
            vec![prop("a", PropertyKind::Element, token()), b],
        )];
        let enums = EnumCatalog::new();
        let err = TypeResolver::new(&types, &enums).close(&types[0]).unwrap_err();
        assert!(matches!(err, SchemaError::InvalidSchema { .. }));
    }

    #[test]
    fn test_attribute_and_element_may_share_a_wire_key() {
        let types = vec![class(
            0,
            "T",
            None,
            vec![
                prop("a", PropertyKind::Attribute, token()),
                {
                    let mut p = prop("a_el", PropertyKind::Element, token());
                    p.wire_name = QName::local("a");
                    p
                },
            ],
        )];
        let enums = EnumCatalog::new();
        assert!(TypeResolver::new(&types, &enums).close(&types[0]).is_ok());
    }
}
