//! # Linked Type Declarations
//!
//! A [`TypeInfo`] is a class declaration after the registry linked every
//! reference in it. Base types and property targets are arena indices,
//! never strings. `TypeInfo` values are immutable once the registry is
//! built.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use igs_core::{Fingerprint, QName, TypeId, TypeRef};

use crate::enums::EnumInfo;

/// Where a property lives on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyKind {
    /// Scalar on the attribute level of the enclosing node.
    Attribute,
    /// Nested element.
    Element,
}

impl std::fmt::Display for PropertyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Attribute => f.write_str("attribute"),
            Self::Element => f.write_str("element"),
        }
    }
}

/// One linked property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyInfo {
    /// Field identifier on the typed entity.
    pub name: String,
    /// Attribute or element.
    pub kind: PropertyKind,
    /// Wire name; the local part is the payload key.
    pub wire_name: QName,
    /// Linked target.
    pub type_ref: TypeRef,
    /// Always a sequence when true.
    pub collection: bool,
    /// Element lower bound (0 or 1). Unused for attributes.
    pub min_occurs: u32,
    /// Attribute presence requirement. Unused for elements.
    pub required: bool,
    /// Inline enumeration, if the property lists its own `values`.
    pub values: Option<Arc<EnumInfo>>,
}

impl PropertyInfo {
    /// Whether an entity must carry this property.
    pub fn is_required(&self) -> bool {
        match self.kind {
            PropertyKind::Attribute => self.required,
            PropertyKind::Element => self.min_occurs >= 1,
        }
    }
}

/// A linked class declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeInfo {
    /// Arena index.
    pub id: TypeId,
    /// Unqualified name, unique across the registry.
    pub local_name: String,
    /// Qualified wire name; `None` for anonymous inner types.
    pub type_name: Option<QName>,
    /// Linked parent.
    pub base: Option<TypeId>,
    /// Module of the first declaration.
    pub module: String,
    /// Further modules that redeclared this type identically.
    pub redeclared_in: Vec<String>,
    /// Namespace inherited by unqualified element properties.
    pub default_element_namespace_uri: Option<String>,
    /// Own properties in declaration order.
    pub properties: Vec<PropertyInfo>,
    /// Structural fingerprint used for redeclaration checks.
    pub fingerprint: Fingerprint,
}

impl TypeInfo {
    /// `module.LocalName` of the first declaration.
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.module, self.local_name)
    }

    /// Every module that declares this type.
    pub fn declaring_modules(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.module.as_str()).chain(self.redeclared_in.iter().map(String::as_str))
    }
}
