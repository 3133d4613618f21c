//! # Module Descriptors
//!
//! The serde model of a schema module as it appears on disk. Field names
//! follow the descriptor format (`localName`, `typeInfos`,
//! `defaultElementNamespaceURI`, ...). Nothing here is linked: references
//! are still strings. [`crate::registry::SchemaRegistryBuilder`] turns
//! descriptors into linked [`crate::types::TypeInfo`] values.
//!
//! ## Format
//!
//! ```yaml
//! name: account
//! defaultElementNamespaceURI: urn:igs:account
//! typeInfos:
//!   - type: enumInfo
//!     localName: Risk
//!     baseTypeInfo: Token
//!     values: [low, medium, high]
//!   - localName: Account
//!     baseTypeInfo: .Entity
//!     propertyInfos:
//!       - name: action
//!         type: attribute
//!         required: true
//!         values: [create, delete, modify, enable, disable]
//! elementInfos:
//!   - elementName: account
//!     typeInfo: .Account
//! ```

use serde::{Deserialize, Serialize};

use igs_core::QName;

/// A whole module descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleDescriptor {
    /// Module identifier, the left half of qualified references.
    pub name: String,
    /// Namespace inherited by unqualified element properties.
    #[serde(
        default,
        rename = "defaultElementNamespaceURI",
        skip_serializing_if = "Option::is_none"
    )]
    pub default_element_namespace_uri: Option<String>,
    /// Class and enumeration declarations, in declaration order.
    #[serde(default)]
    pub type_infos: Vec<TypeInfoDecl>,
    /// Top-level bindable elements.
    #[serde(default)]
    pub element_infos: Vec<ElementInfoDecl>,
}

impl ModuleDescriptor {
    /// Class declarations only.
    pub fn classes(&self) -> impl Iterator<Item = &ClassInfoDecl> {
        self.type_infos.iter().filter_map(|t| match t {
            TypeInfoDecl::Class(c) => Some(c),
            TypeInfoDecl::Enum(_) => None,
        })
    }

    /// Enumeration declarations only.
    pub fn enums(&self) -> impl Iterator<Item = &EnumInfoDecl> {
        self.type_infos.iter().filter_map(|t| match t {
            TypeInfoDecl::Enum(e) => Some(e),
            TypeInfoDecl::Class(_) => None,
        })
    }
}

/// One entry of `typeInfos`.
///
/// Entries tagged `type: enumInfo` are enumerations; everything else is a
/// class declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TypeInfoDecl {
    /// `type: enumInfo`.
    Enum(EnumInfoDecl),
    /// A class declaration.
    Class(ClassInfoDecl),
}

impl TypeInfoDecl {
    /// The declared local name.
    pub fn local_name(&self) -> &str {
        match self {
            Self::Enum(e) => &e.local_name,
            Self::Class(c) => &c.local_name,
        }
    }
}

/// Discriminator for enumeration entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnumTag {
    /// The only accepted spelling.
    #[serde(rename = "enumInfo")]
    EnumInfo,
}

/// Optional discriminator for class entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClassTag {
    /// The only accepted spelling.
    #[serde(rename = "classInfo")]
    ClassInfo,
}

/// A named enumeration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnumInfoDecl {
    /// Always `enumInfo`.
    #[serde(rename = "type")]
    pub kind: EnumTag,
    /// Name, unique within the module.
    pub local_name: String,
    /// The primitive refined by this enumeration.
    #[serde(default = "default_enum_base")]
    pub base_type_info: String,
    /// Allowed literals.
    pub values: Vec<String>,
}

fn default_enum_base() -> String {
    "Token".to_string()
}

/// A class (structured type) declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassInfoDecl {
    /// Optional `classInfo` tag.
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<ClassTag>,
    /// Name, unique within the module.
    pub local_name: String,
    /// Qualified wire name; absent for anonymous inner types.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_name: Option<NameDecl>,
    /// Parent type reference (`.Entity`, `core.Entity`, `Entity`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_type_info: Option<String>,
    /// Overrides the module's namespace for this type's elements.
    #[serde(
        default,
        rename = "defaultElementNamespaceURI",
        skip_serializing_if = "Option::is_none"
    )]
    pub default_element_namespace_uri: Option<String>,
    /// Own properties, in declaration order.
    #[serde(default)]
    pub property_infos: Vec<PropertyInfoDecl>,
}

/// Where a property lives on the wire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PropertyKindDecl {
    /// Nested element (the default).
    #[default]
    Element,
    /// Attribute of the enclosing node.
    Attribute,
}

/// One property of a class declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyInfoDecl {
    /// Field identifier.
    pub name: String,
    /// `element` (default) or `attribute`.
    #[serde(default, rename = "type")]
    pub kind: PropertyKindDecl,
    /// Class, enumeration or primitive reference; `String` when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_info: Option<String>,
    /// Zero-or-more occurrences.
    #[serde(default)]
    pub collection: bool,
    /// Element multiplicity lower bound; defaults to 1.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_occurs: Option<u32>,
    /// Attribute presence requirement.
    #[serde(default)]
    pub required: bool,
    /// Inline enumeration of allowed literals.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<String>>,
    /// Wire name when serialized as an attribute.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute_name: Option<NameDecl>,
    /// Wire name when serialized as an element.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element_name: Option<NameDecl>,
}

impl PropertyInfoDecl {
    /// The declared `typeInfo`, or the `String` default.
    pub fn type_info_or_default(&self) -> &str {
        self.type_info.as_deref().unwrap_or("String")
    }
}

/// A wire name, either a bare local part or `{ localPart, namespaceURI }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NameDecl {
    /// Bare local part.
    Local(String),
    /// Local part with optional namespace.
    Qualified {
        /// Local part.
        #[serde(rename = "localPart")]
        local_part: String,
        /// Namespace URI.
        #[serde(
            default,
            rename = "namespaceURI",
            skip_serializing_if = "Option::is_none"
        )]
        namespace_uri: Option<String>,
    },
}

impl NameDecl {
    /// The local part.
    pub fn local_part(&self) -> &str {
        match self {
            Self::Local(s) => s,
            Self::Qualified { local_part, .. } => local_part,
        }
    }

    /// The explicit namespace, if any.
    pub fn namespace_uri(&self) -> Option<&str> {
        match self {
            Self::Local(_) => None,
            Self::Qualified { namespace_uri, .. } => namespace_uri.as_deref(),
        }
    }

    /// Convert to a [`QName`], filling in `default_ns` when no namespace
    /// was written.
    pub fn to_qname(&self, default_ns: Option<&str>) -> QName {
        QName {
            namespace_uri: self
                .namespace_uri()
                .or(default_ns)
                .map(str::to_string),
            local_part: self.local_part().to_string(),
        }
    }
}

/// One entry of `elementInfos`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ElementInfoDecl {
    /// Shorthand: element name and type local name are the same.
    Name(String),
    /// Explicit element name and type reference.
    Full {
        /// Wire name of the element.
        #[serde(rename = "elementName")]
        element_name: NameDecl,
        /// Reference to the bound class.
        #[serde(rename = "typeInfo")]
        type_info: String,
    },
}

impl ElementInfoDecl {
    /// Wire name of the element.
    pub fn element_name(&self) -> &str {
        match self {
            Self::Name(name) => name,
            Self::Full { element_name, .. } => element_name.local_part(),
        }
    }

    /// The type reference as written (the shorthand is module-relative).
    pub fn type_reference(&self) -> String {
        match self {
            Self::Name(name) => format!(".{name}"),
            Self::Full { type_info, .. } => type_info.clone(),
        }
    }
}
