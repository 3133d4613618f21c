//! # Names, References and Arena Ids
//!
//! Module descriptors refer to other declarations with short strings. This
//! module gives those strings a type: [`TypeReference`] is what a
//! descriptor says, [`TypeRef`] is what the registry linked it to.
//!
//! ## Reference grammar
//!
//! | Written | Meaning |
//! |---------|---------|
//! | `.Attribute` | `Attribute` in the module that holds the reference |
//! | `core.Entity` | `Entity` declared by module `core` |
//! | `Entity` | `Entity` anywhere in the registry |
//! | `Token` | the primitive kind `Token` |
//!
//! `TypeId` and `EnumId` cannot be confused with each other: a class
//! reference can never be used where an enumeration is expected.

use serde::{Deserialize, Serialize};

use crate::primitive::PrimitiveKind;

/// Arena index of a class declaration inside one registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TypeId(pub u32);

/// Arena index of a named enumeration inside one registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EnumId(pub u32);

impl TypeId {
    /// The arena slot.
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl EnumId {
    /// The arena slot.
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for TypeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "type:{}", self.0)
    }
}

impl std::fmt::Display for EnumId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "enum:{}", self.0)
    }
}

/// A reference as written in a descriptor, before linking.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeReference {
    /// One of the built-in scalar kinds.
    Primitive(PrimitiveKind),
    /// `.Name`: a declaration in the referring module.
    Relative(String),
    /// `module.Name`: a declaration in a named module.
    Qualified {
        /// Module name.
        module: String,
        /// Local name within that module.
        name: String,
    },
    /// `Name`: a declaration anywhere in the registry.
    Global(String),
}

impl TypeReference {
    /// Parse the textual form of a reference.
    ///
    /// # Errors
    ///
    /// Returns a description of the problem when the text is empty or has
    /// an empty segment (`.`, `core.`, `.a.b`).
    pub fn parse(text: &str) -> Result<Self, String> {
        let text = text.trim();
        if text.is_empty() {
            return Err("empty type reference".to_string());
        }
        if let Some(rest) = text.strip_prefix('.') {
            if rest.is_empty() || rest.contains('.') {
                return Err(format!("malformed relative reference '{text}'"));
            }
            return Ok(Self::Relative(rest.to_string()));
        }
        if let Ok(kind) = text.parse::<PrimitiveKind>() {
            return Ok(Self::Primitive(kind));
        }
        match text.rsplit_once('.') {
            Some((module, name)) => {
                if module.is_empty() || name.is_empty() {
                    return Err(format!("malformed qualified reference '{text}'"));
                }
                Ok(Self::Qualified {
                    module: module.to_string(),
                    name: name.to_string(),
                })
            }
            None => Ok(Self::Global(text.to_string())),
        }
    }

    /// The local name this reference targets, if it targets a declaration.
    pub fn target_name(&self) -> Option<&str> {
        match self {
            Self::Primitive(_) => None,
            Self::Relative(name) | Self::Global(name) => Some(name),
            Self::Qualified { name, .. } => Some(name),
        }
    }
}

impl std::fmt::Display for TypeReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Primitive(kind) => write!(f, "{kind}"),
            Self::Relative(name) => write!(f, ".{name}"),
            Self::Qualified { module, name } => write!(f, "{module}.{name}"),
            Self::Global(name) => f.write_str(name),
        }
    }
}

/// A reference after linking against a registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeRef {
    /// A built-in scalar kind.
    Primitive(PrimitiveKind),
    /// A class declaration.
    Class(TypeId),
    /// A named enumeration.
    Enum(EnumId),
}

/// A namespace-qualified wire name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct QName {
    /// Namespace URI; `None` for unqualified names.
    pub namespace_uri: Option<String>,
    /// Local part, the key used on the wire.
    pub local_part: String,
}

impl QName {
    /// An unqualified name.
    pub fn local(local_part: impl Into<String>) -> Self {
        Self {
            namespace_uri: None,
            local_part: local_part.into(),
        }
    }

    /// A name in the given namespace.
    pub fn qualified(namespace_uri: impl Into<String>, local_part: impl Into<String>) -> Self {
        Self {
            namespace_uri: Some(namespace_uri.into()),
            local_part: local_part.into(),
        }
    }
}

impl std::fmt::Display for QName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.namespace_uri {
            Some(ns) if !ns.is_empty() => write!(f, "{{{ns}}}{}", self.local_part),
            _ => f.write_str(&self.local_part),
        }
    }
}
