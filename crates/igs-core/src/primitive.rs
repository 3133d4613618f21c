//! # Primitive Kinds: Single Source of Truth
//!
//! Defines the `PrimitiveKind` enum: every scalar type a property may
//! declare as its `typeInfo` without pointing at a class or enumeration.
//! Every `match` on `PrimitiveKind` is exhaustive, so adding a kind forces
//! the binder and validator to handle it at compile time.
//!
//! Keywords are case-sensitive and match the descriptor spelling
//! (`Token`, `Boolean`, ...).

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Scalar types understood by the binder.
///
/// | Keyword | Wire form | Typed form |
/// |---------|-----------|------------|
/// | `String` | any text | text, unchanged |
/// | `Token` | any text | text, unchanged |
/// | `NormalizedString` | any text | text, unchanged |
/// | `Boolean` | exactly `true` / `false` | boolean |
/// | `Int` | base-10, 32-bit range | integer |
/// | `Long` | base-10, 64-bit range | integer |
/// | `Integer` | base-10, 64-bit range | integer |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrimitiveKind {
    /// Free text.
    String,
    /// Whitespace-collapsed text; carried verbatim.
    Token,
    /// Text without line breaks; carried verbatim.
    NormalizedString,
    /// `true` or `false`, case-sensitive.
    Boolean,
    /// Signed 32-bit integer.
    Int,
    /// Signed 64-bit integer.
    Long,
    /// Arbitrary integer, bounded to 64 bits here.
    Integer,
}

/// Total number of primitive kinds.
pub const PRIMITIVE_KIND_COUNT: usize = 7;

impl PrimitiveKind {
    /// Returns all primitive kinds in canonical order.
    pub fn all() -> &'static [PrimitiveKind] {
        &[
            Self::String,
            Self::Token,
            Self::NormalizedString,
            Self::Boolean,
            Self::Int,
            Self::Long,
            Self::Integer,
        ]
    }

    /// The descriptor keyword for this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "String",
            Self::Token => "Token",
            Self::NormalizedString => "NormalizedString",
            Self::Boolean => "Boolean",
            Self::Int => "Int",
            Self::Long => "Long",
            Self::Integer => "Integer",
        }
    }

    /// Whether values of this kind are carried as text in typed form.
    pub fn is_textual(&self) -> bool {
        matches!(self, Self::String | Self::Token | Self::NormalizedString)
    }

    /// Whether values of this kind are carried as integers in typed form.
    pub fn is_integral(&self) -> bool {
        matches!(self, Self::Int | Self::Long | Self::Integer)
    }

    /// Inclusive range accepted for integral kinds.
    pub fn integer_range(&self) -> Option<(i64, i64)> {
        match self {
            Self::Int => Some((i64::from(i32::MIN), i64::from(i32::MAX))),
            Self::Long | Self::Integer => Some((i64::MIN, i64::MAX)),
            Self::String | Self::Token | Self::NormalizedString | Self::Boolean => None,
        }
    }
}

impl std::fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PrimitiveKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| format!("unknown primitive kind: {s}"))
    }
}
