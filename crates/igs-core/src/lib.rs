//! # igs-core: Foundational Types for the Schema Engine
//!
//! This crate is the leaf of the workspace. It defines the primitives that
//! every other crate shares when it talks about identity governance
//! schemas: the error taxonomy, the primitive scalar kinds, the reference
//! grammar used by module descriptors, and the fingerprinting pipeline
//! that decides whether two declarations are structurally identical.
//!
//! ## Key Design Principles
//!
//! 1. **References are parsed once.** A descriptor reference such as
//!    `.Attribute`, `core.Entity` or `Token` becomes a [`TypeReference`] at
//!    load time and is linked into a [`TypeRef`] arena index. Nothing
//!    downstream looks a type up by string.
//!
//! 2. **Single `PrimitiveKind` enum.** Every scalar conversion goes through
//!    one exhaustive `match`; adding a primitive forces every consumer to
//!    handle it.
//!
//! 3. **Structural equality is a digest.** Redeclared types are compared
//!    through [`Fingerprint`], computed only from [`CanonicalBytes`].
//!
//! ## Crate Policy
//!
//! - No dependencies on other `igs-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod canonical;
pub mod error;
pub mod fingerprint;
pub mod names;
pub mod primitive;

// Re-export primary types for ergonomic imports.
pub use canonical::CanonicalBytes;
pub use error::{BindError, IgsError, SchemaError};
pub use fingerprint::{fingerprint, Fingerprint};
pub use names::{EnumId, QName, TypeId, TypeRef, TypeReference};
pub use primitive::{PrimitiveKind, PRIMITIVE_KIND_COUNT};
