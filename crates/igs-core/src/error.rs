//! # Error Types: Structured Error Hierarchy
//!
//! Defines the error types used throughout the schema engine. All errors
//! use `thiserror` for derive-based `Display` and `Error` implementations.
//!
//! ## Design
//!
//! - [`SchemaError`] is load-time and fatal: registry construction aborts
//!   on the first one.
//! - [`BindError`] is binding-time and scoped to one entity. It is returned
//!   to the caller, never allowed to take down the process.
//! - Validation findings are not errors at all; they are returned as data
//!   by the validator in `igs-schema`.

use thiserror::Error;

/// Top-level error type for the schema engine.
#[derive(Error, Debug)]
pub enum IgsError {
    /// A module set could not be turned into a registry.
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    /// A payload or entity could not be bound.
    #[error("bind error: {0}")]
    Bind(#[from] BindError),

    /// Canonicalization failed.
    #[error("canonicalization error: {0}")]
    Canonicalization(#[from] CanonicalizationError),
}

/// Errors raised while loading modules and building a registry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// Two modules declare the same local name with a different shape.
    #[error("schema conflict on type '{type_name}': declaration in module '{incoming_module}' differs from the one in '{existing_module}'")]
    SchemaConflict {
        /// Local name of the colliding type.
        type_name: String,
        /// Module that declared the type first.
        existing_module: String,
        /// Module whose declaration was rejected.
        incoming_module: String,
    },

    /// Two modules declare the same enumeration with different value sets.
    #[error("enumeration '{name}' redeclared in module '{incoming_module}' with a value set that differs from module '{existing_module}'")]
    DuplicateEnum {
        /// Local name of the enumeration.
        name: String,
        /// Module that registered the enumeration first.
        existing_module: String,
        /// Module whose declaration was rejected.
        incoming_module: String,
    },

    /// A reference names a type that was never declared.
    #[error("unknown type '{reference}' referenced from '{referrer}'")]
    UnknownType {
        /// The reference as written in the descriptor.
        reference: String,
        /// The declaration (or caller) holding the reference.
        referrer: String,
    },

    /// An enumeration lookup named an enumeration that was never registered.
    #[error("unknown enumeration '{name}'")]
    UnknownEnum {
        /// The enumeration name that was looked up.
        name: String,
    },

    /// The `baseTypeInfo` chain loops back on itself.
    #[error("cyclic inheritance: {}", .cycle.join(" -> "))]
    CyclicInheritance {
        /// Local names along the cycle, first name repeated at the end.
        cycle: Vec<String>,
    },

    /// A descriptor contradicts itself (e.g. a collection-valued attribute).
    #[error("invalid schema in {context}: {reason}")]
    InvalidSchema {
        /// Module, type or property where the contradiction was found.
        context: String,
        /// What is wrong.
        reason: String,
    },

    /// A descriptor document could not be read or parsed.
    #[error("cannot parse module descriptor '{source_name}': {reason}")]
    Parse {
        /// File name or label of the document.
        source_name: String,
        /// Reason the document could not be parsed.
        reason: String,
    },
}

/// Errors raised while marshalling or unmarshalling one entity.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BindError {
    /// A value's shape disagrees with its property declaration.
    #[error("type mismatch at '{path}': expected {expected}, found {found}")]
    TypeMismatch {
        /// Slash-separated path from the root entity.
        path: String,
        /// What the schema declares.
        expected: String,
        /// What was actually found.
        found: String,
    },

    /// The payload carries a field the schema does not declare (strict mode).
    #[error("unexpected field '{field}' at '{path}'")]
    UnexpectedField {
        /// Path of the node holding the field.
        path: String,
        /// Wire name of the unexpected field.
        field: String,
    },

    /// An entity names a type that the registry does not know.
    #[error("unknown entity type '{type_name}'")]
    UnknownType {
        /// The type name carried by the entity.
        type_name: String,
    },
}

/// Error during canonical serialization.
#[derive(Error, Debug)]
pub enum CanonicalizationError {
    /// JSON serialization failed.
    #[error("serialization failed: {0}")]
    SerializationFailed(#[from] serde_json::Error),
}
