//! # igs-schema: Identity Governance Schema Engine
//!
//! Loads declarative schema modules describing identity-governance domain
//! objects (Identity, Account, Entitlement, Role, Organization,
//! Publication, Attribute), resolves their inheritance, and binds wire
//! payloads to typed entities.
//!
//! ## Data Flow
//!
//! ```text
//! YAML/JSON ──▶ ModuleLoader ──▶ ModuleDescriptor
//!                                     │
//!                                     ▼
//!                  SchemaRegistryBuilder::load / build
//!                  (EnumCatalog, TypeResolver)
//!                                     │
//!                                     ▼
//!                  SchemaRegistry ──▶ ResolvedType
//!                                     │
//!                     ┌───────────────┴──────────────┐
//!                     ▼                              ▼
//!        Binder::marshal / unmarshal       Validator::validate
//! ```
//!
//! ## Errors
//!
//! Load-time problems ([`SchemaError`]) abort registry construction.
//! Binding problems ([`BindError`]) fail one entity. Validation problems
//! are returned as [`ValidationViolations`] and never fail.
//!
//! ## Crate Policy
//!
//! - Depends only on `igs-core` internally.
//! - The registry is immutable once built; reloads go through
//!   [`RegistryHandle`].
//! - Binding and validation perform no I/O.
//!
//! [`SchemaError`]: igs_core::SchemaError
//! [`BindError`]: igs_core::BindError

pub mod binder;
pub mod builtin;
pub mod config;
pub mod descriptor;
pub mod entity;
pub mod enums;
pub mod model;
pub mod payload;
pub mod registry;
pub mod resolver;
pub mod types;
pub mod validate;

pub use binder::{Binder, Bound};
pub use builtin::{builtin_modules, builtin_registry, BUILTIN_MODULES};
pub use config::SchemaConfig;
pub use descriptor::{ModuleLoader, MODULE_SCHEMA};
pub use entity::{Entity, Value};
pub use enums::{EnumCatalog, EnumInfo};
pub use model::ModuleDescriptor;
pub use payload::{Node, Payload};
pub use registry::{ModuleSummary, RegistryHandle, SchemaRegistry, SchemaRegistryBuilder};
pub use resolver::{ResolvedProperty, ResolvedType, TypeResolver, ValueKind};
pub use types::{PropertyInfo, PropertyKind, TypeInfo};
pub use validate::{ValidationViolations, Validator, Violation, ViolationKind};
