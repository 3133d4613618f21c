//! # Bundled Domain Modules
//!
//! The identity-governance modules shipped with the engine, embedded at
//! compile time from `modules/*.yaml`.
//!
//! | Module         | Declares                                         |
//! |----------------|--------------------------------------------------|
//! | `core`         | Risk, Encode, Attribute, Entity                  |
//! | `entity`       | Entity, Attribute, Encode, Risk                  |
//! | `entitlement`  | Entitlement                                      |
//! | `account`      | Account, Entitlement                             |
//! | `role`         | Role, MemberOf                                   |
//! | `identity`     | Identity                                         |
//! | `organization` | Organization                                     |
//! | `publication`  | Publication                                      |
//!
//! Every module redeclares the shared types it uses so it can be read on
//! its own; the registry deduplicates them.

use igs_core::SchemaError;

use crate::descriptor::ModuleLoader;
use crate::model::ModuleDescriptor;
use crate::registry::SchemaRegistry;

/// `(file name, YAML text)` for every bundled module, in load order.
pub const BUILTIN_MODULES: [(&str, &str); 8] = [
    ("core.yaml", include_str!("../../../modules/core.yaml")),
    ("entity.yaml", include_str!("../../../modules/entity.yaml")),
    ("entitlement.yaml", include_str!("../../../modules/entitlement.yaml")),
    ("account.yaml", include_str!("../../../modules/account.yaml")),
    ("role.yaml", include_str!("../../../modules/role.yaml")),
    ("identity.yaml", include_str!("../../../modules/identity.yaml")),
    ("organization.yaml", include_str!("../../../modules/organization.yaml")),
    ("publication.yaml", include_str!("../../../modules/publication.yaml")),
];

/// Parse and check every bundled module.
///
/// # Errors
///
/// Any descriptor error; a failure here means the bundled YAML is broken.
pub fn builtin_modules(loader: &ModuleLoader) -> Result<Vec<ModuleDescriptor>, SchemaError> {
    BUILTIN_MODULES
        .iter()
        .map(|(name, text)| loader.parse_yaml(name, text))
        .collect()
}

/// A registry holding exactly the bundled modules.
///
/// # Errors
///
/// Any load-time or link-time error in the bundled modules.
pub fn builtin_registry() -> Result<SchemaRegistry, SchemaError> {
    let loader = ModuleLoader::new()?;
    SchemaRegistry::from_modules(builtin_modules(&loader)?)
}
