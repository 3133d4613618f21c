//! Integration tests for atomic registry replacement.

use std::sync::Arc;
use std::thread;

use igs_core::SchemaError;
use igs_schema::{
    builtin_modules, builtin_registry, ModuleLoader, RegistryHandle, SchemaRegistry,
};

fn extra_module() -> igs_schema::ModuleDescriptor {
    ModuleLoader::new()
        .unwrap()
        .parse_yaml(
            "group.yaml",
            r#"
name: group
typeInfos:
  - localName: Group
    baseTypeInfo: core.Entity
    propertyInfos:
      - name: owner
        type: attribute
        typeInfo: Token
elementInfos:
  - elementName: group
    typeInfo: .Group
"#,
        )
        .unwrap()
}

#[test]
fn test_reload_swaps_in_new_registry() {
    let handle = RegistryHandle::new(builtin_registry().unwrap());
    let before = handle.snapshot();
    assert!(before.resolve("Group").is_err());

    let loader = ModuleLoader::new().unwrap();
    let mut modules = builtin_modules(&loader).unwrap();
    modules.push(extra_module());
    let after = handle.reload(modules).unwrap();

    assert_eq!(handle.generation(), 1);
    assert_eq!(
        after.resolve("Group").unwrap().property_names(),
        vec!["id", "attributes", "owner"]
    );
    // The old snapshot is untouched.
    assert!(before.resolve("Group").is_err());
    assert!(!Arc::ptr_eq(&before, &handle.snapshot()));
}

#[test]
fn test_failed_reload_keeps_current_registry() {
    let handle = RegistryHandle::new(builtin_registry().unwrap());
    let before = handle.snapshot();

    let loader = ModuleLoader::new().unwrap();
    let identity_only: Vec<_> = builtin_modules(&loader)
        .unwrap()
        .into_iter()
        .filter(|m| m.name == "identity")
        .collect();
    let err = handle.reload(identity_only).unwrap_err();

    assert!(matches!(err, SchemaError::UnknownType { .. }));
    assert_eq!(handle.generation(), 0);
    assert!(Arc::ptr_eq(&before, &handle.snapshot()));
}

#[test]
fn test_readers_see_a_consistent_snapshot_during_swap() {
    let handle = RegistryHandle::new(builtin_registry().unwrap());

    thread::scope(|s| {
        for _ in 0..4 {
            s.spawn(|| {
                for _ in 0..50 {
                    let snapshot = handle.snapshot();
                    let account = snapshot.resolve("Account").unwrap();
                    assert_eq!(account.property_names().len(), 4);
                    assert_eq!(snapshot.type_count(), snapshot.type_names().len());
                }
            });
        }
        s.spawn(|| {
            for _ in 0..5 {
                let previous = handle.swap(builtin_registry().unwrap());
                assert!(previous.resolve("Account").is_ok());
            }
        });
    });

    assert_eq!(handle.generation(), 5);
}

#[test]
fn test_empty_swap_replaces_everything() {
    let handle = RegistryHandle::new(builtin_registry().unwrap());
    handle.swap(SchemaRegistry::from_modules(Vec::new()).unwrap());
    assert_eq!(handle.snapshot().type_count(), 0);
}
