//! Property tests: for any entity conforming to a resolved type,
//! `unmarshal(marshal(e))` returns `e` field-for-field, including through
//! the JSON payload codec.

use proptest::prelude::*;

use igs_schema::{builtin_registry, Binder, Entity, Payload, SchemaRegistry, Validator};

fn token() -> impl Strategy<Value = String> {
    "[A-Za-z][A-Za-z0-9_-]{0,10}"
}

fn attribute() -> impl Strategy<Value = Entity> {
    (
        token(),
        proptest::option::of(prop::sample::select(vec!["none", "base16", "base64"])),
        proptest::option::of(prop::collection::vec("\\PC{0,12}", 0..3)),
    )
        .prop_map(|(name, encode, values)| {
            let mut e = Entity::new("Attribute").with("name", name);
            if let Some(encode) = encode {
                e.set("encode", encode);
            }
            if let Some(values) = values {
                e.set("values", values);
            }
            e
        })
}

fn attributes() -> impl Strategy<Value = Option<Vec<Entity>>> {
    proptest::option::of(prop::collection::vec(attribute(), 0..3))
}

fn entitlement() -> impl Strategy<Value = Entity> {
    (
        token(),
        attributes(),
        proptest::option::of(prop::sample::select(vec!["low", "medium", "high"])),
        proptest::option::of(prop::sample::select(vec!["assign", "revoke", "modify"])),
    )
        .prop_map(|(id, attrs, risk, action)| {
            let mut e = Entity::new("Entitlement").with("id", id);
            if let Some(attrs) = attrs {
                e.set("attributes", attrs);
            }
            if let Some(risk) = risk {
                e.set("risk", risk);
            }
            if let Some(action) = action {
                e.set("action", action);
            }
            e
        })
}

fn account() -> impl Strategy<Value = Entity> {
    (
        token(),
        attributes(),
        proptest::option::of(prop::collection::vec(entitlement(), 0..3)),
        prop::sample::select(vec!["create", "delete", "modify", "enable", "disable"]),
    )
        .prop_map(|(id, attrs, entitlements, action)| {
            let mut e = Entity::new("Account").with("id", id).with("action", action);
            if let Some(attrs) = attrs {
                e.set("attributes", attrs);
            }
            if let Some(entitlements) = entitlements {
                e.set("entitlements", entitlements);
            }
            e
        })
}

fn publication() -> impl Strategy<Value = Entity> {
    (
        token(),
        proptest::option::of(any::<bool>()),
        proptest::option::of(prop::sample::select(vec!["assign", "revoke"])),
    )
        .prop_map(|(scope, hierarchy, action)| {
            let mut e = Entity::new("Publication").with("scope", scope);
            if let Some(hierarchy) = hierarchy {
                e.set("hierarchy", hierarchy);
            }
            if let Some(action) = action {
                e.set("action", action);
            }
            e
        })
}

fn registry() -> SchemaRegistry {
    builtin_registry().expect("bundled registry builds")
}

proptest! {
    #[test]
    fn account_round_trips(e in account()) {
        let reg = registry();
        let account = reg.resolve("Account").unwrap();
        prop_assert!(Validator::new(&reg).validate(&e, &account).is_empty());

        let binder = Binder::new(&reg).strict(true);
        let payload = binder.marshal(&e, &account).unwrap();
        prop_assert_eq!(binder.unmarshal(&payload, &account).unwrap(), e);
    }

    #[test]
    fn account_round_trips_through_json(e in account()) {
        let reg = registry();
        let account = reg.resolve("Account").unwrap();
        let binder = Binder::new(&reg);

        let json = binder.marshal(&e, &account).unwrap().to_json();
        let text = serde_json::to_string(&json).unwrap();
        let decoded = Payload::from_json(&serde_json::from_str(&text).unwrap()).unwrap();
        prop_assert_eq!(binder.unmarshal(&decoded, &account).unwrap(), e);
    }

    #[test]
    fn publication_round_trips(e in publication()) {
        let reg = registry();
        let publication = reg.resolve("Publication").unwrap();
        let binder = Binder::new(&reg);
        let bound = binder.bind(&binder.marshal(&e, &publication).unwrap(), &publication).unwrap();
        prop_assert!(bound.is_valid());
        prop_assert_eq!(bound.entity, e);
    }
}
