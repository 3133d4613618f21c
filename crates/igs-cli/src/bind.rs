//! # Bind Subcommand
//!
//! Reads a JSON payload, unmarshals it against a type and validates the
//! result. Prints the typed entity and any violations; fails when the
//! payload does not bind or the entity has violations.

use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;
use clap::Args;

use igs_schema::{Binder, Payload, SchemaRegistry};

/// Arguments for the bind subcommand.
#[derive(Args, Debug)]
pub struct BindArgs {
    /// JSON payload file.
    pub payload: PathBuf,

    /// Type to bind against (`Account` or `account.Account`).
    #[arg(long = "type", required_unless_present = "element")]
    pub type_name: Option<String>,

    /// Bind against the type of a top-level element.
    #[arg(long, conflicts_with = "type_name")]
    pub element: Option<String>,
}

/// Run the bind subcommand against a built registry.
pub fn run(
    args: &BindArgs,
    registry: &SchemaRegistry,
    binder: &Binder<'_>,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(&args.payload)
        .with_context(|| format!("reading {}", args.payload.display()))?;
    let json: serde_json::Value = serde_json::from_str(&text)
        .with_context(|| format!("parsing {}", args.payload.display()))?;
    bind_json(args, registry, binder, &json, out)
}

/// Bind an already parsed JSON payload.
pub fn bind_json(
    args: &BindArgs,
    registry: &SchemaRegistry,
    binder: &Binder<'_>,
    json: &serde_json::Value,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let bound = match (&args.element, &args.type_name) {
        (Some(element), _) => binder.bind_element_json(element, json)?,
        (None, Some(name)) => {
            let resolved = registry.resolve(name)?;
            binder.bind(&Payload::from_json(json)?, &resolved)?
        }
        (None, None) => anyhow::bail!("--type or --element is required"),
    };
    let type_name = &bound.entity.type_name;

    serde_json::to_writer_pretty(&mut *out, &bound.entity)?;
    writeln!(out)?;

    if bound.is_valid() {
        tracing::info!(type_name = %type_name, "payload is valid");
        return Ok(());
    }
    writeln!(out, "violations:")?;
    writeln!(out, "{}", bound.violations)?;
    anyhow::bail!(
        "{} violation(s) in {} payload",
        bound.violations.len(),
        type_name
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn args(type_name: &str) -> BindArgs {
        BindArgs {
            payload: PathBuf::from("-"),
            type_name: Some(type_name.into()),
            element: None,
        }
    }

    #[test]
    fn test_valid_account_binds() {
        let reg = igs_schema::builtin_registry().unwrap();
        let binder = Binder::new(&reg);
        let payload = json!({
            "@id": "acct-1",
            "@action": "create",
            "entitlement": [{"@id": "e1", "@risk": "high"}]
        });
        let mut out = Vec::new();
        bind_json(&args("Account"), &reg, &binder, &payload, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("\"type\": \"Entitlement\""));
    }

    #[test]
    fn test_violations_fail_the_command() {
        let reg = igs_schema::builtin_registry().unwrap();
        let binder = Binder::new(&reg);
        let mut out = Vec::new();
        let err = bind_json(&args("Account"), &reg, &binder, &json!({"@id": "a"}), &mut out)
            .unwrap_err();
        assert!(err.to_string().contains("1 violation(s)"));
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("missing required property 'action'"));
    }

    #[test]
    fn test_element_binding_uses_element_type() {
        let reg = igs_schema::builtin_registry().unwrap();
        let binder = Binder::new(&reg);
        let args = BindArgs {
            payload: PathBuf::from("-"),
            type_name: None,
            element: Some("organization".into()),
        };
        let mut out = Vec::new();
        bind_json(&args, &reg, &binder, &json!({"@id": "o1", "@status": "active"}), &mut out)
            .unwrap();
        assert!(String::from_utf8(out).unwrap().contains("\"type\": \"Organization\""));
    }

    #[test]
    fn test_strict_binder_rejects_unknown_keys() {
        let reg = igs_schema::builtin_registry().unwrap();
        let binder = Binder::new(&reg).strict(true);
        let payload = json!({"@scope": "s", "@colour": "red"});
        assert!(bind_json(&args("Publication"), &reg, &binder, &payload, &mut Vec::new()).is_err());
    }
}
