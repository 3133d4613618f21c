//! # Resolve Subcommand
//!
//! Prints the closed property list of a type, in resolution order.

use std::io::Write;

use clap::Args;
use serde::Serialize;

use igs_schema::{ResolvedType, SchemaRegistry};

/// Arguments for the resolve subcommand.
#[derive(Args, Debug, Default)]
pub struct ResolveArgs {
    /// Type name (`Account` or `account.Account`).
    #[arg(required_unless_present = "element")]
    pub type_name: Option<String>,

    /// Resolve the type bound to a top-level element instead.
    #[arg(long, conflicts_with = "type_name")]
    pub element: Option<String>,

    /// Emit the closed type as JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
struct PropertyRow<'a> {
    name: &'a str,
    kind: String,
    wire_name: String,
    value: String,
    collection: bool,
    required: bool,
    declared_by: &'a str,
}

fn rows(resolved: &ResolvedType) -> Vec<PropertyRow<'_>> {
    resolved
        .properties
        .iter()
        .map(|p| PropertyRow {
            name: &p.name,
            kind: p.kind.to_string(),
            wire_name: p.wire_name.to_string(),
            value: p.value_kind.describe(),
            collection: p.collection,
            required: p.is_required(),
            declared_by: &p.declared_by,
        })
        .collect()
}

/// Run the resolve subcommand against a built registry.
pub fn run(args: &ResolveArgs, registry: &SchemaRegistry, out: &mut impl Write) -> anyhow::Result<()> {
    let resolved = match (&args.element, &args.type_name) {
        (Some(element), _) => registry.resolve_element(element)?,
        (None, Some(name)) => registry.resolve(name)?,
        (None, None) => anyhow::bail!("a type name or --element is required"),
    };
    let rows = rows(&resolved);

    if args.json {
        let doc = serde_json::json!({
            "type": resolved.local_name,
            "lineage": resolved.lineage,
            "properties": rows,
        });
        serde_json::to_writer_pretty(&mut *out, &doc)?;
        writeln!(out)?;
        return Ok(());
    }

    writeln!(out, "{} ({})", resolved.local_name, resolved.lineage.join(" <- "))?;
    for r in &rows {
        let multiplicity = match (r.collection, r.required) {
            (true, _) => "[*]",
            (false, true) => "[1]",
            (false, false) => "[?]",
        };
        writeln!(
            out,
            "  {:<14} {:<9} {:<4} {:<32} {}  (from {})",
            r.name, r.kind, multiplicity, r.wire_name, r.value, r.declared_by
        )?;
    }
    Ok(())
}
