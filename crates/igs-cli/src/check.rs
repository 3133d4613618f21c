//! # Check Subcommand
//!
//! Loads and links every configured module and prints what was found.
//! Any load-time error fails the command.

use std::io::Write;

use clap::Args;
use serde::Serialize;

use igs_schema::SchemaRegistry;

/// Arguments for the check subcommand.
#[derive(Args, Debug, Default)]
pub struct CheckArgs {
    /// Emit the summary as JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
struct Summary<'a> {
    modules: Vec<&'a str>,
    types: Vec<TypeSummary<'a>>,
    enums: Vec<&'a str>,
    elements: Vec<&'a str>,
}

#[derive(Serialize)]
struct TypeSummary<'a> {
    name: &'a str,
    module: &'a str,
    redeclared_in: &'a [String],
    fingerprint: String,
}

/// Run the check subcommand against a built registry.
pub fn run(args: &CheckArgs, registry: &SchemaRegistry, out: &mut impl Write) -> anyhow::Result<()> {
    let mut types = Vec::new();
    for name in registry.type_names() {
        let info = registry.lookup(name)?;
        types.push(TypeSummary {
            name,
            module: &info.module,
            redeclared_in: &info.redeclared_in,
            fingerprint: info.fingerprint.to_string(),
        });
    }
    let summary = Summary {
        modules: registry.module_names(),
        types,
        enums: registry.enums().names(),
        elements: registry.element_names(),
    };

    if args.json {
        serde_json::to_writer_pretty(&mut *out, &summary)?;
        writeln!(out)?;
        return Ok(());
    }

    writeln!(out, "modules:  {}", summary.modules.join(", "))?;
    writeln!(out, "enums:    {}", summary.enums.join(", "))?;
    writeln!(out, "elements: {}", summary.elements.join(", "))?;
    writeln!(out, "types:")?;
    for t in &summary.types {
        if t.redeclared_in.is_empty() {
            writeln!(out, "  {:<14} {}", t.name, t.module)?;
        } else {
            writeln!(
                out,
                "  {:<14} {} (also {})",
                t.name,
                t.module,
                t.redeclared_in.join(", ")
            )?;
        }
    }
    Ok(())
}
