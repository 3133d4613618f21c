//! # Global Options
//!
//! Flags shared by every subcommand and their merge with the optional
//! YAML configuration file.

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;

use igs_schema::{SchemaConfig, SchemaRegistry};

/// Options accepted before any subcommand.
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// YAML configuration file.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Additional module descriptor directory (repeatable).
    #[arg(long = "module-dir", global = true)]
    pub module_dirs: Vec<PathBuf>,

    /// Do not load the bundled modules.
    #[arg(long, global = true)]
    pub no_builtin: bool,

    /// Reject payload keys the schema does not declare.
    #[arg(long, global = true)]
    pub strict: bool,
}

impl GlobalArgs {
    /// The configuration file (or defaults) with flags applied on top.
    pub fn config(&self) -> anyhow::Result<SchemaConfig> {
        let mut config = match &self.config {
            Some(path) => SchemaConfig::from_path(path)
                .with_context(|| format!("loading configuration {}", path.display()))?,
            None => SchemaConfig::default(),
        };
        if self.no_builtin {
            config.include_builtin = false;
        }
        if self.strict {
            config.strict_unknown_fields = true;
        }
        config.module_dirs.extend(self.module_dirs.iter().cloned());
        Ok(config)
    }

    /// Build the registry described by [`GlobalArgs::config`].
    pub fn registry(&self) -> anyhow::Result<(SchemaConfig, SchemaRegistry)> {
        let config = self.config()?;
        let registry = config
            .build_registry()
            .context("building schema registry")?;
        Ok((config, registry))
    }
}
