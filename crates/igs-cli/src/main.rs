//! # igs CLI Entry Point
//!
//! Assembles subcommands and dispatches to handler modules.

use clap::Parser;

use igs_cli::settings::GlobalArgs;

/// Identity governance schema engine.
///
/// Loads schema modules, prints closed types, and binds payload documents.
#[derive(Parser, Debug)]
#[command(name = "igs", version, about)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Load and link every configured module.
    Check(igs_cli::check::CheckArgs),
    /// Print the closed property list of a type.
    Resolve(igs_cli::resolve::ResolveArgs),
    /// Unmarshal and validate a JSON payload.
    Bind(igs_cli::bind::BindArgs),
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let (config, registry) = cli.global.registry()?;
    let mut stdout = std::io::stdout().lock();

    match &cli.command {
        Commands::Check(args) => igs_cli::check::run(args, &registry, &mut stdout),
        Commands::Resolve(args) => igs_cli::resolve::run(args, &registry, &mut stdout),
        Commands::Bind(args) => {
            let binder = config.binder(&registry);
            igs_cli::bind::run(args, &registry, &binder, &mut stdout)
        }
    }
}
