// teamsplit entry point.
//
// Startup sequence:
// 1. Parse arguments
// 2. Initialize tracing (stderr, so stdout carries only the report)
// 3. Load config, load roster, balance, print

use anyhow::Context;
use clap::Parser;
use tracing::info;

use teamsplit_cli::command::{self, CommandArgs};

fn main() -> anyhow::Result<()> {
    let args = CommandArgs::parse();
    init_tracing(args.verbose)?;
    info!("teamsplit starting");

    command::run(&args)
}

fn init_tracing(verbose: bool) -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let default_filter = if verbose {
        "teamsplit=debug,teamsplit_core=debug,teamsplit_cli=debug,warn"
    } else {
        "teamsplit=info,teamsplit_core=info,teamsplit_cli=info,warn"
    };

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
