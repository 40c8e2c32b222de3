// Command-line front end: argument parsing and the balance/check commands.

use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::{info, warn};

use teamsplit_core::{BalanceReport, Balancer, PartitionConfig};

use crate::config::{self, Config};
use crate::roster::{self, Roster};

#[derive(Debug, Clone, Parser)]
#[command(author, version, about = "Split rated players into balanced teams", long_about = None)]
pub struct CommandArgs {
    /// Path to a teamsplit.toml (defaults to config/teamsplit.toml if present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log search progress at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub mode: Mode,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Mode {
    /// Balance a roster into teams and print the result
    Balance(BalanceArg),
    /// Validate a roster without balancing it
    Check(CheckArg),
}

/// Where the roster comes from. Exactly one source is required.
#[derive(Debug, Clone, Args)]
#[group(required = true, multiple = false)]
pub struct RosterSource {
    /// CSV file with a `name,overall,position` header
    #[arg(long)]
    pub csv: Option<PathBuf>,

    /// JSON request: {players: [...], num_teams, time_limit, num_attempts}
    #[arg(long)]
    pub json: Option<PathBuf>,
}

#[derive(Debug, Clone, Args)]
pub struct BalanceArg {
    #[command(flatten)]
    pub source: RosterSource,

    /// Number of teams
    #[arg(long)]
    pub teams: Option<usize>,

    /// Search budget in seconds
    #[arg(long)]
    pub time_limit: Option<f64>,

    /// Number of independent search attempts
    #[arg(long)]
    pub attempts: Option<usize>,

    /// RNG seed for a reproducible run
    #[arg(long)]
    pub seed: Option<u64>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(Debug, Clone, Args)]
pub struct CheckArg {
    #[command(flatten)]
    pub source: RosterSource,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Budget values given on the command line. They win over the request body,
/// which wins over the config file.
#[derive(Debug, Clone, Copy, Default)]
pub struct BudgetOverrides {
    pub num_teams: Option<usize>,
    pub time_limit: Option<f64>,
    pub num_attempts: Option<usize>,
    pub seed: Option<u64>,
}

impl From<&BalanceArg> for BudgetOverrides {
    fn from(arg: &BalanceArg) -> Self {
        BudgetOverrides {
            num_teams: arg.teams,
            time_limit: arg.time_limit,
            num_attempts: arg.attempts,
            seed: arg.seed,
        }
    }
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

pub fn run(args: &CommandArgs) -> anyhow::Result<()> {
    let cwd = std::env::current_dir().context("failed to resolve working directory")?;
    let config = config::load_config(args.config.as_deref(), &cwd)
        .context("failed to load configuration")?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    match &args.mode {
        Mode::Balance(arg) => run_balance(&config, arg, &mut out),
        Mode::Check(arg) => run_check(&config, arg, &mut out),
    }
}

fn run_balance(config: &Config, arg: &BalanceArg, out: &mut impl Write) -> anyhow::Result<()> {
    let roster = load_roster(&arg.source, config)?;
    let report = balance_roster(config, &roster, &BudgetOverrides::from(arg))?;

    match arg.format {
        OutputFormat::Text => out.write_all(report.render_text().as_bytes())?,
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, &report)?;
            writeln!(out)?;
        }
    }
    Ok(())
}

fn run_check(config: &Config, arg: &CheckArg, out: &mut impl Write) -> anyhow::Result<()> {
    let roster = load_roster(&arg.source, config)?;
    writeln!(out, "Total players: {}", roster.players.len())?;
    for (pos, n) in roster.position_counts() {
        writeln!(out, "{pos}: {n}")?;
    }
    Ok(())
}

/// Load the roster named by the source flags, validating every player
/// against the configured rating bounds.
pub fn load_roster(source: &RosterSource, config: &Config) -> anyhow::Result<Roster> {
    let bounds = &config.ratings;
    let (path, roster) = match (&source.csv, &source.json) {
        (Some(path), _) => (path, roster::load_players_csv_file(path, bounds)),
        (None, Some(path)) => (path, roster::load_request_json_file(path, bounds)),
        (None, None) => anyhow::bail!("either --csv or --json is required"),
    };
    let roster = roster.with_context(|| format!("failed to load roster from {}", path.display()))?;
    info!(players = roster.players.len(), "roster loaded");
    Ok(roster)
}

/// Resolve the budget, run the search, and build the report.
pub fn balance_roster(
    config: &Config,
    roster: &Roster,
    overrides: &BudgetOverrides,
) -> anyhow::Result<BalanceReport> {
    let partition_config = PartitionConfig::new(
        overrides
            .num_teams
            .or(roster.num_teams)
            .unwrap_or(config.search.num_teams),
        overrides
            .time_limit
            .or(roster.time_limit)
            .unwrap_or(config.search.time_limit),
        overrides
            .num_attempts
            .or(roster.num_attempts)
            .unwrap_or(config.search.num_attempts),
    )
    .context("invalid balancing parameters")?;

    let mut options = config.search_options();
    if overrides.seed.is_some() {
        options.seed = overrides.seed;
    }

    let balancer = Balancer::new(config.scoring, options);
    let outcome = balancer
        .balance(&roster.players, &partition_config)
        .context("balancing failed")?;

    if !outcome.warnings.is_empty() {
        warn!(count = outcome.warnings.len(), "balance finished with warnings");
    }
    Ok(BalanceReport::from_outcome(&outcome))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
