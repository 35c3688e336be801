use std::io;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use ustats_cli::commands::{import, query, record, status, util};
use ustats_cli::{Cli, Commands, Config};

fn load_config(config_path: Option<&Path>) -> Result<Config> {
    let config = Config::load_from(config_path).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");
    Ok(config)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Logs go to stderr so stdout stays parseable with --json
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    match &cli.command {
        Some(Commands::Record { at, event }) => {
            let config = load_config(cli.config.as_deref())?;
            let now = Local::now();
            let timestamp = match at {
                Some(at) => util::parse_timestamp(at, now)?,
                None => now,
            };
            let event = record::build_event(event, timestamp);
            record::run(&mut io::stdout().lock(), &config, &event)?;
        }
        Some(Commands::Import) => {
            let config = load_config(cli.config.as_deref())?;
            let summary = import::run(io::stdin().lock(), &config)?;
            eprintln!(
                "{} imported, {} rejected",
                summary.imported, summary.rejected
            );
        }
        Some(Commands::Query {
            kind,
            start,
            end,
            json,
        }) => {
            let config = load_config(cli.config.as_deref())?;
            let today = Local::now().date_naive();
            let start = match start {
                Some(s) => util::parse_day(s, today)?,
                None => today,
            };
            let end = match end {
                Some(s) => util::parse_day(s, today)?,
                None => today,
            };
            query::run(&mut io::stdout().lock(), &config, *kind, start, end, *json)?;
        }
        Some(Commands::Status) => {
            let config = load_config(cli.config.as_deref())?;
            status::run(&mut io::stdout().lock(), &config)?;
        }
        None => {
            // No subcommand, show help
            use clap::CommandFactory;
            Cli::command().print_help()?;
            println!();
        }
    }

    Ok(())
}
