use std::process::ExitCode;

use anyhow::{Context, Result};
use chrono::Local;
use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

use wt_cli::commands::{check, report, target, track};
use wt_cli::{Cli, Commands, Config};
use wt_core::LedgerError;

/// Load config and reject invalid target times before any command runs.
fn load_config(cli: &Cli) -> Result<Config> {
    let config = Config::load_from(cli.config.as_deref()).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");
    config.target_times().context("invalid configuration")?;
    Ok(config)
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Logs go to stderr, stdout carries command output
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    let Some(command) = &cli.command else {
        Cli::command().print_help()?;
        println!();
        return Ok(ExitCode::SUCCESS);
    };

    let config = load_config(&cli)?;
    let today = Local::now().date_naive();
    let mut stdout = std::io::stdout().lock();

    match command {
        Commands::Track(args) => match track::run(&mut stdout, args, &config, today) {
            Err(err) if err.downcast_ref::<LedgerError>().is_some() => {
                eprintln!("error: {err}");
                return Ok(ExitCode::FAILURE);
            }
            result => result?,
        },
        Commands::Target(args) => target::run(&mut stdout, args, &config)?,
        Commands::Report(args) => report::run(&mut stdout, args, &config)?,
        Commands::Check(args) => check::run(&mut stdout, args, &config, today)?,
    }

    Ok(ExitCode::SUCCESS)
}
