//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::commands::{check::CheckArgs, report::ReportArgs, target::TargetArgs, track::TrackArgs};

/// Work time tracker with overtime calculation.
///
/// Logs worked intervals, keeps a daily target per date and reports worked
/// time against those targets.
#[derive(Debug, Parser)]
#[command(name = "wtrack", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Log a worked interval.
    Track(TrackArgs),

    /// Show or set the target time of a date.
    Target(TargetArgs),

    /// Report worked time against targets.
    Report(ReportArgs),

    /// List days with a target but no logged work.
    Check(CheckArgs),
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn track_accepts_negative_correction() {
        let cli = Cli::try_parse_from([
            "wtrack", "track", "09:00", "17:30", "-c", "-0.5h", "desk work",
        ])
        .unwrap();
        let Some(Commands::Track(args)) = cli.command else {
            panic!("expected track command");
        };
        assert_eq!(args.correction, Some(chrono::Duration::minutes(-30)));
        assert_eq!(args.description.as_deref(), Some("desk work"));
    }

    #[test]
    fn report_parses_frequency_and_kind() {
        let cli = Cli::try_parse_from(["wtrack", "report", "--since", "2024-01-01", "w", "delta"])
            .unwrap();
        let Some(Commands::Report(args)) = cli.command else {
            panic!("expected report command");
        };
        assert_eq!(args.frequency, wt_core::Frequency::Week);
        assert_eq!(args.kind, wt_core::ReportKind::Delta);
        assert!(args.since.is_some());
    }

    #[test]
    fn report_rejects_unknown_frequency() {
        assert!(Cli::try_parse_from(["wtrack", "report", "q", "total"]).is_err());
    }

    #[test]
    fn no_subcommand_is_accepted() {
        let cli = Cli::try_parse_from(["wtrack"]).unwrap();
        assert!(cli.command.is_none());
    }
}
