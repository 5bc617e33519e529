use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::core::types::Domain;
use crate::io::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "impactmap")]
#[command(about = "Decision support and recommendation engine for project engagement portfolios", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Analyze a project facts file and print the full report
    Analyze {
        /// Path to the project facts JSON file
        facts: PathBuf,

        /// Project id (defaults to the one in the facts file)
        #[arg(long)]
        project: Option<String>,

        /// Reporting period to scope override loading
        #[arg(long)]
        period: Option<String>,

        /// Restrict effectiveness/responsiveness to one domain
        #[arg(long)]
        domain: Option<Domain>,

        /// Restrict effectiveness to one stakeholder group
        #[arg(long)]
        stakeholder_group: Option<String>,

        /// Start of the activity date range (YYYY-MM-DD)
        #[arg(long)]
        from: Option<NaiveDate>,

        /// End of the activity date range (YYYY-MM-DD)
        #[arg(long)]
        to: Option<NaiveDate>,

        /// Reference date for staleness checks (defaults to today)
        #[arg(long)]
        as_of: Option<NaiveDate>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "terminal")]
        format: OutputFormat,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Disable the parallel per-entity fan-out
        #[arg(long)]
        no_parallel: bool,

        /// Cap the worker threads used for the fan-out
        #[arg(long)]
        jobs: Option<usize>,

        /// Abort the analysis after this many milliseconds
        #[arg(long)]
        timeout_ms: Option<u64>,
    },

    /// Write a template .impactmap.toml to the current directory
    Init {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn analyze_parses_filters() {
        let cli = Cli::parse_from([
            "impactmap",
            "analyze",
            "facts.json",
            "--domain",
            "dissemination",
            "--from",
            "2026-01-01",
            "--format",
            "json",
        ]);
        match cli.command {
            Commands::Analyze {
                domain,
                from,
                format,
                ..
            } => {
                assert_eq!(domain, Some(Domain::Dissemination));
                assert_eq!(from, NaiveDate::from_ymd_opt(2026, 1, 1));
                assert_eq!(format, OutputFormat::Json);
            }
            _ => panic!("expected analyze"),
        }
    }
}
