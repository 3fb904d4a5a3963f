//! CLI command definitions using clap

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// FlowCov: process graph coverage for workflow tests
#[derive(Parser, Debug)]
#[command(name = "flowcov")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorArg,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Replay a recorded observation trace into a coverage report
    Replay(ReplayArgs),

    /// Print the coverage of a report
    Summary(SummaryArgs),

    /// Fail when a report is below a minimum coverage
    Check(CheckArgs),
}

/// Arguments for the replay command
#[derive(Parser, Debug)]
pub struct ReplayArgs {
    /// Process and decision models (YAML)
    #[arg(short, long)]
    pub models: PathBuf,

    /// Recorded trace of one test class (YAML)
    #[arg(short, long)]
    pub trace: PathBuf,

    /// Coverage configuration (YAML)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Report directory, overriding the configuration
    #[arg(short, long)]
    pub out: Option<PathBuf>,
}

/// Arguments for the summary command
#[derive(Parser, Debug)]
pub struct SummaryArgs {
    /// Report file written by `replay`
    pub report: PathBuf,

    /// Output format
    #[arg(short, long, default_value = "text")]
    pub format: SummaryFormat,
}

/// Arguments for the check command
#[derive(Parser, Debug)]
pub struct CheckArgs {
    /// Report file written by `replay`
    pub report: PathBuf,

    /// Minimum coverage ratio between 0.0 and 1.0
    #[arg(long)]
    pub min: f64,

    /// Check one process or decision definition instead of the whole report
    #[arg(short, long)]
    pub definition: Option<String>,
}

/// Summary output format
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SummaryFormat {
    /// Human-readable text
    #[default]
    Text,
    /// JSON document
    Json,
}

/// Color argument for CLI
#[derive(ValueEnum, Clone, Debug, Default)]
pub enum ColorArg {
    /// Automatic color detection
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

impl From<ColorArg> for crate::config::ColorChoice {
    fn from(arg: ColorArg) -> Self {
        match arg {
            ColorArg::Auto => Self::Auto,
            ColorArg::Always => Self::Always,
            ColorArg::Never => Self::Never,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_replay() {
        let cli = Cli::try_parse_from([
            "flowcov", "replay", "--models", "m.yaml", "--trace", "t.yaml", "--out", "target/x",
        ])
        .unwrap();
        match cli.command {
            Commands::Replay(args) => {
                assert_eq!(args.models, PathBuf::from("m.yaml"));
                assert_eq!(args.out, Some(PathBuf::from("target/x")));
                assert!(args.config.is_none());
            }
            other => panic!("expected replay, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_summary_format() {
        let cli = Cli::try_parse_from(["flowcov", "summary", "r.json", "--format", "json"]).unwrap();
        match cli.command {
            Commands::Summary(args) => assert_eq!(args.format, SummaryFormat::Json),
            other => panic!("expected summary, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_check_with_globals() {
        let cli = Cli::try_parse_from([
            "flowcov", "-vv", "--color", "never", "check", "r.json", "--min", "0.8", "-d", "order",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Check(args) => {
                assert!((args.min - 0.8).abs() < f64::EPSILON);
                assert_eq!(args.definition.as_deref(), Some("order"));
            }
            other => panic!("expected check, got {other:?}"),
        }
    }

    #[test]
    fn test_check_requires_min() {
        assert!(Cli::try_parse_from(["flowcov", "check", "r.json"]).is_err());
    }
}
