//! FlowCov CLI: process graph coverage from the command line
//!
//! ## Usage
//!
//! ```bash
//! flowcov replay --models models.yaml --trace trace.yaml   # Write a class report
//! flowcov summary target/flowcov/OrderTest/flowCovReport.json
//! flowcov check target/flowcov/OrderTest/flowCovReport.json --min 0.8
//! ```

use clap::Parser;
use flowcov_cli::handlers::{execute_check, execute_replay, execute_summary};
use flowcov_cli::{Cli, CliConfig, CliResult, ColorChoice, Commands, Verbosity};
use std::process::ExitCode;

/// Exit code when a report is below its minimum coverage
const BELOW_MINIMUM: u8 = 2;

fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = build_config(&cli);
    init_tracing(config.verbosity);
    config.apply_color();

    match run(&config, &cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            if e.is_below_minimum() {
                ExitCode::from(BELOW_MINIMUM)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}

fn run(config: &CliConfig, command: &Commands) -> CliResult<()> {
    match command {
        Commands::Replay(args) => execute_replay(config, args),
        Commands::Summary(args) => execute_summary(config, args),
        Commands::Check(args) => execute_check(config, args),
    }
}

fn build_config(cli: &Cli) -> CliConfig {
    let verbosity = Verbosity::from_flags(cli.quiet, cli.verbose);
    let color: ColorChoice = cli.color.clone().into();
    CliConfig::new().with_verbosity(verbosity).with_color(color)
}

/// `RUST_LOG` wins over the verbosity flags
fn init_tracing(verbosity: Verbosity) {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(verbosity.log_filter())),
        )
        .init();
}
