//! FlowCov CLI Library
//!
//! Command-line interface for replaying recorded test traces into FlowCov
//! reports, summarising reports and gating on minimum coverage.

#![warn(missing_docs)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

mod commands;
mod config;
mod error;
pub mod handlers;

pub use commands::{CheckArgs, Cli, ColorArg, Commands, ReplayArgs, SummaryArgs, SummaryFormat};
pub use config::{CliConfig, ColorChoice, Verbosity};
pub use error::{CliError, CliResult};
