//! Check command handler

use crate::commands::CheckArgs;
use crate::config::CliConfig;
use crate::error::{CliError, CliResult};
use console::style;
use flowcov::coverage::format_ratio;
use flowcov::{CoverageReport, FlowcovError, MinimumCoverage};

/// Scope label and ratio measured for `definition`, or for the whole report
///
/// Missing ratios come back as NaN so that no minimum is met by them.
pub fn measured_coverage(report: &CoverageReport, definition: Option<&str>) -> CliResult<(String, f64)> {
    let Some(key) = definition else {
        return Ok((
            format!("report {}", report.name),
            report.coverage.unwrap_or(f64::NAN),
        ));
    };
    if let Some(model) = report.process_model(key) {
        return Ok((
            format!("process definition {key}"),
            model.coverage.unwrap_or(f64::NAN),
        ));
    }
    if let Some(model) = report.decision_model(key) {
        return Ok((format!("decision {key}"), model.coverage.unwrap_or(f64::NAN)));
    }
    Err(FlowcovError::unknown_definition(key).into())
}

/// Execute the check command
pub fn execute_check(config: &CliConfig, args: &CheckArgs) -> CliResult<()> {
    let minimum = MinimumCoverage::new(args.min).map_err(|_| {
        CliError::invalid_argument(format!(
            "--min {} is not a ratio between 0.0 and 1.0",
            args.min
        ))
    })?;
    let report = CoverageReport::load(&args.report)?;
    let (scope, actual) = measured_coverage(&report, args.definition.as_deref())?;

    let outcome = minimum.check(scope.as_str(), actual);
    if !config.verbosity.is_quiet() {
        let verdict = if outcome.is_ok() {
            style("PASS").green().bold()
        } else {
            style("FAIL").red().bold()
        };
        println!(
            "{verdict} {scope}: {} (minimum {})",
            format_ratio(actual),
            format_ratio(minimum.ratio())
        );
    }
    outcome.map_err(CliError::from)
}
