//! Summary command handler

use crate::commands::{SummaryArgs, SummaryFormat};
use crate::config::CliConfig;
use crate::error::CliResult;
use console::style;
use flowcov::coverage::format_ratio;
use flowcov::CoverageReport;
use serde::Serialize;
use std::fmt::Write as _;

/// Percentages of one report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportSummary {
    /// Class or suite name
    pub name: String,
    /// Ratio over every process model
    pub coverage: Option<f64>,
    /// Process models
    pub processes: Vec<DefinitionSummary>,
    /// Decision models
    pub decisions: Vec<DefinitionSummary>,
}

/// Percentages of one process or decision model
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DefinitionSummary {
    /// Process definition key or decision key
    pub key: String,
    /// Resource the definition was deployed from
    pub resource_name: String,
    /// Union over every class and method
    pub coverage: Option<f64>,
    /// Per-method ratios, class by class
    pub methods: Vec<MethodSummary>,
}

/// Ratio of one test method
#[derive(Debug, Clone, PartialEq, Serialize)]
#[allow(missing_docs)]
pub struct MethodSummary {
    pub class: String,
    pub name: String,
    pub coverage: Option<f64>,
}

impl From<&CoverageReport> for ReportSummary {
    fn from(report: &CoverageReport) -> Self {
        let processes = report
            .process_models
            .iter()
            .map(|model| DefinitionSummary {
                key: model.process_definition_key.clone(),
                resource_name: model.resource_name.clone(),
                coverage: model.coverage,
                methods: model
                    .test_classes
                    .iter()
                    .flat_map(|class| {
                        class.test_methods.iter().map(|method| MethodSummary {
                            class: class.name.clone(),
                            name: method.name.clone(),
                            coverage: method.coverage,
                        })
                    })
                    .collect(),
            })
            .collect();
        let decisions = report
            .decision_models
            .iter()
            .map(|model| DefinitionSummary {
                key: model.decision_key.clone(),
                resource_name: model.resource_name.clone(),
                coverage: model.coverage,
                methods: model
                    .test_classes
                    .iter()
                    .flat_map(|class| {
                        class.test_methods.iter().map(|method| MethodSummary {
                            class: class.name.clone(),
                            name: method.name.clone(),
                            coverage: method.coverage,
                        })
                    })
                    .collect(),
            })
            .collect();
        Self {
            name: report.name.clone(),
            coverage: report.coverage,
            processes,
            decisions,
        }
    }
}

fn styled_ratio(ratio: Option<f64>) -> String {
    match ratio {
        None => style(format_ratio(f64::NAN)).dim().to_string(),
        Some(value) if value >= 1.0 => style(format_ratio(value)).green().to_string(),
        Some(value) => style(format_ratio(value)).yellow().to_string(),
    }
}

fn write_definitions(out: &mut String, heading: &str, definitions: &[DefinitionSummary], detailed: bool) {
    if definitions.is_empty() {
        return;
    }
    let _ = writeln!(out, "{}", style(heading).bold());
    for definition in definitions {
        let _ = writeln!(
            out,
            "  {} ({}): {}",
            definition.key,
            definition.resource_name,
            styled_ratio(definition.coverage)
        );
        if detailed {
            for method in &definition.methods {
                let _ = writeln!(
                    out,
                    "    {}::{}: {}",
                    method.class,
                    method.name,
                    styled_ratio(method.coverage)
                );
            }
        }
    }
}

/// Render a summary as text; `detailed` adds one line per test method
#[must_use]
pub fn render_text(summary: &ReportSummary, detailed: bool) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} {}: {}",
        style("Coverage").bold(),
        summary.name,
        styled_ratio(summary.coverage)
    );
    write_definitions(&mut out, "Process models", &summary.processes, detailed);
    write_definitions(&mut out, "Decision models", &summary.decisions, detailed);
    out
}

/// Execute the summary command
pub fn execute_summary(config: &CliConfig, args: &SummaryArgs) -> CliResult<()> {
    let report = CoverageReport::load(&args.report)?;
    let summary = ReportSummary::from(&report);
    match args.format {
        SummaryFormat::Text => print!("{}", render_text(&summary, config.verbosity.is_verbose())),
        SummaryFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
    }
    Ok(())
}
