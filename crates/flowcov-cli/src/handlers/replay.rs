//! Replay command handler
//!
//! A trace records what one test class observed: for every test method the
//! resources it deployed and the engine events in the order they happened.
//!
//! ```yaml
//! class: OrderTest
//! methods:
//!   - name: ships_order
//!     resources: [order.bpmn]
//!     events:
//!       - { event: entered, process: order, node: Start, instance: s1 }
//!       - { event: taken, process: order, flow: Start->Pay }
//!       - { event: exited, process: order, node: Start, instance: s1 }
//!       - { event: rules, decision: dish, rules: [r1] }
//! ```

use super::summary::{render_text, ReportSummary};
use crate::commands::ReplayArgs;
use crate::config::CliConfig;
use crate::error::{CliError, CliResult};
use flowcov::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;

/// Recorded observations of one test class
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Trace {
    /// Test class name
    pub class: String,
    /// Test methods in execution order
    pub methods: Vec<MethodTrace>,
}

/// Recorded observations of one test method
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MethodTrace {
    /// Test method name
    pub name: String,
    /// Deployment id, defaults to the method name
    #[serde(default)]
    pub deployment: Option<String>,
    /// Resources deployed before the method ran
    pub resources: Vec<String>,
    /// Engine events
    #[serde(default)]
    pub events: Vec<TraceEvent>,
}

/// One engine event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TraceEvent {
    /// A flow node was entered
    Entered {
        /// Process definition key
        process: String,
        /// Flow node id
        node: String,
        /// Runtime instance id
        instance: String,
        /// Element type such as `serviceTask`
        #[serde(default, rename = "type")]
        element_type: Option<String>,
    },
    /// A sequence flow was taken
    Taken {
        /// Process definition key
        process: String,
        /// Sequence flow id
        flow: String,
    },
    /// A flow node finished
    Exited {
        /// Process definition key
        process: String,
        /// Flow node id
        node: String,
        /// Runtime instance id of the matching entry
        instance: String,
    },
    /// A decision evaluation matched rules
    Rules {
        /// Decision key
        decision: String,
        /// Matched rule ids
        rules: Vec<String>,
        /// Decision requirements graph key
        #[serde(default)]
        requirements: Option<String>,
    },
}

impl Trace {
    /// Parse a YAML trace
    pub fn from_yaml_str(text: &str) -> CliResult<Self> {
        Ok(serde_yaml_ng::from_str(text)?)
    }

    /// Load a YAML trace file
    pub fn load(path: impl AsRef<Path>) -> CliResult<Self> {
        Self::from_yaml_str(&std::fs::read_to_string(path)?)
    }
}

fn apply_event(sink: &mut dyn CoverageSink, event: &TraceEvent) -> FlowcovResult<()> {
    match event {
        TraceEvent::Entered {
            process,
            node,
            instance,
            element_type,
        } => {
            let mut covered = CoveredFlowNode::new(process.as_str(), node.as_str(), instance.as_str());
            if let Some(element_type) = element_type {
                covered = covered.with_type(element_type.as_str());
            }
            sink.notify_entered(covered.into())
        }
        TraceEvent::Taken { process, flow } => {
            sink.notify_entered(CoveredSequenceFlow::new(process.as_str(), flow.as_str()).into())
        }
        TraceEvent::Exited {
            process,
            node,
            instance,
        } => sink.notify_exited(CoveredFlowNode::new(process.as_str(), node.as_str(), instance.as_str())),
        TraceEvent::Rules {
            decision,
            rules,
            requirements,
        } => {
            let covered = rules
                .iter()
                .map(|rule| {
                    let covered = CoveredDecisionRule::new(decision.as_str(), rule.as_str());
                    match requirements {
                        Some(key) => covered.with_requirements_key(key.as_str()),
                        None => covered,
                    }
                })
                .collect();
            sink.notify_rules_evaluated(covered)
        }
    }
}

/// Feed a trace through a fresh class run state
///
/// Every method deploys its resources, becomes the current method and then
/// receives its events in order.
pub fn replay_trace(
    trace: &Trace,
    models: &ModelSnapshotProvider,
    config: &CoverageConfig,
) -> CliResult<ClassRunState> {
    let provider = CachingSnapshotProvider::new(models);
    let mut state = ClassRunState::new(trace.class.as_str(), config);
    let mut seen = BTreeSet::new();

    for method in &trace.methods {
        if !seen.insert(method.name.as_str()) {
            return Err(CliError::replay(format!(
                "method '{}' appears twice in class {}",
                method.name, trace.class
            )));
        }
        let deployment_id = method.deployment.as_deref().unwrap_or(&method.name);
        let deployment = models.deployment(deployment_id, &method.resources)?;
        state.deploy(&method.name, &deployment, &provider)?;
        state.set_current_method(&method.name)?;
        for event in &method.events {
            apply_event(&mut state, event)?;
        }
        tracing::debug!(method = %method.name, events = method.events.len(), "replayed method");
    }
    tracing::debug!(
        class = %trace.class,
        snapshots = provider.cached(),
        "replayed class"
    );
    Ok(state)
}

/// Execute the replay command
pub fn execute_replay(config: &CliConfig, args: &ReplayArgs) -> CliResult<()> {
    let models = ModelSnapshotProvider::load(&args.models)?;
    let trace = Trace::load(&args.trace)?;
    let mut coverage_config = match &args.config {
        Some(path) => CoverageConfig::load(path)?,
        None => CoverageConfig::default(),
    };
    if let Some(out) = &args.out {
        coverage_config.report_dir.clone_from(out);
    }

    let state = replay_trace(&trace, &models, &coverage_config)?;
    let report = state.finish(&coverage_config)?;

    if !config.verbosity.is_quiet() {
        println!(
            "Report written to {}",
            coverage_config.class_report_path(&trace.class).display()
        );
        print!("{}", render_text(&ReportSummary::from(&report), config.verbosity.is_verbose()));
    }
    Ok(())
}
