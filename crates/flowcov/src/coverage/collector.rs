//! Coverage Collector
//!
//! The notification surface engine glue talks to. A [`ClassRunState`]
//! collects one test class; a [`SuiteRunState`] chains classes and
//! aggregates them at the end of the suite. Glue code receives either one as
//! `&mut dyn CoverageSink`.

use super::aggregated::AggregatedClassCoverage;
use super::class::ClassCoverage;
use super::config::CoverageConfig;
use super::element::{CoveredDecisionRule, CoveredElement, CoveredFlowNode};
use super::method::MethodCoverage;
use super::ratio::format_ratio;
use super::report::CoverageReport;
use super::snapshot::{DefinitionInfo, GraphSnapshot, SnapshotProvider};
use super::view::CoverageView;
use crate::result::{FlowcovError, FlowcovResult};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

/// Definitions installed for one test method
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deployment {
    /// Deployment id
    pub id: String,
    /// Deployed process definitions
    #[serde(default)]
    pub processes: Vec<DefinitionInfo>,
    /// Deployed decisions
    #[serde(default)]
    pub decisions: Vec<DefinitionInfo>,
}

/// A deployed definition together with its declared elements
#[derive(Debug, Clone)]
pub struct DeployedDefinition {
    pub definition: DefinitionInfo,
    pub snapshot: Arc<GraphSnapshot>,
}

/// A deployment whose snapshots have been fetched
#[derive(Debug, Clone, Default)]
pub struct ResolvedDeployment {
    pub id: String,
    pub processes: Vec<DeployedDefinition>,
    pub decisions: Vec<DeployedDefinition>,
}

impl Deployment {
    /// Fetch the snapshot of every definition, skipping excluded process keys
    pub fn resolve<P>(&self, provider: &P, excluded: &BTreeSet<String>) -> FlowcovResult<ResolvedDeployment>
    where
        P: SnapshotProvider + ?Sized,
    {
        let mut processes = Vec::with_capacity(self.processes.len());
        for definition in &self.processes {
            if excluded.contains(&definition.key) {
                tracing::debug!(definition = %definition, "skipping excluded process definition");
                continue;
            }
            processes.push(DeployedDefinition {
                snapshot: provider.process_snapshot(definition)?,
                definition: definition.clone(),
            });
        }
        let mut decisions = Vec::with_capacity(self.decisions.len());
        for definition in &self.decisions {
            decisions.push(DeployedDefinition {
                snapshot: provider.decision_snapshot(definition)?,
                definition: definition.clone(),
            });
        }
        Ok(ResolvedDeployment {
            id: self.id.clone(),
            processes,
            decisions,
        })
    }
}

/// Receiver of engine observations
pub trait CoverageSink {
    /// Register the definitions deployed for a method; call before its first observation
    fn register_method_deployment(&mut self, method: &str, deployment: ResolvedDeployment) -> FlowcovResult<()>;

    /// Route subsequent notifications to `method`
    fn set_current_method(&mut self, method: &str) -> FlowcovResult<()>;

    /// A flow node was entered or a sequence flow taken
    fn notify_entered(&mut self, element: CoveredElement) -> FlowcovResult<()>;

    /// A flow node finished; carries the instance id of the matching entry
    fn notify_exited(&mut self, node: CoveredFlowNode) -> FlowcovResult<()>;

    /// One decision evaluation matched these rules
    fn notify_rules_evaluated(&mut self, rules: Vec<CoveredDecisionRule>) -> FlowcovResult<()>;
}

/// Collects the coverage of one test class
#[derive(Debug)]
pub struct ClassRunState {
    coverage: ClassCoverage,
    current_method: Option<String>,
    excluded: BTreeSet<String>,
    /// Last ordinal handed out per method
    ordinals: HashMap<String, u64>,
}

impl ClassRunState {
    /// Start collecting a class
    #[must_use]
    pub fn new(class_name: impl Into<String>, config: &CoverageConfig) -> Self {
        Self {
            coverage: ClassCoverage::new(class_name),
            current_method: None,
            excluded: config.excluded_process_definition_keys.clone(),
            ordinals: HashMap::new(),
        }
    }

    /// Class name
    #[must_use]
    pub fn class_name(&self) -> &str {
        self.coverage.name()
    }

    /// Coverage collected so far
    #[must_use]
    pub const fn coverage(&self) -> &ClassCoverage {
        &self.coverage
    }

    /// Give up the collected coverage
    #[must_use]
    pub fn into_coverage(self) -> ClassCoverage {
        self.coverage
    }

    /// Method receiving notifications
    #[must_use]
    pub fn current_method(&self) -> Option<&str> {
        self.current_method.as_deref()
    }

    /// Resolve a deployment through `provider` and register it for `method`
    pub fn deploy<P>(&mut self, method: &str, deployment: &Deployment, provider: &P) -> FlowcovResult<()>
    where
        P: SnapshotProvider + ?Sized,
    {
        let resolved = deployment.resolve(provider, &self.excluded)?;
        self.register_method_deployment(method, resolved)
    }

    fn current(&self) -> FlowcovResult<String> {
        self.current_method.clone().ok_or(FlowcovError::NoCurrentMethod)
    }

    fn next_ordinal(&mut self, method: &str) -> u64 {
        let counter = self.ordinals.entry(method.to_string()).or_insert(0);
        *counter += 1;
        *counter
    }

    /// Check the deployments, log the outcome, write the report and apply the
    /// configured minimums
    ///
    /// The report is written before the minimums are checked, so a failing
    /// gate still leaves a report behind.
    pub fn finish(&self, config: &CoverageConfig) -> FlowcovResult<CoverageReport> {
        self.coverage.assert_all_deployments_equal()?;
        let class_ratio = self.coverage.coverage_percentage()?;
        tracing::info!(
            class = self.class_name(),
            methods = self.coverage.method_count(),
            coverage = %format_ratio(class_ratio),
            "class coverage"
        );
        if config.detailed_logging {
            self.log_details()?;
        }

        let report = CoverageReport::from_class(&self.coverage)?;
        report.write_to(&config.report_dir)?;

        self.check_minimums(config, class_ratio)?;
        Ok(report)
    }

    fn log_details(&self) -> FlowcovResult<()> {
        for method in self.coverage.test_methods() {
            tracing::info!(
                class = self.class_name(),
                method = method.name(),
                coverage = %format_ratio(method.coverage_percentage()?),
                "method coverage"
            );
        }
        for definition in self.coverage.process_definitions()? {
            tracing::info!(
                class = self.class_name(),
                definition = %definition,
                coverage = %format_ratio(self.coverage.coverage_percentage_of(&definition.key)?),
                "process definition coverage"
            );
        }
        for definition in self.coverage.decision_definitions()? {
            tracing::info!(
                class = self.class_name(),
                definition = %definition,
                coverage = %format_ratio(self.coverage.decision_coverage_percentage(&definition.key)?),
                "decision coverage"
            );
        }
        Ok(())
    }

    fn check_minimums(&self, config: &CoverageConfig, class_ratio: f64) -> FlowcovResult<()> {
        for (name, minimum) in &config.method_minimum_coverage {
            let Some(method) = self.coverage.test_method_coverage(name) else {
                tracing::debug!(method = %name, "no coverage for configured method minimum");
                continue;
            };
            minimum.check(
                format!("method '{name}' of {}", self.class_name()),
                method.coverage_percentage()?,
            )?;
        }
        if let Some(minimum) = config.class_minimum_coverage {
            minimum.check(format!("class {}", self.class_name()), class_ratio)?;
        }
        Ok(())
    }
}

impl CoverageSink for ClassRunState {
    fn register_method_deployment(&mut self, method: &str, deployment: ResolvedDeployment) -> FlowcovResult<()> {
        let mut coverage = MethodCoverage::new(deployment.id, method);
        for deployed in deployment.processes {
            if self.excluded.contains(&deployed.definition.key) {
                continue;
            }
            coverage.add_process_coverage(deployed.definition, deployed.snapshot);
        }
        for deployed in deployment.decisions {
            coverage.add_decision_coverage(deployed.definition, deployed.snapshot);
        }
        self.ordinals.remove(method);
        self.coverage.add_test_method_coverage(coverage);
        Ok(())
    }

    fn set_current_method(&mut self, method: &str) -> FlowcovResult<()> {
        if self.coverage.test_method_coverage(method).is_none() {
            return Err(FlowcovError::UnknownMethod {
                method: method.to_string(),
            });
        }
        tracing::debug!(class = self.class_name(), method, "current test method");
        self.current_method = Some(method.to_string());
        Ok(())
    }

    fn notify_entered(&mut self, mut element: CoveredElement) -> FlowcovResult<()> {
        let method = self.current()?;
        if self.excluded.contains(element.definition_key()) {
            tracing::debug!(element = %element, "dropping observation of excluded definition");
            return Ok(());
        }
        match &mut element {
            CoveredElement::FlowNode(node) if node.start_ordinal().is_none() => {
                node.stamp_start(self.next_ordinal(&method));
            }
            CoveredElement::SequenceFlow(flow) if flow.start_ordinal().is_none() => {
                flow.stamp_start(self.next_ordinal(&method));
            }
            _ => {}
        }
        tracing::debug!(method = %method, element = %element, "entered");
        self.coverage.add_covered_element(&method, element)
    }

    fn notify_exited(&mut self, mut node: CoveredFlowNode) -> FlowcovResult<()> {
        let method = self.current()?;
        if self.excluded.contains(node.definition_key()) {
            tracing::debug!(element_id = node.element_id(), "dropping exit of excluded definition");
            return Ok(());
        }
        if node.end_ordinal().is_none() {
            node.stamp_end(self.next_ordinal(&method));
        }
        tracing::debug!(
            method = %method,
            element_id = node.element_id(),
            instance_id = node.instance_id(),
            "exited"
        );
        self.coverage.end_covered_element(&method, &node)
    }

    fn notify_rules_evaluated(&mut self, rules: Vec<CoveredDecisionRule>) -> FlowcovResult<()> {
        let method = self.current()?;
        tracing::debug!(method = %method, rules = rules.len(), "rules evaluated");
        self.coverage.add_covered_decision_rules(&method, rules)
    }
}

/// Collects several classes of one suite
#[derive(Debug)]
pub struct SuiteRunState {
    name: String,
    config: CoverageConfig,
    active: Option<ClassRunState>,
    finished: Vec<ClassCoverage>,
}

impl SuiteRunState {
    /// Start a suite
    #[must_use]
    pub fn new(name: impl Into<String>, config: CoverageConfig) -> Self {
        Self {
            name: name.into(),
            config,
            active: None,
            finished: Vec::new(),
        }
    }

    /// Suite name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Finish the active class, if any, and start collecting `class_name`
    ///
    /// A finished class that only failed a minimum is still aggregated. A
    /// class with unequal deployments is left out of the suite.
    pub fn switch_to_class(&mut self, class_name: impl Into<String>) -> FlowcovResult<Option<CoverageReport>> {
        let finished = self.finish_active();
        self.active = Some(ClassRunState::new(class_name, &self.config));
        finished
    }

    /// The class currently collecting
    pub fn active_mut(&mut self) -> Option<&mut ClassRunState> {
        self.active.as_mut()
    }

    /// Classes finished so far
    #[must_use]
    pub fn finished(&self) -> &[ClassCoverage] {
        &self.finished
    }

    fn finish_active(&mut self) -> FlowcovResult<Option<CoverageReport>> {
        let Some(active) = self.active.take() else {
            return Ok(None);
        };
        if let Err(err) = active.coverage().assert_all_deployments_equal() {
            tracing::warn!(
                class = active.class_name(),
                error = %err,
                "leaving class out of the suite"
            );
            return Err(err);
        }
        let result = if active.coverage().is_empty() {
            Ok(None)
        } else {
            active.finish(&self.config).map(Some)
        };
        self.finished.push(active.into_coverage());
        result
    }

    fn active_or_err(&mut self) -> FlowcovResult<&mut ClassRunState> {
        self.active.as_mut().ok_or(FlowcovError::NoCurrentMethod)
    }

    /// Finish the active class and aggregate every finished class
    pub fn aggregated(&mut self) -> FlowcovResult<AggregatedClassCoverage<'_>> {
        self.finish_active()?;
        Ok(AggregatedClassCoverage::new(&self.finished))
    }

    /// Finish the suite and write the aggregated report
    pub fn finish(&mut self) -> FlowcovResult<CoverageReport> {
        let name = self.name.clone();
        let report_dir = self.config.report_dir.clone();
        let aggregate = self.aggregated()?;
        let report = CoverageReport::from_aggregated(name, &aggregate)?;
        tracing::info!(
            suite = %report.name,
            classes = aggregate.class_count(),
            coverage = %format_ratio(report.coverage.unwrap_or(f64::NAN)),
            "suite coverage"
        );
        report.write_to(report_dir)?;
        Ok(report)
    }
}

impl CoverageSink for SuiteRunState {
    fn register_method_deployment(&mut self, method: &str, deployment: ResolvedDeployment) -> FlowcovResult<()> {
        self.active_or_err()?.register_method_deployment(method, deployment)
    }

    fn set_current_method(&mut self, method: &str) -> FlowcovResult<()> {
        self.active_or_err()?.set_current_method(method)
    }

    fn notify_entered(&mut self, element: CoveredElement) -> FlowcovResult<()> {
        self.active_or_err()?.notify_entered(element)
    }

    fn notify_exited(&mut self, node: CoveredFlowNode) -> FlowcovResult<()> {
        self.active_or_err()?.notify_exited(node)
    }

    fn notify_rules_evaluated(&mut self, rules: Vec<CoveredDecisionRule>) -> FlowcovResult<()> {
        self.active_or_err()?.notify_rules_evaluated(rules)
    }
}
