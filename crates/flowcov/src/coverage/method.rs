//! Per-method coverage

use super::definition::{DecisionCoverage, ProcessCoverage};
use super::element::{CoveredDecisionRule, CoveredElement, CoveredFlowNode, CoveredSequenceFlow};
use super::ratio::coverage_ratio;
use super::snapshot::{DefinitionInfo, GraphSnapshot};
use super::view::{by_resource, covered_declared, CoverageView};
use crate::result::{FlowcovError, FlowcovResult};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Coverage of every definition deployed for one test method
#[derive(Debug, Clone)]
pub struct MethodCoverage {
    deployment_id: String,
    name: String,
    processes: BTreeMap<String, ProcessCoverage>,
    decisions: BTreeMap<String, DecisionCoverage>,
}

impl MethodCoverage {
    /// Create an empty method coverage
    #[must_use]
    pub fn new(deployment_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            deployment_id: deployment_id.into(),
            name: name.into(),
            processes: BTreeMap::new(),
            decisions: BTreeMap::new(),
        }
    }

    /// Deployment made for this method
    #[must_use]
    pub fn deployment_id(&self) -> &str {
        &self.deployment_id
    }

    /// Test method name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Register a deployed process definition
    ///
    /// Must happen before any observation for its key is routed here.
    pub fn add_process_coverage(&mut self, definition: DefinitionInfo, snapshot: Arc<GraphSnapshot>) {
        tracing::debug!(
            method = %self.name,
            definition = %definition,
            elements = snapshot.element_count(),
            "registered process coverage"
        );
        self.processes
            .insert(definition.key.clone(), ProcessCoverage::new(definition, snapshot));
    }

    /// Register a deployed decision
    pub fn add_decision_coverage(&mut self, definition: DefinitionInfo, snapshot: Arc<GraphSnapshot>) {
        tracing::debug!(
            method = %self.name,
            definition = %definition,
            rules = snapshot.rule_count(),
            "registered decision coverage"
        );
        self.decisions
            .insert(definition.key.clone(), DecisionCoverage::new(definition, snapshot));
    }

    /// Route an entered element to its process coverage
    ///
    /// Decision rules arrive through [`Self::add_covered_decision_rules`];
    /// one passed here is dropped with a warning.
    pub fn add_covered_element(&mut self, element: CoveredElement) -> FlowcovResult<()> {
        if let CoveredElement::DecisionRule(rule) = &element {
            tracing::warn!(
                method = %self.name,
                decision_key = rule.decision_key(),
                rule_id = rule.rule_id(),
                "unsupported element for process coverage, dropped"
            );
            return Ok(());
        }
        let key = element.definition_key().to_string();
        self.processes
            .get_mut(&key)
            .ok_or_else(|| FlowcovError::unknown_definition(key))?
            .add_covered_element(element);
        Ok(())
    }

    /// Route an exit notification to its process coverage
    pub fn end_covered_element(&mut self, node: &CoveredFlowNode) -> FlowcovResult<()> {
        self.processes
            .get_mut(node.definition_key())
            .ok_or_else(|| FlowcovError::unknown_definition(node.definition_key()))?
            .end_covered_element(node)
    }

    /// Fan the rules of one evaluation out to their decisions
    ///
    /// Every decision key is resolved before any rule is recorded, so an
    /// unknown key leaves the coverage untouched.
    pub fn add_covered_decision_rules(
        &mut self,
        rules: impl IntoIterator<Item = CoveredDecisionRule>,
    ) -> FlowcovResult<()> {
        let mut by_decision: BTreeMap<String, Vec<CoveredDecisionRule>> = BTreeMap::new();
        for rule in rules {
            by_decision
                .entry(rule.decision_key().to_string())
                .or_default()
                .push(rule);
        }
        if let Some(unknown) = by_decision.keys().find(|key| !self.decisions.contains_key(*key)) {
            return Err(FlowcovError::unknown_definition(unknown.as_str()));
        }
        for (key, rules) in by_decision {
            if let Some(decision) = self.decisions.get_mut(&key) {
                decision.add_covered_rules(rules);
            }
        }
        Ok(())
    }

    /// Coverage of one process definition
    pub fn process(&self, definition_key: &str) -> FlowcovResult<&ProcessCoverage> {
        self.processes
            .get(definition_key)
            .ok_or_else(|| FlowcovError::unknown_definition(definition_key))
    }

    /// Coverage of one decision
    pub fn decision(&self, decision_key: &str) -> FlowcovResult<&DecisionCoverage> {
        self.decisions
            .get(decision_key)
            .ok_or_else(|| FlowcovError::unknown_definition(decision_key))
    }

    /// Whether a process definition is registered under the key
    #[must_use]
    pub fn has_process(&self, definition_key: &str) -> bool {
        self.processes.contains_key(definition_key)
    }

    /// Whether a decision is registered under the key
    #[must_use]
    pub fn has_decision(&self, decision_key: &str) -> bool {
        self.decisions.contains_key(decision_key)
    }

    /// Process coverages in key order
    pub fn processes(&self) -> impl Iterator<Item = &ProcessCoverage> {
        self.processes.values()
    }

    /// Decision coverages in key order
    pub fn decisions(&self) -> impl Iterator<Item = &DecisionCoverage> {
        self.decisions.values()
    }

    /// Declared flow nodes plus sequence flows over all process definitions
    #[must_use]
    pub fn declared_element_count(&self) -> usize {
        self.processes
            .values()
            .map(|process| process.snapshot().element_count())
            .sum()
    }

    /// Number of declared rules of one decision
    pub fn decision_rule_count(&self, decision_key: &str) -> FlowcovResult<usize> {
        Ok(self.decision(decision_key)?.snapshot().rule_count())
    }

    /// Every covered flow node, in canonical order
    #[must_use]
    pub fn all_covered_flow_nodes(&self) -> Vec<CoveredFlowNode> {
        self.processes
            .values()
            .flat_map(ProcessCoverage::covered_flow_nodes)
            .collect()
    }

    /// Every taken sequence flow, in canonical order
    #[must_use]
    pub fn all_covered_sequence_flows(&self) -> Vec<CoveredSequenceFlow> {
        self.processes
            .values()
            .flat_map(ProcessCoverage::covered_sequence_flows)
            .collect()
    }
}

impl CoverageView for MethodCoverage {
    fn process_definitions(&self) -> FlowcovResult<Vec<&DefinitionInfo>> {
        Ok(by_resource(self.processes.values().map(ProcessCoverage::definition)))
    }

    fn decision_definitions(&self) -> FlowcovResult<Vec<&DefinitionInfo>> {
        Ok(by_resource(self.decisions.values().map(DecisionCoverage::definition)))
    }

    fn covered_flow_nodes(&self, definition_key: &str) -> FlowcovResult<Vec<CoveredFlowNode>> {
        Ok(self.process(definition_key)?.covered_flow_nodes())
    }

    fn covered_sequence_flows(
        &self,
        definition_key: &str,
    ) -> FlowcovResult<Vec<CoveredSequenceFlow>> {
        Ok(self.process(definition_key)?.covered_sequence_flows())
    }

    fn covered_decision_rules(
        &self,
        decision_key: &str,
    ) -> FlowcovResult<Vec<CoveredDecisionRule>> {
        Ok(self.decision(decision_key)?.covered_rules())
    }

    fn coverage_percentage(&self) -> FlowcovResult<f64> {
        // Keys are unique per method, so summing per definition is the union.
        let covered = self
            .processes
            .values()
            .map(|process| {
                covered_declared(
                    process.snapshot(),
                    &process.covered_flow_nodes(),
                    &process.covered_sequence_flows(),
                )
            })
            .sum();
        Ok(coverage_ratio(covered, self.declared_element_count()))
    }

    fn coverage_percentage_of(&self, definition_key: &str) -> FlowcovResult<f64> {
        Ok(self.process(definition_key)?.coverage_percentage())
    }

    fn decision_coverage_percentage(&self, decision_key: &str) -> FlowcovResult<f64> {
        Ok(self.decision(decision_key)?.coverage_percentage())
    }
}

impl fmt::Display for MethodCoverage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Deployment ID: {}", self.deployment_id)?;
        writeln!(f, "Deployment process definitions:")?;
        for process in self.processes.values() {
            writeln!(
                f,
                "  {} {}/{} covered",
                process.definition(),
                process.covered_element_count(),
                process.snapshot().element_count()
            )?;
        }
        Ok(())
    }
}
