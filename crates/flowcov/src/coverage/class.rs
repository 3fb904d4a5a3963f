//! Per-class coverage
//!
//! Unions what every test method of a class covered. All methods of a class
//! must deploy the same process resources; [`ClassCoverage::assert_all_deployments_equal`]
//! enforces that before class-level ratios can be trusted.

use super::element::{CoveredDecisionRule, CoveredElement, CoveredFlowNode, CoveredSequenceFlow};
use super::method::MethodCoverage;
use super::ordering::merge_canonical;
use super::ratio::coverage_ratio;
use super::snapshot::DefinitionInfo;
use super::view::{covered_declared, rules_declared, CoverageView};
use crate::result::{FlowcovError, FlowcovResult};
use std::collections::BTreeMap;

/// Coverage of one test class
#[derive(Debug, Clone, Default)]
pub struct ClassCoverage {
    name: String,
    methods: BTreeMap<String, MethodCoverage>,
}

impl ClassCoverage {
    /// Create an empty class coverage
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            methods: BTreeMap::new(),
        }
    }

    /// Test class name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Register a method's coverage under its name, replacing any earlier run
    pub fn add_test_method_coverage(&mut self, coverage: MethodCoverage) -> Option<MethodCoverage> {
        let replaced = self.methods.insert(coverage.name().to_string(), coverage);
        if let Some(previous) = &replaced {
            tracing::debug!(
                class = %self.name,
                method = previous.name(),
                "replaced earlier method coverage"
            );
        }
        replaced
    }

    /// Coverage of one method
    #[must_use]
    pub fn test_method_coverage(&self, method: &str) -> Option<&MethodCoverage> {
        self.methods.get(method)
    }

    /// Method coverages in name order
    pub fn test_methods(&self) -> impl Iterator<Item = &MethodCoverage> {
        self.methods.values()
    }

    /// Number of registered methods
    #[must_use]
    pub fn method_count(&self) -> usize {
        self.methods.len()
    }

    /// Whether no method has been registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }

    fn method_mut(&mut self, method: &str) -> FlowcovResult<&mut MethodCoverage> {
        self.methods
            .get_mut(method)
            .ok_or_else(|| FlowcovError::UnknownMethod {
                method: method.to_string(),
            })
    }

    /// Route an entered element to a method
    pub fn add_covered_element(&mut self, method: &str, element: CoveredElement) -> FlowcovResult<()> {
        self.method_mut(method)?.add_covered_element(element)
    }

    /// Route an exit notification to a method
    pub fn end_covered_element(&mut self, method: &str, node: &CoveredFlowNode) -> FlowcovResult<()> {
        self.method_mut(method)?.end_covered_element(node)
    }

    /// Route the rules of one evaluation to a method
    pub fn add_covered_decision_rules(
        &mut self,
        method: &str,
        rules: impl IntoIterator<Item = CoveredDecisionRule>,
    ) -> FlowcovResult<()> {
        self.method_mut(method)?.add_covered_decision_rules(rules)
    }

    /// One method, used to read the declared side shared by all methods
    ///
    /// Only meaningful once [`Self::assert_all_deployments_equal`] passed.
    pub fn any_method_coverage(&self) -> FlowcovResult<&MethodCoverage> {
        self.methods
            .values()
            .next()
            .ok_or(FlowcovError::EmptyClassCoverage)
    }

    /// Fail unless every method deployed the same process resources
    pub fn assert_all_deployments_equal(&self) -> FlowcovResult<()> {
        let mut reference: Option<Vec<(&str, &str)>> = None;
        for method in self.methods.values() {
            let deployed = deployment_signature(method)?;
            match &reference {
                None => reference = Some(deployed),
                Some(expected) if *expected == deployed => {}
                Some(expected) => {
                    return Err(FlowcovError::InconsistentDeployment {
                        expected: describe(expected),
                        actual: describe(&deployed),
                        method: method.name().to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    fn methods_with_process<'a>(
        &'a self,
        definition_key: &'a str,
    ) -> impl Iterator<Item = &'a MethodCoverage> + 'a {
        self.methods
            .values()
            .filter(move |method| method.has_process(definition_key))
    }

    fn methods_with_decision<'a>(
        &'a self,
        decision_key: &'a str,
    ) -> impl Iterator<Item = &'a MethodCoverage> + 'a {
        self.methods
            .values()
            .filter(move |method| method.has_decision(decision_key))
    }
}

fn deployment_signature(method: &MethodCoverage) -> FlowcovResult<Vec<(&str, &str)>> {
    Ok(method
        .process_definitions()?
        .into_iter()
        .map(DefinitionInfo::resource_identity)
        .collect())
}

fn describe(signature: &[(&str, &str)]) -> String {
    signature
        .iter()
        .map(|(resource, key)| format!("{resource}:{key}"))
        .collect::<Vec<_>>()
        .join(", ")
}

impl CoverageView for ClassCoverage {
    fn process_definitions(&self) -> FlowcovResult<Vec<&DefinitionInfo>> {
        self.any_method_coverage()?.process_definitions()
    }

    fn decision_definitions(&self) -> FlowcovResult<Vec<&DefinitionInfo>> {
        self.any_method_coverage()?.decision_definitions()
    }

    fn covered_flow_nodes(&self, definition_key: &str) -> FlowcovResult<Vec<CoveredFlowNode>> {
        self.any_method_coverage()?.process(definition_key)?;
        Ok(merge_canonical(
            self.methods_with_process(definition_key)
                .filter_map(|method| method.process(definition_key).ok())
                .map(|process| process.covered_flow_nodes()),
        ))
    }

    fn covered_sequence_flows(
        &self,
        definition_key: &str,
    ) -> FlowcovResult<Vec<CoveredSequenceFlow>> {
        self.any_method_coverage()?.process(definition_key)?;
        Ok(merge_canonical(
            self.methods_with_process(definition_key)
                .filter_map(|method| method.process(definition_key).ok())
                .map(|process| process.covered_sequence_flows()),
        ))
    }

    fn covered_decision_rules(
        &self,
        decision_key: &str,
    ) -> FlowcovResult<Vec<CoveredDecisionRule>> {
        self.any_method_coverage()?.decision(decision_key)?;
        Ok(merge_canonical(
            self.methods_with_decision(decision_key)
                .filter_map(|method| method.decision(decision_key).ok())
                .map(|decision| decision.covered_rules()),
        ))
    }

    fn coverage_percentage(&self) -> FlowcovResult<f64> {
        let reference = self.any_method_coverage()?;
        let mut covered = 0;
        for process in reference.processes() {
            let key = process.definition_key();
            covered += covered_declared(
                process.snapshot(),
                &self.covered_flow_nodes(key)?,
                &self.covered_sequence_flows(key)?,
            );
        }
        Ok(coverage_ratio(covered, reference.declared_element_count()))
    }

    fn coverage_percentage_of(&self, definition_key: &str) -> FlowcovResult<f64> {
        let snapshot = self.any_method_coverage()?.process(definition_key)?.snapshot();
        let covered = covered_declared(
            snapshot,
            &self.covered_flow_nodes(definition_key)?,
            &self.covered_sequence_flows(definition_key)?,
        );
        Ok(coverage_ratio(covered, snapshot.element_count()))
    }

    fn decision_coverage_percentage(&self, decision_key: &str) -> FlowcovResult<f64> {
        let snapshot = self.any_method_coverage()?.decision(decision_key)?.snapshot();
        let covered = rules_declared(snapshot, &self.covered_decision_rules(decision_key)?);
        Ok(coverage_ratio(covered, snapshot.rule_count()))
    }
}
