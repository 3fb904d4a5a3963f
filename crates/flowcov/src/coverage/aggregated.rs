//! Suite-level coverage across finished test classes
//!
//! Built once from borrowed [`ClassCoverage`]s. Adding a class means
//! building a new aggregate.

use super::class::ClassCoverage;
use super::element::{CoveredDecisionRule, CoveredFlowNode, CoveredSequenceFlow};
use super::ordering::merge_canonical;
use super::ratio::coverage_ratio;
use super::snapshot::{DefinitionInfo, GraphSnapshot};
use super::view::{by_resource, covered_declared, rules_declared, CoverageView};
use crate::result::{FlowcovError, FlowcovResult};
use std::collections::{BTreeSet, HashMap};

/// Coverage across several test classes
#[derive(Debug, Clone)]
pub struct AggregatedClassCoverage<'a> {
    classes: Vec<&'a ClassCoverage>,
    /// Process definition key -> indices into `classes`
    by_process_key: HashMap<String, Vec<usize>>,
    /// Decision key -> indices into `classes`
    by_decision_key: HashMap<String, Vec<usize>>,
}

impl<'a> AggregatedClassCoverage<'a> {
    /// Index the given classes by the definitions they deployed
    ///
    /// Classes without any method coverage contribute nothing.
    pub fn new(classes: impl IntoIterator<Item = &'a ClassCoverage>) -> Self {
        let classes: Vec<&'a ClassCoverage> = classes.into_iter().collect();
        let mut by_process_key: HashMap<String, Vec<usize>> = HashMap::new();
        let mut by_decision_key: HashMap<String, Vec<usize>> = HashMap::new();

        for (index, class) in classes.iter().enumerate() {
            let Ok(method) = class.any_method_coverage() else {
                tracing::debug!(class = class.name(), "skipping class without method coverage");
                continue;
            };
            let process_keys: BTreeSet<&str> = method
                .processes()
                .map(|process| process.definition_key())
                .collect();
            for key in process_keys {
                by_process_key.entry(key.to_string()).or_default().push(index);
            }
            let decision_keys: BTreeSet<&str> = method
                .decisions()
                .map(|decision| decision.decision_key())
                .collect();
            for key in decision_keys {
                by_decision_key.entry(key.to_string()).or_default().push(index);
            }
        }

        Self {
            classes,
            by_process_key,
            by_decision_key,
        }
    }

    /// Aggregated classes in construction order
    #[must_use]
    pub fn classes(&self) -> &[&'a ClassCoverage] {
        &self.classes
    }

    /// Number of aggregated classes
    #[must_use]
    pub fn class_count(&self) -> usize {
        self.classes.len()
    }

    /// Classes that deployed the process definition key
    pub fn classes_with_process(
        &self,
        definition_key: &str,
    ) -> FlowcovResult<impl Iterator<Item = &'a ClassCoverage> + '_> {
        let indices = self
            .by_process_key
            .get(definition_key)
            .ok_or_else(|| FlowcovError::unknown_definition(definition_key))?;
        Ok(indices.iter().map(|index| self.classes[*index]))
    }

    /// Classes that deployed the decision key
    pub fn classes_with_decision(
        &self,
        decision_key: &str,
    ) -> FlowcovResult<impl Iterator<Item = &'a ClassCoverage> + '_> {
        let indices = self
            .by_decision_key
            .get(decision_key)
            .ok_or_else(|| FlowcovError::unknown_definition(decision_key))?;
        Ok(indices.iter().map(|index| self.classes[*index]))
    }

    /// Declared side of a process key, taken from the first class deploying it
    pub fn reference_snapshot(&self, definition_key: &str) -> FlowcovResult<&'a GraphSnapshot> {
        let class = self
            .classes_with_process(definition_key)?
            .next()
            .ok_or_else(|| FlowcovError::unknown_definition(definition_key))?;
        Ok(class.any_method_coverage()?.process(definition_key)?.snapshot())
    }

    /// Declared side of a decision key, taken from the first class deploying it
    pub fn reference_decision_snapshot(&self, decision_key: &str) -> FlowcovResult<&'a GraphSnapshot> {
        let class = self
            .classes_with_decision(decision_key)?
            .next()
            .ok_or_else(|| FlowcovError::unknown_definition(decision_key))?;
        Ok(class.any_method_coverage()?.decision(decision_key)?.snapshot())
    }

    fn populated(&self) -> impl Iterator<Item = &'a ClassCoverage> + '_ {
        self.classes.iter().copied().filter(|class| !class.is_empty())
    }
}

impl CoverageView for AggregatedClassCoverage<'_> {
    fn process_definitions(&self) -> FlowcovResult<Vec<&DefinitionInfo>> {
        let mut definitions = Vec::new();
        for class in self.populated() {
            definitions.extend(class.process_definitions()?);
        }
        Ok(by_resource(definitions))
    }

    fn decision_definitions(&self) -> FlowcovResult<Vec<&DefinitionInfo>> {
        let mut definitions = Vec::new();
        for class in self.populated() {
            definitions.extend(class.decision_definitions()?);
        }
        Ok(by_resource(definitions))
    }

    fn covered_flow_nodes(&self, definition_key: &str) -> FlowcovResult<Vec<CoveredFlowNode>> {
        let mut lists = Vec::new();
        for class in self.classes_with_process(definition_key)? {
            lists.push(class.covered_flow_nodes(definition_key)?);
        }
        Ok(merge_canonical(lists))
    }

    fn covered_sequence_flows(
        &self,
        definition_key: &str,
    ) -> FlowcovResult<Vec<CoveredSequenceFlow>> {
        let mut lists = Vec::new();
        for class in self.classes_with_process(definition_key)? {
            lists.push(class.covered_sequence_flows(definition_key)?);
        }
        Ok(merge_canonical(lists))
    }

    fn covered_decision_rules(
        &self,
        decision_key: &str,
    ) -> FlowcovResult<Vec<CoveredDecisionRule>> {
        let mut lists = Vec::new();
        for class in self.classes_with_decision(decision_key)? {
            lists.push(class.covered_decision_rules(decision_key)?);
        }
        Ok(merge_canonical(lists))
    }

    fn coverage_percentage(&self) -> FlowcovResult<f64> {
        let keys: BTreeSet<&str> = self.by_process_key.keys().map(String::as_str).collect();
        let mut declared = 0;
        let mut covered = 0;
        for key in keys {
            let snapshot = self.reference_snapshot(key)?;
            declared += snapshot.element_count();
            covered += covered_declared(
                snapshot,
                &self.covered_flow_nodes(key)?,
                &self.covered_sequence_flows(key)?,
            );
        }
        Ok(coverage_ratio(covered, declared))
    }

    fn coverage_percentage_of(&self, definition_key: &str) -> FlowcovResult<f64> {
        let snapshot = self.reference_snapshot(definition_key)?;
        let covered = covered_declared(
            snapshot,
            &self.covered_flow_nodes(definition_key)?,
            &self.covered_sequence_flows(definition_key)?,
        );
        Ok(coverage_ratio(covered, snapshot.element_count()))
    }

    fn decision_coverage_percentage(&self, decision_key: &str) -> FlowcovResult<f64> {
        let snapshot = self.reference_decision_snapshot(decision_key)?;
        let covered = rules_declared(snapshot, &self.covered_decision_rules(decision_key)?);
        Ok(coverage_ratio(covered, snapshot.rule_count()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::coverage::{CoveredElement, MethodCoverage};
    use std::sync::Arc;

    fn snapshot(key: &str, nodes: &[&str]) -> Arc<GraphSnapshot> {
        let mut builder = GraphSnapshot::process(key);
        for node in nodes {
            builder = builder.flow_node(*node, "task");
        }
        Arc::new(builder.build())
    }

    fn class(name: &str, key: &str, nodes: &[&str], covered: &[&str]) -> ClassCoverage {
        let mut method = MethodCoverage::new("d", "m");
        method.add_process_coverage(
            DefinitionInfo::new(format!("{key}:1"), key, format!("{key}.bpmn")),
            snapshot(key, nodes),
        );
        for id in covered {
            let element: CoveredElement = CoveredFlowNode::new(key, *id, *id).into();
            method.add_covered_element(element).unwrap();
        }
        let mut class = ClassCoverage::new(name);
        class.add_test_method_coverage(method);
        class
    }

    #[test]
    fn test_per_key_union_across_classes() {
        let a = class("A", "p", &["x", "y", "z", "w"], &["x"]);
        let b = class("B", "p", &["x", "y", "z", "w"], &["y", "z"]);
        let aggregate = AggregatedClassCoverage::new([&a, &b]);
        assert_eq!(aggregate.coverage_percentage_of("p").unwrap(), 0.75);
        assert_eq!(aggregate.covered_flow_node_ids("p").unwrap().len(), 3);
    }

    #[test]
    fn test_global_ratio_is_not_an_average() {
        let a = class("A", "p", &["x", "y"], &["x", "y"]);
        let b = class("B", "q", &["a", "b", "c", "d", "e", "f"], &[]);
        let aggregate = AggregatedClassCoverage::new([&a, &b]);
        // (2 + 0) / (2 + 6), where averaging would give 0.5
        assert_eq!(aggregate.coverage_percentage().unwrap(), 0.25);
    }

    #[test]
    fn test_unknown_key_fails() {
        let a = class("A", "p", &["x"], &[]);
        let aggregate = AggregatedClassCoverage::new([&a]);
        assert!(matches!(
            aggregate.coverage_percentage_of("q"),
            Err(FlowcovError::UnknownDefinition { .. })
        ));
    }

    #[test]
    fn test_empty_classes_are_skipped() {
        let empty = ClassCoverage::new("Empty");
        let a = class("A", "p", &["x", "y"], &["x"]);
        let aggregate = AggregatedClassCoverage::new([&empty, &a]);
        assert_eq!(aggregate.class_count(), 2);
        assert_eq!(aggregate.coverage_percentage().unwrap(), 0.5);
        assert_eq!(aggregate.process_definitions().unwrap().len(), 1);
    }

    #[test]
    fn test_no_classes_is_undefined() {
        let aggregate = AggregatedClassCoverage::new(Vec::<&ClassCoverage>::new());
        assert!(aggregate.coverage_percentage().unwrap().is_nan());
    }

    #[test]
    fn test_aggregate_is_a_snapshot_of_its_inputs() {
        // Build-once: the aggregate answers for the classes it was given.
        let a = class("A", "p", &["x", "y"], &["x"]);
        let first = AggregatedClassCoverage::new([&a]);
        let b = class("B", "p", &["x", "y"], &["y"]);
        let second = AggregatedClassCoverage::new([&a, &b]);
        assert_eq!(first.coverage_percentage_of("p").unwrap(), 0.5);
        assert_eq!(second.coverage_percentage_of("p").unwrap(), 1.0);
    }
}
