//! Read side shared by method, class and suite coverage

use super::element::{CoveredDecisionRule, CoveredFlowNode, CoveredSequenceFlow};
use super::snapshot::{DefinitionInfo, GraphSnapshot};
use crate::result::FlowcovResult;
use std::collections::{BTreeMap, BTreeSet};

/// Coverage queries answered at every aggregation level
///
/// Covered sets are deduplicated across everything the level spans;
/// percentages divide those unions by the declared elements, they never
/// average lower-level ratios.
pub trait CoverageView {
    /// Deployed process definitions, ordered by resource name then key
    fn process_definitions(&self) -> FlowcovResult<Vec<&DefinitionInfo>>;

    /// Deployed decision definitions, ordered by resource name then key
    fn decision_definitions(&self) -> FlowcovResult<Vec<&DefinitionInfo>>;

    /// Covered flow nodes of one process definition
    fn covered_flow_nodes(&self, definition_key: &str) -> FlowcovResult<Vec<CoveredFlowNode>>;

    /// Taken sequence flows of one process definition
    fn covered_sequence_flows(
        &self,
        definition_key: &str,
    ) -> FlowcovResult<Vec<CoveredSequenceFlow>>;

    /// Matched rules of one decision
    fn covered_decision_rules(
        &self,
        decision_key: &str,
    ) -> FlowcovResult<Vec<CoveredDecisionRule>>;

    /// Ratio over all deployed process definitions
    fn coverage_percentage(&self) -> FlowcovResult<f64>;

    /// Ratio for one process definition
    fn coverage_percentage_of(&self, definition_key: &str) -> FlowcovResult<f64>;

    /// Ratio for one decision
    fn decision_coverage_percentage(&self, decision_key: &str) -> FlowcovResult<f64>;

    /// Ids of covered flow nodes of one process definition
    fn covered_flow_node_ids(&self, definition_key: &str) -> FlowcovResult<BTreeSet<String>> {
        Ok(self
            .covered_flow_nodes(definition_key)?
            .iter()
            .map(|node| node.element_id().to_string())
            .collect())
    }

    /// Ids of taken sequence flows of one process definition
    fn covered_sequence_flow_ids(
        &self,
        definition_key: &str,
    ) -> FlowcovResult<BTreeSet<String>> {
        Ok(self
            .covered_sequence_flows(definition_key)?
            .iter()
            .map(|flow| flow.element_id().to_string())
            .collect())
    }
}

/// Number of covered records that the snapshot declares
pub(crate) fn covered_declared(
    snapshot: &GraphSnapshot,
    flow_nodes: &[CoveredFlowNode],
    sequence_flows: &[CoveredSequenceFlow],
) -> usize {
    let key = snapshot.definition_key();
    let nodes = flow_nodes
        .iter()
        .filter(|node| node.definition_key() == key && snapshot.declares_flow_node(node.element_id()))
        .count();
    let flows = sequence_flows
        .iter()
        .filter(|flow| {
            flow.definition_key() == key && snapshot.declares_sequence_flow(flow.element_id())
        })
        .count();
    nodes + flows
}

/// Number of matched rules that the snapshot declares
pub(crate) fn rules_declared(snapshot: &GraphSnapshot, rules: &[CoveredDecisionRule]) -> usize {
    rules
        .iter()
        .filter(|rule| {
            rule.decision_key() == snapshot.definition_key() && snapshot.declares_rule(rule.rule_id())
        })
        .count()
}

/// Order definitions by `(resource name, key)`, dropping duplicates
pub(crate) fn by_resource<'a>(
    definitions: impl IntoIterator<Item = &'a DefinitionInfo>,
) -> Vec<&'a DefinitionInfo> {
    let mut ordered = BTreeMap::new();
    for definition in definitions {
        ordered.entry(definition.resource_identity()).or_insert(definition);
    }
    ordered.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_covered_declared_filters_foreign_keys() {
        let snapshot = GraphSnapshot::process("order")
            .flow_node("Start", "startEvent")
            .build();
        let nodes = vec![
            CoveredFlowNode::new("order", "Start", "i1"),
            CoveredFlowNode::new("invoice", "Start", "i2"),
        ];
        assert_eq!(covered_declared(&snapshot, &nodes, &[]), 1);
    }

    #[test]
    fn test_by_resource_keeps_same_key_from_two_resources() {
        let a = DefinitionInfo::new("p:1", "p", "b.bpmn");
        let b = DefinitionInfo::new("p:2", "p", "a.bpmn");
        let c = DefinitionInfo::new("p:3", "p", "a.bpmn");
        let ordered = by_resource([&a, &b, &c]);
        assert_eq!(ordered.len(), 2);
        assert_eq!(ordered[0].id, "p:2");
        assert_eq!(ordered[1].resource_name, "b.bpmn");
    }
}
