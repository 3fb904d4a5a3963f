//! Per-definition coverage
//!
//! The covered side of one process or decision definition for one test
//! method, next to the snapshot that supplies the declared side.

use super::element::{CoveredDecisionRule, CoveredElement, CoveredFlowNode, CoveredSequenceFlow};
use super::ordering::canonical;
use super::snapshot::{DefinitionInfo, GraphSnapshot};
use super::view::{covered_declared, rules_declared};
use crate::coverage::ratio::coverage_ratio;
use crate::result::{FlowcovError, FlowcovResult};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

/// Coverage of one process definition during one test method
#[derive(Debug, Clone)]
pub struct ProcessCoverage {
    definition: DefinitionInfo,
    snapshot: Arc<GraphSnapshot>,
    flow_nodes: Vec<CoveredFlowNode>,
    sequence_flows: Vec<CoveredSequenceFlow>,
    /// Instance id -> instance id of the open record it was coalesced into
    coalesced: HashMap<String, String>,
}

impl ProcessCoverage {
    /// Create an empty coverage for a deployed process definition
    #[must_use]
    pub fn new(definition: DefinitionInfo, snapshot: Arc<GraphSnapshot>) -> Self {
        Self {
            definition,
            snapshot,
            flow_nodes: Vec::new(),
            sequence_flows: Vec::new(),
            coalesced: HashMap::new(),
        }
    }

    /// Process definition key
    #[must_use]
    pub fn definition_key(&self) -> &str {
        &self.definition.key
    }

    /// The deployed definition
    #[must_use]
    pub const fn definition(&self) -> &DefinitionInfo {
        &self.definition
    }

    /// Declared elements
    #[must_use]
    pub fn snapshot(&self) -> &GraphSnapshot {
        &self.snapshot
    }

    /// Record an entered flow node or a taken sequence flow
    ///
    /// A flow node whose identity already has an open record under another
    /// instance id is coalesced into that record. Decision rules are not
    /// process elements and are dropped with a warning.
    pub fn add_covered_element(&mut self, element: CoveredElement) {
        match element {
            CoveredElement::FlowNode(node) => self.add_flow_node(node),
            CoveredElement::SequenceFlow(flow) => {
                tracing::trace!(
                    definition_key = flow.definition_key(),
                    element_id = flow.element_id(),
                    "sequence flow taken"
                );
                self.sequence_flows.push(flow);
            }
            CoveredElement::DecisionRule(rule) => {
                tracing::warn!(
                    definition_key = %self.definition.key,
                    decision_key = rule.decision_key(),
                    rule_id = rule.rule_id(),
                    "unsupported element for process coverage, dropped"
                );
            }
        }
    }

    fn add_flow_node(&mut self, node: CoveredFlowNode) {
        let open = self.flow_nodes.iter().find(|existing| {
            !existing.has_ended()
                && existing.instance_id() != node.instance_id()
                && **existing == node
        });
        if let Some(open) = open {
            tracing::trace!(
                element_id = node.element_id(),
                instance_id = node.instance_id(),
                open_instance_id = open.instance_id(),
                "coalesced concurrent flow node instance"
            );
            self.coalesced
                .insert(node.instance_id().to_string(), open.instance_id().to_string());
            return;
        }
        tracing::trace!(
            definition_key = node.definition_key(),
            element_id = node.element_id(),
            instance_id = node.instance_id(),
            "flow node entered"
        );
        self.flow_nodes.push(node);
    }

    /// Close the open record carrying the exit notification's instance id
    ///
    /// An instance that was coalesced on entry closes without touching the
    /// record it was merged into.
    pub fn end_covered_element(&mut self, node: &CoveredFlowNode) -> FlowcovResult<()> {
        if self.coalesced.remove(node.instance_id()).is_some() {
            return Ok(());
        }
        let record = self
            .flow_nodes
            .iter_mut()
            .find(|record| !record.has_ended() && record.instance_id() == node.instance_id())
            .ok_or_else(|| FlowcovError::ElementNotFound {
                definition_key: node.definition_key().to_string(),
                element_id: node.element_id().to_string(),
                instance_id: node.instance_id().to_string(),
            })?;
        record.close(node.end_ordinal());
        tracing::trace!(
            element_id = record.element_id(),
            instance_id = record.instance_id(),
            "flow node ended"
        );
        Ok(())
    }

    /// Covered flow nodes, deduplicated in canonical order
    #[must_use]
    pub fn covered_flow_nodes(&self) -> Vec<CoveredFlowNode> {
        canonical(&self.flow_nodes)
    }

    /// Covered sequence flows, deduplicated in canonical order
    #[must_use]
    pub fn covered_sequence_flows(&self) -> Vec<CoveredSequenceFlow> {
        canonical(&self.sequence_flows)
    }

    /// Ids of covered flow nodes
    #[must_use]
    pub fn covered_flow_node_ids(&self) -> BTreeSet<&str> {
        self.flow_nodes.iter().map(CoveredFlowNode::element_id).collect()
    }

    /// Ids of taken sequence flows
    #[must_use]
    pub fn covered_sequence_flow_ids(&self) -> BTreeSet<&str> {
        self.sequence_flows
            .iter()
            .map(CoveredSequenceFlow::element_id)
            .collect()
    }

    /// Flow node records in execution order
    #[must_use]
    pub fn flow_node_records(&self) -> &[CoveredFlowNode] {
        &self.flow_nodes
    }

    /// Sequence flow records in execution order
    #[must_use]
    pub fn sequence_flow_records(&self) -> &[CoveredSequenceFlow] {
        &self.sequence_flows
    }

    /// Declared elements that were covered
    #[must_use]
    pub fn covered_element_count(&self) -> usize {
        covered_declared(
            &self.snapshot,
            &self.covered_flow_nodes(),
            &self.covered_sequence_flows(),
        )
    }

    /// Covered over declared elements; NaN when nothing is declared
    #[must_use]
    pub fn coverage_percentage(&self) -> f64 {
        coverage_ratio(self.covered_element_count(), self.snapshot.element_count())
    }
}

/// Coverage of one decision during one test method
#[derive(Debug, Clone)]
pub struct DecisionCoverage {
    definition: DefinitionInfo,
    snapshot: Arc<GraphSnapshot>,
    rules: Vec<CoveredDecisionRule>,
}

impl DecisionCoverage {
    /// Create an empty coverage for a deployed decision
    #[must_use]
    pub fn new(definition: DefinitionInfo, snapshot: Arc<GraphSnapshot>) -> Self {
        Self {
            definition,
            snapshot,
            rules: Vec::new(),
        }
    }

    /// Decision key
    #[must_use]
    pub fn decision_key(&self) -> &str {
        &self.definition.key
    }

    /// The deployed decision definition
    #[must_use]
    pub const fn definition(&self) -> &DefinitionInfo {
        &self.definition
    }

    /// Declared rules
    #[must_use]
    pub fn snapshot(&self) -> &GraphSnapshot {
        &self.snapshot
    }

    /// Record matched rules of one evaluation
    pub fn add_covered_rules(&mut self, rules: impl IntoIterator<Item = CoveredDecisionRule>) {
        self.rules.extend(rules);
    }

    /// Matched rules, deduplicated in canonical order
    #[must_use]
    pub fn covered_rules(&self) -> Vec<CoveredDecisionRule> {
        canonical(&self.rules)
    }

    /// Ids of matched rules
    #[must_use]
    pub fn covered_rule_ids(&self) -> BTreeSet<&str> {
        self.rules.iter().map(CoveredDecisionRule::rule_id).collect()
    }

    /// Rule records in evaluation order
    #[must_use]
    pub fn rule_records(&self) -> &[CoveredDecisionRule] {
        &self.rules
    }

    /// Matched over declared rules; NaN when the decision has no rules
    #[must_use]
    pub fn coverage_percentage(&self) -> f64 {
        coverage_ratio(
            rules_declared(&self.snapshot, &self.covered_rules()),
            self.snapshot.rule_count(),
        )
    }
}
