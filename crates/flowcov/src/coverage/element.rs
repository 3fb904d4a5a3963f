//! Covered Element Records
//!
//! One record per observed entry of a flow node, taken sequence flow or
//! evaluated decision rule.
//!
//! Records are identified by `(definition key, element id)` only. Instance
//! ids and ordinals are informational: coverage asks whether an element was
//! ever reached, not how often.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Kind of a covered element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementKind {
    /// Task, event or gateway of a process graph
    FlowNode,
    /// Transition between two flow nodes
    SequenceFlow,
    /// Row of a decision table
    DecisionRule,
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FlowNode => write!(f, "flow_node"),
            Self::SequenceFlow => write!(f, "sequence_flow"),
            Self::DecisionRule => write!(f, "decision_rule"),
        }
    }
}

/// A flow node reached during one test method
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoveredFlowNode {
    definition_key: String,
    element_id: String,
    instance_id: String,
    element_type: String,
    start_ordinal: Option<u64>,
    end_ordinal: Option<u64>,
    #[serde(default)]
    ended: bool,
}

impl CoveredFlowNode {
    /// Create a record for a flow node entry
    #[must_use]
    pub fn new(
        definition_key: impl Into<String>,
        element_id: impl Into<String>,
        instance_id: impl Into<String>,
    ) -> Self {
        Self {
            definition_key: definition_key.into(),
            element_id: element_id.into(),
            instance_id: instance_id.into(),
            element_type: String::new(),
            start_ordinal: None,
            end_ordinal: None,
            ended: false,
        }
    }

    /// Set the element type tag (task, event, gateway, ...)
    #[must_use]
    pub fn with_type(mut self, element_type: impl Into<String>) -> Self {
        self.element_type = element_type.into();
        self
    }

    /// Set the start ordinal
    #[must_use]
    pub const fn with_start_ordinal(mut self, ordinal: u64) -> Self {
        self.start_ordinal = Some(ordinal);
        self
    }

    /// Set the end ordinal, marking the node as ended
    #[must_use]
    pub const fn with_end_ordinal(mut self, ordinal: u64) -> Self {
        self.end_ordinal = Some(ordinal);
        self.ended = true;
        self
    }

    /// Mark the node as ended on entry (throw events complete immediately)
    #[must_use]
    pub const fn ended(mut self) -> Self {
        self.ended = true;
        self
    }

    /// Definition key of the owning process
    #[must_use]
    pub fn definition_key(&self) -> &str {
        &self.definition_key
    }

    /// Declared flow node id
    #[must_use]
    pub fn element_id(&self) -> &str {
        &self.element_id
    }

    /// Runtime instance id
    #[must_use]
    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    /// Element type tag, empty when unknown
    #[must_use]
    pub fn element_type(&self) -> &str {
        &self.element_type
    }

    /// Start ordinal, if stamped
    #[must_use]
    pub const fn start_ordinal(&self) -> Option<u64> {
        self.start_ordinal
    }

    /// End ordinal, set once the exit notification arrived
    #[must_use]
    pub const fn end_ordinal(&self) -> Option<u64> {
        self.end_ordinal
    }

    /// Whether the exit notification arrived
    #[must_use]
    pub const fn has_ended(&self) -> bool {
        self.ended
    }

    pub(crate) fn close(&mut self, end_ordinal: Option<u64>) {
        self.ended = true;
        if end_ordinal.is_some() {
            self.end_ordinal = end_ordinal;
        }
    }

    pub(crate) fn stamp_start(&mut self, ordinal: u64) {
        if self.start_ordinal.is_none() {
            self.start_ordinal = Some(ordinal);
        }
    }

    pub(crate) fn stamp_end(&mut self, ordinal: u64) {
        if self.end_ordinal.is_none() {
            self.end_ordinal = Some(ordinal);
        }
    }
}

/// A sequence flow taken during one test method
///
/// Transitions are single-shot: taken means covered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoveredSequenceFlow {
    definition_key: String,
    element_id: String,
    start_ordinal: Option<u64>,
}

impl CoveredSequenceFlow {
    /// Create a record for a taken transition
    #[must_use]
    pub fn new(definition_key: impl Into<String>, element_id: impl Into<String>) -> Self {
        Self {
            definition_key: definition_key.into(),
            element_id: element_id.into(),
            start_ordinal: None,
        }
    }

    /// Set the ordinal at which the transition was taken
    #[must_use]
    pub const fn with_start_ordinal(mut self, ordinal: u64) -> Self {
        self.start_ordinal = Some(ordinal);
        self
    }

    /// Definition key of the owning process
    #[must_use]
    pub fn definition_key(&self) -> &str {
        &self.definition_key
    }

    /// Declared sequence flow id
    #[must_use]
    pub fn element_id(&self) -> &str {
        &self.element_id
    }

    /// Ordinal at which the transition was taken
    #[must_use]
    pub const fn start_ordinal(&self) -> Option<u64> {
        self.start_ordinal
    }

    pub(crate) fn stamp_start(&mut self, ordinal: u64) {
        if self.start_ordinal.is_none() {
            self.start_ordinal = Some(ordinal);
        }
    }
}

/// A decision rule that matched during an evaluation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoveredDecisionRule {
    decision_key: String,
    rule_id: String,
    decision_requirements_key: Option<String>,
}

impl CoveredDecisionRule {
    /// Create a record for a matched rule
    #[must_use]
    pub fn new(decision_key: impl Into<String>, rule_id: impl Into<String>) -> Self {
        Self {
            decision_key: decision_key.into(),
            rule_id: rule_id.into(),
            decision_requirements_key: None,
        }
    }

    /// Set the decision requirements graph the rule was evaluated through
    #[must_use]
    pub fn with_requirements_key(mut self, key: impl Into<String>) -> Self {
        self.decision_requirements_key = Some(key.into());
        self
    }

    /// Key of the decision owning the rule
    #[must_use]
    pub fn decision_key(&self) -> &str {
        &self.decision_key
    }

    /// Declared rule id
    #[must_use]
    pub fn rule_id(&self) -> &str {
        &self.rule_id
    }

    /// Requirements graph key, if evaluated as a required decision
    #[must_use]
    pub fn decision_requirements_key(&self) -> Option<&str> {
        self.decision_requirements_key.as_deref()
    }
}

/// Any observed element
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CoveredElement {
    /// Entered flow node
    FlowNode(CoveredFlowNode),
    /// Taken sequence flow
    SequenceFlow(CoveredSequenceFlow),
    /// Matched decision rule
    DecisionRule(CoveredDecisionRule),
}

impl CoveredElement {
    /// Definition key (process key, or decision key for rules)
    #[must_use]
    pub fn definition_key(&self) -> &str {
        match self {
            Self::FlowNode(node) => node.definition_key(),
            Self::SequenceFlow(flow) => flow.definition_key(),
            Self::DecisionRule(rule) => rule.decision_key(),
        }
    }

    /// Declared element id
    #[must_use]
    pub fn element_id(&self) -> &str {
        match self {
            Self::FlowNode(node) => node.element_id(),
            Self::SequenceFlow(flow) => flow.element_id(),
            Self::DecisionRule(rule) => rule.rule_id(),
        }
    }

    /// Element kind
    #[must_use]
    pub const fn kind(&self) -> ElementKind {
        match self {
            Self::FlowNode(_) => ElementKind::FlowNode,
            Self::SequenceFlow(_) => ElementKind::SequenceFlow,
            Self::DecisionRule(_) => ElementKind::DecisionRule,
        }
    }

    /// Coverage identity `(definition key, element id)`
    #[must_use]
    pub fn identity(&self) -> (&str, &str) {
        (self.definition_key(), self.element_id())
    }
}

impl From<CoveredFlowNode> for CoveredElement {
    fn from(node: CoveredFlowNode) -> Self {
        Self::FlowNode(node)
    }
}

impl From<CoveredSequenceFlow> for CoveredElement {
    fn from(flow: CoveredSequenceFlow) -> Self {
        Self::SequenceFlow(flow)
    }
}

impl From<CoveredDecisionRule> for CoveredElement {
    fn from(rule: CoveredDecisionRule) -> Self {
        Self::DecisionRule(rule)
    }
}

impl fmt::Display for CoveredElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}#{}",
            self.kind(),
            self.definition_key(),
            self.element_id()
        )
    }
}

/// Equality, hashing and ordering by coverage identity
macro_rules! identity_traits {
    ($ty:ty, $key:ident, $id:ident) => {
        impl PartialEq for $ty {
            fn eq(&self, other: &Self) -> bool {
                self.$key() == other.$key() && self.$id() == other.$id()
            }
        }

        impl Eq for $ty {}

        impl Hash for $ty {
            fn hash<H: Hasher>(&self, state: &mut H) {
                self.$key().hash(state);
                self.$id().hash(state);
            }
        }

        impl PartialOrd for $ty {
            fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
                Some(self.cmp(other))
            }
        }

        impl Ord for $ty {
            fn cmp(&self, other: &Self) -> Ordering {
                super::ordering::compare_identity(
                    (self.$key(), self.$id()),
                    (other.$key(), other.$id()),
                )
            }
        }
    };
}

identity_traits!(CoveredFlowNode, definition_key, element_id);
identity_traits!(CoveredSequenceFlow, definition_key, element_id);
identity_traits!(CoveredDecisionRule, decision_key, rule_id);
identity_traits!(CoveredElement, definition_key, element_id);
