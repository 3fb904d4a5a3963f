//! Graph Snapshots
//!
//! The declared side of a coverage ratio: every flow node, sequence flow or
//! decision rule of one deployed definition that counts towards coverage.
//! Snapshots are fetched once per definition id from a [`SnapshotProvider`]
//! and shared behind an [`Arc`].

use crate::result::FlowcovResult;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

/// One deployed process or decision definition
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DefinitionInfo {
    /// Deployment specific id
    pub id: String,
    /// Stable definition key
    pub key: String,
    /// Display name
    pub name: Option<String>,
    /// Resource the definition was parsed from (e.g. `order.bpmn`)
    pub resource_name: String,
    /// Version tag, if the resource declares one
    pub version_tag: Option<String>,
}

impl DefinitionInfo {
    /// Create a definition description
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        key: impl Into<String>,
        resource_name: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            key: key.into(),
            name: None,
            resource_name: resource_name.into(),
            version_tag: None,
        }
    }

    /// Set the display name
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the version tag
    #[must_use]
    pub fn with_version_tag(mut self, version_tag: impl Into<String>) -> Self {
        self.version_tag = Some(version_tag.into());
        self
    }

    /// Deployment comparison key: resource first, so that two resources
    /// declaring the same key stay distinct
    #[must_use]
    pub fn resource_identity(&self) -> (&str, &str) {
        (&self.resource_name, &self.key)
    }
}

impl fmt::Display for DefinitionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.key, self.resource_name)
    }
}

/// Declared elements of one definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    definition_key: String,
    /// Flow node id -> element type
    flow_nodes: BTreeMap<String, String>,
    sequence_flows: BTreeSet<String>,
    decision_rules: BTreeSet<String>,
}

impl GraphSnapshot {
    /// Start building a process snapshot
    #[must_use]
    pub fn process(definition_key: impl Into<String>) -> GraphSnapshotBuilder {
        GraphSnapshotBuilder {
            definition_key: definition_key.into(),
            flow_nodes: BTreeMap::new(),
            sequence_flows: Vec::new(),
        }
    }

    /// Create a decision snapshot from the rules of that decision
    #[must_use]
    pub fn decision<I, S>(decision_key: impl Into<String>, rules: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            definition_key: decision_key.into(),
            flow_nodes: BTreeMap::new(),
            sequence_flows: BTreeSet::new(),
            decision_rules: rules.into_iter().map(Into::into).collect(),
        }
    }

    /// Definition key
    #[must_use]
    pub fn definition_key(&self) -> &str {
        &self.definition_key
    }

    /// Declared flow node ids in canonical order
    pub fn flow_node_ids(&self) -> impl Iterator<Item = &str> {
        self.flow_nodes.keys().map(String::as_str)
    }

    /// Declared sequence flow ids in canonical order
    pub fn sequence_flow_ids(&self) -> impl Iterator<Item = &str> {
        self.sequence_flows.iter().map(String::as_str)
    }

    /// Declared decision rule ids in canonical order
    pub fn decision_rule_ids(&self) -> impl Iterator<Item = &str> {
        self.decision_rules.iter().map(String::as_str)
    }

    /// Element type of a declared flow node
    #[must_use]
    pub fn element_type(&self, flow_node_id: &str) -> Option<&str> {
        self.flow_nodes.get(flow_node_id).map(String::as_str)
    }

    /// Whether a flow node is declared
    #[must_use]
    pub fn declares_flow_node(&self, id: &str) -> bool {
        self.flow_nodes.contains_key(id)
    }

    /// Whether a sequence flow is declared
    #[must_use]
    pub fn declares_sequence_flow(&self, id: &str) -> bool {
        self.sequence_flows.contains(id)
    }

    /// Whether a decision rule is declared
    #[must_use]
    pub fn declares_rule(&self, id: &str) -> bool {
        self.decision_rules.contains(id)
    }

    /// Number of declared flow nodes
    #[must_use]
    pub fn flow_node_count(&self) -> usize {
        self.flow_nodes.len()
    }

    /// Number of declared sequence flows
    #[must_use]
    pub fn sequence_flow_count(&self) -> usize {
        self.sequence_flows.len()
    }

    /// Number of declared flow nodes plus sequence flows
    #[must_use]
    pub fn element_count(&self) -> usize {
        self.flow_nodes.len() + self.sequence_flows.len()
    }

    /// Number of declared decision rules
    #[must_use]
    pub fn rule_count(&self) -> usize {
        self.decision_rules.len()
    }

    /// Identities of all declared flow nodes and sequence flows
    pub fn element_identities(&self) -> impl Iterator<Item = (&str, &str)> {
        let key = self.definition_key.as_str();
        self.flow_node_ids()
            .chain(self.sequence_flow_ids())
            .map(move |id| (key, id))
    }

    /// Identities of all declared decision rules
    pub fn rule_identities(&self) -> impl Iterator<Item = (&str, &str)> {
        let key = self.definition_key.as_str();
        self.decision_rule_ids().map(move |id| (key, id))
    }

    /// Hex SHA-256 over the canonical element listing
    #[must_use]
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.definition_key.as_bytes());
        for (id, element_type) in &self.flow_nodes {
            hasher.update(b"\x00n");
            hasher.update(id.as_bytes());
            hasher.update(b"\x00");
            hasher.update(element_type.as_bytes());
        }
        for id in &self.sequence_flows {
            hasher.update(b"\x00f");
            hasher.update(id.as_bytes());
        }
        for id in &self.decision_rules {
            hasher.update(b"\x00r");
            hasher.update(id.as_bytes());
        }
        let result = hasher.finalize();
        format!("{result:x}")
    }
}

/// Builder for process snapshots
#[derive(Debug)]
pub struct GraphSnapshotBuilder {
    definition_key: String,
    flow_nodes: BTreeMap<String, String>,
    sequence_flows: Vec<(String, String)>,
}

impl GraphSnapshotBuilder {
    /// Declare a flow node
    #[must_use]
    pub fn flow_node(mut self, id: impl Into<String>, element_type: impl Into<String>) -> Self {
        self.flow_nodes.insert(id.into(), element_type.into());
        self
    }

    /// Declare a sequence flow leaving `source`
    #[must_use]
    pub fn sequence_flow(mut self, id: impl Into<String>, source: impl Into<String>) -> Self {
        self.sequence_flows.push((id.into(), source.into()));
        self
    }

    /// Build the snapshot
    ///
    /// Sequence flows whose source is not a declared flow node are dropped.
    #[must_use]
    pub fn build(self) -> GraphSnapshot {
        let flow_nodes = self.flow_nodes;
        let sequence_flows = self
            .sequence_flows
            .into_iter()
            .filter(|(_, source)| flow_nodes.contains_key(source))
            .map(|(id, _)| id)
            .collect();
        GraphSnapshot {
            definition_key: self.definition_key,
            flow_nodes,
            sequence_flows,
            decision_rules: BTreeSet::new(),
        }
    }
}

/// Source of graph snapshots for deployed definitions
///
/// Implementations may parse resources and are treated as slow and
/// fallible; wrap them in a [`CachingSnapshotProvider`].
pub trait SnapshotProvider {
    /// Declared flow nodes and sequence flows of a process definition
    fn process_snapshot(&self, definition: &DefinitionInfo) -> FlowcovResult<Arc<GraphSnapshot>>;

    /// Declared rules of a decision definition
    fn decision_snapshot(&self, definition: &DefinitionInfo)
        -> FlowcovResult<Arc<GraphSnapshot>>;
}

impl<P: SnapshotProvider + ?Sized> SnapshotProvider for &P {
    fn process_snapshot(&self, definition: &DefinitionInfo) -> FlowcovResult<Arc<GraphSnapshot>> {
        (**self).process_snapshot(definition)
    }

    fn decision_snapshot(
        &self,
        definition: &DefinitionInfo,
    ) -> FlowcovResult<Arc<GraphSnapshot>> {
        (**self).decision_snapshot(definition)
    }
}

/// Memoizes snapshots per definition id
#[derive(Debug)]
pub struct CachingSnapshotProvider<P> {
    inner: P,
    processes: Mutex<HashMap<String, Arc<GraphSnapshot>>>,
    decisions: Mutex<HashMap<String, Arc<GraphSnapshot>>>,
}

impl<P: SnapshotProvider> CachingSnapshotProvider<P> {
    /// Wrap a provider
    #[must_use]
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            processes: Mutex::new(HashMap::new()),
            decisions: Mutex::new(HashMap::new()),
        }
    }

    /// Number of cached snapshots
    #[must_use]
    pub fn cached(&self) -> usize {
        let processes = self.processes.lock().unwrap_or_else(PoisonError::into_inner);
        let decisions = self.decisions.lock().unwrap_or_else(PoisonError::into_inner);
        processes.len() + decisions.len()
    }

    /// The wrapped provider
    #[must_use]
    pub const fn inner(&self) -> &P {
        &self.inner
    }

    fn fetch(
        cache: &Mutex<HashMap<String, Arc<GraphSnapshot>>>,
        definition: &DefinitionInfo,
        load: impl FnOnce() -> FlowcovResult<Arc<GraphSnapshot>>,
    ) -> FlowcovResult<Arc<GraphSnapshot>> {
        if let Some(hit) = cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&definition.id)
        {
            return Ok(Arc::clone(hit));
        }
        let snapshot = load()?;
        tracing::debug!(
            definition_id = %definition.id,
            elements = snapshot.element_count(),
            rules = snapshot.rule_count(),
            "cached graph snapshot"
        );
        cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(definition.id.clone(), Arc::clone(&snapshot));
        Ok(snapshot)
    }
}

impl<P: SnapshotProvider> SnapshotProvider for CachingSnapshotProvider<P> {
    fn process_snapshot(&self, definition: &DefinitionInfo) -> FlowcovResult<Arc<GraphSnapshot>> {
        Self::fetch(&self.processes, definition, || {
            self.inner.process_snapshot(definition)
        })
    }

    fn decision_snapshot(
        &self,
        definition: &DefinitionInfo,
    ) -> FlowcovResult<Arc<GraphSnapshot>> {
        Self::fetch(&self.decisions, definition, || {
            self.inner.decision_snapshot(definition)
        })
    }
}
