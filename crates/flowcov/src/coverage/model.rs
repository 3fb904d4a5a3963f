//! Process and decision models described in YAML
//!
//! A [`ModelSnapshotProvider`] answers snapshot requests from these models,
//! applying the counting rules: flow nodes only of executable processes,
//! sequence flows only when their source node counts, rules only of the
//! requested decision.

use super::collector::Deployment;
use super::snapshot::{DefinitionInfo, GraphSnapshot, SnapshotProvider};
use crate::result::{FlowcovError, FlowcovResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

/// Every model a run may deploy
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelSet {
    #[serde(default)]
    pub processes: Vec<ProcessModel>,
    #[serde(default)]
    pub decisions: Vec<DecisionModel>,
}

/// One BPMN resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProcessModel {
    pub resource_name: String,
    pub processes: Vec<ProcessElement>,
}

/// One process of a BPMN resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProcessElement {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default = "executable_by_default")]
    pub executable: bool,
    #[serde(default)]
    pub version_tag: Option<String>,
    #[serde(default)]
    pub flow_nodes: Vec<FlowNodeElement>,
    #[serde(default)]
    pub sequence_flows: Vec<SequenceFlowElement>,
}

const fn executable_by_default() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FlowNodeElement {
    pub id: String,
    #[serde(rename = "type")]
    pub element_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SequenceFlowElement {
    pub id: String,
    pub source: String,
    pub target: String,
}

/// One DMN resource, possibly a requirements graph of several decisions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DecisionModel {
    pub resource_name: String,
    /// Requirements graph id
    #[serde(default)]
    pub id: Option<String>,
    pub decisions: Vec<DecisionElement>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DecisionElement {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub version_tag: Option<String>,
    #[serde(default)]
    pub rules: Vec<String>,
}

impl ModelSet {
    /// Parse a YAML document
    pub fn from_yaml_str(text: &str) -> FlowcovResult<Self> {
        Ok(serde_yaml_ng::from_str(text)?)
    }

    /// Load a YAML file
    pub fn load(path: impl AsRef<Path>) -> FlowcovResult<Self> {
        Self::from_yaml_str(&std::fs::read_to_string(path)?)
    }

    fn process(&self, resource_name: &str, key: &str) -> Option<&ProcessElement> {
        self.processes
            .iter()
            .filter(|model| model.resource_name == resource_name)
            .flat_map(|model| &model.processes)
            .find(|process| process.id == key)
    }

    fn decision(&self, resource_name: &str, key: &str) -> Option<&DecisionElement> {
        self.decisions
            .iter()
            .filter(|model| model.resource_name == resource_name)
            .flat_map(|model| &model.decisions)
            .find(|decision| decision.id == key)
    }
}

/// Snapshot provider over an in-memory [`ModelSet`]
#[derive(Debug, Clone, Default)]
pub struct ModelSnapshotProvider {
    models: ModelSet,
}

impl ModelSnapshotProvider {
    #[must_use]
    pub const fn new(models: ModelSet) -> Self {
        Self { models }
    }

    /// Load models from a YAML file
    pub fn load(path: impl AsRef<Path>) -> FlowcovResult<Self> {
        Ok(Self::new(ModelSet::load(path)?))
    }

    #[must_use]
    pub const fn models(&self) -> &ModelSet {
        &self.models
    }

    /// Describe what deploying `resources` installs
    ///
    /// Non-executable processes are not deployed as definitions.
    pub fn deployment(&self, deployment_id: &str, resources: &[String]) -> FlowcovResult<Deployment> {
        let mut deployment = Deployment {
            id: deployment_id.to_string(),
            ..Deployment::default()
        };
        for resource in resources {
            let mut found = false;
            for model in self.models.processes.iter().filter(|m| &m.resource_name == resource) {
                found = true;
                for process in model.processes.iter().filter(|p| p.executable) {
                    let mut info = DefinitionInfo::new(
                        format!("{}:{deployment_id}", process.id),
                        process.id.clone(),
                        resource.clone(),
                    );
                    info.name.clone_from(&process.name);
                    info.version_tag.clone_from(&process.version_tag);
                    deployment.processes.push(info);
                }
            }
            for model in self.models.decisions.iter().filter(|m| &m.resource_name == resource) {
                found = true;
                for decision in &model.decisions {
                    let mut info = DefinitionInfo::new(
                        format!("{}:{deployment_id}", decision.id),
                        decision.id.clone(),
                        resource.clone(),
                    );
                    info.name.clone_from(&decision.name);
                    info.version_tag.clone_from(&decision.version_tag);
                    deployment.decisions.push(info);
                }
            }
            if !found {
                return Err(FlowcovError::SnapshotUnavailable {
                    definition_id: resource.clone(),
                    message: "resource is not part of the model set".to_string(),
                });
            }
        }
        Ok(deployment)
    }
}

fn unavailable(definition: &DefinitionInfo) -> FlowcovError {
    FlowcovError::SnapshotUnavailable {
        definition_id: definition.id.clone(),
        message: format!(
            "no definition '{}' in resource '{}'",
            definition.key, definition.resource_name
        ),
    }
}

impl SnapshotProvider for ModelSnapshotProvider {
    fn process_snapshot(&self, definition: &DefinitionInfo) -> FlowcovResult<Arc<GraphSnapshot>> {
        let process = self
            .models
            .process(&definition.resource_name, &definition.key)
            .ok_or_else(|| unavailable(definition))?;
        let mut builder = GraphSnapshot::process(definition.key.clone());
        if process.executable {
            for node in &process.flow_nodes {
                builder = builder.flow_node(node.id.clone(), node.element_type.clone());
            }
        }
        for flow in &process.sequence_flows {
            builder = builder.sequence_flow(flow.id.clone(), flow.source.clone());
        }
        Ok(Arc::new(builder.build()))
    }

    fn decision_snapshot(&self, definition: &DefinitionInfo) -> FlowcovResult<Arc<GraphSnapshot>> {
        let decision = self
            .models
            .decision(&definition.resource_name, &definition.key)
            .ok_or_else(|| unavailable(definition))?;
        Ok(Arc::new(GraphSnapshot::decision(
            definition.key.clone(),
            decision.rules.iter().cloned(),
        )))
    }
}
