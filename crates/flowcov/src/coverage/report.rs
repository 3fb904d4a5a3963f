//! Coverage Report
//!
//! JSON document describing one class or a whole suite:
//! - one entry per deployed process model and decision model
//! - per test class and test method, the covered element ids with their
//!   execution ordinals
//!
//! Undefined ratios are written as `null`.

use super::aggregated::AggregatedClassCoverage;
use super::class::ClassCoverage;
use super::config::REPORT_FILE_NAME;
use super::element::{CoveredDecisionRule, CoveredFlowNode, CoveredSequenceFlow};
use super::ratio::defined;
use super::snapshot::{DefinitionInfo, GraphSnapshot};
use super::view::CoverageView;
use crate::result::FlowcovResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Report over one class or one suite
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverageReport {
    /// Unique report id
    pub id: Uuid,
    /// Generation time
    pub generated_at: DateTime<Utc>,
    /// Class name, or suite name for aggregated reports
    pub name: String,
    /// Ratio over every process model in the report
    pub coverage: Option<f64>,
    /// Process models ordered by resource name then key
    pub process_models: Vec<ProcessModelReport>,
    /// Decision models ordered by resource name then key
    pub decision_models: Vec<DecisionModelReport>,
}

/// One process model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessModelReport {
    pub process_definition_key: String,
    pub name: Option<String>,
    pub resource_name: String,
    pub version: Option<String>,
    /// Content digest of the declared elements
    pub digest: String,
    /// Declared flow nodes plus sequence flows
    pub total_element_count: usize,
    pub coverage: Option<f64>,
    pub test_classes: Vec<TestClassReport>,
}

/// One class within a process model entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestClassReport {
    pub name: String,
    pub coverage: Option<f64>,
    pub test_methods: Vec<TestMethodReport>,
}

/// One method within a process model entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestMethodReport {
    pub name: String,
    pub coverage: Option<f64>,
    /// Flow node records in execution order
    pub flow_nodes: Vec<FlowNodeReport>,
    /// Sequence flow records in execution order
    pub sequence_flows: Vec<SequenceFlowReport>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowNodeReport {
    pub key: String,
    pub element_type: String,
    pub start_ordinal: Option<u64>,
    pub end_ordinal: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceFlowReport {
    pub key: String,
    pub start_ordinal: Option<u64>,
}

/// One decision model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionModelReport {
    pub decision_key: String,
    pub name: Option<String>,
    pub resource_name: String,
    pub version: Option<String>,
    pub rule_count: usize,
    pub coverage: Option<f64>,
    pub test_classes: Vec<DecisionClassReport>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionClassReport {
    pub name: String,
    pub coverage: Option<f64>,
    pub test_methods: Vec<DecisionMethodReport>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionMethodReport {
    pub name: String,
    pub coverage: Option<f64>,
    /// Rule records in evaluation order
    pub rules: Vec<RuleReport>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleReport {
    pub key: String,
    pub decision_requirements_key: Option<String>,
}

impl From<&CoveredFlowNode> for FlowNodeReport {
    fn from(node: &CoveredFlowNode) -> Self {
        Self {
            key: node.element_id().to_string(),
            element_type: node.element_type().to_string(),
            start_ordinal: node.start_ordinal(),
            end_ordinal: node.end_ordinal(),
        }
    }
}

impl FlowNodeReport {
    /// Entry for `node`, typed from `snapshot` when the observation carried no type
    fn observed(node: &CoveredFlowNode, snapshot: &GraphSnapshot) -> Self {
        let mut report = Self::from(node);
        if report.element_type.is_empty() {
            if let Some(declared) = snapshot.element_type(node.element_id()) {
                report.element_type = declared.to_string();
            }
        }
        report
    }
}

impl From<&CoveredSequenceFlow> for SequenceFlowReport {
    fn from(flow: &CoveredSequenceFlow) -> Self {
        Self {
            key: flow.element_id().to_string(),
            start_ordinal: flow.start_ordinal(),
        }
    }
}

impl From<&CoveredDecisionRule> for RuleReport {
    fn from(rule: &CoveredDecisionRule) -> Self {
        Self {
            key: rule.rule_id().to_string(),
            decision_requirements_key: rule.decision_requirements_key().map(str::to_string),
        }
    }
}

impl CoverageReport {
    /// Report over one class
    ///
    /// The class must have passed the deployment equality check.
    pub fn from_class(class: &ClassCoverage) -> FlowcovResult<Self> {
        let aggregate = AggregatedClassCoverage::new([class]);
        Self::from_aggregated(class.name(), &aggregate)
    }

    /// Report over several classes
    pub fn from_aggregated(
        name: impl Into<String>,
        aggregate: &AggregatedClassCoverage<'_>,
    ) -> FlowcovResult<Self> {
        let process_models = aggregate
            .process_definitions()?
            .into_iter()
            .map(|definition| process_model(aggregate, definition))
            .collect::<FlowcovResult<Vec<_>>>()?;
        let decision_models = aggregate
            .decision_definitions()?
            .into_iter()
            .map(|definition| decision_model(aggregate, definition))
            .collect::<FlowcovResult<Vec<_>>>()?;

        Ok(Self {
            id: Uuid::new_v4(),
            generated_at: Utc::now(),
            name: name.into(),
            coverage: defined(aggregate.coverage_percentage()?),
            process_models,
            decision_models,
        })
    }

    /// Process model entry for a key
    #[must_use]
    pub fn process_model(&self, definition_key: &str) -> Option<&ProcessModelReport> {
        self.process_models
            .iter()
            .find(|model| model.process_definition_key == definition_key)
    }

    /// Decision model entry for a key
    #[must_use]
    pub fn decision_model(&self, decision_key: &str) -> Option<&DecisionModelReport> {
        self.decision_models
            .iter()
            .find(|model| model.decision_key == decision_key)
    }

    /// Write pretty JSON to `<dir>/<name>/flowCovReport.json`
    pub fn write_to(&self, dir: impl AsRef<Path>) -> FlowcovResult<PathBuf> {
        let target_dir = dir.as_ref().join(&self.name);
        std::fs::create_dir_all(&target_dir)?;
        let path = target_dir.join(REPORT_FILE_NAME);
        std::fs::write(&path, serde_json::to_string_pretty(self)?)?;
        tracing::info!(path = %path.display(), "wrote coverage report");
        Ok(path)
    }

    /// Read a report written by [`Self::write_to`]
    pub fn load(path: impl AsRef<Path>) -> FlowcovResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}

fn process_model(
    aggregate: &AggregatedClassCoverage<'_>,
    definition: &DefinitionInfo,
) -> FlowcovResult<ProcessModelReport> {
    let key = definition.key.as_str();
    let snapshot = aggregate.reference_snapshot(key)?;

    let mut test_classes = Vec::new();
    for class in aggregate.classes_with_process(key)? {
        let test_methods = class
            .test_methods()
            .filter_map(|method| method.process(key).ok().map(|process| (method, process)))
            .map(|(method, process)| TestMethodReport {
                name: method.name().to_string(),
                coverage: defined(process.coverage_percentage()),
                flow_nodes: process
                    .flow_node_records()
                    .iter()
                    .map(|node| FlowNodeReport::observed(node, snapshot))
                    .collect(),
                sequence_flows: process
                    .sequence_flow_records()
                    .iter()
                    .map(Into::into)
                    .collect(),
            })
            .collect();
        test_classes.push(TestClassReport {
            name: class.name().to_string(),
            coverage: defined(class.coverage_percentage_of(key)?),
            test_methods,
        });
    }

    Ok(ProcessModelReport {
        process_definition_key: definition.key.clone(),
        name: definition.name.clone(),
        resource_name: definition.resource_name.clone(),
        version: definition.version_tag.clone(),
        digest: snapshot.digest(),
        total_element_count: snapshot.element_count(),
        coverage: defined(aggregate.coverage_percentage_of(key)?),
        test_classes,
    })
}

fn decision_model(
    aggregate: &AggregatedClassCoverage<'_>,
    definition: &DefinitionInfo,
) -> FlowcovResult<DecisionModelReport> {
    let key = definition.key.as_str();
    let snapshot = aggregate.reference_decision_snapshot(key)?;

    let mut test_classes = Vec::new();
    for class in aggregate.classes_with_decision(key)? {
        let test_methods = class
            .test_methods()
            .filter_map(|method| method.decision(key).ok().map(|decision| (method, decision)))
            .map(|(method, decision)| DecisionMethodReport {
                name: method.name().to_string(),
                coverage: defined(decision.coverage_percentage()),
                rules: decision.rule_records().iter().map(Into::into).collect(),
            })
            .collect();
        test_classes.push(DecisionClassReport {
            name: class.name().to_string(),
            coverage: defined(class.decision_coverage_percentage(key)?),
            test_methods,
        });
    }

    Ok(DecisionModelReport {
        decision_key: definition.key.clone(),
        name: definition.name.clone(),
        resource_name: definition.resource_name.clone(),
        version: definition.version_tag.clone(),
        rule_count: snapshot.rule_count(),
        coverage: defined(aggregate.decision_coverage_percentage(key)?),
        test_classes,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::coverage::{GraphSnapshot, MethodCoverage};
    use std::sync::Arc;

    fn class() -> ClassCoverage {
        let snapshot = Arc::new(
            GraphSnapshot::process("order")
                .flow_node("Start", "startEvent")
                .flow_node("End", "endEvent")
                .sequence_flow("Start->End", "Start")
                .build(),
        );
        let dish = Arc::new(GraphSnapshot::decision("dish", ["r1", "r2"]));
        let mut class = ClassCoverage::new("OrderTest");
        for name in ["b_second", "a_first"] {
            let mut method = MethodCoverage::new("d1", name);
            method.add_process_coverage(
                DefinitionInfo::new("order:1", "order", "order.bpmn").with_version_tag("1.0"),
                Arc::clone(&snapshot),
            );
            method.add_decision_coverage(
                DefinitionInfo::new("dish:1", "dish", "dish.dmn"),
                Arc::clone(&dish),
            );
            class.add_test_method_coverage(method);
        }
        class
            .add_covered_element(
                "a_first",
                CoveredFlowNode::new("order", "Start", "i1")
                    .with_type("startEvent")
                    .with_start_ordinal(1)
                    .with_end_ordinal(2)
                    .into(),
            )
            .unwrap();
        class
            .add_covered_decision_rules("b_second", [CoveredDecisionRule::new("dish", "r2")])
            .unwrap();
        class
    }

    #[test]
    fn test_from_class() {
        let report = CoverageReport::from_class(&class()).unwrap();
        assert_eq!(report.name, "OrderTest");
        assert_eq!(report.coverage, Some(1.0 / 3.0));

        let model = report.process_model("order").unwrap();
        assert_eq!(model.total_element_count, 3);
        assert_eq!(model.version.as_deref(), Some("1.0"));
        assert_eq!(model.digest.len(), 64);
        let methods: Vec<&str> = model.test_classes[0]
            .test_methods
            .iter()
            .map(|m| m.name.as_str())
            .collect();
        assert_eq!(methods, vec!["a_first", "b_second"]);
        let node = &model.test_classes[0].test_methods[0].flow_nodes[0];
        assert_eq!(node.key, "Start");
        assert_eq!(node.end_ordinal, Some(2));

        let decision = report.decision_model("dish").unwrap();
        assert_eq!(decision.rule_count, 2);
        assert_eq!(decision.coverage, Some(0.5));
    }

    #[test]
    fn test_untyped_node_takes_declared_type() {
        let mut class = class();
        class
            .add_covered_element("b_second", CoveredFlowNode::new("order", "End", "i9").into())
            .unwrap();
        let report = CoverageReport::from_class(&class).unwrap();
        let model = report.process_model("order").unwrap();
        let methods = &model.test_classes[0].test_methods;
        assert_eq!(methods[0].flow_nodes[0].element_type, "startEvent");
        let end = &methods[1].flow_nodes[0];
        assert_eq!(end.key, "End");
        assert_eq!(end.element_type, "endEvent");
    }

    #[test]
    fn test_undefined_ratio_serializes_as_null() {
        let mut class = ClassCoverage::new("EmptyModel");
        let mut method = MethodCoverage::new("d1", "m");
        method.add_process_coverage(
            DefinitionInfo::new("blank:1", "blank", "blank.bpmn"),
            Arc::new(GraphSnapshot::process("blank").build()),
        );
        class.add_test_method_coverage(method);

        let report = CoverageReport::from_class(&class).unwrap();
        let json = serde_json::to_value(&report).unwrap();
        assert!(json["coverage"].is_null());
        assert!(json["process_models"][0]["coverage"].is_null());
    }

    #[test]
    fn test_write_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let report = CoverageReport::from_class(&class()).unwrap();
        let path = report.write_to(dir.path()).unwrap();
        assert!(path.ends_with("OrderTest/flowCovReport.json"));
        let loaded = CoverageReport::load(&path).unwrap();
        assert_eq!(loaded.id, report.id);
        assert_eq!(loaded.generated_at, report.generated_at);
        assert_eq!(
            loaded.process_models[0].test_classes[0].test_methods[0].flow_nodes,
            report.process_models[0].test_classes[0].test_methods[0].flow_nodes
        );
        assert_eq!(loaded.decision_models, report.decision_models);
        assert!((loaded.coverage.unwrap() - report.coverage.unwrap()).abs() < 1e-12);
    }
}
