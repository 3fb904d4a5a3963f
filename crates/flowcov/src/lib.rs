//! FlowCov: process graph coverage for workflow tests
//!
//! FlowCov records which flow nodes, sequence flows and decision rules a test
//! run reached in deployed BPMN processes and DMN decisions. Observations are
//! grouped per test method and rolled up per test class and per suite, and the
//! result is written as a JSON report.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    FLOWCOV Architecture                          │
//! ├─────────────────────────────────────────────────────────────────┤
//! │   ┌────────────┐    ┌────────────┐    ┌────────────┐            │
//! │   │ Engine     │    │ Coverage   │    │ Class /    │            │
//! │   │ listeners  │───►│ Sink       │───►│ Suite      │───► JSON   │
//! │   │            │    │            │    │ Aggregate  │    report  │
//! │   └────────────┘    └────────────┘    └────────────┘            │
//! │                           ▲                                      │
//! │                  ┌────────┴───────┐                              │
//! │                  │ Snapshot       │ (declared elements)          │
//! │                  │ Provider       │                              │
//! │                  └────────────────┘                              │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust
//! use flowcov::prelude::*;
//! use std::sync::Arc;
//!
//! let snapshot = GraphSnapshot::process("order")
//!     .flow_node("start", "startEvent")
//!     .flow_node("end", "endEvent")
//!     .sequence_flow("start->end", "start")
//!     .build();
//!
//! let mut method = MethodCoverage::new("deployment-1", "ships_order");
//! method.add_process_coverage(
//!     DefinitionInfo::new("order:1", "order", "order.bpmn"),
//!     Arc::new(snapshot),
//! );
//! method
//!     .add_covered_element(CoveredFlowNode::new("order", "start", "i1").into())
//!     .unwrap();
//!
//! let ratio = method.coverage_percentage_of("order").unwrap();
//! assert!((ratio - 1.0 / 3.0).abs() < f64::EPSILON);
//! ```

#![warn(missing_docs)]

/// Coverage model, aggregation, run state and reports
#[allow(missing_docs)]
pub mod coverage;
mod result;

pub use coverage::{
    AggregatedClassCoverage, CachingSnapshotProvider, ClassCoverage, ClassRunState,
    CoverageConfig, CoverageConfigBuilder, CoverageReport, CoverageSink, CoverageView,
    CoveredDecisionRule, CoveredElement, CoveredFlowNode, CoveredSequenceFlow,
    DecisionCoverage, DefinitionInfo, Deployment, ElementKind, GraphSnapshot, MethodCoverage,
    MinimumCoverage, ModelSet, ModelSnapshotProvider, ProcessCoverage, SnapshotProvider,
    SuiteRunState,
};
pub use result::{FlowcovError, FlowcovResult};

/// Prelude for convenient imports
pub mod prelude {
    pub use super::coverage::{
        coverage_ratio, format_ratio, AggregatedClassCoverage, CachingSnapshotProvider,
        ClassCoverage, ClassRunState, CoverageConfig, CoverageReport, CoverageSink,
        CoverageView, CoveredDecisionRule, CoveredElement, CoveredFlowNode, CoveredSequenceFlow,
        DefinitionInfo, Deployment, GraphSnapshot, MethodCoverage, MinimumCoverage,
        ModelSnapshotProvider, SnapshotProvider, SuiteRunState,
    };
    pub use super::result::{FlowcovError, FlowcovResult};
}
