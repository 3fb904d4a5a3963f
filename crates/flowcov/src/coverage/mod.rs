//! Process Graph Coverage
//!
//! Records which flow nodes, sequence flows and decision rules of deployed
//! process and decision definitions a test run reached, and rolls that up
//! per method, per class and per suite.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  FLOWCOV COVERAGE ARCHITECTURE                                   │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  Engine glue → CoverageSink → ClassCoverage → Aggregated → Report│
//! │                    ↓               ↓                             │
//! │            MethodCoverage   SnapshotProvider (declared side)     │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Ratios divide the union of covered elements by the declared elements of
//! the scope. A scope without declared elements has an undefined (NaN) ratio.

mod aggregated;
mod class;
mod collector;
mod config;
mod definition;
mod element;
mod method;
mod model;
mod ordering;
mod ratio;
mod report;
mod snapshot;
#[cfg(any(test, feature = "proptest"))]
pub mod strategies;
mod threshold;
mod view;

pub use aggregated::AggregatedClassCoverage;
pub use class::ClassCoverage;
pub use collector::{
    ClassRunState, CoverageSink, DeployedDefinition, Deployment, ResolvedDeployment, SuiteRunState,
};
pub use config::{CoverageConfig, CoverageConfigBuilder, DEFAULT_REPORT_DIR, REPORT_FILE_NAME};
pub use definition::{DecisionCoverage, ProcessCoverage};
pub use element::{
    CoveredDecisionRule, CoveredElement, CoveredFlowNode, CoveredSequenceFlow, ElementKind,
};
pub use method::MethodCoverage;
pub use model::{
    DecisionElement, DecisionModel, FlowNodeElement, ModelSet, ModelSnapshotProvider,
    ProcessElement, ProcessModel, SequenceFlowElement,
};
pub use ordering::{canonical, compare_identity, merge_canonical};
pub use ratio::{coverage_ratio, defined, format_ratio};
pub use report::{
    CoverageReport, DecisionClassReport, DecisionMethodReport, DecisionModelReport,
    FlowNodeReport, ProcessModelReport, RuleReport, SequenceFlowReport, TestClassReport,
    TestMethodReport,
};
pub use snapshot::{
    CachingSnapshotProvider, DefinitionInfo, GraphSnapshot, GraphSnapshotBuilder, SnapshotProvider,
};
pub use threshold::MinimumCoverage;
pub use view::CoverageView;

#[cfg(test)]
mod tests;
