//! Scenario and property tests for process graph coverage
//!
//! Each module checks one behavior across the whole hierarchy rather than a
//! single type.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::float_cmp,
    clippy::redundant_clone
)]

use super::*;
use std::collections::BTreeSet;
use std::sync::Arc;

fn order_snapshot() -> Arc<GraphSnapshot> {
    Arc::new(
        GraphSnapshot::process("Order")
            .flow_node("Start", "startEvent")
            .flow_node("Pay", "serviceTask")
            .flow_node("End", "endEvent")
            .sequence_flow("Start->Pay", "Start")
            .sequence_flow("Pay->End", "Pay")
            .build(),
    )
}

fn order_method(name: &str, resource: &str) -> MethodCoverage {
    let mut method = MethodCoverage::new(format!("deployment-{name}"), name);
    method.add_process_coverage(
        DefinitionInfo::new(format!("Order:{name}"), "Order", resource),
        order_snapshot(),
    );
    method
}

// ============================================================================
// End-to-end: the Order process
// ============================================================================

mod order_scenario_tests {
    use super::*;

    fn happy_path(method: &mut MethodCoverage) {
        method
            .add_covered_element(CoveredFlowNode::new("Order", "Start", "s1").into())
            .unwrap();
        method
            .add_covered_element(CoveredSequenceFlow::new("Order", "Start->Pay").into())
            .unwrap();
        method
            .add_covered_element(CoveredFlowNode::new("Order", "Pay", "p1").into())
            .unwrap();
        method
            .end_covered_element(&CoveredFlowNode::new("Order", "Pay", "p1"))
            .unwrap();
        method
            .add_covered_element(CoveredSequenceFlow::new("Order", "Pay->End").into())
            .unwrap();
        method
            .add_covered_element(CoveredFlowNode::new("Order", "End", "e1").into())
            .unwrap();
    }

    #[test]
    fn test_full_path_covers_everything() {
        let mut m1 = order_method("m1", "order.bpmn");
        happy_path(&mut m1);
        assert_eq!(m1.coverage_percentage_of("Order").unwrap(), 1.0);
        assert_eq!(m1.coverage_percentage().unwrap(), 1.0);
    }

    #[test]
    fn test_partial_method_and_class_union() {
        let mut m1 = order_method("m1", "order.bpmn");
        happy_path(&mut m1);
        let mut m2 = order_method("m2", "order.bpmn");
        m2.add_covered_element(CoveredFlowNode::new("Order", "Start", "s2").into())
            .unwrap();

        assert_eq!(m2.coverage_percentage_of("Order").unwrap(), 0.2);

        let mut class = ClassCoverage::new("OrderTest");
        class.add_test_method_coverage(m1);
        class.add_test_method_coverage(m2);
        class.assert_all_deployments_equal().unwrap();
        assert_eq!(class.coverage_percentage_of("Order").unwrap(), 1.0);

        let ids = class.covered_flow_node_ids("Order").unwrap();
        let expected: BTreeSet<String> =
            ["End", "Pay", "Start"].iter().map(|s| (*s).to_string()).collect();
        assert_eq!(ids, expected);
    }
}

// ============================================================================
// Identity and deduplication
// ============================================================================

mod identity_tests {
    use super::*;

    #[test]
    fn test_same_identity_different_instances_count_once() {
        let mut method = order_method("m1", "order.bpmn");
        for instance in ["a", "b", "c"] {
            method
                .add_covered_element(CoveredFlowNode::new("Order", "Pay", instance).into())
                .unwrap();
            method
                .end_covered_element(&CoveredFlowNode::new("Order", "Pay", instance))
                .unwrap();
        }
        assert_eq!(method.covered_flow_nodes("Order").unwrap().len(), 1);
        assert_eq!(method.coverage_percentage_of("Order").unwrap(), 0.2);
    }

    #[test]
    fn test_repeated_sequence_flow_counts_once() {
        let mut method = order_method("m1", "order.bpmn");
        for _ in 0..4 {
            method
                .add_covered_element(CoveredSequenceFlow::new("Order", "Start->Pay").into())
                .unwrap();
        }
        let process = method.process("Order").unwrap();
        assert_eq!(process.sequence_flow_records().len(), 4);
        assert_eq!(process.covered_sequence_flows().len(), 1);
    }
}

// ============================================================================
// Parallel branches: interleaved instances of one node
// ============================================================================

mod concurrency_tests {
    use super::*;

    #[test]
    fn test_interleaved_instances_close_independently() {
        let mut method = order_method("m1", "order.bpmn");
        method
            .add_covered_element(CoveredFlowNode::new("Order", "Pay", "branch-1").into())
            .unwrap();
        method
            .add_covered_element(CoveredFlowNode::new("Order", "Pay", "branch-2").into())
            .unwrap();
        method
            .end_covered_element(&CoveredFlowNode::new("Order", "Pay", "branch-1").with_end_ordinal(5))
            .unwrap();
        method
            .end_covered_element(&CoveredFlowNode::new("Order", "Pay", "branch-2").with_end_ordinal(6))
            .unwrap();

        let process = method.process("Order").unwrap();
        assert_eq!(process.flow_node_records().len(), 1);
        assert_eq!(process.flow_node_records()[0].end_ordinal(), Some(5));
        assert!(method
            .end_covered_element(&CoveredFlowNode::new("Order", "Pay", "branch-2"))
            .is_err());
    }
}

// ============================================================================
// Deployment equality
// ============================================================================

mod deployment_tests {
    use super::*;

    #[test]
    fn test_same_key_different_resource_is_inconsistent() {
        let mut class = ClassCoverage::new("OrderTest");
        class.add_test_method_coverage(order_method("a", "P1.bpmn"));
        class.add_test_method_coverage(order_method("b", "P2.bpmn"));
        assert!(matches!(
            class.assert_all_deployments_equal(),
            Err(crate::FlowcovError::InconsistentDeployment { .. })
        ));
    }

    #[test]
    fn test_extra_definition_is_inconsistent() {
        let mut class = ClassCoverage::new("OrderTest");
        class.add_test_method_coverage(order_method("a", "order.bpmn"));
        let mut b = order_method("b", "order.bpmn");
        b.add_process_coverage(
            DefinitionInfo::new("Refund:1", "Refund", "refund.bpmn"),
            Arc::new(GraphSnapshot::process("Refund").flow_node("Start", "startEvent").build()),
        );
        class.add_test_method_coverage(b);
        assert!(class.assert_all_deployments_equal().is_err());
    }

    #[test]
    fn test_decisions_do_not_take_part_in_equality() {
        let mut class = ClassCoverage::new("OrderTest");
        class.add_test_method_coverage(order_method("a", "order.bpmn"));
        let mut b = order_method("b", "order.bpmn");
        b.add_decision_coverage(
            DefinitionInfo::new("dish:1", "dish", "dish.dmn"),
            Arc::new(GraphSnapshot::decision("dish", ["r1"])),
        );
        class.add_test_method_coverage(b);
        assert!(class.assert_all_deployments_equal().is_ok());
    }
}

// ============================================================================
// Suite aggregation through the run state
// ============================================================================

mod suite_tests {
    use super::*;

    struct OrderProvider;

    impl SnapshotProvider for OrderProvider {
        fn process_snapshot(&self, _: &DefinitionInfo) -> crate::FlowcovResult<Arc<GraphSnapshot>> {
            Ok(order_snapshot())
        }

        fn decision_snapshot(&self, _: &DefinitionInfo) -> crate::FlowcovResult<Arc<GraphSnapshot>> {
            Ok(Arc::new(GraphSnapshot::decision("dish", ["r1", "r2"])))
        }
    }

    #[test]
    fn test_cached_provider_shares_snapshots_between_methods() {
        let dir = tempfile::tempdir().unwrap();
        let config = CoverageConfig::builder().report_dir(dir.path()).build().unwrap();
        let provider = CachingSnapshotProvider::new(OrderProvider);
        let deployment = Deployment {
            id: "d1".to_string(),
            processes: vec![DefinitionInfo::new("Order:1", "Order", "order.bpmn")],
            decisions: vec![],
        };

        let mut state = ClassRunState::new("OrderTest", &config);
        state.deploy("m1", &deployment, &provider).unwrap();
        state.deploy("m2", &deployment, &provider).unwrap();
        assert_eq!(provider.cached(), 1);

        let sink: &mut dyn CoverageSink = &mut state;
        sink.set_current_method("m2").unwrap();
        sink.notify_entered(CoveredFlowNode::new("Order", "Start", "s").into())
            .unwrap();

        let report = state.finish(&config).unwrap();
        assert_eq!(report.coverage, Some(0.2));
        assert_eq!(report.process_models[0].test_classes[0].test_methods.len(), 2);
    }

    #[test]
    fn test_suite_report_spans_classes() {
        let dir = tempfile::tempdir().unwrap();
        let config = CoverageConfig::builder().report_dir(dir.path()).build().unwrap();
        let deployment = Deployment {
            id: "d1".to_string(),
            processes: vec![DefinitionInfo::new("Order:1", "Order", "order.bpmn")],
            decisions: vec![],
        };
        let mut suite = SuiteRunState::new("all", config.clone());
        for (class, flow) in [("A", "Start->Pay"), ("B", "Pay->End")] {
            suite.switch_to_class(class).unwrap();
            suite
                .active_mut()
                .unwrap()
                .deploy("m", &deployment, &OrderProvider)
                .unwrap();
            suite.set_current_method("m").unwrap();
            suite
                .notify_entered(CoveredSequenceFlow::new("Order", flow).into())
                .unwrap();
        }
        let report = suite.finish().unwrap();
        assert_eq!(report.name, "all");
        assert_eq!(report.coverage, Some(0.4));
        assert_eq!(report.process_models[0].test_classes.len(), 2);
        assert!(config.class_report_path("all").exists());
        assert!(config.class_report_path("A").exists());
    }
}

// ============================================================================
// Property-based tests
// ============================================================================

mod property_tests {
    use crate::coverage::strategies::{covered_element, flow_node, flow_nodes, sequence_flow};
    use super::*;
    use proptest::prelude::*;
    use std::cmp::Ordering;

    proptest! {
        #[test]
        fn prop_dedup_ignores_instance_and_order(nodes in flow_nodes(0..40)) {
            let identities: BTreeSet<(String, String)> = nodes
                .iter()
                .map(|n| (n.definition_key().to_string(), n.element_id().to_string()))
                .collect();

            let forward = canonical(&nodes);
            let backward = canonical(nodes.iter().rev());
            prop_assert_eq!(forward.len(), identities.len());
            prop_assert_eq!(forward, backward);
        }

        #[test]
        fn prop_comparator_is_total_order(a in covered_element(), b in covered_element(), c in covered_element()) {
            prop_assert_eq!(a.cmp(&b), b.cmp(&a).reverse());
            prop_assert_eq!(a.cmp(&b) == Ordering::Equal, a.identity() == b.identity());
            if a <= b && b <= c {
                prop_assert!(a <= c);
            }
        }

        #[test]
        fn prop_sorting_is_deterministic(mut elements in prop::collection::vec(covered_element(), 0..30)) {
            elements.sort();
            let once: Vec<String> = elements.iter().map(ToString::to_string).collect();
            elements.sort();
            let twice: Vec<String> = elements.iter().map(ToString::to_string).collect();
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn prop_ratios_stay_in_bounds(
            nodes in prop::collection::vec(flow_node(), 0..30),
            flows in prop::collection::vec(sequence_flow(), 0..30),
        ) {
            let snapshot = Arc::new(
                GraphSnapshot::process("order")
                    .flow_node("a", "task")
                    .flow_node("b", "task")
                    .flow_node("c", "task")
                    .sequence_flow("ab", "a")
                    .sequence_flow("bc", "b")
                    .build(),
            );
            let mut method = MethodCoverage::new("d", "m");
            method.add_process_coverage(DefinitionInfo::new("order:1", "order", "order.bpmn"), snapshot);
            for node in nodes.into_iter().filter(|n| n.definition_key() == "order") {
                method.add_covered_element(node.into()).unwrap();
            }
            for flow in flows.into_iter().filter(|f| f.definition_key() == "order") {
                method.add_covered_element(flow.into()).unwrap();
            }
            let ratio = method.coverage_percentage().unwrap();
            prop_assert!((0.0..=1.0).contains(&ratio));
        }

        #[test]
        fn prop_class_ratio_dominates_method_ratios(split in 0usize..6, covered in prop::collection::vec(0usize..5, 0..10)) {
            let ids = ["Start", "Pay", "End", "Start->Pay", "Pay->End"];
            let mut class = ClassCoverage::new("OrderTest");
            let mut methods = vec![order_method("m1", "order.bpmn"), order_method("m2", "order.bpmn")];
            for (position, index) in covered.iter().enumerate() {
                let target = usize::from(position >= split);
                let id = ids[*index];
                let element: CoveredElement = if id.contains("->") {
                    CoveredSequenceFlow::new("Order", id).into()
                } else {
                    CoveredFlowNode::new("Order", id, format!("i{position}")).into()
                };
                methods[target].add_covered_element(element).unwrap();
            }
            let ratios: Vec<f64> = methods
                .iter()
                .map(|m| m.coverage_percentage().unwrap())
                .collect();
            for method in methods {
                class.add_test_method_coverage(method);
            }
            let class_ratio = class.coverage_percentage().unwrap();
            for ratio in ratios {
                prop_assert!(class_ratio >= ratio);
            }
        }
    }
}
