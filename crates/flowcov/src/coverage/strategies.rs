//! Proptest strategies for covered elements
//!
//! Keys and ids are drawn from small alphabets so that generated records
//! collide on identity often.
//!
//! ```rust,ignore
//! proptest! {
//!     #[test]
//!     fn prop_dedup(nodes in flow_nodes(0..50)) {
//!         let unique: BTreeSet<_> = nodes.iter().collect();
//!         assert_eq!(canonical(&nodes).len(), unique.len());
//!     }
//! }
//! ```

use super::element::{CoveredDecisionRule, CoveredElement, CoveredFlowNode, CoveredSequenceFlow};
use proptest::prelude::*;
use std::ops::Range;

/// Definition keys
pub fn definition_key() -> impl Strategy<Value = String> {
    prop::sample::select(vec!["invoice", "order", "shipping"]).prop_map(str::to_string)
}

/// Element ids
pub fn element_id() -> impl Strategy<Value = String> {
    "[a-f]{1,2}"
}

/// Flow node records with random instance ids and ordinals
pub fn flow_node() -> impl Strategy<Value = CoveredFlowNode> {
    (
        definition_key(),
        element_id(),
        "i[0-9]{1,3}",
        proptest::option::of(0u64..10_000),
    )
        .prop_map(|(key, id, instance, start)| {
            let node = CoveredFlowNode::new(key, id, instance);
            match start {
                Some(ordinal) => node.with_start_ordinal(ordinal),
                None => node,
            }
        })
}

/// Sequence flow records
pub fn sequence_flow() -> impl Strategy<Value = CoveredSequenceFlow> {
    (definition_key(), element_id()).prop_map(|(key, id)| CoveredSequenceFlow::new(key, id))
}

/// Decision rule records
pub fn decision_rule() -> impl Strategy<Value = CoveredDecisionRule> {
    (definition_key(), element_id()).prop_map(|(key, id)| CoveredDecisionRule::new(key, id))
}

/// Any covered element
pub fn covered_element() -> impl Strategy<Value = CoveredElement> {
    prop_oneof![
        3 => flow_node().prop_map(CoveredElement::from),
        2 => sequence_flow().prop_map(CoveredElement::from),
        1 => decision_rule().prop_map(CoveredElement::from),
    ]
}

/// Vectors of flow node records
pub fn flow_nodes(len: Range<usize>) -> impl Strategy<Value = Vec<CoveredFlowNode>> {
    prop::collection::vec(flow_node(), len)
}
