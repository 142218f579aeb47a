//! Node traversals over input edges. Visited sets are keyed by `NodeId`, so
//! two distinct nodes holding equal values are never conflated. Neither walk
//! descends into the body of a graph referenced by a constant.
use std::collections::{HashMap, HashSet};

use super::manager::Manager;
use super::node::NodeId;

/// Every node reachable from `root`, inputs before the nodes that use them.
/// Inputs are visited left to right, so the order is deterministic.
pub fn toposort(mng: &Manager, root: NodeId) -> Vec<NodeId> {
    #[derive(PartialEq, Eq, Clone, Copy)]
    enum VisitState {
        Visiting,
        Done,
    }

    let mut state: HashMap<NodeId, VisitState> = HashMap::new();
    let mut order: Vec<NodeId> = Vec::new();
    // (node, inputs pushed yet?)
    let mut stack: Vec<(NodeId, bool)> = vec![(root, false)];

    while let Some((node, expanded)) = stack.pop() {
        if expanded {
            state.insert(node, VisitState::Done);
            order.push(node);
            continue;
        }
        if state.contains_key(&node) {
            continue;
        }
        state.insert(node, VisitState::Visiting);
        stack.push((node, true));
        for inp in mng.node(node).inputs().iter().rev() {
            if !state.contains_key(inp) {
                stack.push((*inp, false));
            }
        }
    }
    order
}

/// Pre-order walk over input edges starting at `root`.
pub fn dfs(mng: &Manager, root: NodeId) -> Vec<NodeId> {
    let mut seen: HashSet<NodeId> = HashSet::new();
    let mut order: Vec<NodeId> = Vec::new();
    let mut stack: Vec<NodeId> = vec![root];
    while let Some(node) = stack.pop() {
        if !seen.insert(node) {
            continue;
        }
        order.push(node);
        for inp in mng.node(node).inputs().iter().rev() {
            if !seen.contains(inp) {
                stack.push(*inp);
            }
        }
    }
    order
}
