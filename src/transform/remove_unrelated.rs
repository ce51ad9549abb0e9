//! RemoveUnrelatedIrOp pass (dead-code elimination)
//!
//! Computes reachability backward from the declared graph outputs and
//! removes every node the outputs do not depend on. Runs after the
//! rewiring passes so their orphans are pruned, and before any pass that
//! synthesizes nodes.

use rustc_hash::FxHashSet;

use crate::error::ConvertResult;
use crate::graph::{IRGraph, NodeId, TensorRef};

use super::TransformStats;

/// Apply the pass, returning change statistics
pub fn apply(graph: &mut IRGraph) -> ConvertResult<TransformStats> {
    let mut stats = TransformStats::default();

    let live = reachable_from_outputs(graph);

    // Unreachable nodes only feed other unreachable nodes, so removing in
    // reverse topological order always clears consumers before producers.
    let order = graph.topo_order()?;
    for id in order.into_iter().rev() {
        if !live.contains(&id) {
            graph.remove_node(id)?;
            stats.nodes_removed += 1;
        }
    }

    Ok(stats)
}

/// Node ids reachable backward from the declared graph outputs
fn reachable_from_outputs(graph: &IRGraph) -> FxHashSet<NodeId> {
    let mut live = FxHashSet::default();
    let mut stack: Vec<NodeId> = graph
        .outputs()
        .iter()
        .filter_map(|r| match r {
            TensorRef::NodeOutput { node, .. } => Some(*node),
            TensorRef::GraphInput(_) => None,
        })
        .collect();

    while let Some(id) = stack.pop() {
        if !live.insert(id) {
            continue;
        }
        if let Ok(node) = graph.node(id) {
            for input in &node.inputs {
                if let TensorRef::NodeOutput { node: producer, .. } = input {
                    stack.push(*producer);
                }
            }
        }
    }

    live
}
