//! RemoveReshapeRelatedOp pass
//!
//! Collapses reshape-only chains that do not change the shape ultimately
//! required downstream:
//!
//! 1. identity reshapes (input spec equals output spec) are bridged out;
//! 2. reshape-of-reshape chains are merged: when a reshape's sole consumer
//!    is another reshape, the earlier node absorbs the later one's target
//!    shape and the later node is removed.
//!
//! Nodes orphaned by the merge are left for dead-code elimination, which
//! runs after this pass in the default pipeline.

use crate::error::ConvertResult;
use crate::graph::{AttrValue, IRGraph, NodeId, OpKind, TensorRef};

use super::common::bridge_out;
use super::TransformStats;

/// Apply the pass, returning change statistics
pub fn apply(graph: &mut IRGraph) -> ConvertResult<TransformStats> {
    let mut stats = TransformStats::default();

    // Identity reshapes first: they become single-edge bridges.
    let identities: Vec<NodeId> = graph
        .node_ids()
        .filter(|&id| is_identity_reshape(graph, id))
        .collect();
    for id in identities {
        stats.edges_rewired += bridge_out(graph, id)?;
        stats.nodes_removed += 1;
    }

    // Then merge reshape-of-reshape pairs until none remain.
    loop {
        let Some((first, second)) = find_reshape_pair(graph) else {
            break;
        };
        merge_pair(graph, first, second)?;
        stats.nodes_removed += 1;
        stats.edges_rewired += 1;
    }

    Ok(stats)
}

fn is_identity_reshape(graph: &IRGraph, id: NodeId) -> bool {
    let Ok(node) = graph.node(id) else {
        return false;
    };
    if node.op != OpKind::Reshape || node.inputs.len() != 1 || node.outputs.len() != 1 {
        return false;
    }
    match graph.resolve(node.inputs[0]) {
        Some(input_spec) => *input_spec == node.outputs[0],
        None => false,
    }
}

/// Find a `first -> second` reshape pair where `second` is the only use of
/// `first`'s output
fn find_reshape_pair(graph: &IRGraph) -> Option<(NodeId, NodeId)> {
    for (id, node) in graph.live_nodes() {
        if node.op != OpKind::Reshape || node.inputs.len() != 1 {
            continue;
        }
        let TensorRef::NodeOutput { node: prev, slot: 0 } = node.inputs[0] else {
            continue;
        };
        let Ok(prev_node) = graph.node(prev) else {
            continue;
        };
        if prev_node.op != OpKind::Reshape || prev_node.outputs.len() != 1 {
            continue;
        }
        let prev_out = graph.output_ref_of(prev, 0);
        let sole_use = graph.consumers(prev_out).len() == 1
            && !graph.outputs().contains(&prev_out);
        if sole_use {
            return Some((prev, id));
        }
    }
    None
}

/// Fold `second`'s target shape into `first`, then remove `second`
fn merge_pair(graph: &mut IRGraph, first: NodeId, second: NodeId) -> ConvertResult<()> {
    let final_spec = graph.node(second)?.outputs[0].clone();
    let target: Vec<i64> = final_spec.shape.iter().map(|&d| d as i64).collect();

    graph.redeclare_output(first, 0, final_spec)?;
    graph
        .node_mut(first)?
        .attrs
        .insert("shape".to_string(), AttrValue::Ints(target));

    let second_out = graph.output_ref_of(second, 0);
    let first_out = graph.output_ref_of(first, 0);
    graph.replace_all_uses(second_out, first_out)?;
    graph.remove_node(second)?;
    Ok(())
}
