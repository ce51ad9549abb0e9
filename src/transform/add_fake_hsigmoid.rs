//! AddFakeHSigmoidOut pass
//!
//! The target backend has no hard-sigmoid layer. Each `HardSigmoid` node is
//! replaced by its defining decomposition
//!
//! ```text
//! hsigmoid(x) = relu6(x + 3) / 6
//! ```
//!
//! expressed as `Power{shift: 3} -> Relu6 -> Power{scale: 1/6}`, all of
//! which the backend lowers directly. Consumers are rewired onto the final
//! output and the original node is removed. Runs last in the default
//! pipeline so dead-code elimination cannot prune the synthesized nodes.

use crate::error::{ConvertError, ConvertResult};
use crate::graph::{AttrValue, IRGraph, IRNode, NodeId, OpKind};

use super::TransformStats;

/// Apply the pass, returning change statistics
pub fn apply(graph: &mut IRGraph) -> ConvertResult<TransformStats> {
    let mut stats = TransformStats::default();

    let targets: Vec<NodeId> = graph
        .live_nodes()
        .filter(|(_, n)| n.op == OpKind::HardSigmoid)
        .map(|(id, _)| id)
        .collect();

    for id in targets {
        decompose(graph, id, &mut stats)?;
    }

    Ok(stats)
}

fn decompose(graph: &mut IRGraph, id: NodeId, stats: &mut TransformStats) -> ConvertResult<()> {
    let (name, input, spec) = {
        let node = graph.node(id)?;
        if node.inputs.len() != 1 || node.outputs.len() != 1 {
            return Err(ConvertError::TransformInvariant(format!(
                "hard-sigmoid node '{}' must be single-input/single-output",
                node.name
            )));
        }
        (node.name.clone(), node.inputs[0], node.outputs[0].clone())
    };

    let shift = graph.insert_node(
        IRNode::new(format!("{}_shift3", name), OpKind::Power)
            .with_inputs(vec![input])
            .with_outputs(vec![spec.clone()])
            .with_attr("power", AttrValue::Float(1.0))
            .with_attr("scale", AttrValue::Float(1.0))
            .with_attr("shift", AttrValue::Float(3.0)),
    )?;

    let relu6 = graph.insert_node(
        IRNode::new(format!("{}_relu6", name), OpKind::Relu6)
            .with_inputs(vec![graph.output_ref_of(shift, 0)])
            .with_outputs(vec![spec.clone()]),
    )?;

    let scale = graph.insert_node(
        IRNode::new(format!("{}_div6", name), OpKind::Power)
            .with_inputs(vec![graph.output_ref_of(relu6, 0)])
            .with_outputs(vec![spec])
            .with_attr("power", AttrValue::Float(1.0))
            .with_attr("scale", AttrValue::Float(1.0 / 6.0))
            .with_attr("shift", AttrValue::Float(0.0)),
    )?;

    let old_out = graph.output_ref_of(id, 0);
    let new_out = graph.output_ref_of(scale, 0);
    stats.edges_rewired += graph.replace_all_uses(old_out, new_out)?;
    graph.remove_node(id)?;

    stats.nodes_added += 3;
    stats.nodes_removed += 1;
    Ok(())
}
