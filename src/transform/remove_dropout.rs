//! RemoveDropout pass
//!
//! Dropout is an identity at inference time. Every dropout node is bridged
//! out: its consumers are rewired onto the dropout's own input tensor, then
//! the node is removed. A graph without dropout nodes is left untouched.

use crate::error::ConvertResult;
use crate::graph::{IRGraph, NodeId, OpKind};

use super::common::bridge_out;
use super::TransformStats;

/// Apply the pass, returning change statistics
pub fn apply(graph: &mut IRGraph) -> ConvertResult<TransformStats> {
    let mut stats = TransformStats::default();

    let targets: Vec<NodeId> = graph
        .live_nodes()
        .filter(|(_, n)| n.op == OpKind::Dropout)
        .map(|(id, _)| id)
        .collect();

    for id in targets {
        stats.edges_rewired += bridge_out(graph, id)?;
        stats.nodes_removed += 1;
    }

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{IRNode, TensorRef};
    use crate::tensor::TensorSpec;

    fn spec() -> TensorSpec {
        TensorSpec::f32(vec![1, 4])
    }

    /// Conv -> Dropout -> Relu
    fn make_graph() -> (IRGraph, NodeId, NodeId) {
        let mut g = IRGraph::new("test");
        let x = g.add_input("x", spec());
        let conv = g
            .insert_node(
                IRNode::new("conv_0", OpKind::Conv2d)
                    .with_inputs(vec![x])
                    .with_outputs(vec![spec()]),
            )
            .unwrap();
        let drop = g
            .insert_node(
                IRNode::new("dropout_0", OpKind::Dropout)
                    .with_inputs(vec![g.output_ref_of(conv, 0)])
                    .with_outputs(vec![spec()]),
            )
            .unwrap();
        let relu = g
            .insert_node(
                IRNode::new("relu_0", OpKind::Relu)
                    .with_inputs(vec![g.output_ref_of(drop, 0)])
                    .with_outputs(vec![spec()]),
            )
            .unwrap();
        g.set_outputs(vec![g.output_ref_of(relu, 0)]).unwrap();
        (g, conv, relu)
    }

    #[test]
    fn test_conv_dropout_relu_scenario() {
        let (mut g, conv, relu) = make_graph();

        let stats = apply(&mut g).unwrap();
        assert_eq!(stats.nodes_removed, 1);

        // Relu's input is rewired directly onto Conv's output.
        assert_eq!(
            g.node(relu).unwrap().inputs[0],
            TensorRef::NodeOutput { node: conv, slot: 0 }
        );
        assert_eq!(g.live_count(), 2);
        assert!(g
            .node_ids()
            .all(|id| g.node(id).unwrap().op != OpKind::Dropout));
        assert!(g.validate().is_ok());
    }

    #[test]
    fn test_idempotent() {
        let (mut g, _, _) = make_graph();
        apply(&mut g).unwrap();

        // A graph already free of dropout nodes is a no-op; twice == once.
        let stats = apply(&mut g).unwrap();
        assert_eq!(stats.nodes_removed, 0);
        assert_eq!(stats.edges_rewired, 0);
        assert_eq!(g.live_count(), 2);
    }

    #[test]
    fn test_dropout_feeding_graph_output() {
        let mut g = IRGraph::new("test");
        let x = g.add_input("x", spec());
        let relu = g
            .insert_node(
                IRNode::new("relu_0", OpKind::Relu)
                    .with_inputs(vec![x])
                    .with_outputs(vec![spec()]),
            )
            .unwrap();
        let drop = g
            .insert_node(
                IRNode::new("dropout_0", OpKind::Dropout)
                    .with_inputs(vec![g.output_ref_of(relu, 0)])
                    .with_outputs(vec![spec()]),
            )
            .unwrap();
        g.set_outputs(vec![g.output_ref_of(drop, 0)]).unwrap();

        apply(&mut g).unwrap();
        assert_eq!(g.outputs()[0], g.output_ref_of(relu, 0));
        assert!(g.validate().is_ok());
    }
}
