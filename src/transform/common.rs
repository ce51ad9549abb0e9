//! Shared helpers for transform passes

use crate::error::{ConvertError, ConvertResult};
use crate::graph::{IRGraph, NodeId};

/// Remove a single-input/single-output node, bridging its consumers (and
/// any graph output) directly onto its own input tensor
///
/// Preserves tensor identity of the pass-through value: every use of the
/// node's output becomes a use of its input. Returns the number of edges
/// rewired.
pub fn bridge_out(graph: &mut IRGraph, id: NodeId) -> ConvertResult<usize> {
    let node = graph.node(id)?;
    if node.inputs.len() != 1 || node.outputs.len() != 1 {
        return Err(ConvertError::TransformInvariant(format!(
            "cannot bridge out node '{}' ({}): expected single input and output, \
             found {}/{}",
            node.name,
            node.op,
            node.inputs.len(),
            node.outputs.len()
        )));
    }
    let src = node.inputs[0];
    let out = graph.output_ref_of(id, 0);

    let rewired = graph.replace_all_uses(out, src)?;
    graph.remove_node(id)?;
    Ok(rewired)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{IRNode, OpKind, TensorRef};
    use crate::tensor::TensorSpec;

    #[test]
    fn test_bridge_out_chain() {
        let mut g = IRGraph::new("test");
        let x = g.add_input("x", TensorSpec::f32(vec![1, 4]));
        let drop = g
            .insert_node(
                IRNode::new("dropout_0", OpKind::Dropout)
                    .with_inputs(vec![x])
                    .with_outputs(vec![TensorSpec::f32(vec![1, 4])]),
            )
            .unwrap();
        let relu = g
            .insert_node(
                IRNode::new("relu_0", OpKind::Relu)
                    .with_inputs(vec![g.output_ref_of(drop, 0)])
                    .with_outputs(vec![TensorSpec::f32(vec![1, 4])]),
            )
            .unwrap();
        g.set_outputs(vec![g.output_ref_of(relu, 0)]).unwrap();

        let rewired = bridge_out(&mut g, drop).unwrap();
        assert_eq!(rewired, 1);
        assert_eq!(g.node(relu).unwrap().inputs[0], TensorRef::GraphInput(0));
        assert_eq!(g.live_count(), 1);
        assert!(g.validate().is_ok());
    }

    #[test]
    fn test_bridge_out_rejects_multi_input() {
        let mut g = IRGraph::new("test");
        let x = g.add_input("x", TensorSpec::f32(vec![1, 4]));
        let y = g.add_input("y", TensorSpec::f32(vec![1, 4]));
        let add = g
            .insert_node(
                IRNode::new("add_0", OpKind::Add)
                    .with_inputs(vec![x, y])
                    .with_outputs(vec![TensorSpec::f32(vec![1, 4])]),
            )
            .unwrap();
        g.set_outputs(vec![g.output_ref_of(add, 0)]).unwrap();

        assert!(bridge_out(&mut g, add).is_err());
    }
}
