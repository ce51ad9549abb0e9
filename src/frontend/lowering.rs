//! Trace-to-IR lowering
//!
//! Translates a [`TraceGraph`] into a fresh [`IRGraph`]: one IR node per
//! trace node, same execution order, same data dependencies, same declared
//! inputs and outputs. Each source operator kind maps to exactly one IR
//! operator kind through a fixed table.

use rustc_hash::FxHashMap;

use crate::error::{ConvertError, ConvertResult};
use crate::graph::{IRGraph, IRNode, OpKind, TensorRef};
use crate::tensor::resolve_reshape;

use super::trace::TraceGraph;

/// Map a source operator kind tag to its IR operator kind
///
/// The table is total over the supported source vocabulary; anything else
/// is an [`UnsupportedOperator`](ConvertError::UnsupportedOperator) at
/// lowering time.
pub fn lower_op_kind(kind: &str) -> Option<OpKind> {
    let op = match kind {
        "conv2d" => OpKind::Conv2d,
        "linear" => OpKind::Linear,
        "batch_norm" => OpKind::BatchNorm,
        "max_pool2d" => OpKind::MaxPool2d,
        "avg_pool2d" => OpKind::AvgPool2d,
        "relu" => OpKind::Relu,
        "relu6" => OpKind::Relu6,
        "sigmoid" => OpKind::Sigmoid,
        "hsigmoid" => OpKind::HardSigmoid,
        "softmax" => OpKind::Softmax,
        "add" => OpKind::Add,
        "mul" => OpKind::Mul,
        "concat" => OpKind::Concat,
        "reshape" => OpKind::Reshape,
        "flatten" => OpKind::Flatten,
        "pow" => OpKind::Power,
        "dropout" => OpKind::Dropout,
        "typecvt" => OpKind::TypeCvt,
        _ => return None,
    };
    Some(op)
}

/// Lower a trace into a fresh IR graph
pub fn lower_trace(trace: &dyn TraceGraph) -> ConvertResult<IRGraph> {
    let mut graph = IRGraph::new(trace.name());
    let mut tensors: FxHashMap<String, TensorRef> = FxHashMap::default();

    for input in trace.inputs() {
        let r = graph.add_input(&input.name, input.spec.clone());
        if tensors.insert(input.name.clone(), r).is_some() {
            return Err(ConvertError::InputValidation(format!(
                "trace declares input '{}' more than once",
                input.name
            )));
        }
    }

    for tnode in trace.nodes() {
        let op = lower_op_kind(&tnode.kind)
            .ok_or_else(|| ConvertError::UnsupportedOperator(tnode.kind.clone()))?;

        let mut inputs = Vec::with_capacity(tnode.inputs.len());
        for name in &tnode.inputs {
            let r = tensors.get(name).ok_or_else(|| {
                ConvertError::InputValidation(format!(
                    "node '{}' consumes tensor '{}' which is neither a graph \
                     input nor produced by an earlier node",
                    tnode.name, name
                ))
            })?;
            inputs.push(*r);
        }

        let node = IRNode {
            name: tnode.name.clone(),
            op,
            attrs: tnode.attrs.clone(),
            inputs,
            outputs: tnode.outputs.iter().map(|t| t.spec.clone()).collect(),
            blobs: tnode.params.clone(),
        };
        check_node_contract(&graph, &node)?;
        let id = graph.insert_node(node)?;

        for (slot, out) in tnode.outputs.iter().enumerate() {
            let r = graph.output_ref_of(id, slot);
            if tensors.insert(out.name.clone(), r).is_some() {
                return Err(ConvertError::InputValidation(format!(
                    "tensor '{}' is produced more than once",
                    out.name
                )));
            }
        }
    }

    let mut outputs = Vec::with_capacity(trace.outputs().len());
    for name in trace.outputs() {
        let r = tensors.get(name).ok_or_else(|| {
            ConvertError::InputValidation(format!(
                "declared graph output '{}' is not produced by the trace",
                name
            ))
        })?;
        outputs.push(*r);
    }
    graph.set_outputs(outputs)?;

    log::debug!(
        "lowered trace '{}': {} nodes, {} inputs, {} outputs",
        trace.name(),
        graph.live_count(),
        graph.inputs().len(),
        graph.outputs().len()
    );

    Ok(graph)
}

/// Per-op structural checks applied during lowering
fn check_node_contract(graph: &IRGraph, node: &IRNode) -> ConvertResult<()> {
    if node.outputs.is_empty() {
        return Err(ConvertError::InputValidation(format!(
            "node '{}' declares no outputs",
            node.name
        )));
    }

    // A reshape's declared target must agree with its input element count.
    if node.op == OpKind::Reshape {
        if let Some(target) = node.attr_ints("shape") {
            let input = node.inputs.first().ok_or_else(|| {
                ConvertError::InputValidation(format!("reshape '{}' has no input", node.name))
            })?;
            let count = graph.tensor_spec(*input)?.numel();
            let resolved = resolve_reshape(count, target).map_err(|e| {
                ConvertError::InputValidation(format!("reshape '{}': {}", node.name, e))
            })?;
            if resolved != node.outputs[0].shape {
                return Err(ConvertError::InputValidation(format!(
                    "reshape '{}' target {:?} disagrees with recorded output shape {:?}",
                    node.name, target, node.outputs[0].shape
                )));
            }
        }
    }

    Ok(())
}
