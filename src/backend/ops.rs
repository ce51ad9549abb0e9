//! IR-to-Caffe operator lowering
//!
//! Maps each IR operator kind onto one or more Caffe layer descriptions.
//! The mapping table is closed: an IR kind without an entry fails with
//! [`UnsupportedTargetOperator`](ConvertError::UnsupportedTargetOperator)
//! naming the kind, even when the transform pipeline already ran.

use crate::error::{ConvertError, ConvertResult};
use crate::graph::{IRNode, OpKind};
use crate::tensor::{Blob, DType};

use super::layer::{CaffeLayer, EltwiseOp, LayerParam, PoolMethod};

/// Lower one IR node to its Caffe layer(s)
///
/// `bottoms` and `tops` are the already-assigned tensor names of the node's
/// inputs and outputs.
pub fn lower_node(
    node: &IRNode,
    bottoms: Vec<String>,
    tops: Vec<String>,
) -> ConvertResult<Vec<CaffeLayer>> {
    check_payload_dtypes(node)?;

    let layers = match node.op {
        OpKind::Conv2d => vec![lower_conv2d(node, bottoms, tops)?],
        OpKind::Linear => vec![lower_linear(node, bottoms, tops)?],
        OpKind::BatchNorm => lower_batch_norm(node, bottoms, tops)?,
        OpKind::MaxPool2d => vec![lower_pooling(node, PoolMethod::Max, bottoms, tops)?],
        OpKind::AvgPool2d => vec![lower_pooling(node, PoolMethod::Ave, bottoms, tops)?],
        OpKind::Relu => vec![plain(node, "ReLU", bottoms, tops)],
        OpKind::Relu6 => vec![plain(node, "ReLU6", bottoms, tops)],
        OpKind::Sigmoid => vec![plain(node, "Sigmoid", bottoms, tops)],
        OpKind::Softmax => vec![CaffeLayer {
            name: node.name.clone(),
            kind: "Softmax",
            bottoms,
            tops,
            param: LayerParam::Softmax {
                axis: node.attr_i("axis").unwrap_or(1),
            },
            blobs: vec![],
        }],
        OpKind::Add => vec![eltwise(node, EltwiseOp::Sum, bottoms, tops)],
        OpKind::Mul => vec![eltwise(node, EltwiseOp::Prod, bottoms, tops)],
        OpKind::Concat => vec![CaffeLayer {
            name: node.name.clone(),
            kind: "Concat",
            bottoms,
            tops,
            param: LayerParam::Concat {
                axis: node.attr_i("axis").unwrap_or(1),
            },
            blobs: vec![],
        }],
        OpKind::Reshape => vec![CaffeLayer {
            name: node.name.clone(),
            kind: "Reshape",
            bottoms,
            tops,
            param: LayerParam::Reshape {
                shape: node.outputs[0].shape.iter().map(|&d| d as i64).collect(),
            },
            blobs: vec![],
        }],
        OpKind::Flatten => vec![CaffeLayer {
            name: node.name.clone(),
            kind: "Flatten",
            bottoms,
            tops,
            param: LayerParam::Flatten {
                axis: node.attr_i("axis").unwrap_or(1),
            },
            blobs: vec![],
        }],
        OpKind::Power => vec![CaffeLayer {
            name: node.name.clone(),
            kind: "Power",
            bottoms,
            tops,
            param: LayerParam::Power {
                power: node.attr_f("power").unwrap_or(1.0),
                scale: node.attr_f("scale").unwrap_or(1.0),
                shift: node.attr_f("shift").unwrap_or(0.0),
            },
            blobs: vec![],
        }],
        // No Caffe counterpart; the transform pipeline is expected to have
        // rewritten these away.
        OpKind::Dropout | OpKind::HardSigmoid | OpKind::TypeCvt => {
            return Err(ConvertError::UnsupportedTargetOperator(node.op.to_string()))
        }
    };

    Ok(layers)
}

fn plain(node: &IRNode, kind: &'static str, bottoms: Vec<String>, tops: Vec<String>) -> CaffeLayer {
    CaffeLayer {
        name: node.name.clone(),
        kind,
        bottoms,
        tops,
        param: LayerParam::None,
        blobs: vec![],
    }
}

fn eltwise(node: &IRNode, op: EltwiseOp, bottoms: Vec<String>, tops: Vec<String>) -> CaffeLayer {
    CaffeLayer {
        name: node.name.clone(),
        kind: "Eltwise",
        bottoms,
        tops,
        param: LayerParam::Eltwise { operation: op },
        blobs: vec![],
    }
}

fn lower_conv2d(node: &IRNode, bottoms: Vec<String>, tops: Vec<String>) -> ConvertResult<CaffeLayer> {
    let weight = node.blobs.first().ok_or_else(|| {
        ConvertError::TransformInvariant(format!(
            "convolution '{}' carries no weight payload",
            node.name
        ))
    })?;
    if weight.spec.shape.len() != 4 {
        return Err(ConvertError::TransformInvariant(format!(
            "convolution '{}' weight shape {:?} is not 4-dimensional",
            node.name, weight.spec.shape
        )));
    }

    Ok(CaffeLayer {
        name: node.name.clone(),
        kind: "Convolution",
        bottoms,
        tops,
        param: LayerParam::Convolution {
            num_output: weight.spec.shape[0],
            kernel: (weight.spec.shape[2], weight.spec.shape[3]),
            stride: attr_pair(node, "stride").unwrap_or((1, 1)),
            pad: attr_pair(node, "padding").unwrap_or((0, 0)),
            bias_term: node.blobs.len() > 1,
        },
        blobs: node.blobs.clone(),
    })
}

fn lower_linear(node: &IRNode, bottoms: Vec<String>, tops: Vec<String>) -> ConvertResult<CaffeLayer> {
    let weight = node.blobs.first().ok_or_else(|| {
        ConvertError::TransformInvariant(format!(
            "linear '{}' carries no weight payload",
            node.name
        ))
    })?;

    Ok(CaffeLayer {
        name: node.name.clone(),
        kind: "InnerProduct",
        bottoms,
        tops,
        param: LayerParam::InnerProduct {
            num_output: weight.spec.shape[0],
            bias_term: node.blobs.len() > 1,
        },
        blobs: node.blobs.clone(),
    })
}

/// BatchNorm lowers to the Caffe `BatchNorm` + `Scale` pair: the first
/// normalizes with the stored statistics, the second applies gamma/beta
/// in place on the same top.
fn lower_batch_norm(
    node: &IRNode,
    bottoms: Vec<String>,
    tops: Vec<String>,
) -> ConvertResult<Vec<CaffeLayer>> {
    let [gamma, beta, mean, var] = node.blobs.as_slice() else {
        return Err(ConvertError::TransformInvariant(format!(
            "batch-norm '{}' must carry gamma/beta/mean/var payloads, found {}",
            node.name,
            node.blobs.len()
        )));
    };
    let top = tops[0].clone();
    let scale_factor = Blob::from_f32(vec![1], &[1.0])?;

    Ok(vec![
        CaffeLayer {
            name: node.name.clone(),
            kind: "BatchNorm",
            bottoms,
            tops: vec![top.clone()],
            param: LayerParam::BatchNorm {
                eps: node.attr_f("eps").unwrap_or(1e-5),
            },
            blobs: vec![mean.clone(), var.clone(), scale_factor],
        },
        CaffeLayer {
            name: format!("{}_scale", node.name),
            kind: "Scale",
            bottoms: vec![top.clone()],
            tops: vec![top],
            param: LayerParam::Scale { bias_term: true },
            blobs: vec![gamma.clone(), beta.clone()],
        },
    ])
}

fn lower_pooling(
    node: &IRNode,
    method: PoolMethod,
    bottoms: Vec<String>,
    tops: Vec<String>,
) -> ConvertResult<CaffeLayer> {
    let kernel = attr_pair(node, "kernel").ok_or_else(|| {
        ConvertError::TransformInvariant(format!(
            "pooling '{}' is missing its kernel attribute",
            node.name
        ))
    })?;

    Ok(CaffeLayer {
        name: node.name.clone(),
        kind: "Pooling",
        bottoms,
        tops,
        param: LayerParam::Pooling {
            method,
            kernel,
            stride: attr_pair(node, "stride").unwrap_or(kernel),
            pad: attr_pair(node, "padding").unwrap_or((0, 0)),
        },
        blobs: vec![],
    })
}

/// Read a 2-element ints attribute as an (h, w) pair
fn attr_pair(node: &IRNode, name: &str) -> Option<(usize, usize)> {
    match node.attr_ints(name) {
        Some([h, w]) if *h >= 0 && *w >= 0 => Some((*h as usize, *w as usize)),
        _ => None,
    }
}

fn check_payload_dtypes(node: &IRNode) -> ConvertResult<()> {
    for blob in &node.blobs {
        if blob.spec.dtype != DType::Float32 {
            return Err(ConvertError::UnsupportedTargetOperator(format!(
                "{} ({} parameter payload)",
                node.op, blob.spec.dtype
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{AttrValue, TensorRef};
    use crate::tensor::TensorSpec;

    fn names(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_conv_lowering_reads_weight_shape() {
        let weight = Blob::from_f32(vec![8, 3, 3, 3], &vec![0.0; 8 * 3 * 3 * 3]).unwrap();
        let bias = Blob::from_f32(vec![8], &[0.0; 8]).unwrap();
        let node = IRNode::new("conv_0", OpKind::Conv2d)
            .with_inputs(vec![TensorRef::GraphInput(0)])
            .with_outputs(vec![TensorSpec::f32(vec![1, 8, 30, 30])])
            .with_attr("stride", AttrValue::Ints(vec![1, 1]))
            .with_attr("padding", AttrValue::Ints(vec![0, 0]))
            .with_blob(weight)
            .with_blob(bias);

        let layers = lower_node(&node, names(&["data"]), names(&["conv_0"])).unwrap();
        assert_eq!(layers.len(), 1);
        assert_eq!(layers[0].kind, "Convolution");
        assert!(matches!(
            layers[0].param,
            LayerParam::Convolution {
                num_output: 8,
                kernel: (3, 3),
                bias_term: true,
                ..
            }
        ));
        assert_eq!(layers[0].blobs.len(), 2);
    }

    #[test]
    fn test_batch_norm_emits_pair() {
        let c = 4;
        let blob = |v: f32| Blob::from_f32(vec![c], &vec![v; c]).unwrap();
        let node = IRNode::new("bn_0", OpKind::BatchNorm)
            .with_inputs(vec![TensorRef::GraphInput(0)])
            .with_outputs(vec![TensorSpec::f32(vec![1, c, 8, 8])])
            .with_blob(blob(1.0))
            .with_blob(blob(0.0))
            .with_blob(blob(0.0))
            .with_blob(blob(1.0));

        let layers = lower_node(&node, names(&["data"]), names(&["bn_0"])).unwrap();
        assert_eq!(layers.len(), 2);
        assert_eq!(layers[0].kind, "BatchNorm");
        assert_eq!(layers[1].kind, "Scale");
        // Scale runs in place on the BatchNorm top.
        assert_eq!(layers[1].bottoms, layers[1].tops);
        assert_eq!(layers[0].blobs.len(), 3);
        assert_eq!(layers[1].blobs.len(), 2);
    }

    #[test]
    fn test_unmapped_op_names_kind() {
        let node = IRNode::new("drop_0", OpKind::Dropout)
            .with_inputs(vec![TensorRef::GraphInput(0)])
            .with_outputs(vec![TensorSpec::f32(vec![1, 4])]);

        match lower_node(&node, names(&["data"]), names(&["drop_0"])) {
            Err(ConvertError::UnsupportedTargetOperator(kind)) => assert_eq!(kind, "Dropout"),
            other => panic!("expected UnsupportedTargetOperator, got {:?}", other),
        }
    }

    #[test]
    fn test_non_float_payload_rejected() {
        let spec = TensorSpec::new(vec![2], DType::Uint8);
        let blob = Blob::new(spec, vec![1, 2]).unwrap();
        let node = IRNode::new("linear_0", OpKind::Linear)
            .with_inputs(vec![TensorRef::GraphInput(0)])
            .with_outputs(vec![TensorSpec::f32(vec![1, 2])])
            .with_blob(blob);

        assert!(matches!(
            lower_node(&node, names(&["data"]), names(&["fc_0"])),
            Err(ConvertError::UnsupportedTargetOperator(_))
        ));
    }

    #[test]
    fn test_pooling_defaults_stride_to_kernel() {
        let node = IRNode::new("pool_0", OpKind::MaxPool2d)
            .with_inputs(vec![TensorRef::GraphInput(0)])
            .with_outputs(vec![TensorSpec::f32(vec![1, 4, 4, 4])])
            .with_attr("kernel", AttrValue::Ints(vec![2, 2]));

        let layers = lower_node(&node, names(&["data"]), names(&["pool_0"])).unwrap();
        assert!(matches!(
            layers[0].param,
            LayerParam::Pooling {
                method: PoolMethod::Max,
                kernel: (2, 2),
                stride: (2, 2),
                ..
            }
        ));
    }
}
