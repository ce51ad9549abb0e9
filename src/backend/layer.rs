//! Caffe layer descriptions
//!
//! [`CaffeLayer`] is the target-native description one or more of which
//! every IR node lowers to. [`LayerParam`] is the closed set of parameter
//! blocks the converter emits; each knows how to render itself into
//! prototxt text.

use std::fmt::Write;

use crate::tensor::Blob;

/// Pooling method of a Caffe `Pooling` layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolMethod {
    /// Max pooling
    Max,
    /// Average pooling
    Ave,
}

impl PoolMethod {
    fn token(self) -> &'static str {
        match self {
            PoolMethod::Max => "MAX",
            PoolMethod::Ave => "AVE",
        }
    }
}

/// Operation of a Caffe `Eltwise` layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EltwiseOp {
    /// Elementwise sum
    Sum,
    /// Elementwise product
    Prod,
}

impl EltwiseOp {
    fn token(self) -> &'static str {
        match self {
            EltwiseOp::Sum => "SUM",
            EltwiseOp::Prod => "PROD",
        }
    }
}

/// Typed parameter block of one emitted layer
#[derive(Debug, Clone, PartialEq)]
pub enum LayerParam {
    /// Layer kinds without parameters (ReLU, ReLU6, Sigmoid)
    None,
    /// `input_param`
    Input {
        /// Input blob shape
        shape: Vec<usize>,
    },
    /// `convolution_param`
    Convolution {
        /// Output channels
        num_output: usize,
        /// (kernel_h, kernel_w)
        kernel: (usize, usize),
        /// (stride_h, stride_w)
        stride: (usize, usize),
        /// (pad_h, pad_w)
        pad: (usize, usize),
        /// Whether a bias blob follows the weight blob
        bias_term: bool,
    },
    /// `pooling_param`
    Pooling {
        /// MAX or AVE
        method: PoolMethod,
        /// (kernel_h, kernel_w)
        kernel: (usize, usize),
        /// (stride_h, stride_w)
        stride: (usize, usize),
        /// (pad_h, pad_w)
        pad: (usize, usize),
    },
    /// `inner_product_param`
    InnerProduct {
        /// Output feature count
        num_output: usize,
        /// Whether a bias blob follows the weight blob
        bias_term: bool,
    },
    /// `eltwise_param`
    Eltwise {
        /// SUM or PROD
        operation: EltwiseOp,
    },
    /// `power_param`, computing `(scale * x + shift) ^ power`
    Power {
        /// Exponent
        power: f32,
        /// Multiplier
        scale: f32,
        /// Offset
        shift: f32,
    },
    /// `softmax_param`
    Softmax {
        /// Axis to normalize over
        axis: i64,
    },
    /// `concat_param`
    Concat {
        /// Concatenation axis
        axis: i64,
    },
    /// `reshape_param`
    Reshape {
        /// Target shape
        shape: Vec<i64>,
    },
    /// `flatten_param`
    Flatten {
        /// First axis to flatten
        axis: i64,
    },
    /// `batch_norm_param`
    BatchNorm {
        /// Variance epsilon
        eps: f32,
    },
    /// `scale_param`
    Scale {
        /// Whether a bias blob follows the scale blob
        bias_term: bool,
    },
}

/// One emitted Caffe layer
#[derive(Debug, Clone)]
pub struct CaffeLayer {
    /// Layer name, unique within the net
    pub name: String,
    /// Caffe layer type token
    pub kind: &'static str,
    /// Consumed tensor names
    pub bottoms: Vec<String>,
    /// Produced tensor names
    pub tops: Vec<String>,
    /// Typed parameter block
    pub param: LayerParam,
    /// Parameter payloads, serialized into the weights artifact only
    pub blobs: Vec<Blob>,
}

impl CaffeLayer {
    /// Render this layer as one prototxt `layer { ... }` block
    pub fn render(&self, out: &mut String) {
        out.push_str("layer {\n");
        let _ = writeln!(out, "  name: {:?}", self.name);
        let _ = writeln!(out, "  type: {:?}", self.kind);
        for bottom in &self.bottoms {
            let _ = writeln!(out, "  bottom: {:?}", bottom);
        }
        for top in &self.tops {
            let _ = writeln!(out, "  top: {:?}", top);
        }
        self.render_param(out);
        out.push_str("}\n");
    }

    fn render_param(&self, out: &mut String) {
        match &self.param {
            LayerParam::None => {}
            LayerParam::Input { shape } => {
                out.push_str("  input_param {\n    shape {\n");
                for d in shape {
                    let _ = writeln!(out, "      dim: {}", d);
                }
                out.push_str("    }\n  }\n");
            }
            LayerParam::Convolution {
                num_output,
                kernel,
                stride,
                pad,
                bias_term,
            } => {
                out.push_str("  convolution_param {\n");
                let _ = writeln!(out, "    num_output: {}", num_output);
                let _ = writeln!(out, "    bias_term: {}", bias_term);
                let _ = writeln!(out, "    pad_h: {}", pad.0);
                let _ = writeln!(out, "    pad_w: {}", pad.1);
                let _ = writeln!(out, "    kernel_h: {}", kernel.0);
                let _ = writeln!(out, "    kernel_w: {}", kernel.1);
                let _ = writeln!(out, "    stride_h: {}", stride.0);
                let _ = writeln!(out, "    stride_w: {}", stride.1);
                out.push_str("  }\n");
            }
            LayerParam::Pooling {
                method,
                kernel,
                stride,
                pad,
            } => {
                out.push_str("  pooling_param {\n");
                let _ = writeln!(out, "    pool: {}", method.token());
                let _ = writeln!(out, "    pad_h: {}", pad.0);
                let _ = writeln!(out, "    pad_w: {}", pad.1);
                let _ = writeln!(out, "    kernel_h: {}", kernel.0);
                let _ = writeln!(out, "    kernel_w: {}", kernel.1);
                let _ = writeln!(out, "    stride_h: {}", stride.0);
                let _ = writeln!(out, "    stride_w: {}", stride.1);
                out.push_str("  }\n");
            }
            LayerParam::InnerProduct {
                num_output,
                bias_term,
            } => {
                out.push_str("  inner_product_param {\n");
                let _ = writeln!(out, "    num_output: {}", num_output);
                let _ = writeln!(out, "    bias_term: {}", bias_term);
                out.push_str("  }\n");
            }
            LayerParam::Eltwise { operation } => {
                out.push_str("  eltwise_param {\n");
                let _ = writeln!(out, "    operation: {}", operation.token());
                out.push_str("  }\n");
            }
            LayerParam::Power {
                power,
                scale,
                shift,
            } => {
                out.push_str("  power_param {\n");
                let _ = writeln!(out, "    power: {}", power);
                let _ = writeln!(out, "    scale: {}", scale);
                let _ = writeln!(out, "    shift: {}", shift);
                out.push_str("  }\n");
            }
            LayerParam::Softmax { axis } => {
                out.push_str("  softmax_param {\n");
                let _ = writeln!(out, "    axis: {}", axis);
                out.push_str("  }\n");
            }
            LayerParam::Concat { axis } => {
                out.push_str("  concat_param {\n");
                let _ = writeln!(out, "    axis: {}", axis);
                out.push_str("  }\n");
            }
            LayerParam::Reshape { shape } => {
                out.push_str("  reshape_param {\n    shape {\n");
                for d in shape {
                    let _ = writeln!(out, "      dim: {}", d);
                }
                out.push_str("    }\n  }\n");
            }
            LayerParam::Flatten { axis } => {
                out.push_str("  flatten_param {\n");
                let _ = writeln!(out, "    axis: {}", axis);
                out.push_str("  }\n");
            }
            LayerParam::BatchNorm { eps } => {
                out.push_str("  batch_norm_param {\n");
                out.push_str("    use_global_stats: true\n");
                let _ = writeln!(out, "    eps: {}", eps);
                out.push_str("  }\n");
            }
            LayerParam::Scale { bias_term } => {
                out.push_str("  scale_param {\n");
                let _ = writeln!(out, "    bias_term: {}", bias_term);
                out.push_str("  }\n");
            }
        }
    }
}
