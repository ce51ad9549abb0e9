//! IR operator vocabulary and attribute values
//!
//! [`OpKind`] is the closed set of backend-neutral operators the frontend
//! lowers to and the passes rewrite over. Attributes are typed values keyed
//! by name, carried verbatim from the trace.

use indexmap::IndexMap;
use strum_macros::{Display, EnumString};

/// The fixed vocabulary of IR operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
pub enum OpKind {
    /// 2D convolution (weight blob `[oc, ic, kh, kw]`, optional bias)
    Conv2d,
    /// Fully connected layer (weight blob `[out, in]`, optional bias)
    Linear,
    /// Batch normalization (blobs `[gamma, beta, mean, var]`)
    BatchNorm,
    /// 2D max pooling
    MaxPool2d,
    /// 2D average pooling
    AvgPool2d,
    /// Rectified linear unit
    Relu,
    /// ReLU clipped at 6
    Relu6,
    /// Logistic sigmoid
    Sigmoid,
    /// Approximate hard sigmoid, `relu6(x + 3) / 6`
    HardSigmoid,
    /// Softmax over one axis
    Softmax,
    /// Elementwise addition
    Add,
    /// Elementwise multiplication
    Mul,
    /// Concatenation over one axis
    Concat,
    /// Shape change without data movement
    Reshape,
    /// Collapse trailing dimensions from one axis
    Flatten,
    /// Elementwise affine-power, `(scale * x + shift) ^ power`
    Power,
    /// Dropout (identity at inference time)
    Dropout,
    /// Element type conversion
    TypeCvt,
}

/// A typed attribute value
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    /// Scalar integer
    Int(i64),
    /// Scalar float
    Float(f32),
    /// Boolean flag
    Bool(bool),
    /// Integer list (shapes, per-axis parameters)
    Ints(Vec<i64>),
    /// Float list
    Floats(Vec<f32>),
    /// Free-form string
    Str(String),
}

/// Attribute map of one node (insertion order preserved)
pub type Attributes = IndexMap<String, AttrValue>;
