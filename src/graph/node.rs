//! IR node and tensor reference types
//!
//! Nodes live in an arena owned by [`IRGraph`](super::IRGraph) and are
//! addressed by [`NodeId`]. Edges are weak [`TensorRef`] values held by
//! consumer nodes: a producer id plus an output slot, never an owning
//! pointer, so removal and rewiring are plain index updates.

use std::fmt;

use crate::tensor::{Blob, TensorSpec};

use super::op::{AttrValue, Attributes, OpKind};

/// Arena index of a node within one [`IRGraph`](super::IRGraph)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// Raw arena index
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// A weak reference to one tensor value
///
/// Denotes either a declared graph input or the output slot of a producing
/// node. Shape and dtype are resolved through the owning graph, never
/// duplicated on the reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TensorRef {
    /// Declared graph input, by position
    GraphInput(usize),
    /// Output slot of a node
    NodeOutput {
        /// Producing node
        node: NodeId,
        /// Output slot index
        slot: usize,
    },
}

impl fmt::Display for TensorRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TensorRef::GraphInput(i) => write!(f, "input#{}", i),
            TensorRef::NodeOutput { node, slot } => write!(f, "{}:{}", node, slot),
        }
    }
}

/// One operator instance in the IR graph
#[derive(Debug, Clone)]
pub struct IRNode {
    /// Unique human-readable name, used for emitted tensor naming
    pub name: String,
    /// Operator kind tag
    pub op: OpKind,
    /// Typed attributes by name
    pub attrs: Attributes,
    /// Ordered input references
    pub inputs: Vec<TensorRef>,
    /// Ordered output specifications
    pub outputs: Vec<TensorSpec>,
    /// Constant parameter payloads (weights, biases, statistics)
    pub blobs: Vec<Blob>,
}

impl IRNode {
    /// Create a node with no inputs, outputs, attributes, or blobs
    pub fn new(name: impl Into<String>, op: OpKind) -> Self {
        Self {
            name: name.into(),
            op,
            attrs: Attributes::default(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            blobs: Vec::new(),
        }
    }

    /// Set the input references
    pub fn with_inputs(mut self, inputs: impl Into<Vec<TensorRef>>) -> Self {
        self.inputs = inputs.into();
        self
    }

    /// Set the output specifications
    pub fn with_outputs(mut self, outputs: impl Into<Vec<TensorSpec>>) -> Self {
        self.outputs = outputs.into();
        self
    }

    /// Add one attribute
    pub fn with_attr(mut self, name: impl Into<String>, value: AttrValue) -> Self {
        self.attrs.insert(name.into(), value);
        self
    }

    /// Add one constant payload
    pub fn with_blob(mut self, blob: Blob) -> Self {
        self.blobs.push(blob);
        self
    }

    /// Integer attribute accessor
    pub fn attr_i(&self, name: &str) -> Option<i64> {
        match self.attrs.get(name) {
            Some(AttrValue::Int(v)) => Some(*v),
            _ => None,
        }
    }

    /// Float attribute accessor
    pub fn attr_f(&self, name: &str) -> Option<f32> {
        match self.attrs.get(name) {
            Some(AttrValue::Float(v)) => Some(*v),
            _ => None,
        }
    }

    /// Boolean attribute accessor
    pub fn attr_bool(&self, name: &str) -> Option<bool> {
        match self.attrs.get(name) {
            Some(AttrValue::Bool(v)) => Some(*v),
            _ => None,
        }
    }

    /// Integer list attribute accessor
    pub fn attr_ints(&self, name: &str) -> Option<&[i64]> {
        match self.attrs.get(name) {
            Some(AttrValue::Ints(v)) => Some(v.as_slice()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::op::OpKind;

    #[test]
    fn test_node_builder() {
        let node = IRNode::new("relu_0", OpKind::Relu)
            .with_outputs(vec![TensorSpec::f32(vec![1, 8])])
            .with_attr("axis", AttrValue::Int(1));

        assert_eq!(node.name, "relu_0");
        assert_eq!(node.attr_i("axis"), Some(1));
        assert_eq!(node.attr_i("missing"), None);
        assert_eq!(node.outputs.len(), 1);
    }

    #[test]
    fn test_tensor_ref_display() {
        let r = TensorRef::NodeOutput {
            node: NodeId(3),
            slot: 1,
        };
        assert_eq!(r.to_string(), "n3:1");
        assert_eq!(TensorRef::GraphInput(0).to_string(), "input#0");
    }
}
