//! The IR graph arena
//!
//! [`IRGraph`] owns every node and all tensor metadata of one conversion.
//! Nodes occupy arena slots addressed by [`NodeId`]; removing a node empties
//! its slot and invalidates references into it, which every resolving
//! accessor checks explicitly.

use rustc_hash::FxHashSet;
use smallvec::SmallVec;

use crate::error::{ConvertError, ConvertResult};
use crate::tensor::TensorSpec;

use super::node::{IRNode, NodeId, TensorRef};

/// A backend-neutral operator graph
#[derive(Debug, Clone, Default)]
pub struct IRGraph {
    /// Graph name, carried into the emitted net
    name: String,
    /// Node arena; `None` marks a removed slot
    slots: Vec<Option<IRNode>>,
    /// Declared graph inputs, in order
    inputs: Vec<(String, TensorSpec)>,
    /// Declared graph outputs, in order
    outputs: Vec<TensorRef>,
}

impl IRGraph {
    /// Create an empty graph
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Graph name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declare a graph input and return its reference
    pub fn add_input(&mut self, name: impl Into<String>, spec: TensorSpec) -> TensorRef {
        self.inputs.push((name.into(), spec));
        TensorRef::GraphInput(self.inputs.len() - 1)
    }

    /// Declared graph inputs, in order
    pub fn inputs(&self) -> &[(String, TensorSpec)] {
        &self.inputs
    }

    /// Declared graph outputs, in order
    pub fn outputs(&self) -> &[TensorRef] {
        &self.outputs
    }

    /// Declare the graph outputs
    pub fn set_outputs(&mut self, outputs: Vec<TensorRef>) -> ConvertResult<()> {
        for r in &outputs {
            self.tensor_spec(*r)?;
        }
        self.outputs = outputs;
        Ok(())
    }

    // ========================================================================
    // Node accessors
    // ========================================================================

    /// Get a node by id
    pub fn node(&self, id: NodeId) -> ConvertResult<&IRNode> {
        self.slots
            .get(id.0)
            .and_then(|s| s.as_ref())
            .ok_or_else(|| {
                ConvertError::TransformInvariant(format!("node {} does not exist", id))
            })
    }

    /// Get a mutable node by id
    pub fn node_mut(&mut self, id: NodeId) -> ConvertResult<&mut IRNode> {
        self.slots
            .get_mut(id.0)
            .and_then(|s| s.as_mut())
            .ok_or_else(|| {
                ConvertError::TransformInvariant(format!("node {} does not exist", id))
            })
    }

    /// Check whether a node id refers to a live node
    pub fn contains(&self, id: NodeId) -> bool {
        matches!(self.slots.get(id.0), Some(Some(_)))
    }

    /// Ids of live nodes, in arena (insertion) order
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.is_some())
            .map(|(i, _)| NodeId(i))
    }

    /// Number of live nodes
    pub fn live_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// Reference to one output slot of a node
    pub fn output_ref_of(&self, id: NodeId, slot: usize) -> TensorRef {
        TensorRef::NodeOutput { node: id, slot }
    }

    // ========================================================================
    // Tensor resolution
    // ========================================================================

    /// Resolve a reference to its spec, or `None` if it dangles
    pub fn resolve(&self, r: TensorRef) -> Option<&TensorSpec> {
        match r {
            TensorRef::GraphInput(i) => self.inputs.get(i).map(|(_, spec)| spec),
            TensorRef::NodeOutput { node, slot } => self
                .slots
                .get(node.0)
                .and_then(|s| s.as_ref())
                .and_then(|n| n.outputs.get(slot)),
        }
    }

    /// Resolve a reference to its spec; a dangling reference is an invariant
    /// violation
    pub fn tensor_spec(&self, r: TensorRef) -> ConvertResult<&TensorSpec> {
        self.resolve(r).ok_or_else(|| {
            ConvertError::TransformInvariant(format!("dangling tensor reference {}", r))
        })
    }

    /// All (consumer node, input index) pairs referencing a tensor
    pub fn consumers(&self, r: TensorRef) -> SmallVec<[(NodeId, usize); 4]> {
        let mut out = SmallVec::new();
        for (id, node) in self.live_nodes() {
            for (idx, input) in node.inputs.iter().enumerate() {
                if *input == r {
                    out.push((id, idx));
                }
            }
        }
        out
    }

    /// Check whether any consumer or graph output still references a node
    pub fn is_referenced(&self, id: NodeId) -> bool {
        let refers = |r: &TensorRef| matches!(r, TensorRef::NodeOutput { node, .. } if *node == id);
        self.outputs.iter().any(refers)
            || self
                .live_nodes()
                .filter(|(other, _)| *other != id)
                .any(|(_, node)| node.inputs.iter().any(refers))
    }

    /// Live (id, node) pairs in arena order
    pub fn live_nodes(&self) -> impl Iterator<Item = (NodeId, &IRNode)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.as_ref().map(|n| (NodeId(i), n)))
    }

    // ========================================================================
    // Traversal and validation
    // ========================================================================

    /// Live nodes in topological order
    ///
    /// Recomputed per request, so mutations between calls are always fully
    /// visible to the next traversal. A cycle is an invariant violation.
    pub fn topo_order(&self) -> ConvertResult<Vec<NodeId>> {
        let live: Vec<NodeId> = self.node_ids().collect();
        let mut indegree = vec![0usize; self.slots.len()];

        for (id, node) in self.live_nodes() {
            for input in &node.inputs {
                if let TensorRef::NodeOutput { .. } = input {
                    indegree[id.0] += 1;
                }
            }
        }

        let mut queue: Vec<NodeId> = live.iter().copied().filter(|id| indegree[id.0] == 0).collect();
        let mut order = Vec::with_capacity(live.len());
        let mut head = 0;

        while head < queue.len() {
            let id = queue[head];
            head += 1;
            order.push(id);

            for (consumer, _) in self.consumers_of_node(id) {
                indegree[consumer.0] -= 1;
                if indegree[consumer.0] == 0 {
                    queue.push(consumer);
                }
            }
        }

        if order.len() != live.len() {
            return Err(ConvertError::TransformInvariant(
                "graph contains a cycle".to_string(),
            ));
        }
        Ok(order)
    }

    /// Full invariant audit: no dangling references, outputs resolvable,
    /// and the node set forms a DAG
    pub fn validate(&self) -> ConvertResult<()> {
        let mut names = FxHashSet::default();
        for (_, node) in self.live_nodes() {
            if !names.insert(node.name.as_str()) {
                return Err(ConvertError::TransformInvariant(format!(
                    "duplicate node name '{}'",
                    node.name
                )));
            }
            for input in &node.inputs {
                if self.resolve(*input).is_none() {
                    return Err(ConvertError::TransformInvariant(format!(
                        "node '{}' has dangling input {}",
                        node.name, input
                    )));
                }
            }
        }
        for (i, output) in self.outputs.iter().enumerate() {
            if self.resolve(*output).is_none() {
                return Err(ConvertError::TransformInvariant(format!(
                    "graph output #{} references missing tensor {}",
                    i, output
                )));
            }
        }
        self.topo_order()?;
        Ok(())
    }

    /// Edges from a node's outputs to each consuming (node, input index)
    fn consumers_of_node(&self, id: NodeId) -> SmallVec<[(NodeId, usize); 4]> {
        let mut out = SmallVec::new();
        for (other, node) in self.live_nodes() {
            for (idx, input) in node.inputs.iter().enumerate() {
                if matches!(input, TensorRef::NodeOutput { node, .. } if *node == id) {
                    out.push((other, idx));
                }
            }
        }
        out
    }

    pub(super) fn slot_mut(&mut self, id: NodeId) -> &mut Option<IRNode> {
        &mut self.slots[id.0]
    }

    pub(super) fn outputs_mut(&mut self) -> &mut Vec<TensorRef> {
        &mut self.outputs
    }

    pub(super) fn push_slot(&mut self, node: IRNode) -> NodeId {
        self.slots.push(Some(node));
        NodeId(self.slots.len() - 1)
    }
}
