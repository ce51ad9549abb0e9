//! Graph mutation operations
//!
//! The mutation surface available to transform passes: insert, remove,
//! replace, and rewire. Every operation leaves the graph free of dangling
//! references or reports a [`TransformInvariant`](crate::error::ConvertError)
//! violation.

use crate::error::{ConvertError, ConvertResult};
use crate::tensor::TensorSpec;

use super::graph::IRGraph;
use super::node::{IRNode, NodeId, TensorRef};
use super::op::{Attributes, OpKind};

impl IRGraph {
    /// Insert a node, validating that every input reference resolves
    ///
    /// Returns the fresh node id; output references are obtained via
    /// [`IRGraph::output_ref_of`].
    pub fn insert_node(&mut self, node: IRNode) -> ConvertResult<NodeId> {
        for input in &node.inputs {
            if self.resolve(*input).is_none() {
                return Err(ConvertError::TransformInvariant(format!(
                    "cannot insert node '{}': input {} does not resolve",
                    node.name, input
                )));
            }
        }
        Ok(self.push_slot(node))
    }

    /// Remove a node, invalidating its output references
    ///
    /// Fails unless every consumer of its outputs has already been rewired
    /// or removed.
    pub fn remove_node(&mut self, id: NodeId) -> ConvertResult<IRNode> {
        self.node(id)?;
        if self.is_referenced(id) {
            let name = &self.node(id)?.name;
            return Err(ConvertError::TransformInvariant(format!(
                "cannot remove node '{}': its outputs are still referenced",
                name
            )));
        }
        self.slot_mut(id).take().ok_or_else(|| {
            ConvertError::TransformInvariant(format!("node {} does not exist", id))
        })
    }

    /// Replace a node's operator kind and attributes in place
    ///
    /// The output arity and specs are untouched; use
    /// [`IRGraph::redeclare_output`] to re-declare an output contract.
    pub fn replace_op(&mut self, id: NodeId, op: OpKind, attrs: Attributes) -> ConvertResult<()> {
        let node = self.node_mut(id)?;
        node.op = op;
        node.attrs = attrs;
        Ok(())
    }

    /// Re-declare the spec of one output slot
    ///
    /// Callers take over the shape contract for every consumer of the slot.
    pub fn redeclare_output(
        &mut self,
        id: NodeId,
        slot: usize,
        spec: TensorSpec,
    ) -> ConvertResult<()> {
        let node = self.node_mut(id)?;
        let out = node.outputs.get_mut(slot).ok_or_else(|| {
            ConvertError::TransformInvariant(format!(
                "node '{}' has no output slot {}",
                node.name, slot
            ))
        })?;
        *out = spec;
        Ok(())
    }

    /// Redirect one input edge of a consumer to a new reference
    ///
    /// The new reference must resolve to the same shape and dtype as the
    /// old one.
    pub fn rewire_input(
        &mut self,
        consumer: NodeId,
        index: usize,
        new_ref: TensorRef,
    ) -> ConvertResult<()> {
        let old_ref = *self.node(consumer)?.inputs.get(index).ok_or_else(|| {
            ConvertError::TransformInvariant(format!(
                "node {} has no input index {}",
                consumer, index
            ))
        })?;
        self.check_specs_match(old_ref, new_ref)?;
        self.node_mut(consumer)?.inputs[index] = new_ref;
        Ok(())
    }

    /// Redirect one declared graph output to a new reference
    pub fn rewire_output(&mut self, index: usize, new_ref: TensorRef) -> ConvertResult<()> {
        let old_ref = *self.outputs().get(index).ok_or_else(|| {
            ConvertError::TransformInvariant(format!("graph has no output index {}", index))
        })?;
        self.check_specs_match(old_ref, new_ref)?;
        self.outputs_mut()[index] = new_ref;
        Ok(())
    }

    /// Redirect every use of a tensor (consumer inputs and graph outputs)
    /// to a new reference, returning the number of edges rewired
    pub fn replace_all_uses(&mut self, old: TensorRef, new: TensorRef) -> ConvertResult<usize> {
        self.check_specs_match(old, new)?;
        let mut rewired = 0;

        let consumers = self.consumers(old);
        for (consumer, index) in consumers {
            self.node_mut(consumer)?.inputs[index] = new;
            rewired += 1;
        }

        let output_hits: Vec<usize> = self
            .outputs()
            .iter()
            .enumerate()
            .filter(|(_, r)| **r == old)
            .map(|(i, _)| i)
            .collect();
        for i in output_hits {
            self.outputs_mut()[i] = new;
            rewired += 1;
        }

        Ok(rewired)
    }

    fn check_specs_match(&self, old: TensorRef, new: TensorRef) -> ConvertResult<()> {
        let old_spec = self.tensor_spec(old)?;
        let new_spec = self.tensor_spec(new)?;
        if old_spec != new_spec {
            return Err(ConvertError::TransformInvariant(format!(
                "cannot rewire {} -> {}: spec {:?}/{} does not match {:?}/{}",
                old, new, old_spec.shape, old_spec.dtype, new_spec.shape, new_spec.dtype
            )));
        }
        Ok(())
    }
}
