//! Graph transform engine
//!
//! A conversion runs an ordered list of rewrite passes over one
//! [`IRGraph`]. The pass vocabulary is the closed [`TransformerRule`] enum;
//! the caller composes a pipeline from it (or takes
//! [`IRTransform::default_pipeline`]) and every rule runs exactly once, in
//! the given order. Passes that find no applicable subgraph are sanctioned
//! no-ops; a pass that finds or leaves the graph invalid aborts the whole
//! pipeline.
//!
//! Order sensitivity is part of the contract: the rewiring rules run before
//! dead-code elimination so orphans are pruned, and node-synthesizing rules
//! run after it so fresh nodes survive. The engine never reorders or
//! iterates to a fixpoint.

pub mod add_fake_hsigmoid;
pub mod common;
pub mod remove_dropout;
pub mod remove_reshape_related;
pub mod remove_unrelated;

use strum_macros::{Display, EnumString};

use crate::error::ConvertResult;
use crate::graph::IRGraph;

/// The fixed vocabulary of transform passes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
pub enum TransformerRule {
    /// Bridge out inference-time dropout nodes
    RemoveDropout,
    /// Collapse redundant reshape chains
    RemoveReshapeRelatedOp,
    /// Dead-code elimination backward from the graph outputs
    RemoveUnrelatedIrOp,
    /// Decompose hard-sigmoid into backend-supported primitives
    AddFakeHSigmoidOut,
}

/// Change statistics accumulated across a pipeline run
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TransformStats {
    /// Nodes removed from the graph
    pub nodes_removed: usize,
    /// Nodes synthesized by passes
    pub nodes_added: usize,
    /// Edges (consumer inputs or graph outputs) redirected
    pub edges_rewired: usize,
}

impl TransformStats {
    /// Fold another pass's statistics into this one
    pub fn merge(&mut self, other: TransformStats) {
        self.nodes_removed += other.nodes_removed;
        self.nodes_added += other.nodes_added;
        self.edges_rewired += other.edges_rewired;
    }
}

/// An ordered, caller-constructed pass pipeline
#[derive(Debug, Clone)]
pub struct IRTransform {
    rules: Vec<TransformerRule>,
}

impl IRTransform {
    /// Create a pipeline from an explicit rule order
    pub fn new(rules: impl Into<Vec<TransformerRule>>) -> Self {
        Self {
            rules: rules.into(),
        }
    }

    /// The default Caffe-targeting pipeline
    pub fn default_pipeline() -> Self {
        Self::new(vec![
            TransformerRule::RemoveDropout,
            TransformerRule::RemoveReshapeRelatedOp,
            TransformerRule::RemoveUnrelatedIrOp,
            TransformerRule::AddFakeHSigmoidOut,
        ])
    }

    /// The configured rules, in execution order
    pub fn rules(&self) -> &[TransformerRule] {
        &self.rules
    }

    /// Run every rule exactly once, in order, over the same graph instance
    ///
    /// The graph is validated before the first rule and after every rule;
    /// any violation aborts the pipeline without retrying.
    pub fn transform(&self, graph: &mut IRGraph) -> ConvertResult<TransformStats> {
        graph.validate()?;

        let mut total = TransformStats::default();
        for rule in &self.rules {
            let stats = match rule {
                TransformerRule::RemoveDropout => remove_dropout::apply(graph)?,
                TransformerRule::RemoveReshapeRelatedOp => remove_reshape_related::apply(graph)?,
                TransformerRule::RemoveUnrelatedIrOp => remove_unrelated::apply(graph)?,
                TransformerRule::AddFakeHSigmoidOut => add_fake_hsigmoid::apply(graph)?,
            };
            graph.validate()?;

            log::debug!(
                "{}: -{} +{} nodes, {} edges rewired",
                rule,
                stats.nodes_removed,
                stats.nodes_added,
                stats.edges_rewired
            );
            total.merge(stats);
        }

        Ok(total)
    }
}

impl Default for IRTransform {
    fn default() -> Self {
        Self::default_pipeline()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{IRNode, OpKind, TensorRef};
    use crate::tensor::TensorSpec;

    fn spec() -> TensorSpec {
        TensorSpec::f32(vec![1, 4])
    }

    /// Conv -> Dropout -> HardSigmoid with a dead Sigmoid branch
    fn make_graph() -> IRGraph {
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
        let hsig = g
            .insert_node(
                IRNode::new("hsig_0", OpKind::HardSigmoid)
                    .with_inputs(vec![g.output_ref_of(drop, 0)])
                    .with_outputs(vec![spec()]),
            )
            .unwrap();
        let _dead = g
            .insert_node(
                IRNode::new("sigmoid_0", OpKind::Sigmoid)
                    .with_inputs(vec![g.output_ref_of(conv, 0)])
                    .with_outputs(vec![spec()]),
            )
            .unwrap();
        g.set_outputs(vec![g.output_ref_of(hsig, 0)]).unwrap();
        g
    }

    #[test]
    fn test_default_pipeline_order() {
        let rules = IRTransform::default_pipeline().rules().to_vec();
        assert_eq!(
            rules,
            vec![
                TransformerRule::RemoveDropout,
                TransformerRule::RemoveReshapeRelatedOp,
                TransformerRule::RemoveUnrelatedIrOp,
                TransformerRule::AddFakeHSigmoidOut,
            ]
        );
    }

    #[test]
    fn test_full_pipeline() {
        let mut g = make_graph();
        let stats = IRTransform::default_pipeline().transform(&mut g).unwrap();

        // Dropout bridged, dead branch pruned, hard-sigmoid decomposed.
        assert_eq!(stats.nodes_removed, 3);
        assert_eq!(stats.nodes_added, 3);
        assert!(g.node_ids().all(|id| {
            let op = g.node(id).unwrap().op;
            op != OpKind::Dropout && op != OpKind::HardSigmoid && op != OpKind::Sigmoid
        }));
        assert!(g.validate().is_ok());
    }

    #[test]
    fn test_no_dangling_or_mismatched_refs_survive() {
        let mut g = make_graph();
        IRTransform::default_pipeline().transform(&mut g).unwrap();

        for id in g.node_ids().collect::<Vec<_>>() {
            let node = g.node(id).unwrap();
            for (idx, input) in node.inputs.iter().enumerate() {
                let produced = g.tensor_spec(*input).unwrap();
                // Every consumed tensor resolves, and resolving through a
                // node output yields the producer's declared spec.
                if let TensorRef::NodeOutput { node: p, slot } = input {
                    assert_eq!(produced, &g.node(*p).unwrap().outputs[*slot], "{}:{}", id, idx);
                }
            }
        }
    }

    #[test]
    fn test_empty_rule_list_is_identity() {
        let mut g = make_graph();
        let before = g.live_count();
        let stats = IRTransform::new(vec![]).transform(&mut g).unwrap();
        assert_eq!(stats, TransformStats::default());
        assert_eq!(g.live_count(), before);
    }
}
