//! Backend-neutral IR graph
//!
//! This module provides the core data structure of the converter:
//!
//! - [`IRGraph`]: arena-owned operator DAG with invariant-checked mutation
//! - [`IRNode`]: one operator instance (kind, attributes, edges, payloads)
//! - [`TensorRef`]: weak (producer, slot) edge reference
//! - [`OpKind`]: the fixed operator vocabulary
//!
//! # Overview
//!
//! Nodes live in an integer-indexed arena; edges are `(producer id, output
//! slot)` pairs held by consumer nodes. Removal and rewiring are plain index
//! updates with explicit validity checks, so the graph never relies on
//! shared ownership between nodes.
//!
//! # Example
//!
//! ```ignore
//! use trace2caffe::graph::{IRGraph, IRNode, OpKind};
//! use trace2caffe::tensor::TensorSpec;
//!
//! let mut g = IRGraph::new("net");
//! let x = g.add_input("x", TensorSpec::f32(vec![1, 8]));
//! let relu = g.insert_node(
//!     IRNode::new("relu_0", OpKind::Relu)
//!         .with_inputs(vec![x])
//!         .with_outputs(vec![TensorSpec::f32(vec![1, 8])]),
//! )?;
//! g.set_outputs(vec![g.output_ref_of(relu, 0)])?;
//! ```
//!
//! The mutation surface available to passes lives in [`mutators`]; traversal
//! ([`IRGraph::topo_order`]) is recomputed per request so no pass observes a
//! half-applied view from another pass.

pub mod graph;
pub mod mutators;
pub mod node;
pub mod op;

pub use graph::IRGraph;
pub use node::{IRNode, NodeId, TensorRef};
pub use op::{AttrValue, Attributes, OpKind};
