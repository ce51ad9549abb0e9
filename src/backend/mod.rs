//! Caffe backend emitter
//!
//! Lowers a finalized [`IRGraph`] to Caffe layer descriptions and
//! serializes them as two artifacts: a textual prototxt describing
//! topology and attributes, and a binary caffemodel carrying parameter
//! payloads in node order.
//!
//! The emitter is a two-phase state machine: [`CaffeConverter::convert`]
//! buffers the lowered net in memory, then [`CaffeConverter::dump`] writes
//! the artifacts. `dump` before `convert`, or `convert` twice, is a guarded
//! precondition violation, so a failed conversion can never leave partial
//! output files behind.

pub mod layer;
pub mod ops;
pub mod writer;

pub use layer::{CaffeLayer, EltwiseOp, LayerParam, PoolMethod};
pub use ops::lower_node;
pub use writer::{encode_caffemodel, render_prototxt, write_caffemodel, write_prototxt};

use rustc_hash::{FxHashMap, FxHashSet};

use crate::error::{ConvertError, ConvertResult};
use crate::graph::{IRGraph, TensorRef};

/// A fully lowered net, buffered in memory between convert and dump
#[derive(Debug, Clone)]
pub struct CaffeNet {
    /// Net name, from the IR graph
    pub name: String,
    /// Emitted layers: one `Input` per graph input, then the lowered nodes
    /// in topological order
    pub layers: Vec<CaffeLayer>,
}

/// Lowers one IR graph into Caffe artifacts
#[derive(Debug)]
pub struct CaffeConverter {
    graph: IRGraph,
    omit_blobs: bool,
    net: Option<CaffeNet>,
}

impl CaffeConverter {
    /// Take ownership of a finalized graph
    pub fn new(graph: IRGraph, omit_blobs: bool) -> Self {
        Self {
            graph,
            omit_blobs,
            net: None,
        }
    }

    /// The graph being emitted
    pub fn graph(&self) -> &IRGraph {
        &self.graph
    }

    /// The buffered net, available after a successful [`convert`](Self::convert)
    pub fn net(&self) -> Option<&CaffeNet> {
        self.net.as_ref()
    }

    /// Lower every node to its Caffe description and buffer the result
    ///
    /// Assigns each tensor a stable unique name: graph inputs keep their
    /// declared names, node outputs are named after the producing node
    /// (slot-suffixed beyond the first), and collisions get a numeric
    /// suffix.
    pub fn convert(&mut self) -> ConvertResult<()> {
        if self.net.is_some() {
            return Err(ConvertError::InvalidState(
                "convert() may only be called once per converter".to_string(),
            ));
        }
        self.graph.validate()?;

        let names = assign_tensor_names(&self.graph);
        let mut layers = Vec::with_capacity(self.graph.inputs().len() + self.graph.live_count());

        for (i, (_, spec)) in self.graph.inputs().iter().enumerate() {
            let top = names[&TensorRef::GraphInput(i)].clone();
            layers.push(CaffeLayer {
                name: top.clone(),
                kind: "Input",
                bottoms: vec![],
                tops: vec![top],
                param: LayerParam::Input {
                    shape: spec.shape.clone(),
                },
                blobs: vec![],
            });
        }

        for id in self.graph.topo_order()? {
            let node = self.graph.node(id)?;
            let bottoms = node.inputs.iter().map(|r| names[r].clone()).collect();
            let tops = (0..node.outputs.len())
                .map(|slot| names[&self.graph.output_ref_of(id, slot)].clone())
                .collect();
            layers.extend(lower_node(node, bottoms, tops)?);
        }

        log::info!(
            "lowered '{}' to {} Caffe layers",
            self.graph.name(),
            layers.len()
        );
        self.net = Some(CaffeNet {
            name: self.graph.name().to_string(),
            layers,
        });
        Ok(())
    }

    /// Write the prototxt and caffemodel artifacts
    ///
    /// Both paths must be non-empty; the converter must have been
    /// [`convert`](Self::convert)ed. No file is touched unless both checks
    /// pass.
    pub fn dump(&self, prototxt: &str, caffemodel: &str) -> ConvertResult<()> {
        validate_path(prototxt, "prototxt")?;
        validate_path(caffemodel, "caffemodel")?;
        let net = self.net.as_ref().ok_or_else(|| {
            ConvertError::InvalidState(
                "dump() requires a successful convert() first".to_string(),
            )
        })?;

        write_prototxt(net, prototxt)?;
        write_caffemodel(net, caffemodel, self.omit_blobs)?;
        log::info!("wrote '{}' and '{}'", prototxt, caffemodel);
        Ok(())
    }
}

/// Validate one output path argument before any I/O
pub fn validate_path(path: &str, which: &str) -> ConvertResult<()> {
    if path.is_empty() {
        return Err(ConvertError::InputValidation(format!(
            "{} path must be non-empty",
            which
        )));
    }
    Ok(())
}

/// Assign every tensor a stable, unique emitted name
fn assign_tensor_names(graph: &IRGraph) -> FxHashMap<TensorRef, String> {
    let mut used = FxHashSet::default();
    let mut names = FxHashMap::default();

    for (i, (name, _)) in graph.inputs().iter().enumerate() {
        names.insert(TensorRef::GraphInput(i), uniquify(name, &mut used));
    }

    for (id, node) in graph.live_nodes() {
        for slot in 0..node.outputs.len() {
            let base = if slot == 0 {
                node.name.clone()
            } else {
                format!("{}_{}", node.name, slot)
            };
            names.insert(graph.output_ref_of(id, slot), uniquify(&base, &mut used));
        }
    }

    names
}

fn uniquify(base: &str, used: &mut FxHashSet<String>) -> String {
    if used.insert(base.to_string()) {
        return base.to_string();
    }
    let mut n = 1;
    loop {
        let candidate = format!("{}_{}", base, n);
        if used.insert(candidate.clone()) {
            return candidate;
        }
        n += 1;
    }
}
