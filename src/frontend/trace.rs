//! Trace capability surface
//!
//! The converter depends on the source framework only through the narrow
//! [`TraceGraph`] contract: iterate nodes in execution order and read each
//! node's operator kind, attributes, and tensor shapes/dtypes. Resolving a
//! serialized trace file into such an object is the job of an external
//! [`TraceLoader`] collaborator.

use crate::error::{ConvertError, ConvertResult};
use crate::graph::{AttrValue, Attributes};
use crate::tensor::{Blob, TensorSpec};

/// One named tensor value of a trace
#[derive(Debug, Clone)]
pub struct TraceTensor {
    /// Tensor name, unique within the trace
    pub name: String,
    /// Shape and element type
    pub spec: TensorSpec,
}

impl TraceTensor {
    /// Create a trace tensor
    pub fn new(name: impl Into<String>, spec: TensorSpec) -> Self {
        Self {
            name: name.into(),
            spec,
        }
    }
}

/// One recorded computation step of a trace
#[derive(Debug, Clone)]
pub struct TraceNode {
    /// Node name, unique within the trace
    pub name: String,
    /// Framework operator kind tag (e.g. `"conv2d"`)
    pub kind: String,
    /// Operator attributes
    pub attrs: Attributes,
    /// Names of consumed tensors, in order
    pub inputs: Vec<String>,
    /// Produced tensors, in order
    pub outputs: Vec<TraceTensor>,
    /// Constant parameter payloads captured with the node
    pub params: Vec<Blob>,
}

impl TraceNode {
    /// Create a node with no attributes or parameters
    pub fn new(
        name: impl Into<String>,
        kind: impl Into<String>,
        inputs: Vec<String>,
        outputs: Vec<TraceTensor>,
    ) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            attrs: Attributes::default(),
            inputs,
            outputs,
            params: Vec::new(),
        }
    }

    /// Add one attribute
    pub fn with_attr(mut self, name: impl Into<String>, value: AttrValue) -> Self {
        self.attrs.insert(name.into(), value);
        self
    }

    /// Add one parameter payload
    pub fn with_param(mut self, blob: Blob) -> Self {
        self.params.push(blob);
        self
    }
}

/// Read-only view of a traced computation graph
///
/// The required capability set is deliberately minimal so the source
/// framework can be swapped without touching the IR, transform, or backend
/// components.
pub trait TraceGraph {
    /// Trace (model) name
    fn name(&self) -> &str;
    /// Declared graph inputs, in order
    fn inputs(&self) -> &[TraceTensor];
    /// Names of declared graph outputs, in order
    fn outputs(&self) -> &[String];
    /// Recorded nodes, in execution order
    fn nodes(&self) -> &[TraceNode];
}

/// An owned in-memory trace
///
/// The canonical [`TraceGraph`] implementation, produced by loaders and by
/// tests.
#[derive(Debug, Clone, Default)]
pub struct TracedModule {
    name: String,
    inputs: Vec<TraceTensor>,
    outputs: Vec<String>,
    nodes: Vec<TraceNode>,
}

impl TracedModule {
    /// Create an empty trace
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Declare a graph input
    pub fn push_input(&mut self, name: impl Into<String>, spec: TensorSpec) -> &mut Self {
        self.inputs.push(TraceTensor::new(name, spec));
        self
    }

    /// Append a node in execution order
    pub fn push_node(&mut self, node: TraceNode) -> &mut Self {
        self.nodes.push(node);
        self
    }

    /// Declare the graph outputs
    pub fn set_outputs(&mut self, outputs: Vec<String>) -> &mut Self {
        self.outputs = outputs;
        self
    }
}

impl TraceGraph for TracedModule {
    fn name(&self) -> &str {
        &self.name
    }

    fn inputs(&self) -> &[TraceTensor] {
        &self.inputs
    }

    fn outputs(&self) -> &[String] {
        &self.outputs
    }

    fn nodes(&self) -> &[TraceNode] {
        &self.nodes
    }
}

/// External collaborator resolving a trace path to an in-memory trace
pub trait TraceLoader {
    /// Load and deserialize the trace at `path`
    fn load(&self, path: &str) -> ConvertResult<TracedModule>;
}

/// Input surface of a conversion: an in-memory trace or a path to one
pub enum TraceArtifact<'a> {
    /// Already-loaded trace object
    Module(&'a dyn TraceGraph),
    /// Path to a serialized trace, resolved through a [`TraceLoader`]
    Path(&'a str),
}

impl TraceArtifact<'_> {
    /// Validate the artifact before any IR work begins
    pub fn validate(&self) -> ConvertResult<()> {
        match self {
            TraceArtifact::Module(_) => Ok(()),
            TraceArtifact::Path(p) if p.is_empty() => Err(ConvertError::InputValidation(
                "trace path must be non-empty".to_string(),
            )),
            TraceArtifact::Path(_) => Ok(()),
        }
    }
}
