//! # trace2caffe
//!
//! Converts traced model graphs to Caffe `prototxt` + `caffemodel`
//! artifacts.
//!
//! The pipeline is a small compiler over a DAG of typed tensors and
//! operators:
//!
//! - **Frontend**: lowers a framework trace into a backend-neutral IR graph
//! - **Transform**: applies an ordered list of graph-rewrite passes
//! - **Backend**: lowers IR operators to Caffe layers and serializes
//!   structure + weights
//!
//! ## Example
//!
//! ```ignore
//! use trace2caffe::prelude::*;
//!
//! let trace = my_loader.load("model.tm")?;
//! tracedmodule_to_caffe(&trace, "out.prototxt", "out.caffemodel", false)?;
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod backend;
pub mod converter;
pub mod error;
pub mod frontend;
pub mod graph;
pub mod proto;
pub mod tensor;
pub mod transform;

/// Prelude module - import commonly used types with `use trace2caffe::prelude::*`
pub mod prelude {
    pub use crate::backend::{CaffeConverter, CaffeLayer, CaffeNet};
    pub use crate::converter::{
        convert_trace, trace_artifact_to_caffe, tracedmodule_to_caffe, ConversionContext,
    };
    pub use crate::error::{ConvertError, ConvertResult};
    pub use crate::frontend::{
        lower_trace, TraceArtifact, TraceGraph, TraceLoader, TraceNode, TraceTensor, TracedModule,
    };
    pub use crate::graph::{AttrValue, IRGraph, IRNode, NodeId, OpKind, TensorRef};
    pub use crate::tensor::{Blob, DType, TensorSpec};
    pub use crate::transform::{IRTransform, TransformStats, TransformerRule};
}

pub use error::{ConvertError, ConvertResult};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default structural artifact name
pub const DEFAULT_PROTOTXT: &str = "out.prototxt";
/// Default weights artifact name
pub const DEFAULT_CAFFEMODEL: &str = "out.caffemodel";
