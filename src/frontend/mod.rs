//! Frontend: trace capability surface and lowering
//!
//! The frontend owns the boundary to the source framework. A trace is read
//! through the minimal [`TraceGraph`] contract and lowered into a fresh
//! [`IRGraph`](crate::graph::IRGraph); the trace object stays read-only
//! throughout.

pub mod lowering;
pub mod trace;

pub use lowering::{lower_op_kind, lower_trace};
pub use trace::{TraceArtifact, TraceGraph, TraceLoader, TraceNode, TraceTensor, TracedModule};
