//! Caffe protobuf types
//!
//! This module re-exports the generated protobuf types from `prost-build`.
//! Only the messages needed for the weights artifact are generated; the
//! structural prototxt is rendered as text by the backend writer.

/// Generated Caffe protobuf types
#[allow(missing_docs)]
#[allow(clippy::all)]
pub mod caffe {
    include!(concat!(env!("OUT_DIR"), "/caffe.rs"));
}

pub use caffe::{BlobProto, BlobShape, LayerParameter, NetParameter};
