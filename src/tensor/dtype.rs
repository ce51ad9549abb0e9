//! Tensor element types
//!
//! The element types the converter tracks for shape/size bookkeeping.
//! Blob payloads are carried as opaque bytes; the dtype only determines
//! element width and which payloads the Caffe backend may serialize.

use std::fmt;

/// Element type of a tensor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DType {
    /// 32-bit IEEE float
    Float32,
    /// 16-bit IEEE float
    Float16,
    /// 32-bit signed integer
    Int32,
    /// 8-bit signed integer
    Int8,
    /// 8-bit unsigned integer
    Uint8,
}

impl DType {
    /// Size of one element in bytes
    pub fn size_bytes(self) -> usize {
        match self {
            DType::Float32 | DType::Int32 => 4,
            DType::Float16 => 2,
            DType::Int8 | DType::Uint8 => 1,
        }
    }

    /// Check if this is a floating-point type
    pub fn is_float(self) -> bool {
        matches!(self, DType::Float32 | DType::Float16)
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DType::Float32 => "float32",
            DType::Float16 => "float16",
            DType::Int32 => "int32",
            DType::Int8 => "int8",
            DType::Uint8 => "uint8",
        };
        f.write_str(s)
    }
}
