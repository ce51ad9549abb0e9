//! Tensor metadata and constant payloads
//!
//! The converter never interprets tensor contents; it carries shape/dtype
//! metadata ([`TensorSpec`]) and opaque parameter bytes ([`Blob`]) through
//! the pipeline, checking only size consistency.

pub mod dtype;
pub mod shape;

pub use dtype::DType;
pub use shape::{numel, resolve_reshape};

use crate::error::{ConvertError, ConvertResult};

/// Shape and element type of one tensor value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TensorSpec {
    /// Concrete dimensions, outermost first
    pub shape: Vec<usize>,
    /// Element type
    pub dtype: DType,
}

impl TensorSpec {
    /// Create a new spec
    pub fn new(shape: Vec<usize>, dtype: DType) -> Self {
        Self { shape, dtype }
    }

    /// Float32 spec shorthand (the common case for activations and weights)
    pub fn f32(shape: Vec<usize>) -> Self {
        Self::new(shape, DType::Float32)
    }

    /// Total number of elements
    pub fn numel(&self) -> usize {
        numel(&self.shape)
    }

    /// Total payload size in bytes
    pub fn byte_len(&self) -> usize {
        self.numel() * self.dtype.size_bytes()
    }
}

/// An opaque constant payload attached to a weight-holding node
#[derive(Debug, Clone, PartialEq)]
pub struct Blob {
    /// Shape and element type of the payload
    pub spec: TensorSpec,
    /// Raw little-endian bytes; length must match `spec.byte_len()`
    data: Vec<u8>,
}

impl Blob {
    /// Create a blob from raw bytes, checking size consistency
    pub fn new(spec: TensorSpec, data: Vec<u8>) -> ConvertResult<Self> {
        if data.len() != spec.byte_len() {
            return Err(ConvertError::TransformInvariant(format!(
                "blob payload is {} bytes but spec {:?} ({}) requires {}",
                data.len(),
                spec.shape,
                spec.dtype,
                spec.byte_len()
            )));
        }
        Ok(Self { spec, data })
    }

    /// Create a float32 blob from element values
    pub fn from_f32(shape: Vec<usize>, values: &[f32]) -> ConvertResult<Self> {
        let spec = TensorSpec::f32(shape);
        let mut data = Vec::with_capacity(values.len() * 4);
        for v in values {
            data.extend_from_slice(&v.to_le_bytes());
        }
        Self::new(spec, data)
    }

    /// Raw payload bytes
    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    /// Payload size in bytes
    pub fn byte_len(&self) -> usize {
        self.data.len()
    }

    /// Reinterpret the payload as float32 elements
    pub fn as_f32_vec(&self) -> ConvertResult<Vec<f32>> {
        if self.spec.dtype != DType::Float32 {
            return Err(ConvertError::TransformInvariant(format!(
                "cannot reinterpret {} blob as float32",
                self.spec.dtype
            )));
        }
        Ok(self
            .data
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spec_numel_and_bytes() {
        let spec = TensorSpec::f32(vec![2, 3]);
        assert_eq!(spec.numel(), 6);
        assert_eq!(spec.byte_len(), 24);
    }

    #[test]
    fn test_blob_size_check() {
        let spec = TensorSpec::f32(vec![2]);
        assert!(Blob::new(spec.clone(), vec![0u8; 8]).is_ok());
        assert!(Blob::new(spec, vec![0u8; 7]).is_err());
    }

    #[test]
    fn test_blob_f32_round_trip() {
        let blob = Blob::from_f32(vec![3], &[1.0, -2.5, 0.0]).unwrap();
        assert_eq!(blob.as_f32_vec().unwrap(), vec![1.0, -2.5, 0.0]);
    }

    #[test]
    fn test_blob_non_float_reinterpret() {
        let spec = TensorSpec::new(vec![4], DType::Uint8);
        let blob = Blob::new(spec, vec![1, 2, 3, 4]).unwrap();
        assert!(blob.as_f32_vec().is_err());
    }
}
