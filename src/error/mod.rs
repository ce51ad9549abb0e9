//! Error types for trace2caffe
//!
//! This module defines all error types used throughout the crate.

use thiserror::Error;

/// Main error type for trace-to-Caffe conversion
#[derive(Error, Debug)]
pub enum ConvertError {
    /// Bad argument at the conversion boundary (paths, malformed trace input)
    #[error("Invalid input: {0}")]
    InputValidation(String),

    /// Frontend lowering has no mapping for a source operator kind
    #[error("Unsupported source operator: {0}")]
    UnsupportedOperator(String),

    /// A pass found or left the graph in an invalid state
    #[error("Transform invariant violated: {0}")]
    TransformInvariant(String),

    /// The Caffe backend has no lowering for an IR operator kind
    #[error("No Caffe lowering for operator: {0}")]
    UnsupportedTargetOperator(String),

    /// Converter precondition misuse (dump before convert, double convert)
    #[error("Invalid converter state: {0}")]
    InvalidState(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Protobuf encode error
    #[error("Protobuf encode error: {0}")]
    ProtoEncode(#[from] prost::EncodeError),
}

/// Result type alias for conversion operations
pub type ConvertResult<T> = Result<T, ConvertError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ConvertError::UnsupportedOperator("roi_align".to_string());
        assert!(err.to_string().contains("roi_align"));
    }

    #[test]
    fn test_target_operator_names_kind() {
        let err = ConvertError::UnsupportedTargetOperator("Dropout".to_string());
        assert!(err.to_string().contains("Dropout"));
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: ConvertError = io.into();
        assert!(matches!(err, ConvertError::Io(_)));
    }
}
