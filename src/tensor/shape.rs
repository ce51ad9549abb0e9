//! Shape utilities
//!
//! Helpers for working with concrete tensor shapes and reshape targets.

use crate::error::{ConvertError, ConvertResult};

/// Total number of elements for a shape (scalar = 1)
pub fn numel(shape: &[usize]) -> usize {
    shape.iter().product()
}

/// Resolve a reshape target against a known element count.
///
/// The target may contain at most one `-1` wildcard, which is inferred from
/// the element count. The resolved shape must cover exactly `count` elements.
pub fn resolve_reshape(count: usize, target: &[i64]) -> ConvertResult<Vec<usize>> {
    let wildcards = target.iter().filter(|&&d| d == -1).count();
    if wildcards > 1 {
        return Err(ConvertError::TransformInvariant(format!(
            "reshape target {:?} has more than one wildcard dimension",
            target
        )));
    }
    if target.iter().any(|&d| d < -1 || d == 0) {
        return Err(ConvertError::TransformInvariant(format!(
            "reshape target {:?} contains an invalid dimension",
            target
        )));
    }

    let known: usize = target
        .iter()
        .filter(|&&d| d > 0)
        .map(|&d| d as usize)
        .product();

    let mut resolved: Vec<usize> = Vec::with_capacity(target.len());
    for &d in target {
        if d == -1 {
            if known == 0 || count % known != 0 {
                return Err(ConvertError::TransformInvariant(format!(
                    "cannot infer wildcard in reshape target {:?} for {} elements",
                    target, count
                )));
            }
            resolved.push(count / known);
        } else {
            resolved.push(d as usize);
        }
    }

    if numel(&resolved) != count {
        return Err(ConvertError::TransformInvariant(format!(
            "reshape target {:?} does not cover {} elements",
            target, count
        )));
    }

    Ok(resolved)
}
