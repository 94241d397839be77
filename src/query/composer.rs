//! Hybrid query fusion: combine several query vectors into one.
//!
//! A hybrid query (for example an image embedding plus a text embedding) is
//! the unit-normalized weighted sum of its components. Weights are usually a
//! convex combination but need not sum to 1; what matters is that the sum is
//! not the zero vector, which has no defined normalization.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SagittaError};
use crate::vector::Vector;

/// One component of a hybrid query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeightedVector {
    pub vector: Vector,
    pub weight: f32,
}

impl WeightedVector {
    pub fn new(vector: Vector, weight: f32) -> Self {
        Self { vector, weight }
    }
}

/// Fuse weighted components into a single unit-normalized query vector.
///
/// Returns [`SagittaError::DegenerateCombination`] when the input is empty
/// or the weighted sum is (numerically) the zero vector, and
/// [`SagittaError::DimensionMismatch`] when components disagree on length.
pub fn fuse(components: &[WeightedVector]) -> Result<Vector> {
    let Some(first) = components.first() else {
        return Err(SagittaError::DegenerateCombination);
    };
    let dim = first.vector.dimension();

    let mut sum = vec![0.0f32; dim];
    for component in components {
        component.vector.validate_dimension(dim)?;
        for (acc, value) in sum.iter_mut().zip(&component.vector.data) {
            *acc += component.weight * value;
        }
    }

    let mut fused = Vector::new(sum);
    if fused.norm() == 0.0 {
        return Err(SagittaError::DegenerateCombination);
    }
    fused.normalize();
    Ok(fused)
}

/// Two-component convenience: `alpha * a + (1 - alpha) * b`, normalized.
pub fn blend(a: &Vector, b: &Vector, alpha: f32) -> Result<Vector> {
    fuse(&[
        WeightedVector::new(a.clone(), alpha),
        WeightedVector::new(b.clone(), 1.0 - alpha),
    ])
}
