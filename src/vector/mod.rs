//! Dense vector type and distance math.
//!
//! All vectors in an index share one fixed dimension and are unit-normalized
//! before insertion or querying. Distances are squared Euclidean, which over
//! unit vectors is monotonically related to cosine similarity by
//! `similarity = 1 - distance / 2`. That identity is exact only when both
//! vectors have unit norm; callers must preserve the normalization invariant
//! or reported similarities are meaningless.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SagittaError};

/// A dense vector of f32 components.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vector {
    /// The vector components.
    pub data: Vec<f32>,
}

impl Vector {
    /// Create a new vector from raw components.
    pub fn new(data: Vec<f32>) -> Self {
        Self { data }
    }

    /// Get the dimensionality of this vector.
    pub fn dimension(&self) -> usize {
        self.data.len()
    }

    /// Calculate the L2 norm (magnitude) of this vector.
    pub fn norm(&self) -> f32 {
        self.data.iter().map(|x| x * x).sum::<f32>().sqrt()
    }

    /// Normalize this vector to unit length. Zero vectors are left unchanged.
    pub fn normalize(&mut self) {
        let norm = self.norm();
        if norm > 0.0 {
            for value in &mut self.data {
                *value /= norm;
            }
        }
    }

    /// Get a normalized copy of this vector.
    pub fn normalized(&self) -> Self {
        let mut normalized = self.clone();
        normalized.normalize();
        normalized
    }

    /// Validate that this vector has the expected dimension.
    pub fn validate_dimension(&self, expected: usize) -> Result<()> {
        if self.data.len() != expected {
            return Err(SagittaError::dimension_mismatch(expected, self.data.len()));
        }
        Ok(())
    }

    /// Check that this vector contains no NaN or infinite components.
    pub fn is_valid(&self) -> bool {
        self.data.iter().all(|x| x.is_finite())
    }

    /// Normalize a batch of vectors, in parallel for larger batches.
    pub fn normalize_batch(vectors: &mut [Vector]) {
        if vectors.len() > 64 {
            vectors.par_iter_mut().for_each(|vector| vector.normalize());
        } else {
            for vector in vectors {
                vector.normalize();
            }
        }
    }
}

impl From<Vec<f32>> for Vector {
    fn from(data: Vec<f32>) -> Self {
        Vector::new(data)
    }
}

/// Squared Euclidean distance between two equal-length slices.
///
/// Callers are responsible for dimension checks; slices of unequal length
/// are truncated to the shorter by `zip`.
pub fn squared_euclidean(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}

/// Convert a squared Euclidean distance between unit vectors into a cosine
/// similarity score.
pub fn similarity_from_distance(distance: f32) -> f32 {
    1.0 - distance / 2.0
}
