//! Latent factors of users and items.

use serde::{Deserialize, Serialize};

use crate::error::CoreResult;
use crate::math::vector::Vector;

/// Scalar bias plus a latent vector of the model rank.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct LatentFactor {
    pub bias: f32,
    pub vector: Vector,
}

impl LatentFactor {
    #[must_use]
    pub fn new(bias: f32, vector: impl Into<Vector>) -> Self {
        Self {
            bias,
            vector: vector.into(),
        }
    }

    #[must_use]
    pub fn zeros(rank: usize) -> Self {
        Self::new(0.0, Vector::zeros(rank))
    }

    #[must_use]
    pub fn rank(&self) -> usize {
        self.vector.len()
    }

    /// Adds the other factor's bias and vector in place.
    ///
    /// On a length mismatch, `self` is left untouched.
    pub fn accumulate(&mut self, other: &Self) -> CoreResult<()> {
        self.vector.add_assign(&other.vector)?;
        self.bias += other.bias;
        Ok(())
    }

    #[inline]
    pub fn dot(&self, other: &Self) -> CoreResult<f32> {
        self.vector.dot(&other.vector)
    }
}

/// User or item record as it is exported from the model.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct LatentEntry {
    pub id: i64,
    pub latent: LatentFactor,
}
