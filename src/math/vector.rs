use serde::{Deserialize, Serialize};

use crate::error::{CoreResult, Error};

/// Latent vector of a fixed length, the model rank.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(transparent)]
pub struct Vector(pub Vec<f32>);

impl From<Vec<f32>> for Vector {
    fn from(vec: Vec<f32>) -> Self {
        Self(vec)
    }
}

impl Vector {
    #[must_use]
    pub fn zeros(length: usize) -> Self {
        Self(vec![0.0; length])
    }

    #[must_use]
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    #[inline]
    pub fn dot(&self, other: &Self) -> CoreResult<f32> {
        self.ensure_same_length(other)?;
        Ok(self.0.iter().zip(&other.0).fold(0.0, |dot, (xi, yi)| dot + xi * yi))
    }

    /// Adds the other vector elementwise in place.
    pub fn add_assign(&mut self, other: &Self) -> CoreResult<()> {
        self.ensure_same_length(other)?;
        for (left, right) in self.0.iter_mut().zip(&other.0) {
            *left += right;
        }
        Ok(())
    }

    fn ensure_same_length(&self, other: &Self) -> CoreResult<()> {
        if self.len() == other.len() {
            Ok(())
        } else {
            Err(Error::VectorLengthMismatch {
                left: self.len(),
                right: other.len(),
            })
        }
    }
}
