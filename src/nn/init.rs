//! Weight initialization.
//!
//! Every draw goes through a caller-supplied [`rand::Rng`], so seeding that
//! generator (e.g. `StdRng::seed_from_u64`) makes a whole block reproducible.

use crate::tensor::{Result, Tensor, TensorElem, TensorError};
use num_traits::Float;
use rand::Rng;

/// Default half-width of the uniform initialization range.
pub const DEFAULT_INIT_RANGE: f64 = 0.1;

/// Draws elements independently from `U[-bound, bound]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UniformInit {
    bound: f64,
}

impl UniformInit {
    /// # Errors
    ///
    /// `InvalidConfig` unless `bound` is finite and strictly positive.
    pub fn new(bound: f64) -> Result<Self> {
        if !(bound.is_finite() && bound > 0.0) {
            return Err(TensorError::InvalidConfig(format!(
                "init bound must be a positive finite number, got {}",
                bound
            )));
        }
        Ok(Self { bound })
    }

    pub fn bound(&self) -> f64 {
        self.bound
    }

    /// Samples a `[rows, cols]` matrix.
    pub fn matrix<T, R>(&self, rng: &mut R, shape: [usize; 2]) -> Result<Tensor<T, 2>>
    where
        T: TensorElem + Float,
        R: Rng + ?Sized,
    {
        let data = self.sample(rng, &shape)?;
        Tensor::new(data, shape)
    }

    /// Samples a vector of length `len`.
    pub fn vector<T, R>(&self, rng: &mut R, len: usize) -> Result<Tensor<T, 1>>
    where
        T: TensorElem + Float,
        R: Rng + ?Sized,
    {
        let data = self.sample(rng, &[len])?;
        Tensor::new(data, [len])
    }

    fn sample<T, R>(&self, rng: &mut R, shape: &[usize]) -> Result<Vec<T>>
    where
        T: TensorElem + Float,
        R: Rng + ?Sized,
    {
        if shape.iter().any(|&d| d == 0) {
            return Err(TensorError::InvalidConfig(format!(
                "cannot initialize a tensor with a zero dimension: {:?}",
                shape
            )));
        }

        let size: usize = shape.iter().product();
        (0..size)
            .map(|_| {
                let v = rng.random_range(-self.bound..=self.bound);
                T::from_f64(v).ok_or_else(|| {
                    TensorError::InvalidConfig(format!("{} is not representable", v))
                })
            })
            .collect()
    }
}

impl Default for UniformInit {
    fn default() -> Self {
        Self {
            bound: DEFAULT_INIT_RANGE,
        }
    }
}
