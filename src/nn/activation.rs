//! Activation Functions.
//!
//! The encoder's feed-forward layer uses ReLU: $f(x) = \max(x, 0)$.

use crate::tensor::{Tensor, TensorElem};

/// Computes ReLU for one value. NaN passes through unchanged.
pub fn relu<T: TensorElem>(x: T) -> T {
    if x < T::zero() { T::zero() } else { x }
}

/// Activation functions namespace.
pub struct Activation;

impl Activation {
    /// Applies ReLU element-wise.
    pub fn relu<const RANK: usize, T: TensorElem>(x: &Tensor<T, RANK>) -> Tensor<T, RANK> {
        x.map(relu)
    }
}
