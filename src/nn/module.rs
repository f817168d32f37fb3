use crate::tensor::{Result, Tensor, TensorElem};
use std::fmt::Debug;

/// A layer that maps a `[rows, features]` matrix to another matrix with the same row count.
///
/// Attention is not a `Module`: it takes an extra mask argument and exposes its own `forward`.
pub trait Module<T: TensorElem>: Debug + Send + Sync {
    fn forward(&self, x: &Tensor<T, 2>) -> Result<Tensor<T, 2>>;
}
