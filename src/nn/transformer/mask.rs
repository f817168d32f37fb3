//! Attention masks.
//!
//! A mask is a `[seq_q, seq_k]` matrix combined with the scaled scores. An
//! infinite entry (`+inf`, or `-inf`) forbids query `i` from attending to key
//! `j` and yields an attention weight of exactly zero. Finite entries are added
//! to the score as a bias; `0` leaves the pair unrestricted.

use crate::tensor::{Tensor, TensorElem};
use num_traits::Float;

/// Returns `true` if a mask entry forbids attention.
pub fn is_blocked<T: Float>(value: T) -> bool {
    value.is_infinite()
}

/// Causal mask: query `i` may only attend to keys `0..=i`.
///
/// ```rust
/// use encoder_rs::nn::transformer::causal_mask;
///
/// let m = causal_mask::<f32>(2);
/// assert_eq!(m.data(), &[0.0, f32::INFINITY, 0.0, 0.0]);
/// ```
pub fn causal_mask<T: TensorElem + Float>(seq_len: usize) -> Tensor<T, 2> {
    Tensor::from_fn([seq_len, seq_len], |idx| {
        let (row, col) = (idx / seq_len, idx % seq_len);
        if col > row { T::infinity() } else { T::zero() }
    })
}

/// Mask that restricts nothing. Equivalent to passing no mask.
pub fn no_mask<T: TensorElem + Float>(seq_len: usize) -> Tensor<T, 2> {
    Tensor::zeros([seq_len, seq_len])
}
