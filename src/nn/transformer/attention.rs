//! Scaled dot-product and multi-head self-attention.
//!
//! For one head:
//!
//! $$ \text{Attention}(Q, K, V) = \text{softmax}\left(\frac{QK^T}{\sqrt{d_k}} + M\right) V $$
//!
//! `MultiHeadAttention` projects the input once per role (query, key, value),
//! splits the projections into `num_heads` contiguous column slices, runs the
//! heads in parallel and recombines them through an output projection.

use super::mask::is_blocked;
use crate::nn::{Linear, UniformInit};
use crate::tensor::{Result, Tensor, TensorElem, TensorError};
use num_traits::Float;
use rand::Rng;
use rayon::prelude::*;
use tracing::{debug, instrument};

/// Row-wise softmax, in place.
///
/// The row maximum is subtracted before exponentiating, so large finite scores
/// cannot overflow. `-inf` entries receive a weight of exactly zero.
///
/// # Errors
///
/// `NumericDegeneracy` for the first row with no finite support: every entry
/// `-inf`, any `+inf` or NaN, or no columns at all.
pub fn softmax_rows<T: TensorElem + Float>(scores: &mut Tensor<T, 2>) -> Result<()> {
    let [rows, cols] = *scores.shape();
    if rows == 0 {
        return Ok(());
    }
    if cols == 0 {
        return Err(TensorError::NumericDegeneracy { row: 0 });
    }

    let degenerate = scores
        .data_mut()
        .par_chunks_mut(cols)
        .enumerate()
        .filter_map(|(i, row)| {
            let mut max_val = T::neg_infinity();
            for &v in row.iter() {
                if v.is_nan() {
                    return Some(i);
                }
                if v > max_val {
                    max_val = v;
                }
            }
            if !max_val.is_finite() {
                return Some(i);
            }

            let mut sum_exp = T::zero();
            for v in row.iter_mut() {
                *v = (*v - max_val).exp();
                sum_exp += *v;
            }

            // sum_exp >= 1: the maximum contributes exp(0)
            let inv_sum = T::one() / sum_exp;
            for v in row.iter_mut() {
                *v *= inv_sum;
            }
            None
        })
        .min();

    match degenerate {
        Some(row) => Err(TensorError::NumericDegeneracy { row }),
        None => Ok(()),
    }
}

fn check_mask<T: TensorElem>(mask: Option<&Tensor<T, 2>>, rows: usize, cols: usize) -> Result<()> {
    match mask {
        Some(m) => m.ensure_shape([rows, cols]),
        None => Ok(()),
    }
}

/// Computes the `[seq_q, seq_k]` attention weights `softmax(QK^T / sqrt(d_k) + mask)`.
pub fn attention_weights<T: TensorElem + Float>(
    q: &Tensor<T, 2>,
    k: &Tensor<T, 2>,
    mask: Option<&Tensor<T, 2>>,
) -> Result<Tensor<T, 2>> {
    check_mask(mask, q.rows(), k.rows())?;
    let d_k = q.cols();
    if d_k == 0 || k.cols() != d_k {
        return Err(TensorError::ShapeMismatch {
            expected: vec![k.rows(), d_k.max(1)],
            got: k.shape().to_vec(),
        });
    }

    let d_k = T::from_usize(d_k).ok_or_else(|| {
        TensorError::InvalidConfig(format!("head width {} is not representable", d_k))
    })?;
    let scale = T::one() / d_k.sqrt();

    let mut scores = q.matmul(&k.transpose()?)?.scale(scale);

    if let Some(m) = mask {
        scores
            .data_mut()
            .par_iter_mut()
            .zip(m.data().par_iter())
            .for_each(|(s, &mv)| {
                if is_blocked(mv) {
                    *s = T::neg_infinity();
                } else {
                    *s += mv;
                }
            });
    }

    softmax_rows(&mut scores)?;
    Ok(scores)
}

/// Scaled dot-product attention for one head.
///
/// Shapes: `q [seq_q, d_k]`, `k [seq_k, d_k]`, `v [seq_k, d_v]`, `mask [seq_q, seq_k]`.
/// Returns `[seq_q, d_v]`.
pub fn scaled_dot_product_attention<T: TensorElem + Float>(
    q: &Tensor<T, 2>,
    k: &Tensor<T, 2>,
    v: &Tensor<T, 2>,
    mask: Option<&Tensor<T, 2>>,
) -> Result<Tensor<T, 2>> {
    if v.rows() != k.rows() {
        return Err(TensorError::ShapeMismatch {
            expected: vec![k.rows(), v.cols()],
            got: v.shape().to_vec(),
        });
    }
    let weights = attention_weights(q, k, mask)?;
    weights.matmul(v)
}

/// Multi-head self-attention with four bias-free `[d_model, d_model]` projections.
#[derive(Debug, Clone)]
pub struct MultiHeadAttention<T: TensorElem> {
    q_proj: Linear<T>,
    k_proj: Linear<T>,
    v_proj: Linear<T>,
    o_proj: Linear<T>,

    num_heads: usize,
    head_dim: usize,
}

impl<T: TensorElem + Float> MultiHeadAttention<T> {
    /// Creates an attention layer with uniformly initialized projections.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` if a dimension is zero or `d_model` is not divisible by `num_heads`.
    pub fn new<R: Rng + ?Sized>(
        d_model: usize,
        num_heads: usize,
        rng: &mut R,
        init: &UniformInit,
    ) -> Result<Self> {
        let head_dim = Self::head_dim_for(d_model, num_heads)?;

        let q_proj = Linear::init(rng, init, d_model, d_model, false)?;
        let k_proj = Linear::init(rng, init, d_model, d_model, false)?;
        let v_proj = Linear::init(rng, init, d_model, d_model, false)?;
        let o_proj = Linear::init(rng, init, d_model, d_model, false)?;

        debug!(d_model, num_heads, head_dim, "initialized multi-head attention");
        Ok(Self {
            q_proj,
            k_proj,
            v_proj,
            o_proj,
            num_heads,
            head_dim,
        })
    }

    /// Creates an attention layer from explicit `[d_model, d_model]` projection matrices.
    pub fn from_weights(
        num_heads: usize,
        w_q: Tensor<T, 2>,
        w_k: Tensor<T, 2>,
        w_v: Tensor<T, 2>,
        w_o: Tensor<T, 2>,
    ) -> Result<Self> {
        let d_model = w_q.rows();
        let head_dim = Self::head_dim_for(d_model, num_heads)?;
        for w in [&w_q, &w_k, &w_v, &w_o] {
            w.ensure_shape([d_model, d_model])?;
        }

        Ok(Self {
            q_proj: Linear::new(w_q, None)?,
            k_proj: Linear::new(w_k, None)?,
            v_proj: Linear::new(w_v, None)?,
            o_proj: Linear::new(w_o, None)?,
            num_heads,
            head_dim,
        })
    }

    fn head_dim_for(d_model: usize, num_heads: usize) -> Result<usize> {
        if d_model == 0 || num_heads == 0 {
            return Err(TensorError::InvalidConfig(format!(
                "attention dimensions must be positive (d_model={}, num_heads={})",
                d_model, num_heads
            )));
        }
        if d_model % num_heads != 0 {
            return Err(TensorError::InvalidConfig(format!(
                "d_model ({}) must be divisible by num_heads ({})",
                d_model, num_heads
            )));
        }
        Ok(d_model / num_heads)
    }

    pub fn d_model(&self) -> usize {
        self.num_heads * self.head_dim
    }

    pub fn num_heads(&self) -> usize {
        self.num_heads
    }

    pub fn head_dim(&self) -> usize {
        self.head_dim
    }

    /// Self-attention over `x [seq_len, d_model]` with an optional `[seq_len, seq_len]` mask.
    ///
    /// The same mask is applied to every head. Output shape equals input shape.
    #[instrument(level = "trace", skip_all, fields(seq_len = x.rows(), num_heads = self.num_heads))]
    pub fn forward(&self, x: &Tensor<T, 2>, mask: Option<&Tensor<T, 2>>) -> Result<Tensor<T, 2>> {
        let [seq_len, width] = *x.shape();
        if seq_len == 0 || width != self.d_model() {
            return Err(TensorError::ShapeMismatch {
                expected: vec![seq_len.max(1), self.d_model()],
                got: x.shape().to_vec(),
            });
        }
        check_mask(mask, seq_len, seq_len)?;

        let q = self.q_proj.forward(x)?;
        let k = self.k_proj.forward(x)?;
        let v = self.v_proj.forward(x)?;

        // Head h owns columns [h * head_dim, (h + 1) * head_dim)
        let heads = (0..self.num_heads)
            .into_par_iter()
            .map(|h| {
                let start = h * self.head_dim;
                let q_h = q.narrow_cols(start, self.head_dim)?;
                let k_h = k.narrow_cols(start, self.head_dim)?;
                let v_h = v.narrow_cols(start, self.head_dim)?;
                scaled_dot_product_attention(&q_h, &k_h, &v_h, mask)
            })
            .collect::<Result<Vec<_>>>()?;

        let concat = Tensor::concat_cols(&heads)?;
        self.o_proj.forward(&concat)
    }
}
