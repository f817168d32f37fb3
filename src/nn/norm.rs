use crate::nn::Module;
use crate::tensor::{Result, Tensor, TensorElem, TensorError};
use num_traits::Float;
use rayon::prelude::*;

/// Default epsilon added to the variance.
pub const DEFAULT_EPS: f64 = 1e-5;

/// Layer Normalization.
///
/// Normalizes every row (token) independently over its last dimension, then
/// applies a learnable affine correction.
/// Formula: `y = (x - mean) / sqrt(var + eps) * gamma + beta`
///
/// The variance is the population variance (divided by the row width).
#[derive(Debug, Clone)]
pub struct LayerNorm<T: TensorElem> {
    weight: Tensor<T, 1>,
    bias: Tensor<T, 1>,
    eps: T,
}

impl<T: TensorElem + Float> LayerNorm<T> {
    /// Creates a LayerNorm over `d_model` features with gamma = 1 and beta = 0.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` for a zero width or an epsilon that is not positive and finite.
    pub fn new(d_model: usize, eps: T) -> Result<Self> {
        Self::from_parts(Tensor::ones([d_model]), Tensor::zeros([d_model]), eps)
    }

    /// Creates a LayerNorm from explicit gamma (`weight`) and beta (`bias`).
    pub fn from_parts(weight: Tensor<T, 1>, bias: Tensor<T, 1>, eps: T) -> Result<Self> {
        if !(eps.is_finite() && eps > T::zero()) {
            return Err(TensorError::InvalidConfig(format!(
                "layer norm epsilon must be positive and finite, got {:?}",
                eps
            )));
        }
        if weight.size() == 0 {
            return Err(TensorError::InvalidConfig(
                "layer norm width must be positive".into(),
            ));
        }
        if weight.shape() != bias.shape() {
            return Err(TensorError::ShapeMismatch {
                expected: weight.shape().to_vec(),
                got: bias.shape().to_vec(),
            });
        }
        Ok(Self { weight, bias, eps })
    }

    pub fn d_model(&self) -> usize {
        self.weight.shape()[0]
    }

    pub fn eps(&self) -> T {
        self.eps
    }

    /// Performs the forward pass, normalizing over the last dimension.
    pub fn forward<const RANK: usize>(&self, x: &Tensor<T, RANK>) -> Result<Tensor<T, RANK>> {
        let shape = x.shape();
        let last_dim = shape[RANK - 1];
        if last_dim != self.d_model() {
            return Err(TensorError::ShapeMismatch {
                expected: vec![self.d_model()],
                got: vec![last_dim],
            });
        }

        let mut out = Tensor::zeros(*shape);
        let n = T::from_usize(last_dim).ok_or_else(|| {
            TensorError::InvalidConfig(format!("width {} is not representable", last_dim))
        })?;
        let gamma = self.weight.data();
        let beta = self.bias.data();

        out.data_mut()
            .par_chunks_mut(last_dim)
            .zip(x.data().par_chunks(last_dim))
            .for_each(|(out_row, in_row)| {
                let mean = in_row.iter().fold(T::zero(), |acc, &v| acc + v) / n;
                let var = in_row
                    .iter()
                    .fold(T::zero(), |acc, &v| acc + (v - mean) * (v - mean))
                    / n;
                let rstd = T::one() / (var + self.eps).sqrt();

                for (i, o) in out_row.iter_mut().enumerate() {
                    *o = (in_row[i] - mean) * rstd * gamma[i] + beta[i];
                }
            });

        Ok(out)
    }
}

impl<T: TensorElem + Float> Module<T> for LayerNorm<T> {
    fn forward(&self, x: &Tensor<T, 2>) -> Result<Tensor<T, 2>> {
        LayerNorm::forward(self, x)
    }
}
