use crate::nn::{Module, UniformInit};
use crate::tensor::{Result, Tensor, TensorElem, TensorError};
use num_traits::Float;
use rand::Rng;

/// Linear Layer: `y = xW + b`
///
/// Weights are stored input-major (`[in_features, out_features]`), so a sequence
/// matrix `[seq_len, in_features]` multiplies them directly with no transpose.
///
/// # Examples
/// ```rust
/// use encoder_rs::nn::Linear;
/// use encoder_rs::tensor::Tensor;
///
/// // 10 inputs, 5 outputs
/// let layer = Linear::<f32>::new(Tensor::zeros([10, 5]), Some(Tensor::zeros([5]))).unwrap();
/// assert_eq!(layer.out_features(), 5);
/// ```
#[derive(Debug, Clone)]
pub struct Linear<T: TensorElem> {
    /// - Shape: `[in_features, out_features]`
    weight: Tensor<T, 2>,
    /// - Shape: `[out_features]`
    bias: Option<Tensor<T, 1>>,
}

impl<T: TensorElem> Linear<T> {
    /// Creates a Linear layer from explicit parameters.
    ///
    /// # Errors
    ///
    /// `ShapeMismatch` if the bias length differs from `out_features`.
    pub fn new(weight: Tensor<T, 2>, bias: Option<Tensor<T, 1>>) -> Result<Self> {
        if let Some(b) = &bias {
            let out = weight.cols();
            if b.shape()[0] != out {
                return Err(TensorError::ShapeMismatch {
                    expected: vec![out],
                    got: b.shape().to_vec(),
                });
            }
        }
        Ok(Self { weight, bias })
    }

    pub fn in_features(&self) -> usize {
        self.weight.rows()
    }

    pub fn out_features(&self) -> usize {
        self.weight.cols()
    }

    pub fn weight(&self) -> &Tensor<T, 2> {
        &self.weight
    }

    pub fn bias(&self) -> Option<&Tensor<T, 1>> {
        self.bias.as_ref()
    }

    /// Applies the layer to `x` of shape `[rows, in_features]`.
    pub fn forward(&self, x: &Tensor<T, 2>) -> Result<Tensor<T, 2>> {
        if x.cols() != self.in_features() {
            return Err(TensorError::ShapeMismatch {
                expected: vec![x.rows(), self.in_features()],
                got: x.shape().to_vec(),
            });
        }

        let out = x.matmul(&self.weight)?;
        match &self.bias {
            Some(b) => out.add_row_broadcast(b),
            None => Ok(out),
        }
    }
}

impl<T: TensorElem + Float> Linear<T> {
    /// Creates a layer with uniformly initialized weights and, optionally, a zero bias.
    pub fn init<R: Rng + ?Sized>(
        rng: &mut R,
        init: &UniformInit,
        in_features: usize,
        out_features: usize,
        with_bias: bool,
    ) -> Result<Self> {
        let weight = init.matrix(rng, [in_features, out_features])?;
        let bias = with_bias.then(|| Tensor::zeros([out_features]));
        Self::new(weight, bias)
    }
}

impl<T: TensorElem> Module<T> for Linear<T> {
    fn forward(&self, x: &Tensor<T, 2>) -> Result<Tensor<T, 2>> {
        Linear::forward(self, x)
    }
}
