use crate::nn::{Activation, Linear, Module, UniformInit};
use crate::tensor::{Result, Tensor, TensorElem, TensorError};
use num_traits::Float;
use rand::Rng;

/// Position-wise feed-forward network: `relu(x W1 + b1) W2 + b2`.
///
/// Expands every token from `d_model` to `d_ff` and projects it back.
#[derive(Debug, Clone)]
pub struct FeedForward<T: TensorElem> {
    fc1: Linear<T>,
    fc2: Linear<T>,
}

impl<T: TensorElem + Float> FeedForward<T> {
    /// Creates a network with uniformly initialized weights and zero biases.
    pub fn new<R: Rng + ?Sized>(
        d_model: usize,
        d_ff: usize,
        rng: &mut R,
        init: &UniformInit,
    ) -> Result<Self> {
        if d_model == 0 || d_ff == 0 {
            return Err(TensorError::InvalidConfig(format!(
                "feed-forward dimensions must be positive (d_model={}, d_ff={})",
                d_model, d_ff
            )));
        }
        let fc1 = Linear::init(rng, init, d_model, d_ff, true)?;
        let fc2 = Linear::init(rng, init, d_ff, d_model, true)?;
        Ok(Self { fc1, fc2 })
    }

    /// Assembles the network from an expanding layer `[d_model, d_ff]` and a
    /// contracting layer `[d_ff, d_model]`.
    pub fn from_parts(fc1: Linear<T>, fc2: Linear<T>) -> Result<Self> {
        let (d_model, d_ff) = (fc1.in_features(), fc1.out_features());
        if fc2.in_features() != d_ff || fc2.out_features() != d_model {
            return Err(TensorError::ShapeMismatch {
                expected: vec![d_ff, d_model],
                got: vec![fc2.in_features(), fc2.out_features()],
            });
        }
        Ok(Self { fc1, fc2 })
    }

    pub fn d_model(&self) -> usize {
        self.fc1.in_features()
    }

    pub fn d_ff(&self) -> usize {
        self.fc1.out_features()
    }

    pub fn forward(&self, x: &Tensor<T, 2>) -> Result<Tensor<T, 2>> {
        let hidden = self.fc1.forward(x)?;
        let hidden = Activation::relu(&hidden);
        self.fc2.forward(&hidden)
    }
}

impl<T: TensorElem + Float> Module<T> for FeedForward<T> {
    fn forward(&self, x: &Tensor<T, 2>) -> Result<Tensor<T, 2>> {
        FeedForward::forward(self, x)
    }
}
