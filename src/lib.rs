//! # encoder-rs
//!
//! `encoder-rs` is a pure Rust implementation of a single Transformer encoder block:
//! multi-head self-attention, a position-wise feed-forward network and layer
//! normalization, composed post-norm with residual connections.
//!
//! It runs on the CPU, parallelizing attention heads and matrix rows with `rayon`.
//! Everything is generic over the float type, so `f32` and `f64` share one implementation.
//!
//! ## Modules
//!
//! - [`mod@tensor`]: Dense row-major tensor and the crate error type.
//! - [`nn`]: Layers (Linear, LayerNorm, FeedForward, attention, the encoder block).
//! - [`config`]: Serializable block configuration.
//!
//! ## Example
//!
//! ```rust
//! use encoder_rs::{EncoderBlock, EncoderConfig, Tensor};
//! use encoder_rs::nn::transformer::causal_mask;
//!
//! let config = EncoderConfig { d_model: 16, num_heads: 4, d_ff: 32, ..EncoderConfig::base() };
//! let block = EncoderBlock::<f32>::new(&config).unwrap();
//!
//! let x = Tensor::<f32, 2>::from_fn([5, 16], |i| (i as f32 * 0.37).sin());
//! let mask = causal_mask::<f32>(5);
//! let y = block.forward(&x, Some(&mask)).unwrap();
//! assert_eq!(y.shape(), x.shape());
//! ```

/// Macro for creating a Tensor with compile-time shape checking.
///
/// # Examples
///
/// ```rust
/// use encoder_rs::tensor;
/// use encoder_rs::tensor::Tensor;
///
/// // Works
/// let t = tensor!([1.0, 2.0, 3.0, 4.0], [2, 2]);
///
/// // Fails to compile:
/// // let t = tensor!([1.0, 2.0, 3.0], [2, 2]);
/// ```
#[macro_export]
macro_rules! tensor {
    ($data:expr, $shape:expr) => {{
        // Constants to force compile-time evaluation
        const DATA_LEN: usize = (&$data as &[_]).len();
        const SHAPE: [usize; (&$shape as &[_]).len()] = $shape;
        const EXPECTED_SIZE: usize = {
            let mut size = 1;
            let mut i = 0;
            while i < (&SHAPE as &[_]).len() {
                size *= SHAPE[i];
                i += 1;
            }
            size
        };

        // This assertion triggers a compile-time error if false
        const _: () = assert!(
            DATA_LEN == EXPECTED_SIZE,
            "Shape mismatch: data length does not match shape product"
        );

        // Safe to unwrap because we checked at compile time
        $crate::tensor::Tensor::new($data.to_vec(), $shape).unwrap()
    }};
}

pub mod config;
pub mod nn;
pub mod tensor;

pub use config::EncoderConfig;
pub use nn::transformer::{EncoderBlock, FeedForward, MultiHeadAttention};
pub use tensor::{Result, Tensor, TensorElem, TensorError};
