//! Transformer encoder components.
//!
//! - [`MultiHeadAttention`]: parallel scaled dot-product attention heads.
//! - [`FeedForward`]: the position-wise two-layer network.
//! - [`EncoderBlock`]: attention and feed-forward sub-layers, each wrapped in a
//!   residual connection followed by layer normalization.
//! - [`mask`]: helpers for building attention masks.

pub mod attention;
pub mod encoder;
pub mod feed_forward;
pub mod mask;

pub use attention::{
    MultiHeadAttention, attention_weights, scaled_dot_product_attention, softmax_rows,
};
pub use encoder::EncoderBlock;
pub use feed_forward::FeedForward;
pub use mask::{causal_mask, is_blocked, no_mask};
