//! Encoder block configuration.
//!
//! All dimensions are fixed when a block is built; nothing here changes during
//! a forward pass.

use crate::tensor::{Result, TensorError};
use serde::{Deserialize, Serialize};

/// Hyperparameters of one [`EncoderBlock`](crate::EncoderBlock).
///
/// Missing fields fall back to [`EncoderConfig::base`] when deserialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncoderConfig {
    /// Feature width of every token representation.
    pub d_model: usize,
    /// Number of attention heads. Must divide `d_model`.
    pub num_heads: usize,
    /// Hidden width of the feed-forward sub-layer.
    pub d_ff: usize,
    pub layer_norm_epsilon: f64,
    /// Weights are drawn from `U[-init_range, init_range]`.
    pub init_range: f64,
    /// Seed for the weight initializer.
    pub seed: u64,
}

impl EncoderConfig {
    /// A 64-wide block with 8 heads and a 256-wide feed-forward layer.
    pub fn base() -> Self {
        Self {
            d_model: 64,
            num_heads: 8,
            d_ff: 256,
            layer_norm_epsilon: 1e-5,
            init_range: 0.1,
            seed: 0,
        }
    }

    /// Per-head key/value width (`d_model / num_heads`).
    pub fn head_dim(&self) -> usize {
        self.d_model / self.num_heads.max(1)
    }

    /// Checks every construction-time invariant.
    ///
    /// # Errors
    ///
    /// `TensorError::InvalidConfig` naming the first violated constraint.
    pub fn validate(&self) -> Result<()> {
        if self.d_model == 0 || self.num_heads == 0 || self.d_ff == 0 {
            return Err(TensorError::InvalidConfig(format!(
                "dimensions must be positive (d_model={}, num_heads={}, d_ff={})",
                self.d_model, self.num_heads, self.d_ff
            )));
        }
        if self.d_model % self.num_heads != 0 {
            return Err(TensorError::InvalidConfig(format!(
                "d_model ({}) must be divisible by num_heads ({})",
                self.d_model, self.num_heads
            )));
        }
        if !(self.layer_norm_epsilon.is_finite() && self.layer_norm_epsilon > 0.0) {
            return Err(TensorError::InvalidConfig(format!(
                "layer_norm_epsilon must be a positive finite number, got {}",
                self.layer_norm_epsilon
            )));
        }
        if !(self.init_range.is_finite() && self.init_range > 0.0) {
            return Err(TensorError::InvalidConfig(format!(
                "init_range must be a positive finite number, got {}",
                self.init_range
            )));
        }
        Ok(())
    }

    /// Parses a JSON document and validates the result.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| TensorError::InvalidConfig(format!("malformed config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self::base()
    }
}
