use super::{FeedForward, MultiHeadAttention};
use crate::config::EncoderConfig;
use crate::nn::{LayerNorm, Module, UniformInit};
use crate::tensor::{Result, Tensor, TensorElem, TensorError};
use num_traits::Float;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, instrument};

/// One Transformer encoder layer with post-norm residuals.
///
/// ```text
/// x1  = LayerNorm1(x  + MultiHeadAttention(x, mask))
/// out = LayerNorm2(x1 + FeedForward(x1))
/// ```
///
/// Parameters are fixed after construction; `forward` takes `&self` and may be
/// called from several threads at once.
#[derive(Debug, Clone)]
pub struct EncoderBlock<T: TensorElem> {
    attn: MultiHeadAttention<T>,
    ff: FeedForward<T>,
    ln_1: LayerNorm<T>,
    ln_2: LayerNorm<T>,
}

impl<T: TensorElem + Float> EncoderBlock<T> {
    /// Builds a block from `config`, seeding the initializer with `config.seed`.
    ///
    /// Two blocks built from equal configs have identical weights.
    pub fn new(config: &EncoderConfig) -> Result<Self> {
        config.validate()?;
        let mut rng = StdRng::seed_from_u64(config.seed);
        Self::with_rng(config, &mut rng)
    }

    /// Builds a block drawing all weights from `rng`.
    ///
    /// Draw order: query, key, value and output projections, then the two
    /// feed-forward layers.
    pub fn with_rng<R: Rng + ?Sized>(config: &EncoderConfig, rng: &mut R) -> Result<Self> {
        config.validate()?;
        let init = UniformInit::new(config.init_range)?;
        let eps = T::from_f64(config.layer_norm_epsilon).ok_or_else(|| {
            TensorError::InvalidConfig(format!(
                "layer_norm_epsilon {} is not representable",
                config.layer_norm_epsilon
            ))
        })?;

        let attn = MultiHeadAttention::new(config.d_model, config.num_heads, rng, &init)?;
        let ff = FeedForward::new(config.d_model, config.d_ff, rng, &init)?;
        let ln_1 = LayerNorm::new(config.d_model, eps)?;
        let ln_2 = LayerNorm::new(config.d_model, eps)?;

        debug!(
            d_model = config.d_model,
            num_heads = config.num_heads,
            d_ff = config.d_ff,
            init_range = config.init_range,
            "built encoder block"
        );
        Self::from_parts(attn, ff, ln_1, ln_2)
    }

    /// Assembles a block from prebuilt sub-layers.
    ///
    /// # Errors
    ///
    /// `ShapeMismatch` if the sub-layers disagree on `d_model`.
    pub fn from_parts(
        attn: MultiHeadAttention<T>,
        ff: FeedForward<T>,
        ln_1: LayerNorm<T>,
        ln_2: LayerNorm<T>,
    ) -> Result<Self> {
        let d_model = attn.d_model();
        for got in [ff.d_model(), ln_1.d_model(), ln_2.d_model()] {
            if got != d_model {
                return Err(TensorError::ShapeMismatch {
                    expected: vec![d_model],
                    got: vec![got],
                });
            }
        }
        Ok(Self {
            attn,
            ff,
            ln_1,
            ln_2,
        })
    }

    pub fn d_model(&self) -> usize {
        self.attn.d_model()
    }

    pub fn num_heads(&self) -> usize {
        self.attn.num_heads()
    }

    pub fn d_ff(&self) -> usize {
        self.ff.d_ff()
    }

    pub fn attention(&self) -> &MultiHeadAttention<T> {
        &self.attn
    }

    pub fn feed_forward(&self) -> &FeedForward<T> {
        &self.ff
    }

    /// Encodes `x [seq_len, d_model]` into a tensor of the same shape.
    ///
    /// # Errors
    ///
    /// - `ShapeMismatch` for an empty sequence, a wrong feature width or a mask
    ///   that is not `[seq_len, seq_len]`.
    /// - `NumericDegeneracy` if the mask blocks every key for some query.
    #[instrument(level = "debug", skip_all, fields(seq_len = x.rows(), d_model = self.d_model()))]
    pub fn forward(&self, x: &Tensor<T, 2>, mask: Option<&Tensor<T, 2>>) -> Result<Tensor<T, 2>> {
        let attn_out = self.attn.forward(x, mask)?;
        let x1 = self.ln_1.forward(&(x + &attn_out)?)?;

        residual(&self.ff, &self.ln_2, &x1)
    }
}

// norm(x + layer(x))
fn residual<T, M>(layer: &M, norm: &LayerNorm<T>, x: &Tensor<T, 2>) -> Result<Tensor<T, 2>>
where
    T: TensorElem + Float,
    M: Module<T>,
{
    let out = layer.forward(x)?;
    norm.forward(&(x + &out)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nn::Linear;
    use crate::nn::transformer::causal_mask;

    fn small_config() -> EncoderConfig {
        EncoderConfig {
            d_model: 8,
            num_heads: 2,
            d_ff: 16,
            seed: 17,
            ..EncoderConfig::base()
        }
    }

    fn input(seq_len: usize, d_model: usize) -> Tensor<f64, 2> {
        Tensor::from_fn([seq_len, d_model], |i| ((i * 7 % 13) as f64 - 6.0) * 0.5)
    }

    #[test]
    fn test_forward_shape() {
        let block = EncoderBlock::<f32>::new(&EncoderConfig::base()).unwrap();
        let x = Tensor::<f32, 2>::from_fn([10, 64], |i| (i as f32 * 0.01).sin());

        let out = block.forward(&x, Some(&causal_mask(10))).unwrap();
        assert_eq!(out.shape(), &[10, 64]);
        assert!(out.data().iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_same_seed_is_deterministic() {
        let a = EncoderBlock::<f64>::new(&small_config()).unwrap();
        let b = EncoderBlock::<f64>::new(&small_config()).unwrap();
        let x = input(5, 8);

        assert_eq!(a.forward(&x, None).unwrap(), b.forward(&x, None).unwrap());
        // Repeated calls on one block are bit-identical
        assert_eq!(a.forward(&x, None).unwrap(), a.forward(&x, None).unwrap());
    }

    #[test]
    fn test_different_seed_changes_output() {
        let a = EncoderBlock::<f64>::new(&small_config()).unwrap();
        let b = EncoderBlock::<f64>::new(&EncoderConfig {
            seed: 18,
            ..small_config()
        })
        .unwrap();
        let x = input(5, 8);
        assert_ne!(a.forward(&x, None).unwrap(), b.forward(&x, None).unwrap());
    }

    #[test]
    fn test_output_rows_are_normalized() {
        // Default gamma/beta: every output row has mean ~0 and variance ~1
        let block = EncoderBlock::<f64>::new(&small_config()).unwrap();
        let out = block.forward(&input(6, 8), None).unwrap();

        for row in out.data().chunks(8) {
            let mean = row.iter().sum::<f64>() / 8.0;
            let var = row.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / 8.0;
            assert!(mean.abs() < 1e-5, "mean {}", mean);
            assert!((var - 1.0).abs() < 1e-3, "var {}", var);
        }
    }

    #[test]
    fn test_single_token_sequence() {
        let block = EncoderBlock::<f64>::new(&small_config()).unwrap();
        let out = block.forward(&input(1, 8), Some(&causal_mask(1))).unwrap();
        assert_eq!(out.shape(), &[1, 8]);
    }

    #[test]
    fn test_causal_mask_hides_future_tokens() {
        // With a causal mask the first output row depends only on the first token
        let block = EncoderBlock::<f64>::new(&small_config()).unwrap();
        let mask = causal_mask(4);
        let x = input(4, 8);

        let mut y = x.clone();
        for v in &mut y.data_mut()[8..] {
            *v += 3.0;
        }

        let out_x = block.forward(&x, Some(&mask)).unwrap();
        let out_y = block.forward(&y, Some(&mask)).unwrap();
        for (a, b) in out_x.data()[..8].iter().zip(&out_y.data()[..8]) {
            assert!((a - b).abs() < 1e-12);
        }
        assert_ne!(out_x.data()[8..], out_y.data()[8..]);
    }

    #[test]
    fn test_invalid_inputs() {
        let block = EncoderBlock::<f64>::new(&small_config()).unwrap();

        assert!(matches!(
            block.forward(&Tensor::zeros([3, 7]), None),
            Err(TensorError::ShapeMismatch { .. })
        ));
        assert!(matches!(
            block.forward(&Tensor::zeros([0, 8]), None),
            Err(TensorError::ShapeMismatch { .. })
        ));
        assert!(matches!(
            block.forward(&input(3, 8), Some(&Tensor::zeros([3, 4]))),
            Err(TensorError::ShapeMismatch { .. })
        ));
        assert!(matches!(
            block.forward(&input(3, 8), Some(&Tensor::full([3, 3], f64::INFINITY))),
            Err(TensorError::NumericDegeneracy { row: 0 })
        ));
    }

    #[test]
    fn test_invalid_config() {
        let config = EncoderConfig {
            d_model: 10,
            num_heads: 4,
            ..EncoderConfig::base()
        };
        assert!(matches!(
            EncoderBlock::<f32>::new(&config),
            Err(TensorError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_from_parts_checks_widths() {
        let mut rng = StdRng::seed_from_u64(0);
        let init = UniformInit::default();
        let attn = MultiHeadAttention::<f32>::new(8, 2, &mut rng, &init).unwrap();
        let ff = FeedForward::from_parts(
            Linear::new(Tensor::zeros([4, 16]), None).unwrap(),
            Linear::new(Tensor::zeros([16, 4]), None).unwrap(),
        )
        .unwrap();
        let ln = LayerNorm::new(8, 1e-5).unwrap();

        assert!(matches!(
            EncoderBlock::from_parts(attn, ff, ln.clone(), ln),
            Err(TensorError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_block_is_shareable_across_threads() {
        fn assert_send_sync<S: Send + Sync>() {}
        assert_send_sync::<EncoderBlock<f32>>();

        let block = EncoderBlock::<f64>::new(&small_config()).unwrap();
        let x = input(4, 8);
        let expected = block.forward(&x, None).unwrap();

        std::thread::scope(|s| {
            let handles: Vec<_> = (0..4)
                .map(|_| s.spawn(|| block.forward(&x, None).unwrap()))
                .collect();
            for h in handles {
                assert_eq!(h.join().unwrap(), expected);
            }
        });
    }

    #[test]
    fn test_accessors() {
        let block = EncoderBlock::<f32>::new(&EncoderConfig::base()).unwrap();
        assert_eq!(block.d_model(), 64);
        assert_eq!(block.num_heads(), 8);
        assert_eq!(block.d_ff(), 256);
        assert_eq!(block.attention().head_dim(), 8);
        assert_eq!(block.feed_forward().d_ff(), 256);
    }
}
