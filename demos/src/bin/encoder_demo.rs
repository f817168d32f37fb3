use anyhow::{Context, Result};
use clap::Parser;
use encoder_rs::nn::transformer::causal_mask;
use encoder_rs::{EncoderBlock, EncoderConfig, Tensor};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Instant;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Runs one encoder block over a random sequence and reports the output shape.
#[derive(Parser)]
#[command(name = "encoder_demo", version)]
struct Args {
    /// Number of tokens in the input sequence
    #[arg(long, default_value = "10")]
    seq_len: usize,
    #[arg(long, default_value = "64")]
    d_model: usize,
    #[arg(long, default_value = "8")]
    num_heads: usize,
    #[arg(long, default_value = "256")]
    d_ff: usize,
    /// Half-width of the uniform weight initialization range
    #[arg(long, default_value = "0.1")]
    init_range: f64,
    #[arg(long, default_value = "0")]
    seed: u64,
    /// JSON block configuration; replaces the dimension flags above
    #[arg(long)]
    config: Option<String>,
    /// Let every token attend to the whole sequence
    #[arg(long)]
    no_causal: bool,
}

fn load_config(args: &Args) -> Result<EncoderConfig> {
    match &args.config {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path))?;
            EncoderConfig::from_json_str(&json)
                .with_context(|| format!("Failed to parse config file: {}", path))
        }
        None => {
            let config = EncoderConfig {
                d_model: args.d_model,
                num_heads: args.num_heads,
                d_ff: args.d_ff,
                init_range: args.init_range,
                seed: args.seed,
                ..EncoderConfig::base()
            };
            config.validate()?;
            Ok(config)
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_target(false)
        .init();

    let args = Args::parse();
    let config = load_config(&args)?;
    info!(?config, "building encoder block");

    let block = EncoderBlock::<f32>::new(&config)?;

    // Input drawn from a generator independent of the weight seed
    let mut rng = StdRng::seed_from_u64(config.seed.wrapping_add(1));
    let x = Tensor::<f32, 2>::from_fn([args.seq_len, config.d_model], |_| {
        rng.random_range(-1.0..1.0)
    });
    let mask = (!args.no_causal).then(|| causal_mask::<f32>(args.seq_len));

    let start = Instant::now();
    let y = block.forward(&x, mask.as_ref())?;
    let elapsed = start.elapsed();

    info!(
        seq_len = args.seq_len,
        causal = mask.is_some(),
        elapsed_us = elapsed.as_micros() as u64,
        "forward pass complete"
    );

    println!("Input shape:  {:?}", x.shape());
    println!("Output shape: {:?}", y.shape());
    if let Ok(first) = y.row(0) {
        let preview: Vec<String> = first.iter().take(8).map(|v| format!("{:+.4}", v)).collect();
        println!("Row 0 (first {}): [{}]", preview.len(), preview.join(", "));
    }

    Ok(())
}
