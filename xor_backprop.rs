use std::process::ExitCode;

use rust_neural_backprop::architecture::{build_network, load_architecture};
use rust_neural_backprop::config::{load_config, TrainingConfig};
use rust_neural_backprop::matrix::Matrix;
use rust_neural_backprop::utils::SimpleRng;
use rust_neural_backprop::{FeedForward, Network, Result, Trainer};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

// XOR on a 2-3-1 network with bias layers.
const ARCHITECTURE: &str = "config/architectures/xor_bias.json";
const TRAINING: &str = "config/training.json";
const DEFAULT_EPOCHS: usize = 5000;
const LOG_EVERY: usize = 500;

// XOR dataset, one sample per batch.
fn xor_samples() -> Vec<(Matrix, Matrix)> {
    [([0.0, 0.0], 0.0), ([0.0, 1.0], 1.0), ([1.0, 0.0], 1.0), ([1.0, 1.0], 0.0)]
        .iter()
        .map(|(input, target)| (Matrix::column(input), Matrix::column(&[*target])))
        .collect()
}

fn train(network: &mut Network, config: &TrainingConfig, samples: &[(Matrix, Matrix)]) -> Result<f32> {
    let mut trainer = Trainer::new(network, config)?;
    let epochs = config.epochs.unwrap_or(DEFAULT_EPOCHS);

    let mut loss = 0.0;
    for epoch in 0..epochs {
        loss = trainer.fit(network, samples, 1)?.pop().unwrap_or_default();
        if (epoch + 1) % LOG_EVERY == 0 {
            info!(epoch = epoch + 1, loss, "training");
        }
    }
    Ok(loss)
}

fn test(network: &Network, config: &TrainingConfig, samples: &[(Matrix, Matrix)]) -> Result<()> {
    let forward = FeedForward::new(config.dispatch);
    println!("\nTesting the trained network:");
    for (input, target) in samples {
        let prediction = forward.predict(network, input)?;
        println!(
            "Input: {:.1}, {:.1}, Expected Output: {:.1}, Predicted Output: {:.3}",
            input.get(0, 0),
            input.get(1, 0),
            target.get(0, 0),
            prediction.get(0, 0)
        );
    }
    Ok(())
}

fn run() -> Result<()> {
    let config = load_config(TRAINING)?;
    let architecture = load_architecture(ARCHITECTURE)?;
    let mut rng = SimpleRng::new(42);
    let mut network = build_network(&architecture, &mut rng)?;
    info!(
        parameters = network.parameter_count(),
        learning_rate = config.learning_rate,
        momentum = config.momentum,
        "starting training"
    );

    let samples = xor_samples();
    let loss = train(&mut network, &config, &samples)?;
    info!(loss, "training finished");
    test(&network, &config, &samples)
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(%err, "xor training failed");
            ExitCode::FAILURE
        }
    }
}
