//! Training configuration
//!
//! Hyperparameters of the backward pass are read from JSON and validated before
//! an engine is created from them.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::{NetworkError, Result};
use crate::kernels::Dispatch;
use crate::optimizers::Momentum;

/// Hyperparameters of a training run.
///
/// `learning_rate` is required; `momentum` defaults to `0.0` and `dispatch` to
/// `"sequential"`.
///
/// # Example
///
/// ```json
/// {
///   "learning_rate": 0.5,
///   "momentum": 0.9,
///   "dispatch": "parallel",
///   "epochs": 5000
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TrainingConfig {
    /// Step size, must be positive.
    pub learning_rate: f32,

    /// Fraction of the previous update carried into the next one, in `[0, 1)`.
    #[serde(default)]
    pub momentum: f32,

    /// Kernel backend: `"sequential"` or `"parallel"`.
    #[serde(default)]
    pub dispatch: Dispatch,

    /// Passes over the training set, if the run is driven by the config.
    pub epochs: Option<usize>,
}

impl TrainingConfig {
    pub fn new(learning_rate: f32, momentum: f32) -> Self {
        Self {
            learning_rate,
            momentum,
            dispatch: Dispatch::Sequential,
            epochs: None,
        }
    }

    /// Checks every hyperparameter against its valid range.
    ///
    /// # Errors
    ///
    /// [`NetworkError::InvalidHyperparameter`] naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        Momentum::new(self.learning_rate, self.momentum)?;
        if self.epochs == Some(0) {
            return Err(NetworkError::InvalidHyperparameter {
                name: "epochs",
                value: "0".to_string(),
                constraint: "must be greater than 0",
            });
        }
        Ok(())
    }
}

/// Loads and validates a training configuration from a JSON file.
///
/// # Errors
///
/// [`NetworkError::Io`] if the file cannot be read, [`NetworkError::Json`] if it is
/// not a valid config, [`NetworkError::InvalidHyperparameter`] if a value is out of
/// range.
///
/// # Examples
///
/// ```no_run
/// use rust_neural_backprop::config::load_config;
///
/// let cfg = load_config("config/training.json").unwrap();
/// assert!(cfg.learning_rate > 0.0);
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<TrainingConfig> {
    let contents = fs::read_to_string(path)?;
    let config: TrainingConfig = serde_json::from_str(&contents)?;
    config.validate()?;
    Ok(config)
}
