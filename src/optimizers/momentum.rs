//! Gradient descent with momentum

use crate::error::{NetworkError, Result};

/// Momentum-weighted update rule.
///
/// The previous update of every weight is the "velocity"; it is owned by the
/// caller (one buffer per connection) so the rule itself is stateless and can be
/// shared between worker threads.
///
/// # Example
///
/// ```
/// use rust_neural_backprop::optimizers::Momentum;
///
/// let rule = Momentum::new(0.1, 0.5).unwrap();
/// let mut weight = 1.0f32;
/// let mut velocity = 0.0f32;
///
/// rule.apply(&mut weight, &mut velocity, 2.0);
/// assert!((weight - 1.2).abs() < 1e-6);
/// rule.apply(&mut weight, &mut velocity, 2.0);
/// assert!((velocity - 0.3).abs() < 1e-6);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Momentum {
    learning_rate: f32,
    momentum: f32,
}

impl Momentum {
    /// # Errors
    ///
    /// [`NetworkError::InvalidHyperparameter`] unless `learning_rate > 0` and
    /// `0 <= momentum < 1`.
    pub fn new(learning_rate: f32, momentum: f32) -> Result<Self> {
        if !(learning_rate > 0.0 && learning_rate.is_finite()) {
            return Err(NetworkError::hyperparameter(
                "learning_rate",
                learning_rate,
                "must be positive and finite",
            ));
        }
        if !(0.0..1.0).contains(&momentum) {
            return Err(NetworkError::hyperparameter(
                "momentum",
                momentum,
                "must be in [0, 1)",
            ));
        }
        Ok(Self {
            learning_rate,
            momentum,
        })
    }

    pub fn learning_rate(&self) -> f32 {
        self.learning_rate
    }

    pub fn momentum(&self) -> f32 {
        self.momentum
    }

    /// `learning_rate * signal + momentum * previous`
    #[inline]
    pub fn update(&self, signal: f32, previous: f32) -> f32 {
        self.learning_rate * signal + self.momentum * previous
    }

    /// Adds the update to `weight` and records it in `velocity`.
    #[inline]
    pub fn apply(&self, weight: &mut f32, velocity: &mut f32, signal: f32) {
        let update = self.update(signal, *velocity);
        *weight += update;
        *velocity = update;
    }
}
