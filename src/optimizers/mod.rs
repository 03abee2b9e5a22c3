//! Weight update rules applied by the backward pass
//!
//! The derivative kernels compute an error signal for every weight and hand it to
//! an update rule together with that weight's previous update. The only rule is
//! gradient descent with momentum:
//!
//! ```text
//! update = learning_rate * signal + momentum * previous_update
//! weight = weight + update
//! ```

pub mod momentum;

pub use momentum::Momentum;
