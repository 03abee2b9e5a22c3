//! Logistic activation and the error measures built on it

/// Logistic sigmoid: 1 / (1 + exp(-x))
#[inline]
pub fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

/// Sigmoid derivative assuming `a = sigmoid(z)`: a * (1 - a)
#[inline]
pub fn sigmoid_derivative(a: f32) -> f32 {
    a * (1.0 - a)
}

pub fn sigmoid_inplace(data: &mut [f32]) {
    for value in data.iter_mut() {
        *value = sigmoid(*value);
    }
}

/// Mean of squared differences; zero for empty input.
///
/// # Panics
///
/// Panics if the slices differ in length.
pub fn mean_squared_error(predicted: &[f32], expected: &[f32]) -> f32 {
    assert_eq!(predicted.len(), expected.len(), "length mismatch in mean_squared_error");
    if predicted.is_empty() {
        return 0.0;
    }
    let total: f32 = predicted
        .iter()
        .zip(expected)
        .map(|(p, e)| (e - p) * (e - p))
        .sum();
    total / predicted.len() as f32
}
