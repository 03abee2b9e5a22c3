//! Deterministic xorshift generator for weight initialisation.
//!
//! Seeded runs reproduce the same weights on every platform, which the tests and
//! the architecture builder rely on.

/// Xorshift PRNG.
#[derive(Debug, Clone)]
pub struct SimpleRng {
    state: u64,
}

impl SimpleRng {
    /// Create a new RNG with explicit seed (if zero, use a fixed value).
    pub fn new(seed: u64) -> Self {
        let state = if seed == 0 { 0x9e3779b97f4a7c15 } else { seed };
        Self { state }
    }

    pub fn next_u32(&mut self) -> u32 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        (x >> 32) as u32
    }

    /// Uniform in [0, 1).
    pub fn next_f32(&mut self) -> f32 {
        (self.next_u32() >> 8) as f32 / (1u32 << 24) as f32
    }

    /// Uniform sample in [low, high).
    pub fn gen_range_f32(&mut self, low: f32, high: f32) -> f32 {
        low + (high - low) * self.next_f32()
    }

    /// `count` weights drawn from `U(-limit, limit)` with the Xavier/Glorot limit
    /// `sqrt(6 / (fan_in + fan_out))`.
    pub fn xavier_uniform(&mut self, fan_in: usize, fan_out: usize, count: usize) -> Vec<f32> {
        let limit = (6.0f32 / (fan_in + fan_out).max(1) as f32).sqrt();
        (0..count).map(|_| self.gen_range_f32(-limit, limit)).collect()
    }
}
