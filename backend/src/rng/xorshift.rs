//! xorshift64* random number generator
//!
//! Fast, deterministic PRNG used for every random draw in the simulator:
//! Poisson arrival counts, menu and customer sampling, rush batch sizes.
//!
//! # Determinism
//!
//! Same seed → same sequence. Comparison runs depend on this to replay an
//! identical arrival stream through two policies.

use serde::{Deserialize, Serialize};

/// Largest mean drawn with a single Knuth pass
const POISSON_CHUNK: f64 = 500.0;

/// Means above this are clamped
const POISSON_MAX_MEAN: f64 = 1.0e6;

/// Deterministic random number generator using xorshift64*
///
/// # Example
/// ```
/// use barista_simulator_core_rs::RngManager;
///
/// let mut rng = RngManager::new(12345);
/// let arrivals = rng.poisson(1.4);
/// let batch = rng.range(5, 9); // [5, 9)
/// assert!((5..9).contains(&batch));
/// # let _ = arrivals;
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RngManager {
    state: u64,
}

impl RngManager {
    /// Create a new RNG with given seed
    ///
    /// A zero seed is mapped to 1 since xorshift never leaves the zero state.
    pub fn new(seed: u64) -> Self {
        let state = if seed == 0 { 1 } else { seed };
        Self { state }
    }

    /// Generate next random u64 value
    pub fn next(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.state = x;
        x.wrapping_mul(0x2545F4914F6CDD1D)
    }

    /// Generate random value in range [min, max)
    ///
    /// # Panics
    /// Panics if min >= max
    pub fn range(&mut self, min: i64, max: i64) -> i64 {
        assert!(min < max, "min must be less than max");

        let span = (max - min) as u64;
        min + (self.next() % span) as i64
    }

    /// Current internal state (for checkpointing)
    pub fn get_state(&self) -> u64 {
        self.state
    }

    /// Generate random f64 in range [0.0, 1.0)
    pub fn next_f64(&mut self) -> f64 {
        (self.next() >> 11) as f64 * (1.0 / ((1u64 << 53) as f64))
    }

    /// Sample a Poisson-distributed count with mean `lambda`
    ///
    /// Uses Knuth's multiplication method, which is exact and fast for the
    /// per-minute rates a service counter sees. Means above
    /// `POISSON_CHUNK` are drawn as a sum of smaller Poisson draws, since
    /// `exp(-lambda)` underflows past ~745. Non-positive or non-finite rates
    /// yield zero; means beyond `POISSON_MAX_MEAN` are clamped to it.
    ///
    /// # Example
    /// ```
    /// use barista_simulator_core_rs::RngManager;
    ///
    /// let mut rng = RngManager::new(7);
    /// assert_eq!(rng.poisson(0.0), 0);
    /// ```
    pub fn poisson(&mut self, lambda: f64) -> u32 {
        if !lambda.is_finite() || lambda <= 0.0 {
            return 0;
        }

        let mut remaining = lambda.min(POISSON_MAX_MEAN);
        let mut total: u32 = 0;
        while remaining > POISSON_CHUNK {
            total = total.saturating_add(self.poisson_knuth(POISSON_CHUNK));
            remaining -= POISSON_CHUNK;
        }
        total.saturating_add(self.poisson_knuth(remaining))
    }

    fn poisson_knuth(&mut self, lambda: f64) -> u32 {
        let limit = (-lambda).exp();
        let mut product = 1.0;
        let mut count: u32 = 0;
        loop {
            product *= self.next_f64();
            if product <= limit {
                return count;
            }
            count += 1;
        }
    }

    /// Pick an index from `weights` with probability proportional to weight
    ///
    /// Returns `None` if the slice is empty or no weight is positive.
    pub fn choose_weighted(&mut self, weights: &[f64]) -> Option<usize> {
        let total: f64 = weights.iter().filter(|w| **w > 0.0).sum();
        if total <= 0.0 {
            return None;
        }

        let mut target = self.next_f64() * total;
        let mut last_positive = None;
        for (idx, weight) in weights.iter().enumerate() {
            if *weight <= 0.0 {
                continue;
            }
            last_positive = Some(idx);
            if target < *weight {
                return Some(idx);
            }
            target -= weight;
        }

        // Floating-point residue lands on the last eligible slot
        last_positive
    }
}
