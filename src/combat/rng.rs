//! Injectable PRNG for combat resolution. Uses SplitMix64 for throughput and
//! good statistical quality. Deterministic: same seed produces the same
//! sequence. Not cryptographically secure.
//!
//! No component in this crate owns a global generator; every randomized
//! operation takes a `&mut` [`RandomSource`] supplied by the caller.

const SPLITMIX64_GOLDEN: u64 = 0x9e3779b97f4a7c15;
const SPLITMIX64_M1: u64 = 0xbf58476d1ce4e5b9;
const SPLITMIX64_M2: u64 = 0x94d049bb133111eb;

/// Scale factor turning the top 53 bits of a u64 into a float in `[0, 1)`.
const UNIFORM_SCALE: f64 = 1.0 / (1u64 << 53) as f64;

/// Source of randomness for the resolution pipeline.
///
/// Implementations provide `next_u64`; every derived draw consumes exactly
/// one `next_u64` call, so call sequences stay aligned across runs even when
/// a probability is degenerate (0 or 1) or a lookup fails downstream.
pub trait RandomSource {
    /// Returns the next 64-bit value in the sequence.
    fn next_u64(&mut self) -> u64;

    /// Uniform draw in `[0, 1)` with 53-bit resolution.
    fn uniform(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 * UNIFORM_SCALE
    }

    /// Bernoulli draw: true with probability `p`.
    ///
    /// `p <= 0` never succeeds and `p >= 1` always succeeds, but one draw is
    /// consumed either way.
    fn roll(&mut self, p: f64) -> bool {
        self.uniform() < p
    }

    /// One draw against ascending cumulative `thresholds`; returns the index
    /// of the first bucket the draw falls under, or `None` past the last.
    fn roll_tiered(&mut self, thresholds: &[f64]) -> Option<usize> {
        let draw = self.uniform();
        thresholds.iter().position(|&bound| draw < bound)
    }

    /// Picks an index with probability proportional to its weight.
    ///
    /// Negative weights count as zero. Returns `None` when the weight sum is
    /// not positive; the draw is consumed regardless.
    fn weighted_choice(&mut self, weights: &[f64]) -> Option<usize> {
        let draw = self.uniform();
        let total: f64 = weights.iter().map(|w| w.max(0.0)).sum();
        if !(total > 0.0) || !total.is_finite() {
            return None;
        }
        let mut cursor = draw * total;
        for (index, weight) in weights.iter().enumerate() {
            let weight = weight.max(0.0);
            if cursor < weight {
                return Some(index);
            }
            cursor -= weight;
        }
        // Rounding can leave the cursor a hair past the last bucket.
        Some(weights.len() - 1)
    }
}

/// SplitMix64 generator, the crate's standard [`RandomSource`].
#[derive(Debug, Clone, Copy)]
pub struct SplitMix64 {
    state: u64,
}

impl SplitMix64 {
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }
}

impl RandomSource for SplitMix64 {
    #[inline]
    fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(SPLITMIX64_GOLDEN);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(SPLITMIX64_M1);
        z = (z ^ (z >> 27)).wrapping_mul(SPLITMIX64_M2);
        z ^ (z >> 31)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splitmix64_deterministic() {
        let mut a = SplitMix64::new(7);
        let mut b = SplitMix64::new(7);
        for _ in 0..100 {
            assert_eq!(a.next_u64(), b.next_u64());
        }
    }

    #[test]
    fn splitmix64_different_seeds_differ() {
        let mut a = SplitMix64::new(1);
        let mut b = SplitMix64::new(2);
        assert_ne!(a.next_u64(), b.next_u64());
    }

    #[test]
    fn uniform_stays_in_unit_interval() {
        let mut rng = SplitMix64::new(42);
        for _ in 0..10_000 {
            let value = rng.uniform();
            assert!((0.0..1.0).contains(&value), "uniform out of range: {value}");
        }
    }

    #[test]
    fn roll_degenerate_probabilities_are_deterministic() {
        let mut rng = SplitMix64::new(3);
        for _ in 0..100 {
            assert!(!rng.roll(0.0));
            assert!(rng.roll(1.0));
        }
    }

    #[test]
    fn roll_consumes_one_draw_regardless_of_probability() {
        let mut rolled = SplitMix64::new(11);
        let mut raw = SplitMix64::new(11);
        rolled.roll(0.0);
        rolled.roll(1.0);
        rolled.roll(0.5);
        raw.next_u64();
        raw.next_u64();
        raw.next_u64();
        assert_eq!(rolled.next_u64(), raw.next_u64());
    }

    #[test]
    fn roll_tiered_picks_first_matching_bucket() {
        struct Fixed(u64);
        impl RandomSource for Fixed {
            fn next_u64(&mut self) -> u64 {
                self.0
            }
        }
        // uniform() == 0.0 falls in the first bucket.
        assert_eq!(Fixed(0).roll_tiered(&[0.1, 0.5, 1.0]), Some(0));
        // uniform() just under 1.0 falls past every bucket below it.
        assert_eq!(Fixed(u64::MAX).roll_tiered(&[0.1, 0.5, 1.0]), Some(2));
        assert_eq!(Fixed(u64::MAX).roll_tiered(&[0.1, 0.5]), None);
    }

    #[test]
    fn weighted_choice_skips_zero_weight_buckets() {
        let mut rng = SplitMix64::new(9);
        for _ in 0..1_000 {
            assert_eq!(rng.weighted_choice(&[0.0, 1.0, 0.0]), Some(1));
        }
    }

    #[test]
    fn weighted_choice_empty_or_zero_total_is_none() {
        let mut rng = SplitMix64::new(5);
        assert_eq!(rng.weighted_choice(&[]), None);
        assert_eq!(rng.weighted_choice(&[0.0, -3.0]), None);
    }

    #[test]
    fn weighted_choice_roughly_tracks_weights() {
        let mut rng = SplitMix64::new(1234);
        let mut counts = [0u32; 2];
        for _ in 0..10_000 {
            let index = rng.weighted_choice(&[1.0, 3.0]).unwrap();
            counts[index] += 1;
        }
        let share = counts[1] as f64 / 10_000.0;
        assert!((share - 0.75).abs() < 0.02, "weight share drifted: {share}");
    }
}
