//! Tower height sampling.
//!
//! Heights come from an injected [`HeightSampler`] so tests can replay fixed
//! sequences. The default sampler flips a fair coin and climbs one level per
//! head, stopping at `max_level` without resampling; keys that reach the cap
//! are therefore shorter-tailed than a true geometric law.

use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};

/// Source of tower heights.
pub trait HeightSampler {
    /// Returns a height in `0..=max_level`.
    fn sample(&mut self, max_level: usize) -> usize;
}

impl<F> HeightSampler for F
where
    F: FnMut(usize) -> usize,
{
    fn sample(&mut self, max_level: usize) -> usize {
        self(max_level).min(max_level)
    }
}

/// Fair coin flips truncated at `max_level`.
#[derive(Debug, Clone)]
pub struct CoinFlips<R> {
    rng: R,
}

impl<R: RngCore> CoinFlips<R> {
    /// Uses `rng` as the coin.
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl CoinFlips<StdRng> {
    /// Deterministic coin seeded from `seed`.
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }

    /// Coin seeded from OS entropy.
    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }
}

impl<R: RngCore> HeightSampler for CoinFlips<R> {
    fn sample(&mut self, max_level: usize) -> usize {
        let mut height = 0;
        // Flip before checking the cap so a capped tower still spends its
        // final draw.
        while self.rng.gen_bool(0.5) && height < max_level {
            height += 1;
        }
        height
    }
}

/// Replays a fixed sequence of heights, clamped to `max_level`.
///
/// Once the sequence is exhausted every further sample is 0.
#[derive(Debug, Clone, Default)]
pub struct FixedHeights {
    heights: Vec<usize>,
    next: usize,
}

impl FixedHeights {
    /// Sampler that yields `heights` in order.
    pub fn new(heights: impl Into<Vec<usize>>) -> Self {
        Self {
            heights: heights.into(),
            next: 0,
        }
    }

    /// Heights not yet consumed.
    pub fn remaining(&self) -> &[usize] {
        &self.heights[self.next.min(self.heights.len())..]
    }
}

impl HeightSampler for FixedHeights {
    fn sample(&mut self, max_level: usize) -> usize {
        let height = self.heights.get(self.next).copied().unwrap_or(0);
        self.next += 1;
        height.min(max_level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_heights_replay_then_zero() {
        let mut sampler = FixedHeights::new(vec![0, 2, 1]);
        assert_eq!(sampler.sample(5), 0);
        assert_eq!(sampler.remaining(), &[2, 1]);
        assert_eq!(sampler.sample(5), 2);
        assert_eq!(sampler.sample(5), 1);
        assert_eq!(sampler.sample(5), 0);
        assert!(sampler.remaining().is_empty());
    }

    #[test]
    fn fixed_heights_clamp_to_max_level() {
        let mut sampler = FixedHeights::new(vec![9]);
        assert_eq!(sampler.sample(3), 3);
    }

    #[test]
    fn coin_flips_respect_cap() {
        let mut coin = CoinFlips::seeded(7);
        for _ in 0..1_000 {
            assert!(coin.sample(2) <= 2);
        }
        assert_eq!(coin.sample(0), 0);
    }

    #[test]
    fn capped_tower_spends_its_last_flip() {
        let mut coin = CoinFlips::seeded(9);
        let mut rng = StdRng::seed_from_u64(9);
        assert_eq!(coin.sample(0), 0);
        // Exactly one draw was consumed at max level 0.
        let _ = rng.gen_bool(0.5);

        let mut rest = CoinFlips::new(rng);
        let xs: Vec<_> = (0..64).map(|_| coin.sample(5)).collect();
        let ys: Vec<_> = (0..64).map(|_| rest.sample(5)).collect();
        assert_eq!(xs, ys);
    }

    #[test]
    fn coin_flips_are_deterministic_per_seed() {
        let mut a = CoinFlips::seeded(42);
        let mut b = CoinFlips::seeded(42);
        let xs: Vec<_> = (0..64).map(|_| a.sample(5)).collect();
        let ys: Vec<_> = (0..64).map(|_| b.sample(5)).collect();
        assert_eq!(xs, ys);
    }

    #[test]
    fn coin_flips_reach_upper_levels() {
        let mut coin = CoinFlips::seeded(1);
        let samples: Vec<_> = (0..4_096).map(|_| coin.sample(16)).collect();
        let zeros = samples.iter().filter(|&&h| h == 0).count();
        // Roughly half of all towers stay at the base.
        assert!((1_600..2_500).contains(&zeros), "zeros = {}", zeros);
        assert!(samples.iter().any(|&h| h >= 4));
    }

    #[test]
    fn closures_are_samplers() {
        let mut always_three = |_max: usize| 3;
        assert_eq!(HeightSampler::sample(&mut always_three, 1), 1);
        assert_eq!(HeightSampler::sample(&mut always_three, 8), 3);
    }
}
