// src/utils/rng.rs
//! Seedable randomness source
//!
//! Every traveler task owns its own generator forked from the master one, so
//! no RNG state is shared between tasks.

use crate::grid::{Dimensions, Direction, Position};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;

/// Uniform randomness for step counts, delays, positions and directions
#[derive(Debug, Clone)]
pub struct SimRng {
    inner: StdRng,
}

impl SimRng {
    /// Seeded generator, or one seeded from entropy when `seed` is `None`
    pub fn from_seed(seed: Option<u64>) -> Self {
        let inner = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { inner }
    }

    /// Derive an independent generator for another task
    pub fn fork(&mut self) -> Self {
        Self {
            inner: StdRng::seed_from_u64(self.inner.gen()),
        }
    }

    pub fn position(&mut self, dims: Dimensions) -> Position {
        Position::new(
            self.inner.gen_range(0..dims.width),
            self.inner.gen_range(0..dims.height),
        )
    }

    pub fn direction(&mut self) -> Direction {
        Direction::ALL[self.inner.gen_range(0..Direction::ALL.len())]
    }

    /// Step budget in `[min, max]`
    pub fn steps(&mut self, min: u32, max: u32) -> u32 {
        self.inner.gen_range(min..=max)
    }

    /// Delay in `[min, max)`; exactly `min` when the range is empty
    pub fn delay(&mut self, min: Duration, max: Duration) -> Duration {
        min + self.duration_below(max.saturating_sub(min))
    }

    /// Uniform duration in `[0, bound)`; zero for a zero bound
    pub fn duration_below(&mut self, bound: Duration) -> Duration {
        let nanos = bound.as_nanos().min(u64::MAX as u128) as u64;
        if nanos == 0 {
            return Duration::ZERO;
        }
        Duration::from_nanos(self.inner.gen_range(0..nanos))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_generators_repeat() {
        let mut a = SimRng::from_seed(Some(42));
        let mut b = SimRng::from_seed(Some(42));
        let dims = Dimensions::new(15, 15);

        for _ in 0..20 {
            assert_eq!(a.position(dims), b.position(dims));
            assert_eq!(a.direction(), b.direction());
        }
    }

    #[test]
    fn test_ranges() {
        let mut rng = SimRng::from_seed(Some(1));
        let min = Duration::from_millis(10);
        let max = Duration::from_millis(50);

        for _ in 0..200 {
            let steps = rng.steps(10, 100);
            assert!((10..=100).contains(&steps));

            let delay = rng.delay(min, max);
            assert!(delay >= min && delay < max);
        }

        assert_eq!(rng.delay(min, min), min);
        assert_eq!(rng.duration_below(Duration::ZERO), Duration::ZERO);
    }
}
