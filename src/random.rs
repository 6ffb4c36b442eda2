/*
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Per-worker pseudo-random streams.
//!
//! Worker `k` of a rank whose base seed is `s` draws from an independent
//! stream seeded `s + k`; one extra "central" stream, seeded past all
//! worker streams, is reserved for run-level decisions (rank tie
//! breaking), so rank stability does not depend on worker scheduling.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// A deterministic pseudo-random stream.
#[derive(Debug, Clone)]
pub struct RandomSource {
    rng: SmallRng,
}

impl RandomSource {
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    /// A value uniform in `[0, n)`.
    #[inline]
    pub fn uniform_int(&mut self, n: usize) -> usize {
        self.rng.random_range(0..n)
    }

    /// Two distinct values uniform in `[0, n)`, by redrawing the second
    /// until it differs.
    pub fn distinct_pair(&mut self, n: usize) -> (usize, usize) {
        let first = self.uniform_int(n);
        let mut second = self.uniform_int(n);
        while second == first {
            second = self.uniform_int(n);
        }
        (first, second)
    }

    /// Fisher-Yates shuffle of the whole slice.
    pub fn shuffle(&mut self, values: &mut [u32]) {
        self.partial_shuffle(values, values.len().saturating_sub(1));
    }

    /// Fisher-Yates restricted to the first `prefix` positions: position
    /// `i < prefix` is swapped with a uniform position in `[i, len)`.
    ///
    /// After the call the first `prefix` positions hold a uniformly random
    /// ordered selection of the slice.
    pub fn partial_shuffle(&mut self, values: &mut [u32], prefix: usize) {
        if values.len() > 1 {
            for i in 0..prefix {
                let j = i + self.uniform_int(values.len() - i);
                values.swap(i, j);
            }
        }
    }
}

/// The worker streams and the central stream for one rank.
pub fn worker_streams(rank_seed: u64, workers: usize) -> (Vec<RandomSource>, RandomSource) {
    let streams = (0..workers)
        .map(|worker| RandomSource::from_seed(rank_seed + worker as u64))
        .collect();
    (streams, RandomSource::from_seed(rank_seed + workers as u64))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deterministic() {
        let mut a = RandomSource::from_seed(42);
        let mut b = RandomSource::from_seed(42);
        for _ in 0..100 {
            assert_eq!(a.uniform_int(1000), b.uniform_int(1000));
        }
    }

    #[test]
    fn test_shuffle_is_permutation() {
        let mut rng = RandomSource::from_seed(7);
        let mut values: Vec<u32> = (0..50).collect();
        rng.shuffle(&mut values);
        let mut sorted = values.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..50).collect::<Vec<_>>());
    }

    #[test]
    fn test_distinct_pair() {
        let mut rng = RandomSource::from_seed(3);
        for _ in 0..100 {
            let (a, b) = rng.distinct_pair(2);
            assert_ne!(a, b);
        }
    }

    #[test]
    fn test_partial_shuffle_prefix_only() {
        // With prefix 0 the slice is untouched.
        let mut rng = RandomSource::from_seed(11);
        let mut values: Vec<u32> = (0..10).collect();
        rng.partial_shuffle(&mut values, 0);
        assert_eq!(values, (0..10).collect::<Vec<_>>());
    }
}
