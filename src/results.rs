/*
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Accumulation across samples and ranking of the relevant pairs.

use std::cmp::Ordering;

use crate::error::{Error, Result};
use crate::random::RandomSource;
use crate::utils::{z_score, HalfMatrix};

/// One relevant event pair with its statistics at some point of the run.
#[derive(Debug, Clone, Copy)]
pub struct ScoredPair {
    pub event1: u32,
    pub event2: u32,
    /// Position of the pair in the row-major enumeration of relevant
    /// pairs; stable across the run.
    pub relevant_id: u32,
    /// Raw p-value tally (count of samples at or above the original, with
    /// ties split).
    pub p_tally: u32,
    pub z_score: f32,
}

/// Running sums over all samples. Mutated monotonically by the sampling
/// loop, reduced across processes, and read out at the end.
#[derive(Debug, Clone)]
pub struct Accumulator {
    cooc_sum: HalfMatrix<u64>,
    cooc_square_sum: HalfMatrix<u64>,
    p_tally: HalfMatrix<u32>,
}

impl Accumulator {
    pub fn new(num_events: usize) -> Result<Self> {
        Ok(Self {
            cooc_sum: HalfMatrix::new(num_events)?,
            cooc_square_sum: HalfMatrix::new(num_events)?,
            p_tally: HalfMatrix::new(num_events)?,
        })
    }

    /// Folds one sample into the sums and returns the sample's total
    /// co-occurrence, which the caller checks against the degree-sequence
    /// constant.
    ///
    /// A sample strictly above the original bumps the p tally by one; a tie
    /// contributes the parity of the sample index, a deterministic split
    /// that averages to one half over many independent samples and keeps
    /// equal seeds producing equal results.
    pub fn fold_sample(
        &mut self,
        sample: &HalfMatrix<u32>,
        original: &HalfMatrix<u32>,
        sample_index: u32,
    ) -> u64 {
        let mut total = 0;
        let tie_bump = sample_index % 2;
        for (((sum, square_sum), tally), (&value, &orig)) in self
            .cooc_sum
            .as_mut_slice()
            .iter_mut()
            .zip(self.cooc_square_sum.as_mut_slice().iter_mut())
            .zip(self.p_tally.as_mut_slice().iter_mut())
            .zip(sample.as_slice().iter().zip(original.as_slice()))
        {
            *sum += value as u64;
            *square_sum += value as u64 * value as u64;
            match value.cmp(&orig) {
                Ordering::Greater => *tally += 1,
                Ordering::Equal => *tally += tie_bump,
                Ordering::Less => {}
            }
            total += value as u64;
        }
        total
    }

    /// Merges another accumulator into this one (sum of all tallies).
    pub fn merge(&mut self, other: &Accumulator) {
        for (a, b) in self
            .cooc_sum
            .as_mut_slice()
            .iter_mut()
            .zip(other.cooc_sum.as_slice())
        {
            *a += b;
        }
        for (a, b) in self
            .cooc_square_sum
            .as_mut_slice()
            .iter_mut()
            .zip(other.cooc_square_sum.as_slice())
        {
            *a += b;
        }
        for (a, b) in self
            .p_tally
            .as_mut_slice()
            .iter_mut()
            .zip(other.p_tally.as_slice())
        {
            *a += b;
        }
    }

    /// Zeroes all tallies; used by non-root ranks after their contribution
    /// has been reduced away.
    pub fn clear(&mut self) {
        self.cooc_sum.fill(0);
        self.cooc_square_sum.fill(0);
        self.p_tally.fill(0);
    }

    pub fn cooc_sum(&self) -> &HalfMatrix<u64> {
        &self.cooc_sum
    }

    pub fn cooc_square_sum(&self) -> &HalfMatrix<u64> {
        &self.cooc_square_sum
    }

    pub fn p_tally(&self) -> &HalfMatrix<u32> {
        &self.p_tally
    }

    pub(crate) fn cooc_sum_mut(&mut self) -> &mut [u64] {
        self.cooc_sum.as_mut_slice()
    }

    pub(crate) fn cooc_square_sum_mut(&mut self) -> &mut [u64] {
        self.cooc_square_sum.as_mut_slice()
    }

    pub(crate) fn p_tally_mut(&mut self) -> &mut [u32] {
        self.p_tally.as_mut_slice()
    }

    /// Mean sampled co-occurrence of a cell.
    pub fn mean(&self, row: usize, col: usize, num_samples: u32) -> f64 {
        self.cooc_sum[(row, col)] as f64 / num_samples as f64
    }

    /// Derived z-score of a cell against its original co-occurrence.
    pub fn z(&self, row: usize, col: usize, original: u32, num_samples: u32) -> f32 {
        z_score(
            original as u64,
            self.cooc_sum[(row, col)],
            self.cooc_square_sum[(row, col)],
            num_samples,
        )
    }

    /// Derivation error when a sample total disagrees with the expected
    /// constant.
    pub fn check_sample_total(total: u64, expected: u64) -> Result<()> {
        if total != expected {
            return Err(Error::InvariantViolation(format!(
                "sample co-occurrence sum is {total}, expected {expected}"
            )));
        }
        Ok(())
    }
}

/// Lists all relevant pairs (original co-occurrence at or above
/// `min_cooc`) in row-major order with their current statistics.
pub fn scored_pairs(
    acc: &Accumulator,
    original: &HalfMatrix<u32>,
    min_cooc: u32,
    num_samples: u32,
) -> Vec<ScoredPair> {
    let mut pairs = Vec::new();
    for (row, col, orig) in original.iter_cells() {
        if orig >= min_cooc {
            pairs.push(ScoredPair {
                event1: row as u32,
                event2: (row + col + 1) as u32,
                relevant_id: pairs.len() as u32,
                p_tally: acc.p_tally()[(row, col)],
                z_score: acc.z(row, col, orig, num_samples),
            });
        }
    }
    pairs
}

/// The surprise ordering: ascending p tally (lower means more surprising),
/// then descending z-score, then a coin flip from the central stream.
pub fn rank_cmp(a: &ScoredPair, b: &ScoredPair, rng: &mut RandomSource) -> Ordering {
    match a.p_tally.cmp(&b.p_tally) {
        Ordering::Equal => match b.z_score.partial_cmp(&a.z_score) {
            Some(Ordering::Equal) | None => {
                if rng.uniform_int(2) == 0 {
                    Ordering::Less
                } else {
                    Ordering::Greater
                }
            }
            Some(ordering) => ordering,
        },
        ordering => ordering,
    }
}

/// Quickselect: rearranges `pairs` so that the `count` best-ranked pairs
/// occupy `pairs[..count]`, in no particular order. Linear on average; a
/// full sort of all pairs is never needed.
pub fn select_top(pairs: &mut [ScoredPair], count: usize, rng: &mut RandomSource) {
    if count == 0 || count >= pairs.len() {
        return;
    }
    qselect(pairs, count - 1, rng);
}

fn qselect(v: &mut [ScoredPair], k: usize, rng: &mut RandomSource) {
    let len = v.len();
    if len <= 1 {
        return;
    }
    // Partition against the last element.
    let mut boundary = 0;
    for i in 0..len - 1 {
        let pivot_cmp = {
            let (head, tail) = v.split_at(len - 1);
            rank_cmp(&head[i], &tail[0], rng)
        };
        if pivot_cmp == Ordering::Greater {
            continue;
        }
        v.swap(i, boundary);
        boundary += 1;
    }
    v.swap(len - 1, boundary);

    match k.cmp(&boundary) {
        Ordering::Equal => {}
        Ordering::Less => qselect(&mut v[..boundary], k, rng),
        Ordering::Greater => qselect(&mut v[boundary + 1..], k - boundary - 1, rng),
    }
}

/// Selects the `count` best-ranked pairs into the front, then fully sorts
/// them. The sort breaks remaining ties by pair id so its output is
/// deterministic.
pub fn sort_top(pairs: &mut [ScoredPair], count: usize, rng: &mut RandomSource) {
    select_top(pairs, count, rng);
    let count = count.min(pairs.len());
    pairs[..count].sort_unstable_by(|a, b| {
        a.p_tally
            .cmp(&b.p_tally)
            .then_with(|| b.z_score.total_cmp(&a.z_score))
            .then_with(|| a.relevant_id.cmp(&b.relevant_id))
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(id: u32, p_tally: u32, z: f32) -> ScoredPair {
        ScoredPair {
            event1: 0,
            event2: id + 1,
            relevant_id: id,
            p_tally,
            z_score: z,
        }
    }

    #[test]
    fn test_select_top() {
        let mut rng = RandomSource::from_seed(0);
        let mut pairs: Vec<_> = (0..20).map(|i| pair(i, 100 - i, i as f32)).collect();
        // Best-ranked pairs are those with the lowest tallies, i.e. the
        // highest ids.
        select_top(&mut pairs, 5, &mut rng);
        let mut top: Vec<_> = pairs[..5].iter().map(|p| p.relevant_id).collect();
        top.sort_unstable();
        assert_eq!(top, vec![15, 16, 17, 18, 19]);
    }

    #[test]
    fn test_sort_top_orders_by_rank() {
        let mut rng = RandomSource::from_seed(0);
        let mut pairs = vec![pair(0, 3, 0.0), pair(1, 1, -2.0), pair(2, 1, 5.0), pair(3, 2, 0.0)];
        sort_top(&mut pairs, 4, &mut rng);
        let ids: Vec<_> = pairs.iter().map(|p| p.relevant_id).collect();
        assert_eq!(ids, vec![2, 1, 3, 0]);
    }

    #[test]
    fn test_fold_sample_tie_split() -> Result<()> {
        let mut original = HalfMatrix::<u32>::new(3)?;
        original.as_mut_slice().copy_from_slice(&[2, 1, 0]);
        let mut sample = HalfMatrix::<u32>::new(3)?;
        sample.as_mut_slice().copy_from_slice(&[2, 2, 0]);

        let mut acc = Accumulator::new(3)?;
        // Even sample index: ties contribute nothing.
        let total = acc.fold_sample(&sample, &original, 0);
        assert_eq!(total, 4);
        assert_eq!(acc.p_tally().as_slice(), &[0, 1, 0]);
        // Odd sample index: ties contribute one.
        acc.fold_sample(&sample, &original, 1);
        assert_eq!(acc.p_tally().as_slice(), &[1, 2, 1]);
        assert_eq!(acc.cooc_sum().as_slice(), &[4, 4, 0]);
        assert_eq!(acc.cooc_square_sum().as_slice(), &[8, 8, 0]);
        Ok(())
    }

    #[test]
    fn test_merge_and_clear() -> Result<()> {
        let mut original = HalfMatrix::<u32>::new(3)?;
        original.as_mut_slice().copy_from_slice(&[1, 1, 1]);
        let mut sample = HalfMatrix::<u32>::new(3)?;
        sample.as_mut_slice().copy_from_slice(&[2, 1, 0]);

        let mut a = Accumulator::new(3)?;
        a.fold_sample(&sample, &original, 0);
        let mut b = a.clone();
        b.merge(&a);
        assert_eq!(b.cooc_sum().as_slice(), &[4, 2, 0]);
        assert_eq!(b.p_tally().as_slice(), &[2, 0, 0]);
        b.clear();
        assert_eq!(b.cooc_sum().as_slice(), &[0, 0, 0]);
        Ok(())
    }
}
