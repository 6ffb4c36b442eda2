/*
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! The sample-count heuristic and its ground truths.
//!
//! A ground truth is a set of event pairs plus the set of events they
//! touch. The *internal* ground truth is rolling: after each batch it is
//! replaced by the current top-k of the relevant pairs. On the next batch
//! the top-k is recomputed among the pairs touching a ground-truth event
//! and compared against the stored pairs; once the positive predictive
//! value of that comparison reaches the configured threshold, the ranking
//! has stabilized and sampling stops. An *external* ground truth works the
//! same way but is loaded once and never replaced.

use std::collections::HashMap;
use std::io::BufRead;

use sux::bits::BitVec;

use crate::config::{Config, GtMissingPolicy};
use crate::error::{Error, Result};
use crate::graph::GraphInfo;
use crate::random::RandomSource;
use crate::results::{scored_pairs, select_top, sort_top, Accumulator, ScoredPair};
use crate::utils::HalfMatrix;

/// A set of reference pairs (by relevant-pair id) and the events they
/// touch.
#[derive(Debug, Clone)]
pub struct GroundTruth {
    events: BitVec,
    pairs: BitVec,
    num_pairs: usize,
}

impl GroundTruth {
    fn new(info: &GraphInfo) -> Self {
        Self {
            events: BitVec::new(info.num_events),
            pairs: BitVec::new(info.num_relevant_pairs),
            num_pairs: 0,
        }
    }

    fn insert(&mut self, pair: &ScoredPair) {
        self.events.set(pair.event1 as usize, true);
        self.events.set(pair.event2 as usize, true);
        self.pairs.set(pair.relevant_id as usize, true);
    }

    /// PPV of the current top-k (k = `num_pairs`) among the pairs touching
    /// a ground-truth event, against the stored pairs.
    fn ppv(&self, all_pairs: &[ScoredPair], rng: &mut RandomSource) -> f64 {
        let mut filtered: Vec<ScoredPair> = all_pairs
            .iter()
            .filter(|p| self.events.get(p.event1 as usize) || self.events.get(p.event2 as usize))
            .copied()
            .collect();
        // The stored pairs all touch a ground-truth event, so the filtered
        // set is at least as large as the top-k.
        let k = self.num_pairs.min(filtered.len());
        select_top(&mut filtered, k, rng);
        let matched = filtered[..k]
            .iter()
            .filter(|p| self.pairs.get(p.relevant_id as usize))
            .count();
        matched as f64 / self.num_pairs as f64
    }
}

/// The rolling internal ground truth.
#[derive(Debug, Clone)]
pub struct SampleHeuristic {
    gt: GroundTruth,
}

impl SampleHeuristic {
    pub fn new(info: &GraphInfo) -> Self {
        Self {
            gt: GroundTruth::new(info),
        }
    }

    /// Evaluates the run after a batch. The first call only creates the
    /// ground truth and returns `None`; later calls return the PPV against
    /// the previous batch's top-k and replace the ground truth with the
    /// current one.
    pub fn evaluate(
        &mut self,
        acc: &Accumulator,
        original: &HalfMatrix<u32>,
        info: &GraphInfo,
        config: &Config,
        num_samples: u32,
        rng: &mut RandomSource,
    ) -> Option<f64> {
        let mut pairs = scored_pairs(acc, original, config.min_cooc, num_samples);
        let ppv = if self.gt.num_pairs == 0 {
            None
        } else {
            Some(self.gt.ppv(&pairs, rng))
        };

        // Replace the ground truth with the current top-k.
        let k = ((info.num_relevant_pairs as f64 * config.ratio_gt_pairs) as usize).max(1);
        sort_top(&mut pairs, k, rng);
        self.gt = GroundTruth::new(info);
        self.gt.num_pairs = k.min(pairs.len());
        for pair in &pairs[..self.gt.num_pairs] {
            self.gt.insert(pair);
        }

        ppv
    }
}

/// A fixed, collaborator-provided ground truth.
#[derive(Debug, Clone)]
pub struct ExternalGroundTruth {
    gt: GroundTruth,
}

impl ExternalGroundTruth {
    /// Parses a ground-truth file: one pair of whitespace-separated event
    /// names per line. Pairs naming events absent from the input graph are
    /// handled according to the configured policy.
    pub fn parse<R: BufRead>(
        input: R,
        info: &GraphInfo,
        original: &HalfMatrix<u32>,
        config: &Config,
    ) -> Result<Self> {
        let ids: HashMap<&str, u32> = info
            .event_labels
            .iter()
            .enumerate()
            .map(|(id, label)| (label.as_str(), id as u32))
            .collect();

        // Relevant-pair ids in row-major order, as everywhere else.
        let mut relevant = HashMap::new();
        for (row, col, value) in original.iter_cells() {
            if value >= config.min_cooc {
                let id = relevant.len() as u32;
                relevant.insert((row as u32, (row + col + 1) as u32), id);
            }
        }

        let mut gt = GroundTruth::new(info);
        for (i, line) in input.lines().enumerate() {
            let line = line?;
            let line = line.trim_end();
            if line.is_empty() {
                continue;
            }
            let (left, right) = line.split_once(' ').ok_or_else(|| {
                Error::InvalidInput(format!(
                    "ground-truth line {} is not two space-separated node names: {line:?}",
                    i + 1
                ))
            })?;
            match (ids.get(left), ids.get(right)) {
                (Some(&a), Some(&b)) => {
                    gt.num_pairs += 1;
                    gt.events.set(a as usize, true);
                    gt.events.set(b as usize, true);
                    if let Some(&id) = relevant.get(&(a.min(b), a.max(b))) {
                        gt.pairs.set(id as usize, true);
                    }
                }
                (found_left, found_right) => match config.gt_missing_policy {
                    GtMissingPolicy::Include => {
                        // Count the pair and keep whichever event exists.
                        gt.num_pairs += 1;
                        if let Some(&a) = found_left {
                            gt.events.set(a as usize, true);
                        }
                        if let Some(&b) = found_right {
                            gt.events.set(b as usize, true);
                        }
                    }
                    GtMissingPolicy::Ignore => {}
                    GtMissingPolicy::Disallow => {
                        let missing = if found_left.is_none() { left } else { right };
                        return Err(Error::MissingNode(missing.to_owned()));
                    }
                },
            }
        }
        if gt.num_pairs == 0 {
            return Err(Error::InvalidInput(
                "the external ground truth has no usable pairs".into(),
            ));
        }
        Ok(Self { gt })
    }

    /// PPV of the current ranking against the fixed ground truth.
    pub fn ppv(
        &self,
        acc: &Accumulator,
        original: &HalfMatrix<u32>,
        config: &Config,
        num_samples: u32,
        rng: &mut RandomSource,
    ) -> f64 {
        let pairs = scored_pairs(acc, original, config.min_cooc, num_samples);
        self.gt.ppv(&pairs, rng)
    }
}
