/*
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Immutable run configuration.
//!
//! A [`Config`] value is built once (by the CLI or by test code) and passed
//! by reference into every component; nothing in the engine mutates it.

use crate::error::{Error, Result};

/// Topology of the input graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphKind {
    /// Two disjoint node partitions, actors and events.
    Bipartite,
    /// Undirected general graph; actors and events coincide and every
    /// physical edge is stored twice.
    General,
}

/// Which side of a bipartite input holds the events (nodes of interest).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

/// Degree-preserving randomization algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapAlgorithm {
    Curveball,
    SingleSwitch,
}

/// How many swaps to perform between successive samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapCount {
    /// Calibrate with the perturbation-plateau heuristic.
    Heuristic,
    /// `|E| * ln |E|`.
    ElnE,
    /// A fixed number of swaps.
    Fixed(u64),
}

/// How many samples to draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleCount {
    /// Stop when the internal top-k ranking is stable (PPV criterion),
    /// capped at [`Config::max_samples`].
    Heuristic,
    /// A fixed number of samples.
    Fixed(u32),
}

/// Policy for ground-truth pairs naming events absent from the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GtMissingPolicy {
    /// Fail the run.
    #[default]
    Disallow,
    /// Count the pair and keep the events that do exist.
    Include,
    /// Drop the pair as if the ground-truth line did not exist.
    Ignore,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub kind: GraphKind,
    pub side_of_interest: Side,
    /// Weight that a direct edge `a-b` of a general graph contributes to
    /// `cooc(a, b)`.
    pub direct_edge_weight: u32,

    pub seed: u64,

    pub algorithm: SwapAlgorithm,
    pub swaps: SwapCount,
    /// Threshold for the theta validation of the swap calibration; `None`
    /// disables the check.
    pub theta: Option<f64>,
    /// Number of distinct degrees sampled by the theta validation.
    pub degrees_swap_heuristic: usize,
    /// Number of events selected per sampled degree.
    pub events_per_degree_swap_heuristic: usize,

    /// Minimum original co-occurrence for a pair to be reported.
    pub min_cooc: u32,

    pub samples: SampleCount,
    pub max_samples: u32,
    /// Fraction of the relevant pairs kept as internal ground truth.
    pub ratio_gt_pairs: f64,
    /// PPV above which the sample heuristic stops the run.
    pub internal_ppv_threshold: f64,
    pub gt_missing_policy: GtMissingPolicy,

    /// Number of worker-local graph copies per process.
    pub workers: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            kind: GraphKind::Bipartite,
            side_of_interest: Side::Left,
            direct_edge_weight: 1,
            seed: 0,
            algorithm: SwapAlgorithm::Curveball,
            swaps: SwapCount::Heuristic,
            theta: None,
            degrees_swap_heuristic: 9,
            events_per_degree_swap_heuristic: 6,
            min_cooc: 1,
            samples: SampleCount::Heuristic,
            max_samples: 10_000,
            ratio_gt_pairs: 2e-3,
            internal_ppv_threshold: 0.95,
            gt_missing_policy: GtMissingPolicy::Disallow,
            workers: 16,
        }
    }
}

impl Config {
    /// The algorithm the engine will actually run.
    ///
    /// Curveball trades are only defined for bipartite graphs; general
    /// graphs always use single switches.
    pub fn effective_algorithm(&self) -> SwapAlgorithm {
        match self.kind {
            GraphKind::Bipartite => self.algorithm,
            GraphKind::General => SwapAlgorithm::SingleSwitch,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(Error::InvalidInput("at least one worker is needed".into()));
        }
        if !(0.0..=1.0).contains(&self.internal_ppv_threshold) {
            return Err(Error::InvalidInput(format!(
                "internal PPV threshold must be in [0, 1], got {}",
                self.internal_ppv_threshold
            )));
        }
        if !(self.ratio_gt_pairs > 0.0 && self.ratio_gt_pairs <= 1.0) {
            return Err(Error::InvalidInput(format!(
                "ratio of ground-truth pairs must be in (0, 1], got {}",
                self.ratio_gt_pairs
            )));
        }
        if let Some(theta) = self.theta {
            if theta <= 0.0 {
                return Err(Error::InvalidInput(format!(
                    "theta threshold must be positive, got {theta}"
                )));
            }
            if self.degrees_swap_heuristic < 2 || self.events_per_degree_swap_heuristic < 2 {
                return Err(Error::InvalidInput(
                    "theta validation needs at least two degrees and two events per degree".into(),
                ));
            }
        }
        if let SampleCount::Fixed(0) = self.samples {
            return Err(Error::InvalidInput("at least one sample is needed".into()));
        }
        Ok(())
    }
}
