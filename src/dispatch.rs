/*
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! The parallel sampling loop.
//!
//! The dispatcher owns one graph copy and one random stream per worker.
//! Each batch randomizes every worker graph in parallel, computes the
//! co-occurrences of each sample (itself parallel over sub-block pair
//! kinds), folds them into the shared accumulator, reduces the accumulator
//! across processes, and asks the sample heuristic whether to continue.
//! Worker errors surface at the batch barrier; any error is fatal.

use dsi_progress_logger::prelude::*;
use rayon::prelude::*;

use crate::collective::Collective;
use crate::config::{Config, GraphKind, SampleCount, SwapAlgorithm, SwapCount};
use crate::cooc;
use crate::error::Result;
use crate::graph::{Graph, GraphInfo};
use crate::heuristics::sample::{ExternalGroundTruth, SampleHeuristic};
use crate::heuristics::swap;
use crate::random::{worker_streams, RandomSource};
use crate::results::{scored_pairs, Accumulator, ScoredPair};
use crate::swaps;
use crate::utils::HalfMatrix;

/// Progress of a run; transitions are strictly forward and any failure
/// aborts the run in whatever state it is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RunState {
    Init,
    Loaded,
    OriginalCooc,
    SwapCalibrated,
    Sampling,
    Report,
    Done,
}

/// Everything a run produces.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// The relevant pairs in row-major order, with final statistics.
    pub pairs: Vec<ScoredPair>,
    pub accumulator: Accumulator,
    /// Total number of samples drawn, across all ranks.
    pub num_samples: u32,
    /// Swaps per sample actually used.
    pub num_swaps: u64,
}

pub struct Dispatcher<'a, C: Collective> {
    info: &'a GraphInfo,
    original_cooc: &'a HalfMatrix<u32>,
    config: &'a Config,
    collective: &'a C,
    state: RunState,
}

impl<'a, C: Collective> Dispatcher<'a, C> {
    pub fn new(
        info: &'a GraphInfo,
        original_cooc: &'a HalfMatrix<u32>,
        config: &'a Config,
        collective: &'a C,
    ) -> Self {
        Self {
            info,
            original_cooc,
            config,
            collective,
            state: RunState::Init,
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    fn advance(&mut self, next: RunState) {
        debug_assert!(self.state < next);
        log::debug!("run state: {:?} -> {next:?}", self.state);
        self.state = next;
    }

    /// Runs the whole sampling pipeline on a canonical base graph.
    pub fn run(
        &mut self,
        base: &Graph,
        external_gt: Option<&ExternalGroundTruth>,
    ) -> Result<RunOutcome> {
        let info = self.info;
        let config = self.config;
        let workers = config.workers;

        self.advance(RunState::Loaded);
        self.advance(RunState::OriginalCooc);

        // Stream k of this rank is seeded `seed + W * rank + k`; the
        // central stream comes right after the worker streams.
        let rank_seed = config.seed + (workers * self.collective.rank()) as u64;
        let (mut rngs, mut central) = worker_streams(rank_seed, workers);
        let mut graphs = vec![base.clone(); workers];

        let num_swaps = match config.swaps {
            SwapCount::Fixed(n) => n,
            SwapCount::ElnE => {
                (info.num_edges as f64 * (info.num_edges as f64).ln()).ceil() as u64
            }
            SwapCount::Heuristic => {
                log::info!("running the swap heuristic...");
                let local = swap::calibrate(base, info, config, &mut rngs[0])?;
                let reduced = self.collective.reduce_max_u64(local)?;
                let mut num_swaps = reduced;
                self.collective.broadcast_u64(&mut num_swaps)?;
                // Decorrelate all worker graphs from the original before
                // the first sample.
                run_swap_step(&mut graphs, &mut rngs, info, config, num_swaps)?;
                num_swaps
            }
        };
        log::info!("swaps per sample: {num_swaps}");
        self.advance(RunState::SwapCalibrated);

        let target = match config.samples {
            SampleCount::Fixed(n) => n,
            SampleCount::Heuristic => config.max_samples,
        };
        let mut heuristic = match config.samples {
            SampleCount::Heuristic => Some(SampleHeuristic::new(info)),
            SampleCount::Fixed(_) => None,
        };

        let mut acc = Accumulator::new(info.num_events)?;
        let mut scratch = HalfMatrix::<u32>::new(info.num_events)?;
        let num_ranks = self.collective.num_ranks() as u32;
        let mut samples_done: u32 = 0;
        let mut continue_sampling = true;

        self.advance(RunState::Sampling);
        let mut pl = progress_logger![item_name = "sample"];
        pl.expected_updates(Some(target as usize));
        pl.start("sampling...");

        while continue_sampling && samples_done * num_ranks < target {
            run_swap_step(&mut graphs, &mut rngs, info, config, num_swaps)?;
            self.collective.barrier();

            for worker in 0..workers {
                cooc::compute(&mut graphs[worker], info, &mut scratch)?;
                let total =
                    acc.fold_sample(&scratch, self.original_cooc, samples_done + worker as u32);
                Accumulator::check_sample_total(total, info.cooc_sum)?;
                scratch.fill(0);
            }
            samples_done += workers as u32;
            pl.update_with_count(workers);
            self.collective.barrier();

            if num_ranks > 1 {
                self.collective.reduce_sum_u64(acc.cooc_sum_mut())?;
                self.collective.reduce_sum_u64(acc.cooc_square_sum_mut())?;
                self.collective.reduce_sum_u32(acc.p_tally_mut())?;
            }

            if self.collective.rank() == 0 {
                let total_samples = samples_done * num_ranks;
                if let Some(gt) = external_gt {
                    let ppv =
                        gt.ppv(&acc, self.original_cooc, config, total_samples, &mut central);
                    log::info!("external PPV is {ppv:.4} after {total_samples} samples");
                }
                if let Some(heuristic) = heuristic.as_mut() {
                    if let Some(ppv) = heuristic.evaluate(
                        &acc,
                        self.original_cooc,
                        info,
                        config,
                        total_samples,
                        &mut central,
                    ) {
                        log::info!("internal PPV is {ppv:.4} after {total_samples} samples");
                        if ppv >= config.internal_ppv_threshold {
                            log::info!(
                                "internal PPV reached the threshold ({})",
                                config.internal_ppv_threshold
                            );
                            continue_sampling = false;
                        }
                    }
                }
            } else {
                // This rank's contribution now lives in the root's
                // accumulator.
                acc.clear();
            }
            self.collective.broadcast_bool(&mut continue_sampling)?;
        }
        pl.done();

        self.advance(RunState::Report);
        let num_samples = samples_done * num_ranks;
        let pairs = scored_pairs(&acc, self.original_cooc, config.min_cooc, num_samples);
        self.advance(RunState::Done);

        Ok(RunOutcome {
            pairs,
            accumulator: acc,
            num_samples,
            num_swaps,
        })
    }
}

/// Randomizes every worker graph in parallel: `num_swaps` trades or
/// switches each, drawn from the worker's own stream.
fn run_swap_step(
    graphs: &mut [Graph],
    rngs: &mut [RandomSource],
    info: &GraphInfo,
    config: &Config,
    num_swaps: u64,
) -> Result<()> {
    let algorithm = config.effective_algorithm();
    graphs
        .par_iter_mut()
        .zip(rngs.par_iter_mut())
        .try_for_each(|(g, rng)| -> Result<()> {
            match algorithm {
                SwapAlgorithm::Curveball => {
                    for _ in 0..num_swaps {
                        let (a1, a2) = rng.distinct_pair(info.num_actors);
                        swaps::trade_sorted(g, a1, a2, rng);
                    }
                    g.rebuild_matrix_from_lists(info);
                }
                SwapAlgorithm::SingleSwitch => {
                    for _ in 0..num_swaps {
                        let e1 = rng.uniform_int(info.num_edges) as u32;
                        let e2 = rng.uniform_int(info.num_edges) as u32;
                        match info.kind {
                            GraphKind::Bipartite => {
                                swaps::single_switch_bipartite(g, e1, e2);
                            }
                            GraphKind::General => {
                                swaps::single_switch_general(g, e1, e2);
                            }
                        }
                    }
                }
            }
            #[cfg(debug_assertions)]
            g.check_consistency(info)?;
            Ok(())
        })
}

/// Convenience entry point for a single-process run.
pub fn run_single_process(
    base: &Graph,
    info: &GraphInfo,
    original_cooc: &HalfMatrix<u32>,
    config: &Config,
    external_gt: Option<&ExternalGroundTruth>,
) -> Result<RunOutcome> {
    config.validate()?;
    let collective = crate::collective::SingleProcess;
    Dispatcher::new(info, original_cooc, config, &collective).run(base, external_gt)
}
