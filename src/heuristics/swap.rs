/*
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Swap-count calibration.
//!
//! Starting from the original graph, fixed-size steps of swaps are applied
//! to a scratch copy and the perturbation against the original is measured
//! after each step. The measure saturates near the mixing plateau of the
//! chain; tracking the last step with relevant growth and stopping once the
//! most recent half of the walk shows none approximates the decorrelation
//! time without estimating autocorrelations explicitly.

use crate::config::{Config, GraphKind, SwapAlgorithm};
use crate::error::Result;
use crate::graph::{Graph, GraphInfo};
use crate::random::RandomSource;
use crate::swaps;

/// Growth below this factor over the best perturbation seen so far is not
/// considered relevant.
const RELEVANT_INCREASE: f64 = 1.01;

/// Below this edge count the walk is skipped and a generous fixed swap
/// count is returned instead.
const SMALL_GRAPH_EDGES: usize = 100;

/// Calibrates the number of swaps per sample.
///
/// The stream used here is worker 0's, which the sampling loop keeps
/// using afterwards.
pub fn calibrate(
    base: &Graph,
    info: &GraphInfo,
    config: &Config,
    rng: &mut RandomSource,
) -> Result<u64> {
    let algorithm = config.effective_algorithm();

    if info.num_edges < SMALL_GRAPH_EDGES {
        // Very small graphs can afford a safe amount of swaps.
        return Ok(match algorithm {
            SwapAlgorithm::Curveball => 100 * info.num_actors as u64,
            SwapAlgorithm::SingleSwitch => {
                (info.num_edges as f64 * (info.num_edges as f64).ln()).ceil() as u64
            }
        });
    }

    let step_size = match algorithm {
        SwapAlgorithm::Curveball => info.num_actors as u64,
        SwapAlgorithm::SingleSwitch => info.num_edges as u64 / 5,
    };

    let mut test = base.clone();
    let mut best = 0u64;
    let mut steps_to_best = 0u64;
    let mut steps = 0u64;

    // Until the most recent half of the walk shows no relevant growth.
    while steps <= 2 * steps_to_best {
        run_swaps(&mut test, info, algorithm, step_size, rng);
        steps += 1;

        let perturbation = match algorithm {
            SwapAlgorithm::Curveball => perturbation_lists(&mut test, base, info),
            SwapAlgorithm::SingleSwitch => test.adj().xor_popcount(base.adj()),
        };
        if perturbation as f64 > RELEVANT_INCREASE * best as f64 {
            best = perturbation;
            steps_to_best = steps;
        }
        log::debug!(
            "swap heuristic: {} swaps, perturbation {perturbation}, best {best} at {} swaps",
            steps * step_size,
            steps_to_best * step_size
        );
    }

    let num_swaps = steps_to_best * step_size;
    log::info!("swap heuristic settled on {num_swaps} swaps per sample");

    if let Some(threshold) = config.theta {
        if algorithm == SwapAlgorithm::Curveball {
            test.rebuild_matrix_from_lists(info);
        }
        crate::heuristics::theta::check(&mut test, info, config, num_swaps, threshold, rng)?;
    }

    Ok(num_swaps)
}

/// One batch of swaps, used both by the calibration walk and by the theta
/// validation. The heuristic trades with deferred sorting; the
/// perturbation measure sorts on demand.
pub(crate) fn run_swaps(
    g: &mut Graph,
    info: &GraphInfo,
    algorithm: SwapAlgorithm,
    count: u64,
    rng: &mut RandomSource,
) {
    match algorithm {
        SwapAlgorithm::Curveball => {
            for _ in 0..count {
                let (a1, a2) = rng.distinct_pair(info.num_actors);
                swaps::trade_hashed(g, a1, a2, rng);
            }
        }
        SwapAlgorithm::SingleSwitch => {
            for _ in 0..count {
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
}

/// Perturbation as the symmetric difference of per-actor adjacency lists,
/// summed over actors. Sorts the test graph's lists in place; `base` must
/// be canonical. A graph has distance zero from itself.
pub fn perturbation_lists(test: &mut Graph, base: &Graph, info: &GraphInfo) -> u64 {
    let mut diff = 0;
    for actor in 0..info.num_actors {
        let range = test.acc_degrees[actor] as usize..test.acc_degrees[actor + 1] as usize;
        test.adj_lists[range].sort_unstable();

        let test_list = test.actor_list(actor);
        let base_list = base.actor_list(actor);
        let (mut i, mut j) = (0, 0);
        while i < test_list.len() && j < base_list.len() {
            if test_list[i] == base_list[j] {
                i += 1;
                j += 1;
            } else {
                diff += 1;
                if test_list[i] < base_list[j] {
                    i += 1;
                } else {
                    j += 1;
                }
            }
        }
        diff += (test_list.len() - i) as u64;
        diff += (base_list.len() - j) as u64;
    }
    diff
}
