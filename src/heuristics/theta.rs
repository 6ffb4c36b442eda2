/*
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Theta validation of the swap calibration.
//!
//! A handful of events is selected across the degree spectrum: a few
//! distinct degrees, each represented by several events, spread as evenly
//! as the spectrum allows. Over a batch of decorrelated samples, the mean
//! co-occurrence of every selected cross-degree pair is collected; within a
//! group of pairs with the same degree combination those means should
//! agree, so theta, the dispersion (standard deviation over mean) averaged
//! across groups, measures how well the calibrated swap count mixes the
//! chain.

use itertools::Itertools;

use crate::config::Config;
use crate::cooc;
use crate::error::{Error, Result};
use crate::graph::{Graph, GraphInfo};
use crate::random::RandomSource;

/// Draws one decorrelated sample per worker slot from `g` and warns if
/// theta stays above `threshold`.
pub(crate) fn check(
    g: &mut Graph,
    info: &GraphInfo,
    config: &Config,
    num_swaps: u64,
    threshold: f64,
    rng: &mut RandomSource,
) -> Result<()> {
    let selected = select_events(g, info, config)?;
    let num_degrees = config.degrees_swap_heuristic;
    let events_per_degree = config.events_per_degree_swap_heuristic;
    let group_len = events_per_degree * events_per_degree;
    let num_groups = num_degrees * (num_degrees - 1) / 2;

    let mut cooc_sums = vec![0u64; num_groups * group_len];
    let num_samples = config.workers as u32;
    let algorithm = config.effective_algorithm();
    for _ in 0..num_samples {
        super::swap::run_swaps(g, info, algorithm, num_swaps, rng);
        g.rebuild_matrix_from_lists(info);

        let mut slot = 0;
        for (d1, d2) in (0..num_degrees).tuple_combinations::<(_, _)>() {
            for &e1 in &selected[d1] {
                for &e2 in &selected[d2] {
                    cooc_sums[slot] += cooc::pair_cooc(g, e1 as usize, e2 as usize) as u64;
                    slot += 1;
                }
            }
        }
    }

    let theta = theta_statistic(&cooc_sums, group_len, num_samples, threshold);
    if theta > threshold {
        log::warn!(
            "theta is {theta:.2e}, above the threshold {threshold:.2e}: {num_swaps} swaps per \
             sample may not decorrelate this graph"
        );
    } else {
        log::info!("theta is {theta:.2e} (threshold {threshold:.2e})");
    }
    Ok(())
}

/// Normalized dispersion of the per-pair mean co-occurrences, averaged
/// over the degree-combination groups. A NaN (null deviation from too few
/// swaps or samples) maps to twice the threshold, so the caller always
/// warns.
fn theta_statistic(cooc_sums: &[u64], group_len: usize, num_samples: u32, threshold: f64) -> f64 {
    let num_groups = cooc_sums.len() / group_len;
    let mut theta = 0.0;
    for group in cooc_sums.chunks_exact(group_len) {
        let mut sum = 0.0;
        let mut square_sum = 0.0;
        for &pair_sum in group {
            let mean = pair_sum as f64 / num_samples as f64;
            sum += mean;
            square_sum += mean * mean;
        }
        let group_mean = sum / group_len as f64;
        let group_stddev =
            ((square_sum - sum * sum / group_len as f64) / (group_len as f64 - 1.0)).sqrt();
        theta += group_stddev / group_mean;
    }
    theta /= num_groups as f64;

    if theta.is_nan() {
        2.0 * threshold
    } else {
        theta
    }
}

/// Selects `degrees_swap_heuristic` distinct degrees, each with at least
/// `events_per_degree_swap_heuristic` events, spread over the upper part
/// of the degree spectrum, and returns that many events per degree.
///
/// Fails with [`Error::ConfigConflict`] when the spectrum cannot satisfy
/// the request.
pub fn select_events(g: &Graph, info: &GraphInfo, config: &Config) -> Result<Vec<Vec<u32>>> {
    let num_degrees = config.degrees_swap_heuristic;
    let events_per_degree = config.events_per_degree_swap_heuristic;

    let degrees: Vec<u32> = (0..info.num_events)
        .map(|event| g.event_degree_via_matrix(info, event))
        .collect();
    let max_degree = *degrees.iter().max().unwrap() as usize;

    let mut frequencies = vec![0u32; max_degree + 1];
    for &degree in &degrees {
        frequencies[degree as usize] += 1;
    }

    // Degrees represented by enough events, ascending.
    let eligible: Vec<u32> = (0..=max_degree as u32)
        .filter(|&d| frequencies[d as usize] >= events_per_degree as u32)
        .collect();
    if eligible.len() < num_degrees {
        return Err(Error::ConfigConflict(format!(
            "only {} degrees have at least {events_per_degree} events each, but \
             {num_degrees} degrees were requested; use a larger data set, fewer events per \
             degree, fewer degrees, or a fixed number of swaps",
            eligible.len()
        )));
    }

    // Aim at the top of the spectrum, lowering the smallest admissible
    // degree until enough eligible degrees qualify.
    let max_eligible = *eligible.last().unwrap();
    let mut min_selected = max_eligible / num_degrees as u32 + 1;
    let mut first_idx = 0;
    loop {
        min_selected = min_selected.saturating_sub(1);
        first_idx = eligible
            .iter()
            .position(|&d| d >= min_selected)
            .unwrap_or(eligible.len());
        if eligible.len() - first_idx >= num_degrees {
            break;
        }
    }

    let chosen = most_sparse_subset(&eligible, num_degrees, first_idx);

    let mut selected = vec![Vec::with_capacity(events_per_degree); num_degrees];
    for (event, &degree) in degrees.iter().enumerate() {
        if let Some(bucket) = chosen.iter().position(|&d| d == degree) {
            if selected[bucket].len() < events_per_degree {
                selected[bucket].push(event as u32);
            }
        }
    }
    Ok(selected)
}

/// Inverse of the variance of the differences between consecutive
/// elements; large when the subset is evenly spread. Nothing to do with
/// the number of zero elements.
fn sparsity(values: &[u32]) -> f64 {
    let n = values.len();
    let mut mean = 0.0;
    for pair in values.windows(2) {
        mean += pair[1] as f64 - pair[0] as f64;
    }
    mean /= (n - 1) as f64;

    let mut variance = 0.0;
    for pair in values.windows(2) {
        let diff = pair[1] as f64 - pair[0] as f64;
        variance += (diff - mean) * (diff - mean);
    }
    variance /= n as f64 - 2.0;

    1.0 / variance
}

/// Hill-climbs the inner elements of the subset towards the most sparse
/// selection, with the first element pinned to `set[first_idx]` and the
/// last to the end of the set.
fn most_sparse_subset(set: &[u32], subset_len: usize, first_idx: usize) -> Vec<u32> {
    let mut idxs = vec![first_idx; subset_len];
    idxs[subset_len - 1] = set.len() - 1;
    let values = |idxs: &[usize]| idxs.iter().map(|&i| set[i]).collect::<Vec<u32>>();

    let mut best = sparsity(&values(&idxs));
    let mut improved = true;
    while improved {
        improved = false;
        for j in (1..subset_len.saturating_sub(1)).rev() {
            while idxs[j] + 1 < set.len() {
                idxs[j] += 1;
                let s = sparsity(&values(&idxs));
                if s > best {
                    best = s;
                    improved = true;
                } else {
                    idxs[j] -= 1;
                    break;
                }
            }
        }
    }
    values(&idxs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sparsity_prefers_even_spread() {
        assert!(sparsity(&[0, 5, 10, 15]) > sparsity(&[0, 1, 2, 15]));
    }

    #[test]
    fn test_most_sparse_subset_endpoints_pinned() {
        let set: Vec<u32> = (0..20).collect();
        let subset = most_sparse_subset(&set, 4, 2);
        assert_eq!(subset[0], 2);
        assert_eq!(subset[3], 19);
        assert!(subset.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_theta_nan_maps_to_double_threshold() {
        // A single sample gives zero variance within each group only if all
        // means are equal; identical sums produce stddev 0, mean > 0, so
        // theta is 0, not NaN. NaN needs a zero group mean.
        let sums = vec![0u64; 4];
        assert_eq!(theta_statistic(&sums, 4, 1, 5e-3), 1e-2);
    }
}
