/*
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Per-sample co-occurrence computation.
//!
//! Event ids are partitioned into [`NUM_SUB_BLOCKS`] equal-width
//! sub-blocks. A sorted adjacency list slices cleanly into one contiguous
//! range per sub-block, so the edge pairs of an actor split by unordered
//! *sub-block pair kind*; each of the [`NUM_BLOCK_PAIRS`] kinds touches a
//! disjoint set of half-matrix cells (the row lies in one sub-block, the
//! derived second event in the other), which lets one worker per kind
//! accumulate without locks.

use rayon::prelude::*;
use sync_cell_slice::{SyncCell, SyncSlice};

use crate::config::GraphKind;
use crate::error::Result;
use crate::graph::{Graph, GraphInfo};
use crate::utils::HalfMatrix;

/// Number of equal-width event-id sub-blocks.
pub const NUM_SUB_BLOCKS: usize = 5;

/// Number of unordered sub-block pair kinds, and so of co-occurrence
/// workers.
pub const NUM_BLOCK_PAIRS: usize = NUM_SUB_BLOCKS * (NUM_SUB_BLOCKS + 1) / 2;

/// The table of unordered sub-block pair kinds `(i, j)` with `i <= j`:
/// the diagonal kinds first, then the cross kinds.
pub fn block_pairs() -> [(usize, usize); NUM_BLOCK_PAIRS] {
    let mut pairs = [(0, 0); NUM_BLOCK_PAIRS];
    let mut next = 0;
    for i in 0..NUM_SUB_BLOCKS {
        pairs[next] = (i, i);
        next += 1;
    }
    for i in 0..NUM_SUB_BLOCKS {
        for j in i + 1..NUM_SUB_BLOCKS {
            pairs[next] = (i, j);
            next += 1;
        }
    }
    pairs
}

/// Accumulates into `cooc[(e1, e2 - e1 - 1)]`, for every event pair
/// `(e1, e2)`, the number of actors adjacent to both, plus the direct-edge
/// contribution for general graphs. `cooc` must come in zeroed.
///
/// The graph's lists are re-sorted and its sub-block indexes refreshed
/// first (swaps defer canonicalization to this point), and for general
/// graphs the edge links are rebuilt afterwards.
pub fn compute(g: &mut Graph, info: &GraphInfo, cooc: &mut HalfMatrix<u32>) -> Result<()> {
    g.sort_lists_and_index(info);

    if info.kind == GraphKind::General {
        for actor in 0..info.num_actors {
            direct_edge_cooc(g, info, actor, cooc);
        }
    }

    {
        let cells = cooc.as_mut_slice().as_sync_slice();
        let gr: &Graph = g;
        block_pairs()
            .par_iter()
            .for_each(|&(i, j)| compute_kind(gr, info, i, j, cells));
    }

    if info.kind == GraphKind::General {
        g.rebuild_links(info)?;
    }
    Ok(())
}

/// The kernel of one sub-block pair kind. Writes of different kinds never
/// collide, which is what makes the unsynchronized cells sound.
fn compute_kind(g: &Graph, info: &GraphInfo, i: usize, j: usize, cells: &[SyncCell<u32>]) {
    let num_events = info.num_events;
    let bump = |e1: u32, e2: u32| {
        let idx = crate::utils::flat_index(num_events, e1 as usize, (e2 - e1 - 1) as usize);
        unsafe { cells[idx].set(cells[idx].get() + 1) };
    };

    for actor in 0..info.num_actors {
        if i == j {
            let (start, end) = (g.sub_start[actor][i], g.sub_end[actor][i]);
            for x in start..end.saturating_sub(1) {
                for y in x + 1..end {
                    bump(g.adj_lists[x as usize], g.adj_lists[y as usize]);
                }
            }
        } else {
            let (s1, e1) = (g.sub_start[actor][i], g.sub_end[actor][i]);
            let (s2, e2) = (g.sub_start[actor][j], g.sub_end[actor][j]);
            for x in s1..e1 {
                for y in s2..e2 {
                    bump(g.adj_lists[x as usize], g.adj_lists[y as usize]);
                }
            }
        }
    }
}

/// The direct edge `a - b` of a general graph contributes
/// `direct_edge_weight` to `cooc(a, b)`. Counted once per physical edge by
/// only looking at the lower endpoint's entries.
fn direct_edge_cooc(g: &Graph, info: &GraphInfo, actor: usize, cooc: &mut HalfMatrix<u32>) {
    let first = g.acc_degrees[actor] as usize;
    let last = g.acc_degrees[actor + 1] as usize;
    for edge in first..last {
        let event = g.adj_lists[edge] as usize;
        if actor > event {
            cooc[(event, actor - event - 1)] += info.direct_edge_weight;
        }
    }
}

/// Co-occurrence of a single event pair, by AND-ing the two matrix rows
/// and counting bits. For general graphs the direct edge between the two
/// nodes shows up through the diagonal bits and counts double, matching
/// the matrix construction.
pub fn pair_cooc(g: &Graph, event1: usize, event2: usize) -> u32 {
    g.adj().and_popcount(event1, event2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_pairs_cover_all_kinds() {
        let pairs = block_pairs();
        assert_eq!(pairs.len(), NUM_BLOCK_PAIRS);
        for (i, j) in pairs {
            assert!(i <= j && j < NUM_SUB_BLOCKS);
        }
        let mut seen: Vec<_> = pairs.to_vec();
        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen.len(), NUM_BLOCK_PAIRS);
    }
}
