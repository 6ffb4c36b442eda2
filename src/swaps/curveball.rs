/*
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use std::collections::HashMap;

use crate::graph::Graph;
use crate::random::RandomSource;

/// Curveball trade between two distinct actors of a bipartite graph, for
/// lists in canonical (sorted) form.
///
/// The *pool* is the symmetric difference of the two adjacency lists,
/// built by a linear merge; shared events never move. The pool is
/// partially shuffled (Fisher-Yates over the first `min(k, |P| - k)`
/// positions, where `k` is the number of pool events contributed by the
/// first actor, is enough for a uniform redistribution) and handed back
/// into the positions each list contributed, after which both lists are
/// re-sorted. Row and column sums are both preserved.
///
/// The adjacency matrix is not touched; callers rebuild it from the lists
/// after a batch of trades.
pub fn trade_sorted(g: &mut Graph, a1: usize, a2: usize, rng: &mut RandomSource) {
    debug_assert_ne!(a1, a2);
    let r1 = g.acc_degrees[a1] as usize..g.acc_degrees[a1 + 1] as usize;
    let r2 = g.acc_degrees[a2] as usize..g.acc_degrees[a2 + 1] as usize;
    let (len1, len2) = (r1.len(), r2.len());

    let mut pool = Vec::with_capacity(len1 + len2);
    // Offsets within each list of the entries that went into the pool.
    let mut from1 = Vec::with_capacity(len1);
    let mut from2 = Vec::with_capacity(len2);

    let (mut i, mut j) = (0, 0);
    while i < len1 && j < len2 {
        let x = g.adj_lists[r1.start + i];
        let y = g.adj_lists[r2.start + j];
        if x < y {
            pool.push(x);
            from1.push(i);
            i += 1;
        } else if y < x {
            pool.push(y);
            from2.push(j);
            j += 1;
        } else {
            // Shared by both actors: not tradeable.
            i += 1;
            j += 1;
        }
    }
    while i < len1 {
        pool.push(g.adj_lists[r1.start + i]);
        from1.push(i);
        i += 1;
    }
    while j < len2 {
        pool.push(g.adj_lists[r2.start + j]);
        from2.push(j);
        j += 1;
    }

    let k1 = from1.len();
    rng.partial_shuffle(&mut pool, k1.min(from2.len()));

    for (idx, &off) in from1.iter().enumerate() {
        g.adj_lists[r1.start + off] = pool[idx];
    }
    for (idx, &off) in from2.iter().enumerate() {
        g.adj_lists[r2.start + off] = pool[k1 + idx];
    }

    g.adj_lists[r1].sort_unstable();
    g.adj_lists[r2].sort_unstable();
}

/// Curveball trade that does not assume sorted lists, used while
/// canonicalization is deferred (the swap heuristic).
///
/// Pool membership is tracked through a hash map keyed by event id,
/// rebuilt per trade; the pool keeps the first list's survivors in list
/// order followed by the second list's own events in list order, so runs
/// are deterministic under a fixed seed. The whole pool is shuffled and
/// the lists are refilled but left unsorted.
pub fn trade_hashed(g: &mut Graph, a1: usize, a2: usize, rng: &mut RandomSource) {
    debug_assert_ne!(a1, a2);
    let r1 = g.acc_degrees[a1] as usize..g.acc_degrees[a1 + 1] as usize;
    let r2 = g.acc_degrees[a2] as usize..g.acc_degrees[a2 + 1] as usize;

    let mut candidates: HashMap<u32, usize> = g.adj_lists[r1.clone()]
        .iter()
        .enumerate()
        .map(|(off, &event)| (event, off))
        .collect();
    let mut from2 = Vec::with_capacity(r2.len());
    for off in 0..r2.len() {
        let event = g.adj_lists[r2.start + off];
        if candidates.remove(&event).is_none() {
            // Only in the second list.
            from2.push(off);
        }
    }

    let mut pool = Vec::with_capacity(candidates.len() + from2.len());
    let mut from1 = Vec::with_capacity(candidates.len());
    for off in 0..r1.len() {
        let event = g.adj_lists[r1.start + off];
        if candidates.contains_key(&event) {
            pool.push(event);
            from1.push(off);
        }
    }
    let k1 = from1.len();
    for &off in &from2 {
        pool.push(g.adj_lists[r2.start + off]);
    }

    rng.shuffle(&mut pool);

    for (idx, &off) in from1.iter().enumerate() {
        g.adj_lists[r1.start + off] = pool[idx];
    }
    for (idx, &off) in from2.iter().enumerate() {
        g.adj_lists[r2.start + off] = pool[k1 + idx];
    }
}
