/*
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use crate::graph::Graph;

/// Attempts to swap the event endpoints of two edges of a bipartite graph.
///
/// With `e1 = (a1, v1)` and `e2 = (a2, v2)`, the move replaces them by
/// `(a1, v2)` and `(a2, v1)`. If either destination edge already exists the
/// move is rejected and the graph is unchanged; the sample advances anyway.
/// The adjacency matrix is updated in place; the lists are left unsorted
/// and canonicalization is deferred to the co-occurrence pass.
///
/// Returns whether the move was applied.
pub fn single_switch_bipartite(g: &mut Graph, e1: u32, e2: u32) -> bool {
    let v1 = g.event_of_edge(e1) as usize;
    let v2 = g.event_of_edge(e2) as usize;
    let a1 = g.actor_of_edge(e1) as usize;
    let a2 = g.actor_of_edge(e2) as usize;

    if g.adj.test(v1, a2) || g.adj.test(v2, a1) {
        return false;
    }

    g.adj.set(v1, a2);
    g.adj.set(v2, a1);
    g.adj.clear(v1, a1);
    g.adj.clear(v2, a2);

    g.adj_lists.swap(e1 as usize, e2 as usize);
    true
}

/// The single switch on a general graph.
///
/// Every undirected edge is stored twice, so a logical swap touches two
/// redundant edges per side: four matrix bits are flipped on each side, and
/// the list entries and links of both twins are rewritten so that the links
/// remain an involution. Rejection works as in the bipartite case.
pub fn single_switch_general(g: &mut Graph, e1: u32, e2: u32) -> bool {
    let v1 = g.event_of_edge(e1) as usize;
    let v2 = g.event_of_edge(e2) as usize;
    let a1 = g.actor_of_edge(e1) as usize;
    let a2 = g.actor_of_edge(e2) as usize;
    let t1 = g.edge_links[e1 as usize] as usize;
    let t2 = g.edge_links[e2 as usize] as usize;

    if g.adj.test(v1, a2) || g.adj.test(v2, a1) {
        return false;
    }

    g.adj.set(v1, a2);
    g.adj.set(v2, a1);
    g.adj.set(a1, v2);
    g.adj.set(a2, v1);

    g.adj.clear(v1, a1);
    g.adj.clear(v2, a2);
    g.adj.clear(a1, v1);
    g.adj.clear(a2, v2);

    // The randomly drawn pair and their redundant twins.
    g.adj_lists.swap(e1 as usize, e2 as usize);
    g.adj_lists.swap(t1, t2);

    g.edge_links.swap(e1 as usize, e2 as usize);
    g.edge_links.swap(t1, t2);
    true
}
