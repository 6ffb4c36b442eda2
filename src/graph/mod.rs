/*
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! The dual-view graph representation.
//!
//! A [`Graph`] keeps the same edge set in two forms: a bit-packed adjacency
//! matrix (rows are events, columns are actors) giving O(1) membership
//! tests, and flat per-actor adjacency lists giving O(degree) iteration.
//! Every public operation either preserves the *canonical form* (lists
//! sorted ascending, sub-block indexes current, edge links current, matrix
//! in agreement with the lists) or restores it before returning; the
//! `rebuild_*` methods are the only resync points.
//!
//! The immutable shape of the graph (node counts, degree sequences, labels,
//! co-occurrence total) lives in [`GraphInfo`] and is shared by all
//! worker-local copies.

pub mod binary;
pub mod load;

use rayon::prelude::*;

use crate::config::GraphKind;
use crate::cooc::NUM_SUB_BLOCKS;
use crate::error::{Error, Result};
use crate::utils::BitMatrix;

pub mod prelude {
    pub use super::binary::{read_binary, write_binary};
    pub use super::load::{load, load_binary, load_bipartite, load_general, LoadedGraph};
    pub use super::{Graph, GraphInfo};
}

/// Static information about the input graph; initialized by the loader and
/// immutable for the rest of the run.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphInfo {
    pub kind: GraphKind,
    pub num_events: usize,
    pub num_actors: usize,
    /// Number of stored edges. For general graphs every physical edge is
    /// stored twice, so this is twice the number of input lines.
    pub num_edges: usize,
    /// Number of unordered event pairs.
    pub num_pairs: usize,
    /// Width of the label fields in the binary format: the longest event
    /// label plus one terminator byte.
    pub max_label_len: usize,
    pub event_labels: Vec<String>,
    pub event_degrees: Vec<u32>,
    pub actor_degrees: Vec<u32>,
    /// Total co-occurrence implied by the degree sequence,
    /// `sum_a deg(a)*(deg(a)-1)/2`, plus the direct-edge contribution for
    /// general graphs. Every sample must reproduce this total exactly.
    pub cooc_sum: u64,
    /// Number of pairs whose original co-occurrence reaches the relevance
    /// threshold.
    pub num_relevant_pairs: usize,
    /// Weight a direct edge contributes to the co-occurrence of its
    /// endpoints (general graphs only).
    pub direct_edge_weight: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Graph {
    /// Adjacency matrix; for general graphs the main diagonal is set.
    pub(crate) adj: BitMatrix,
    /// Event ids of all edges, concatenated per actor.
    pub(crate) adj_lists: Vec<u32>,
    /// Prefix sums of the actor degrees; actor `a` owns the slice
    /// `adj_lists[acc_degrees[a]..acc_degrees[a + 1]]`.
    pub(crate) acc_degrees: Vec<u32>,
    /// Owning actor of every edge index.
    pub(crate) edge_actors: Vec<u32>,
    /// For general graphs, the edge index of the redundant twin: if edge
    /// `e` stores `a -> b`, `edge_links[e]` stores `b -> a`. Empty for
    /// bipartite graphs. Invariant: `links[links[e]] == e`.
    pub(crate) edge_links: Vec<u32>,
    /// Per actor, the first edge index of each sub-block of its sorted
    /// adjacency list.
    pub(crate) sub_start: Vec<[u32; NUM_SUB_BLOCKS]>,
    /// Per actor, the past-the-end edge index of each sub-block.
    pub(crate) sub_end: Vec<[u32; NUM_SUB_BLOCKS]>,
}

/// Sub-block boundaries of one sorted adjacency list slice.
///
/// Sub-block `k` covers the event ids in
/// `[k * num_events / S, (k + 1) * num_events / S)`; the returned indexes
/// are global edge indexes, offset by `first_edge`.
pub(crate) fn sub_blocks_of(
    list: &[u32],
    first_edge: u32,
    num_events: usize,
) -> ([u32; NUM_SUB_BLOCKS], [u32; NUM_SUB_BLOCKS]) {
    let mut upper = [0u32; NUM_SUB_BLOCKS];
    for (k, u) in upper.iter_mut().enumerate() {
        *u = ((k + 1) * num_events / NUM_SUB_BLOCKS) as u32;
    }

    let mut start = [0u32; NUM_SUB_BLOCKS];
    let mut end = [0u32; NUM_SUB_BLOCKS];
    let mut sb = 0;
    start[0] = first_edge;
    let mut i = 0;
    while i < list.len() {
        if list[i] >= upper[sb] {
            // End of the current sub-block, start of the next; the current
            // edge is reevaluated against the next limit.
            end[sb] = first_edge + i as u32;
            start[sb + 1] = first_edge + i as u32;
            sb += 1;
            continue;
        }
        i += 1;
    }
    end[sb] = first_edge + list.len() as u32;
    // Trailing sub-blocks this actor has no edges in.
    for k in sb + 1..NUM_SUB_BLOCKS {
        start[k] = first_edge + list.len() as u32;
        end[k] = start[k];
    }
    (start, end)
}

impl Graph {
    /// Creates an empty (all-zero) graph of the given shape.
    pub fn new(info: &GraphInfo) -> Result<Self> {
        Ok(Self {
            adj: BitMatrix::new(info.num_events, info.num_actors)?,
            adj_lists: vec![0; info.num_edges],
            acc_degrees: vec![0; info.num_actors + 1],
            edge_actors: vec![0; info.num_edges],
            edge_links: match info.kind {
                GraphKind::General => vec![0; info.num_edges],
                GraphKind::Bipartite => Vec::new(),
            },
            sub_start: vec![[0; NUM_SUB_BLOCKS]; info.num_actors],
            sub_end: vec![[0; NUM_SUB_BLOCKS]; info.num_actors],
        })
    }

    /// Deep-copies `other` into `self`, reusing the allocations. The result
    /// compares equal to `other`.
    pub fn copy_from(&mut self, other: &Graph) {
        self.adj.clone_from(&other.adj);
        self.adj_lists.clone_from(&other.adj_lists);
        self.acc_degrees.clone_from(&other.acc_degrees);
        self.edge_actors.clone_from(&other.edge_actors);
        self.edge_links.clone_from(&other.edge_links);
        self.sub_start.clone_from(&other.sub_start);
        self.sub_end.clone_from(&other.sub_end);
    }

    pub fn adj(&self) -> &BitMatrix {
        &self.adj
    }

    /// The sorted (in canonical form) adjacency list of one actor.
    pub fn actor_list(&self, actor: usize) -> &[u32] {
        &self.adj_lists[self.acc_degrees[actor] as usize..self.acc_degrees[actor + 1] as usize]
    }

    pub fn event_of_edge(&self, edge: u32) -> u32 {
        self.adj_lists[edge as usize]
    }

    pub fn actor_of_edge(&self, edge: u32) -> u32 {
        self.edge_actors[edge as usize]
    }

    /// Restores canonical form: sorts all adjacency lists, recomputes the
    /// sub-block indexes and, for general graphs, rebuilds the edge links.
    /// Idempotent.
    pub fn canonize(&mut self, info: &GraphInfo) -> Result<()> {
        self.sort_lists_and_index(info);
        if info.kind == GraphKind::General {
            self.rebuild_links(info)?;
        }
        Ok(())
    }

    /// Sorts every actor's list and recomputes its sub-block indexes, in
    /// parallel over actors.
    pub(crate) fn sort_lists_and_index(&mut self, info: &GraphInfo) {
        let acc = &self.acc_degrees;
        let mut slices = Vec::with_capacity(info.num_actors);
        let mut rest: &mut [u32] = &mut self.adj_lists;
        for actor in 0..info.num_actors {
            let len = (acc[actor + 1] - acc[actor]) as usize;
            let (head, tail) = rest.split_at_mut(len);
            slices.push(head);
            rest = tail;
        }

        let num_events = info.num_events;
        self.sub_start
            .par_iter_mut()
            .zip(self.sub_end.par_iter_mut())
            .zip(slices.into_par_iter())
            .enumerate()
            .for_each(|(actor, ((start, end), list))| {
                list.sort_unstable();
                (*start, *end) = sub_blocks_of(list, acc[actor], num_events);
            });
    }

    /// Recomputes `edge_links` by scanning, for every edge `a -> b`, the
    /// adjacency list of `b` for `a`. Fails with
    /// [`Error::BrokenEdgeLink`] if a twin is missing, which means the two
    /// views have diverged.
    pub(crate) fn rebuild_links(&mut self, info: &GraphInfo) -> Result<()> {
        let me = &*self;
        let links = (0..info.num_edges as u32)
            .into_par_iter()
            .map(|edge| me.find_linked_edge(edge))
            .collect::<Result<Vec<_>>>()?;
        self.edge_links = links;
        Ok(())
    }

    /// Locates the redundant twin of `edge` by scanning the adjacency list
    /// of its event endpoint.
    pub fn find_linked_edge(&self, edge: u32) -> Result<u32> {
        let event = self.adj_lists[edge as usize];
        let actor = self.edge_actors[edge as usize];
        let first = self.acc_degrees[event as usize];
        let last = self.acc_degrees[event as usize + 1];
        for twin in first..last {
            if self.adj_lists[twin as usize] == actor {
                return Ok(twin);
            }
        }
        Err(Error::BrokenEdgeLink { edge, actor, event })
    }

    /// Clears and repopulates the adjacency matrix from the lists; for
    /// general graphs the main diagonal is set as well. Used after
    /// list-level swaps.
    pub fn rebuild_matrix_from_lists(&mut self, info: &GraphInfo) {
        self.adj.clear_all();
        for actor in 0..info.num_actors {
            for edge in self.acc_degrees[actor] as usize..self.acc_degrees[actor + 1] as usize {
                self.adj.set(self.adj_lists[edge] as usize, actor);
            }
            if info.kind == GraphKind::General {
                // Self-loops on the diagonal simplify the swap checks.
                self.adj.set(actor, actor);
            }
        }
    }

    /// Repopulates the adjacency lists, prefix sums and edge map from the
    /// matrix. Used after binary input.
    pub fn rebuild_lists_from_matrix(&mut self, info: &GraphInfo) -> Result<()> {
        let mut edge = 0;
        self.acc_degrees[0] = 0;
        for actor in 0..info.num_actors {
            for event in 0..info.num_events {
                if info.kind == GraphKind::General && actor == event {
                    continue;
                }
                if self.adj.test(event, actor) {
                    self.adj_lists[edge] = event as u32;
                    self.edge_actors[edge] = actor as u32;
                    edge += 1;
                }
            }
            self.acc_degrees[actor + 1] = edge as u32;
        }
        if edge != info.num_edges {
            return Err(Error::InvariantViolation(format!(
                "rebuilding adjacency lists from the matrix produced {edge} edges, expected {}",
                info.num_edges
            )));
        }
        Ok(())
    }

    pub fn event_degree_via_matrix(&self, info: &GraphInfo, event: usize) -> u32 {
        let degree = self.adj.row_popcount(event);
        match info.kind {
            GraphKind::Bipartite => degree,
            // Discount the self-edge on the diagonal.
            GraphKind::General => degree - 1,
        }
    }

    pub fn actor_degree_via_matrix(&self, info: &GraphInfo, actor: usize) -> u32 {
        let mut degree = 0;
        for event in 0..info.num_events {
            if self.adj.test(event, actor) {
                degree += 1;
            }
        }
        match info.kind {
            GraphKind::Bipartite => degree,
            GraphKind::General => degree - 1,
        }
    }

    pub fn event_degree_via_lists(&self, event: usize) -> u32 {
        self.adj_lists
            .iter()
            .filter(|&&e| e == event as u32)
            .count() as u32
    }

    pub fn actor_degree_via_lists(&self, actor: usize) -> u32 {
        self.acc_degrees[actor + 1] - self.acc_degrees[actor]
    }

    /// Consistency of the two views with each other and with the original
    /// degree sequence: per-node degrees agree, no duplicate event within
    /// an actor list, every list entry has its matrix bit set, and for
    /// general graphs the edge links form an involution over redundant
    /// twins. Does not require the lists to be sorted.
    pub fn check_consistency(&self, info: &GraphInfo) -> Result<()> {
        for actor in 0..info.num_actors {
            let via_matrix = self.actor_degree_via_matrix(info, actor);
            let via_lists = self.actor_degree_via_lists(actor);
            if via_matrix != via_lists || via_matrix != info.actor_degrees[actor] {
                return Err(Error::InvariantViolation(format!(
                    "actor {actor}: degree {via_matrix} via the matrix, {via_lists} via the \
                     lists, originally {}",
                    info.actor_degrees[actor]
                )));
            }
        }
        for event in 0..info.num_events {
            let via_matrix = self.event_degree_via_matrix(info, event);
            let via_lists = self.event_degree_via_lists(event);
            if via_matrix != via_lists || via_matrix != info.event_degrees[event] {
                return Err(Error::InvariantViolation(format!(
                    "event {event}: degree {via_matrix} via the matrix, {via_lists} via the \
                     lists, originally {}",
                    info.event_degrees[event]
                )));
            }
        }

        for actor in 0..info.num_actors {
            let list = self.actor_list(actor);
            for (i, &event) in list.iter().enumerate() {
                if list[i + 1..].contains(&event) {
                    return Err(Error::InvariantViolation(format!(
                        "actor {actor}: event {event} appears twice in the adjacency list"
                    )));
                }
                if !self.adj.test(event as usize, actor) {
                    return Err(Error::InvariantViolation(format!(
                        "actor {actor}: edge to event {event} is in the lists but not in the \
                         matrix"
                    )));
                }
            }
        }

        if info.kind == GraphKind::General {
            self.check_edge_links(info)?;
        }
        Ok(())
    }

    /// Checks that every adjacency list is strictly increasing. Only
    /// meaningful in canonical form.
    pub fn check_sorted(&self, info: &GraphInfo) -> Result<()> {
        for actor in 0..info.num_actors {
            let list = self.actor_list(actor);
            for pair in list.windows(2) {
                if pair[0] >= pair[1] {
                    return Err(Error::InvariantViolation(format!(
                        "actor {actor}: adjacency list is not strictly increasing ({} before {})",
                        pair[0], pair[1]
                    )));
                }
            }
        }
        Ok(())
    }

    /// Checks that the edge links pair every edge `a -> b` with an edge
    /// `b -> a`, and that the pairing is an involution.
    pub fn check_edge_links(&self, info: &GraphInfo) -> Result<()> {
        for edge in 0..info.num_edges as u32 {
            let twin = self.edge_links[edge as usize];
            let actor1 = self.edge_actors[edge as usize];
            let event1 = self.adj_lists[edge as usize];
            let actor2 = self.edge_actors[twin as usize];
            let event2 = self.adj_lists[twin as usize];
            if actor1 != event2 || actor2 != event1 || self.edge_links[twin as usize] != edge {
                return Err(Error::InvariantViolation(format!(
                    "edges {edge} = ({actor1}, {event1}) and {twin} = ({actor2}, {event2}) are \
                     linked but not redundant twins"
                )));
            }
        }
        Ok(())
    }
}
