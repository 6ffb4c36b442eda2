/*
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Text-format loading.
//!
//! The input is one edge per line, two whitespace-separated node names.
//! Names are mapped to dense ids in order of first appearance, so a given
//! input always produces the same ids. Repeated edges (for general graphs,
//! in either orientation, which also rejects self-loops) are an error.

use std::collections::HashMap;
use std::io::BufRead;
use std::path::Path;

use crate::config::{Config, GraphKind, Side};
use crate::cooc;
use crate::error::{Error, Result};
use crate::graph::{Graph, GraphInfo};
use crate::utils::HalfMatrix;

/// The product of loading: the canonical graph, its immutable shape, and
/// the original co-occurrence half-matrix.
#[derive(Debug, Clone)]
pub struct LoadedGraph {
    pub info: GraphInfo,
    pub graph: Graph,
    pub original_cooc: HalfMatrix<u32>,
}

/// Loads a graph in the format selected by the configuration.
pub fn load<R: BufRead>(input: R, config: &Config) -> Result<LoadedGraph> {
    match config.kind {
        GraphKind::Bipartite => load_bipartite(input, config),
        GraphKind::General => load_general(input, config),
    }
}

/// Reads a binary graph file and finishes it into a [`LoadedGraph`].
pub fn load_binary(path: &Path, config: &Config) -> Result<LoadedGraph> {
    let (info, graph) = super::binary::read_binary(path, config)?;
    finish(info, graph, config)
}

fn split_edge_line(line: &str, number: usize) -> Result<(&str, &str)> {
    let line = line.trim_end();
    match line.split_once(' ') {
        Some((left, right)) if !left.is_empty() && !right.is_empty() => Ok((left, right)),
        _ => Err(Error::InvalidInput(format!(
            "line {number} is not two space-separated node names: {line:?}"
        ))),
    }
}

fn intern(ids: &mut HashMap<String, u32>, labels: &mut Vec<String>, name: &str) -> u32 {
    match ids.get(name) {
        Some(&id) => id,
        None => {
            let id = labels.len() as u32;
            ids.insert(name.to_owned(), id);
            labels.push(name.to_owned());
            id
        }
    }
}

/// Loads a bipartite graph. The side of interest (events) is chosen by the
/// configuration; the other side holds the actors.
pub fn load_bipartite<R: BufRead>(input: R, config: &Config) -> Result<LoadedGraph> {
    let mut actor_ids = HashMap::new();
    let mut actor_labels = Vec::new();
    let mut event_ids = HashMap::new();
    let mut event_labels = Vec::new();
    let mut seen = HashMap::new();
    let mut edges = Vec::new();

    for (i, line) in input.lines().enumerate() {
        let number = i + 1;
        let line = line?;
        let (left, right) = split_edge_line(&line, number)?;
        let (event_name, actor_name) = match config.side_of_interest {
            Side::Left => (left, right),
            Side::Right => (right, left),
        };
        let event = intern(&mut event_ids, &mut event_labels, event_name);
        let actor = intern(&mut actor_ids, &mut actor_labels, actor_name);
        if let Some(first_line) = seen.insert((actor, event), number) {
            return Err(Error::DuplicateEdge {
                left: left.to_owned(),
                right: right.to_owned(),
                first_line,
                line: number,
            });
        }
        edges.push((actor, event));
    }

    let info = build_info(
        GraphKind::Bipartite,
        event_labels,
        actor_labels.len(),
        &edges,
        config,
    )?;
    let graph = build_graph(&info, &edges)?;
    finish(info, graph, config)
}

/// Loads a general undirected graph. Every physical edge is stored twice,
/// once per orientation, which lets the bipartite co-occurrence kernel run
/// unchanged.
pub fn load_general<R: BufRead>(input: R, config: &Config) -> Result<LoadedGraph> {
    let mut node_ids = HashMap::new();
    let mut node_labels = Vec::new();
    let mut seen = HashMap::new();
    let mut edges = Vec::new();

    for (i, line) in input.lines().enumerate() {
        let number = i + 1;
        let line = line?;
        let (left, right) = split_edge_line(&line, number)?;
        let a = intern(&mut node_ids, &mut node_labels, left);
        let b = intern(&mut node_ids, &mut node_labels, right);
        // Registering both orientations also rejects self-loops.
        for (x, y) in [(a, b), (b, a)] {
            if let Some(first_line) = seen.insert((x, y), number) {
                return Err(Error::DuplicateEdge {
                    left: left.to_owned(),
                    right: right.to_owned(),
                    first_line,
                    line: number,
                });
            }
            edges.push((x, y));
        }
    }

    let num_nodes = node_labels.len();
    let info = build_info(GraphKind::General, node_labels, num_nodes, &edges, config)?;
    let graph = build_graph(&info, &edges)?;
    finish(info, graph, config)
}

/// Assembles the [`GraphInfo`] from the interned edge list; degrees are
/// filled in by [`build_graph`].
fn build_info(
    kind: GraphKind,
    event_labels: Vec<String>,
    num_actors: usize,
    edges: &[(u32, u32)],
    config: &Config,
) -> Result<GraphInfo> {
    if edges.is_empty() {
        return Err(Error::InvalidInput("the input graph has no edges".into()));
    }
    let num_events = event_labels.len();
    let max_label_len = event_labels.iter().map(|l| l.len()).max().unwrap_or(0) + 1;
    Ok(GraphInfo {
        kind,
        num_events,
        num_actors,
        num_edges: edges.len(),
        num_pairs: num_events * (num_events - 1) / 2,
        max_label_len,
        event_labels,
        event_degrees: vec![0; num_events],
        actor_degrees: vec![0; num_actors],
        cooc_sum: 0,
        num_relevant_pairs: 0,
        direct_edge_weight: config.direct_edge_weight,
    })
}

fn build_graph(info: &GraphInfo, edges: &[(u32, u32)]) -> Result<Graph> {
    let mut graph = Graph::new(info)?;

    let mut degrees = vec![0u32; info.num_actors];
    for &(actor, _) in edges {
        degrees[actor as usize] += 1;
    }
    graph.acc_degrees[0] = 0;
    for actor in 0..info.num_actors {
        graph.acc_degrees[actor + 1] = graph.acc_degrees[actor] + degrees[actor];
    }

    let mut next = graph.acc_degrees.clone();
    for &(actor, event) in edges {
        let slot = next[actor as usize] as usize;
        graph.adj_lists[slot] = event;
        graph.edge_actors[slot] = actor;
        next[actor as usize] += 1;
    }

    graph.rebuild_matrix_from_lists(info);
    Ok(graph)
}

/// Canonizes the graph, computes the original co-occurrence and verifies it
/// against the degree-sequence total, and counts the relevant pairs.
pub(crate) fn finish(
    mut info: GraphInfo,
    mut graph: Graph,
    config: &Config,
) -> Result<LoadedGraph> {
    graph.canonize(&info)?;

    // Original degree sequences, the reference for all later checks.
    for actor in 0..info.num_actors {
        info.actor_degrees[actor] = graph.actor_degree_via_lists(actor);
        if info.actor_degrees[actor] == 0 {
            return Err(Error::InvalidInput(format!(
                "actor {actor} has degree zero"
            )));
        }
    }
    for event in 0..info.num_events {
        info.event_degrees[event] = graph.event_degree_via_matrix(&info, event);
        if info.event_degrees[event] == 0 {
            return Err(Error::InvalidInput(format!(
                "event {} has degree zero",
                info.event_labels[event]
            )));
        }
    }

    info.cooc_sum = info
        .actor_degrees
        .iter()
        .map(|&d| d as u64 * (d as u64 - 1) / 2)
        .sum();
    if info.kind == GraphKind::General {
        info.cooc_sum += info.num_edges as u64 * info.direct_edge_weight as u64 / 2;
    }

    #[cfg(debug_assertions)]
    {
        graph.check_sorted(&info)?;
        graph.check_consistency(&info)?;
    }

    let mut original_cooc = HalfMatrix::new(info.num_events)?;
    cooc::compute(&mut graph, &info, &mut original_cooc)?;
    let total: u64 = original_cooc.as_slice().iter().map(|&c| c as u64).sum();
    if total != info.cooc_sum {
        return Err(Error::InvariantViolation(format!(
            "original co-occurrence sum is {total}, expected {}",
            info.cooc_sum
        )));
    }

    info.num_relevant_pairs = original_cooc
        .as_slice()
        .iter()
        .filter(|&&c| c >= config.min_cooc)
        .count();
    if info.num_relevant_pairs == 0 {
        return Err(Error::InvalidInput(format!(
            "no pair has co-occurrence of at least {}",
            config.min_cooc
        )));
    }

    Ok(LoadedGraph {
        info,
        graph,
        original_cooc,
    })
}
