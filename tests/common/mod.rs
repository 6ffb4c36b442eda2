/*
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

#![allow(dead_code)]

use std::io::Cursor;

use fdsm::config::{Config, GraphKind, Side};
use fdsm::graph::load::{load_bipartite, load_general, LoadedGraph};

/// A configuration with a fixed seed and a small worker pool, suitable for
/// tests. The fixtures below write edges as `actor event`, so the side of
/// interest is the right one.
pub fn test_config() -> Config {
    Config {
        seed: 7,
        workers: 4,
        side_of_interest: Side::Right,
        ..Config::default()
    }
}

pub fn general_config() -> Config {
    Config {
        kind: GraphKind::General,
        ..test_config()
    }
}

fn edge_text(edges: &[(&str, &str)]) -> String {
    edges
        .iter()
        .map(|(a, b)| format!("{a} {b}\n"))
        .collect::<String>()
}

/// Loads a bipartite graph from (actor, event) pairs.
pub fn load_bip(edges: &[(&str, &str)], config: &Config) -> LoadedGraph {
    load_bipartite(Cursor::new(edge_text(edges)), config).unwrap()
}

pub fn load_gen(edges: &[(&str, &str)], config: &Config) -> LoadedGraph {
    load_general(Cursor::new(edge_text(edges)), config).unwrap()
}

/// The 4-cycle: two actors sharing the same two events. Its degree
/// sequence has a unique realization, so every swap attempt must reject.
pub fn four_cycle() -> Vec<(&'static str, &'static str)> {
    vec![("a1", "e1"), ("a1", "e2"), ("a2", "e1"), ("a2", "e2")]
}

/// The complete bipartite graph on two actors and three events.
pub fn k23() -> Vec<(&'static str, &'static str)> {
    vec![
        ("a1", "e1"),
        ("a1", "e2"),
        ("a1", "e3"),
        ("a2", "e1"),
        ("a2", "e2"),
        ("a2", "e3"),
    ]
}

/// A hub actor holding three events, plus one leaf actor per event.
pub fn star() -> Vec<(&'static str, &'static str)> {
    vec![
        ("hub", "e1"),
        ("hub", "e2"),
        ("hub", "e3"),
        ("l1", "e1"),
        ("l2", "e2"),
        ("l3", "e3"),
    ]
}

/// A deterministic pseudo-random bipartite edge list with no isolated
/// node: actor `j` always holds event `j % num_events`, plus a scattering
/// of further edges.
pub fn random_bipartite_edges(
    num_actors: usize,
    num_events: usize,
    salt: usize,
) -> Vec<(String, String)> {
    let mut edges = Vec::new();
    for actor in 0..num_actors {
        let mut events = vec![actor % num_events];
        for event in 0..num_events {
            if event != actor % num_events && (actor * 31 + event * 17 + salt) % 5 < 2 {
                events.push(event);
            }
        }
        for event in events {
            edges.push((format!("a{actor}"), format!("e{event}")));
        }
    }
    edges
}

/// Loads a deterministic pseudo-random bipartite graph.
pub fn load_random_bipartite(
    num_actors: usize,
    num_events: usize,
    salt: usize,
    config: &Config,
) -> LoadedGraph {
    let text = random_bipartite_edges(num_actors, num_events, salt)
        .iter()
        .map(|(a, e)| format!("{a} {e}\n"))
        .collect::<String>();
    load_bipartite(Cursor::new(text), config).unwrap()
}
