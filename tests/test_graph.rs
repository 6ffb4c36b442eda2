/*
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Tests for loading, canonical form, view reconciliation and the graph
//! invariant checks.

mod common;

use std::io::Cursor;

use common::*;
use fdsm::config::Side;
use fdsm::error::Error;
use fdsm::graph::load::load_bipartite;
use fdsm::graph::Graph;

#[test]
fn test_load_bipartite_shape() {
    let config = test_config();
    let loaded = load_bip(&k23(), &config);
    assert_eq!(loaded.info.num_events, 3);
    assert_eq!(loaded.info.num_actors, 2);
    assert_eq!(loaded.info.num_edges, 6);
    assert_eq!(loaded.info.num_pairs, 3);
    assert_eq!(loaded.info.event_labels, vec!["e1", "e2", "e3"]);
    assert_eq!(loaded.info.actor_degrees, vec![3, 3]);
    assert_eq!(loaded.info.event_degrees, vec![2, 2, 2]);
    // Two actors adjacent to each of the three pairs.
    assert_eq!(loaded.info.cooc_sum, 6);
    assert_eq!(loaded.info.num_relevant_pairs, 3);
}

#[test]
fn test_side_of_interest() {
    let mut config = test_config();
    config.side_of_interest = Side::Left;
    let loaded = load_bip(&star(), &config);
    // With the left side as events, the hub and leaves become the events.
    assert_eq!(loaded.info.num_events, 4);
    assert_eq!(loaded.info.num_actors, 3);
}

#[test]
fn test_duplicate_edge_rejected() {
    let config = test_config();
    let text = "a1 e1\na2 e1\na1 e1\n";
    let err = load_bipartite(Cursor::new(text), &config).unwrap_err();
    match err {
        Error::DuplicateEdge {
            first_line, line, ..
        } => {
            assert_eq!(first_line, 1);
            assert_eq!(line, 3);
        }
        other => panic!("expected DuplicateEdge, got {other:?}"),
    }
}

#[test]
fn test_general_self_loop_rejected() {
    let config = general_config();
    let err = fdsm::graph::load::load_general(Cursor::new("a b\nc c\n"), &config).unwrap_err();
    assert!(matches!(err, Error::DuplicateEdge { .. }));
}

#[test]
fn test_degrees_agree_between_views() {
    let config = test_config();
    let loaded = load_random_bipartite(23, 17, 3, &config);
    let (graph, info) = (&loaded.graph, &loaded.info);
    for actor in 0..info.num_actors {
        assert_eq!(
            graph.actor_degree_via_matrix(info, actor),
            graph.actor_degree_via_lists(actor)
        );
    }
    for event in 0..info.num_events {
        assert_eq!(
            graph.event_degree_via_matrix(info, event),
            graph.event_degree_via_lists(event)
        );
    }
}

#[test]
fn test_canonical_lists_sorted() {
    let config = test_config();
    let loaded = load_random_bipartite(23, 17, 5, &config);
    loaded.graph.check_sorted(&loaded.info).unwrap();
    loaded.graph.check_consistency(&loaded.info).unwrap();
}

#[test]
fn test_matrix_list_matrix_roundtrip() {
    let config = test_config();
    let loaded = load_random_bipartite(15, 12, 1, &config);
    let mut copy = loaded.graph.clone();
    copy.rebuild_lists_from_matrix(&loaded.info).unwrap();
    copy.canonize(&loaded.info).unwrap();
    copy.rebuild_matrix_from_lists(&loaded.info);
    assert_eq!(copy, loaded.graph);
}

#[test]
fn test_copy_is_identical() {
    let config = test_config();
    let loaded = load_random_bipartite(10, 8, 2, &config);
    let mut copy = Graph::new(&loaded.info).unwrap();
    copy.copy_from(&loaded.graph);
    assert_eq!(copy, loaded.graph);
}

#[test]
fn test_general_links_are_involution() {
    let config = general_config();
    // Triangle plus a pendant.
    let loaded = load_gen(&[("a", "b"), ("b", "c"), ("a", "c"), ("c", "d")], &config);
    loaded.graph.check_edge_links(&loaded.info).unwrap();
    for edge in 0..loaded.info.num_edges as u32 {
        let twin = loaded.graph.find_linked_edge(edge).unwrap();
        assert_eq!(loaded.graph.find_linked_edge(twin).unwrap(), edge);
        assert_ne!(twin, edge);
    }
}

#[test]
fn test_general_diagonal_set() {
    let config = general_config();
    let loaded = load_gen(&[("a", "b"), ("b", "c"), ("a", "c")], &config);
    for node in 0..loaded.info.num_events {
        assert!(loaded.graph.adj().test(node, node));
    }
}

#[test]
fn test_canonize_idempotent() {
    let config = test_config();
    let loaded = load_random_bipartite(12, 9, 4, &config);
    let mut again = loaded.graph.clone();
    again.canonize(&loaded.info).unwrap();
    assert_eq!(again, loaded.graph);
}
