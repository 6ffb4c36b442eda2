/*
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Binary graph round trips.

mod common;

use std::io::{Read, Seek, SeekFrom, Write};

use common::*;
use fdsm::error::Error;
use fdsm::graph::binary::{read_binary, write_binary};
use fdsm::graph::load::load_binary;

#[test]
fn test_write_read_roundtrip() {
    // 5 actors, 7 events.
    let config = test_config();
    let loaded = load_random_bipartite(5, 7, 1, &config);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("graph.gbin");
    // write_binary verifies the read back internally as well.
    write_binary(&path, &loaded.info, &loaded.graph, &config).unwrap();

    let (info, graph) = read_binary(&path, &config).unwrap();
    assert_eq!(info, loaded.info);
    assert_eq!(graph, loaded.graph);

    // The full binary load also reproduces the original co-occurrence.
    let reloaded = load_binary(&path, &config).unwrap();
    assert_eq!(reloaded.original_cooc, loaded.original_cooc);
    assert_eq!(reloaded.info, loaded.info);
}

#[test]
fn test_general_roundtrip() {
    let config = general_config();
    let loaded = load_gen(
        &[("a", "b"), ("b", "c"), ("a", "c"), ("c", "d"), ("d", "a")],
        &config,
    );

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("graph.gbin");
    write_binary(&path, &loaded.info, &loaded.graph, &config).unwrap();
    let reloaded = load_binary(&path, &config).unwrap();
    assert_eq!(reloaded.graph, loaded.graph);
    assert_eq!(reloaded.info, loaded.info);
}

#[test]
fn test_version_tag_mismatch_rejected() {
    let config = test_config();
    let loaded = load_bip(&k23(), &config);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("graph.gbin");
    write_binary(&path, &loaded.info, &loaded.graph, &config).unwrap();

    // Corrupt the leading size tag.
    let mut file = std::fs::OpenOptions::new()
        .read(true)
        .write(true)
        .open(&path)
        .unwrap();
    let mut tag = [0u8; 4];
    file.read_exact(&mut tag).unwrap();
    tag[0] = tag[0].wrapping_add(1);
    file.seek(SeekFrom::Start(0)).unwrap();
    file.write_all(&tag).unwrap();
    drop(file);

    let err = read_binary(&path, &config).unwrap_err();
    assert!(matches!(err, Error::Incompatibility(_)));
}

#[test]
fn test_kind_mismatch_rejected() {
    let config = test_config();
    let loaded = load_bip(&k23(), &config);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("graph.gbin");
    write_binary(&path, &loaded.info, &loaded.graph, &config).unwrap();

    let err = read_binary(&path, &general_config()).unwrap_err();
    assert!(matches!(err, Error::Incompatibility(_)));
}
