/*
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! The results writer and the command line round trip.

mod common;

use std::io::Write;

use common::*;
use fdsm::config::{SampleCount, SwapCount};
use fdsm::dispatch::run_single_process;
use fdsm::output::write_results;

#[test]
fn test_results_layout() {
    let mut config = test_config();
    config.swaps = SwapCount::Fixed(10);
    config.samples = SampleCount::Fixed(100);
    let loaded = load_bip(&k23(), &config);
    let outcome = run_single_process(
        &loaded.graph,
        &loaded.info,
        &loaded.original_cooc,
        &config,
        None,
    )
    .unwrap();

    let mut buf = Vec::new();
    write_results(
        &mut buf,
        &loaded.info,
        &loaded.original_cooc,
        &outcome.accumulator,
        &outcome.pairs,
        outcome.num_samples,
    )
    .unwrap();
    let text = String::from_utf8(buf).unwrap();
    let lines: Vec<&str> = text.lines().collect();

    assert!(lines[0].starts_with("Program version"));
    assert!(lines[1].starts_with("Execution date and time"));
    assert!(lines[2].contains("Node1") && lines[2].contains("oriCooc"));
    // One line per relevant pair.
    assert_eq!(lines.len(), 3 + loaded.info.num_relevant_pairs);
    // Every sample ties the original, so the p-value is one half.
    assert!(lines[3].contains("e1") && lines[3].contains("e2") && lines[3].contains("0.5"));
}

#[cfg(feature = "cli")]
#[test]
fn test_cli_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("toy.txt");
    let mut file = std::fs::File::create(&input).unwrap();
    for (actor, event) in k23() {
        writeln!(file, "{event} {actor}").unwrap();
    }
    drop(file);

    fdsm::cli::cli_main([
        "fdsm",
        "--in",
        "toy.txt",
        "--inpath",
        dir.path().to_str().unwrap(),
        "--outpath",
        dir.path().to_str().unwrap(),
        "--seed",
        "42",
        "--swaps",
        "10",
        "--samples",
        "50",
        "--workers",
        "2",
        "--writebinarygraph",
    ])
    .unwrap();

    assert!(dir.path().join("toy.gbin").is_file());
    let results = dir.path().join("toy_50_samples_10_swaps.laps");
    let text = std::fs::read_to_string(&results).unwrap();
    assert_eq!(text.lines().count(), 3 + 3);
}