/*
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Plain-text results writer.
//!
//! The file starts with a program banner and the execution timestamp, then
//! a header line, then one line per relevant pair: both node names padded
//! to the label width, followed by the empirical p-value, the z-score, the
//! mean sampled co-occurrence and the original co-occurrence in 15-wide
//! columns.

use std::io::Write;

use crate::error::Result;
use crate::graph::GraphInfo;
use crate::results::{Accumulator, ScoredPair};
use crate::utils::HalfMatrix;

/// Extension of the results file.
pub const RESULTS_EXTENSION: &str = "laps";

/// Builds the results file name from the output stem: with `run_info`, the
/// sample and swap counts (and the optional date string and run index) are
/// appended before the extension.
pub fn results_file_name(
    stem: &str,
    run_info: bool,
    num_samples: u32,
    num_swaps: u64,
    date: Option<&str>,
    index: Option<&str>,
) -> String {
    let mut name = stem.to_owned();
    if run_info {
        name.push_str(&format!("_{num_samples}_samples_{num_swaps}_swaps"));
        if let Some(date) = date {
            name.push_str(&format!("_date_{date}"));
        }
        if let Some(index) = index {
            name.push_str(&format!("_index_{index}"));
        }
    }
    name.push('.');
    name.push_str(RESULTS_EXTENSION);
    name
}

/// Writes the results for all relevant pairs, in pair-id order.
pub fn write_results<W: Write>(
    mut w: W,
    info: &GraphInfo,
    original_cooc: &HalfMatrix<u32>,
    acc: &Accumulator,
    pairs: &[ScoredPair],
    num_samples: u32,
) -> Result<()> {
    writeln!(
        w,
        "Program version: {} {}",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION")
    )?;
    writeln!(w, "Execution date and time: {}", jiff::Zoned::now())?;

    let label_width = info.max_label_len;
    writeln!(
        w,
        "{:>label_width$} {:>label_width$} {:>15} {:>15} {:>15} {:>15}",
        "Node1", "Node2", "pValue", "zScore", "Cooc(FDSM)", "oriCooc"
    )?;

    for pair in pairs {
        let row = pair.event1 as usize;
        let col = (pair.event2 - pair.event1 - 1) as usize;
        writeln!(
            w,
            "{:>label_width$} {:>label_width$} {:>15} {:>15} {:>15} {:>15}",
            info.event_labels[pair.event1 as usize],
            info.event_labels[pair.event2 as usize],
            pair.p_tally as f64 / num_samples as f64,
            pair.z_score,
            acc.mean(row, col, num_samples),
            original_cooc[(row, col)],
        )?;
    }
    Ok(())
}
