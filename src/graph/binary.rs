/*
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Binary graph format.
//!
//! Layout, in native byte order:
//!
//! 1. a `u32` equal to [`HEADER_BYTES`], rejecting files of other builds;
//! 2. the header scalars of the [`GraphInfo`];
//! 3. one byte, `b` for bipartite or `n` for general;
//! 4. `num_events` label fields of exactly `max_label_len` bytes each,
//!    NUL-padded;
//! 5. the adjacency-matrix blocks.
//!
//! Reading rebuilds the adjacency lists from the matrix and canonizes, so a
//! write/read round trip reproduces the canonical form byte for byte.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use crate::config::{Config, GraphKind};
use crate::error::{Error, Result};
use crate::graph::{Graph, GraphInfo};

/// Serialized size of the header scalars; doubles as the format version
/// tag.
pub const HEADER_BYTES: u32 = 44;

const BIPARTITE_MARKER: u8 = b'b';
const GENERAL_MARKER: u8 = b'n';

fn write_u32<W: Write>(w: &mut W, value: u32) -> Result<()> {
    w.write_all(&value.to_ne_bytes())?;
    Ok(())
}

fn write_u64<W: Write>(w: &mut W, value: u64) -> Result<()> {
    w.write_all(&value.to_ne_bytes())?;
    Ok(())
}

fn read_u32<R: Read>(r: &mut R) -> Result<u32> {
    let mut buf = [0; 4];
    r.read_exact(&mut buf)?;
    Ok(u32::from_ne_bytes(buf))
}

fn read_u64<R: Read>(r: &mut R) -> Result<u64> {
    let mut buf = [0; 8];
    r.read_exact(&mut buf)?;
    Ok(u64::from_ne_bytes(buf))
}

/// Writes the canonical graph in binary form, then reads it back and
/// verifies that the round trip reproduced it exactly.
pub fn write_binary(path: &Path, info: &GraphInfo, graph: &Graph, config: &Config) -> Result<()> {
    let mut w = BufWriter::new(File::create(path)?);

    write_u32(&mut w, HEADER_BYTES)?;

    let blocks_per_event = graph.adj.blocks_per_row() as u32;
    let num_blocks = graph.adj.blocks().len() as u64;
    write_u64(&mut w, num_blocks)?;
    write_u32(&mut w, blocks_per_event)?;
    write_u32(&mut w, info.max_label_len as u32)?;
    write_u32(&mut w, info.num_events as u32)?;
    write_u32(&mut w, info.num_actors as u32)?;
    write_u32(&mut w, info.num_edges as u32)?;
    write_u32(&mut w, info.num_pairs as u32)?;
    write_u64(&mut w, info.cooc_sum)?;
    write_u32(&mut w, info.num_relevant_pairs as u32)?;

    w.write_all(&[match info.kind {
        GraphKind::Bipartite => BIPARTITE_MARKER,
        GraphKind::General => GENERAL_MARKER,
    }])?;

    let mut field = vec![0u8; info.max_label_len];
    for label in &info.event_labels {
        field.fill(0);
        field[..label.len()].copy_from_slice(label.as_bytes());
        w.write_all(&field)?;
    }

    for block in graph.adj.blocks() {
        write_u64(&mut w, *block)?;
    }
    w.into_inner()
        .map_err(|e| Error::Io(e.into_error()))?
        .sync_all()?;

    // Read back to check the round trip.
    let (read_info, read_graph) = read_binary(path, config)?;
    if read_graph != *graph {
        return Err(Error::InvariantViolation(
            "binary graph read back differs from the written graph".into(),
        ));
    }
    if read_info != *info {
        return Err(Error::InvariantViolation(
            "binary graph information read back differs from the written one".into(),
        ));
    }
    Ok(())
}

/// Reads a binary graph file into a canonical [`Graph`] and its
/// [`GraphInfo`]. The original co-occurrence is not stored in the file;
/// [`load_binary`](super::load::load_binary) recomputes it.
pub fn read_binary(path: &Path, config: &Config) -> Result<(GraphInfo, Graph)> {
    let mut r = BufReader::new(File::open(path)?);

    let tag = read_u32(&mut r)?;
    if tag != HEADER_BYTES {
        return Err(Error::Incompatibility(format!(
            "{} was written by an incompatible build (header size {tag}, expected \
             {HEADER_BYTES}); re-read the original text file",
            path.display()
        )));
    }

    let num_blocks = read_u64(&mut r)? as usize;
    let blocks_per_event = read_u32(&mut r)? as usize;
    let max_label_len = read_u32(&mut r)? as usize;
    let num_events = read_u32(&mut r)? as usize;
    let num_actors = read_u32(&mut r)? as usize;
    let num_edges = read_u32(&mut r)? as usize;
    let num_pairs = read_u32(&mut r)? as usize;
    let cooc_sum = read_u64(&mut r)?;
    let num_relevant_pairs = read_u32(&mut r)? as usize;

    let mut marker = [0u8; 1];
    r.read_exact(&mut marker)?;
    let kind = match marker[0] {
        BIPARTITE_MARKER => GraphKind::Bipartite,
        GENERAL_MARKER => GraphKind::General,
        other => {
            return Err(Error::Incompatibility(format!(
                "unexpected graph kind marker {other:#04x} in {}",
                path.display()
            )))
        }
    };
    if kind != config.kind {
        return Err(Error::Incompatibility(format!(
            "{} contains a {} graph but the run is configured for a {} graph",
            path.display(),
            kind_name(kind),
            kind_name(config.kind)
        )));
    }

    let mut event_labels = Vec::with_capacity(num_events);
    let mut field = vec![0u8; max_label_len];
    for _ in 0..num_events {
        r.read_exact(&mut field)?;
        let len = field.iter().position(|&b| b == 0).unwrap_or(field.len());
        let label = std::str::from_utf8(&field[..len]).map_err(|_| {
            Error::Incompatibility(format!("non-UTF-8 node label in {}", path.display()))
        })?;
        event_labels.push(label.to_owned());
    }

    let mut info = GraphInfo {
        kind,
        num_events,
        num_actors,
        num_edges,
        num_pairs,
        max_label_len,
        event_labels,
        event_degrees: vec![0; num_events],
        actor_degrees: vec![0; num_actors],
        cooc_sum,
        num_relevant_pairs,
        direct_edge_weight: config.direct_edge_weight,
    };

    let mut graph = Graph::new(&info)?;
    if graph.adj.blocks().len() != num_blocks || graph.adj.blocks_per_row() != blocks_per_event {
        return Err(Error::Incompatibility(format!(
            "matrix shape in {} does not match its node counts",
            path.display()
        )));
    }
    for block in graph.adj.blocks_mut() {
        *block = read_u64(&mut r)?;
    }

    graph.rebuild_lists_from_matrix(&info)?;
    graph.canonize(&info)?;

    for actor in 0..num_actors {
        info.actor_degrees[actor] = graph.actor_degree_via_lists(actor);
        if info.actor_degrees[actor] == 0 {
            return Err(Error::InvalidInput(format!(
                "actor {actor} in {} has degree zero",
                path.display()
            )));
        }
    }
    for event in 0..num_events {
        info.event_degrees[event] = graph.event_degree_via_matrix(&info, event);
        if info.event_degrees[event] == 0 {
            return Err(Error::InvalidInput(format!(
                "event {} in {} has degree zero",
                info.event_labels[event],
                path.display()
            )));
        }
    }

    Ok((info, graph))
}

fn kind_name(kind: GraphKind) -> &'static str {
    match kind {
        GraphKind::Bipartite => "bipartite",
        GraphKind::General => "general",
    }
}
