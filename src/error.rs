/*
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Error kinds of the sampling engine.
//!
//! Any error is fatal for the run: callers propagate with `?` up to the
//! process entry point, no recovery is attempted.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Malformed text graph, impossible option combination, and similar.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The same edge appears twice in the input.
    #[error("repeated edge ({left} {right}): first at line {first_line}, again at line {line}")]
    DuplicateEdge {
        left: String,
        right: String,
        first_line: usize,
        line: usize,
    },

    /// A node is referenced but is not part of the input graph.
    #[error("node {0:?} is not part of the input graph")]
    MissingNode(String),

    /// Binary graph file written by a different build, or a graph-kind
    /// mismatch between the file marker and the configuration.
    #[error("incompatible graph file: {0}")]
    Incompatibility(String),

    /// Allocation failure on one of the large buffers.
    #[error("out of memory allocating {0}")]
    ResourceExhaustion(&'static str),

    /// A self-check failed; this indicates a bug, not bad input.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    /// A redundant edge of a general graph has no counterpart; the edge
    /// links are corrupt.
    #[error("no linked edge for edge {edge} ({actor} -> {event})")]
    BrokenEdgeLink { edge: u32, actor: u32, event: u32 },

    /// The swap heuristic cannot satisfy the requested degree selection
    /// given the degree spectrum of the input.
    #[error("configuration conflict: {0}")]
    ConfigConflict(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
