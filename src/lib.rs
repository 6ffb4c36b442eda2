/*
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Estimation of the statistical significance of pairwise co-occurrences
//! under the fixed degree sequence model (FDSM).
//!
//! Given an observed bipartite (or general undirected) graph, the engine
//! draws many degree-preserving random graphs, recomputes the co-occurrence
//! of every event pair on each sample, and derives an empirical p-value and
//! z-score for every pair whose observed co-occurrence is relevant.
//!
//! The pipeline is: load a canonical [`Graph`](graph::Graph), compute the
//! original co-occurrences, calibrate the number of swaps per sample
//! ([`heuristics::swap`]), then let the [`Dispatcher`](dispatch::Dispatcher)
//! run batches of worker-local randomizations until the sample heuristic
//! ([`heuristics::sample`]) declares the top-k ranking stable.

#![deny(unstable_features)]
#![deny(trivial_casts)]
#![deny(unconditional_recursion)]
#![deny(clippy::empty_loop)]
#![deny(unreachable_code)]
#![deny(unreachable_patterns)]
#![deny(unused_macro_rules)]
#![deny(unused_doc_comments)]

#[cfg(feature = "cli")]
pub mod cli;
pub mod collective;
pub mod config;
pub mod cooc;
pub mod dispatch;
pub mod error;
pub mod graph;
pub mod heuristics;
pub mod output;
pub mod random;
pub mod results;
pub mod swaps;
pub mod utils;

pub use error::{Error, Result};

/// Prelude module to import everything from this crate
pub mod prelude {
    pub use crate::collective::*;
    pub use crate::config::*;
    pub use crate::dispatch::*;
    pub use crate::error::{Error, Result};
    pub use crate::graph::prelude::*;
    pub use crate::random::*;
    pub use crate::results::*;
    pub use crate::utils::*;
}
