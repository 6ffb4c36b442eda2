/*
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Small shared building blocks: bit grids, triangular matrices, statistics.

mod bits;
mod half_matrix;
mod stats;

pub use bits::{BitMatrix, Block, BITS_PER_BLOCK};
pub use half_matrix::{flat_index, HalfMatrix};
pub use stats::z_score;
