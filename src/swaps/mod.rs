/*
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Degree-preserving randomization.
//!
//! Two local moves are available: the single switch, which exchanges the
//! event endpoints of two random edges (with Metropolis-style rejections
//! when a destination edge already exists), and the Curveball trade, which
//! redistributes the symmetric difference of two actors' adjacency lists.
//! Both preserve every node degree exactly and never fail; rejected moves
//! still advance the chain.

mod curveball;
mod single_switch;

pub use curveball::{trade_hashed, trade_sorted};
pub use single_switch::{single_switch_bipartite, single_switch_general};
