/*
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Cross-process reduction seam.
//!
//! The sampling engine is oblivious to how processes are started and talk
//! to each other; it only needs the handful of collective operations below.
//! All of them are synchronous and collective: every rank calls them at the
//! same point of the batch loop. Implementors must reduce in a fixed order
//! so that results are deterministic in `(seed, nSamples, W, nProcs)`.
//!
//! The crate ships [`SingleProcess`]; a cluster deployment provides its own
//! implementation on top of its message-passing fabric.

use crate::error::Result;

pub trait Collective {
    /// This process' rank; rank 0 gathers reductions and makes run-level
    /// decisions.
    fn rank(&self) -> usize;

    fn num_ranks(&self) -> usize;

    fn barrier(&self) {}

    /// Element-wise sum over all ranks, gathered into `buf` on rank 0. The
    /// contents of `buf` on other ranks are unspecified afterwards.
    fn reduce_sum_u64(&self, _buf: &mut [u64]) -> Result<()> {
        Ok(())
    }

    /// See [`reduce_sum_u64`](Collective::reduce_sum_u64).
    fn reduce_sum_u32(&self, _buf: &mut [u32]) -> Result<()> {
        Ok(())
    }

    /// Maximum over all ranks, valid on rank 0.
    fn reduce_max_u64(&self, value: u64) -> Result<u64> {
        Ok(value)
    }

    /// Replaces `value` on every rank by rank 0's value.
    fn broadcast_u64(&self, _value: &mut u64) -> Result<()> {
        Ok(())
    }

    /// Replaces `value` on every rank by rank 0's value.
    fn broadcast_bool(&self, _value: &mut bool) -> Result<()> {
        Ok(())
    }
}

/// The trivial single-process fabric: rank 0 of 1, every collective a
/// no-op.
#[derive(Debug, Clone, Copy, Default)]
pub struct SingleProcess;

impl Collective for SingleProcess {
    fn rank(&self) -> usize {
        0
    }

    fn num_ranks(&self) -> usize {
        1
    }
}
