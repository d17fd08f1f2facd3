//! Record decimation of a satellite pass.
//!
//! A pass carries one record per second, far more than the model service needs. The
//! policy choosing which records are queried is configuration, kept apart from the
//! parsing loop.
use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_ORBIT_STRIDE;

/// Which records of a pass are turned into observations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SamplingPolicy {
    /// every record
    All,
    /// records `0, n, 2n, …`
    EveryNth(usize),
    /// at most `n` records, evenly spread over the pass (first record included)
    Budget(usize),
}

impl Default for SamplingPolicy {
    fn default() -> Self {
        SamplingPolicy::EveryNth(DEFAULT_ORBIT_STRIDE)
    }
}

impl SamplingPolicy {
    /// Indices selected out of a pass of `len` records, in increasing order.
    ///
    /// A zero stride or budget selects nothing; [`RunConfig::validate`](crate::config::RunConfig::validate)
    /// rejects both.
    pub fn select(&self, len: usize) -> Vec<usize> {
        match *self {
            SamplingPolicy::All => (0..len).collect(),
            SamplingPolicy::EveryNth(0) | SamplingPolicy::Budget(0) => Vec::new(),
            SamplingPolicy::EveryNth(stride) => (0..len).step_by(stride).collect(),
            SamplingPolicy::Budget(budget) if budget >= len => (0..len).collect(),
            SamplingPolicy::Budget(budget) => (0..budget).map(|k| k * len / budget).collect(),
        }
    }

    pub fn is_valid(&self) -> bool {
        !matches!(
            self,
            SamplingPolicy::EveryNth(0) | SamplingPolicy::Budget(0)
        )
    }
}
