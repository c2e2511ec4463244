//! Progress statistics delivered alongside each transaction batch.

use serde::Serialize;
use std::time::Duration;

/// Throughput snapshot for one shard at the moment a block is delivered.
///
/// Computed from the run start and the shard's cursor positions. The rate is
/// zero and the estimate infinite until at least one nonce has been processed
/// over a non-zero interval.
#[derive(Debug, Clone, Serialize)]
pub struct ProgressStats {
    /// Wall-clock seconds since the run started.
    pub seconds_elapsed: f64,
    /// Nonces processed for this shard during this run.
    pub processed_nonces: u64,
    /// Processing rate over the run so far.
    pub nonces_per_second: f64,
    /// Nonces remaining up to the estimated tip.
    pub nonces_left: u64,
    /// Projected seconds until the tip is reached, with a 10% margin.
    pub seconds_left: f64,
}

impl ProgressStats {
    /// Compute a snapshot from elapsed run time and cursor distances.
    pub fn compute(elapsed: Duration, processed_nonces: u64, nonces_left: u64) -> Self {
        let seconds_elapsed = elapsed.as_secs_f64();
        let nonces_per_second = if seconds_elapsed > 0.0 {
            processed_nonces as f64 / seconds_elapsed
        } else {
            0.0
        };
        let seconds_left = if nonces_per_second > 0.0 {
            nonces_left as f64 / nonces_per_second * 1.1
        } else {
            f64::INFINITY
        };

        Self {
            seconds_elapsed,
            processed_nonces,
            nonces_per_second,
            nonces_left,
            seconds_left,
        }
    }
}
