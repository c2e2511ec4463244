//! Tip projection from per-shard baselines.

use shardtail_types::{Nonce, ShardId};
use std::collections::HashMap;
use std::time::Duration;

/// Projects each shard's current tip from a baseline captured once per run.
///
/// The network commits one block per shard per round, so the tip at time `t`
/// is the baseline nonce plus the number of whole rounds elapsed since the
/// baseline was taken. One status poll per shard per run replaces a poll per
/// block; the drift this admits is bounded by the run length and corrected
/// when the next run captures fresh baselines.
#[derive(Debug)]
pub struct TipEstimator {
    round_duration: Duration,
    baselines: HashMap<ShardId, Baseline>,
}

#[derive(Debug, Clone, Copy)]
struct Baseline {
    nonce: Nonce,
    at: Duration,
}

impl TipEstimator {
    pub fn new(round_duration: Duration) -> Self {
        Self {
            round_duration,
            baselines: HashMap::new(),
        }
    }

    /// Record the observed tip for a shard at clock time `now`.
    pub fn record_baseline(&mut self, shard: ShardId, nonce: Nonce, now: Duration) {
        self.baselines.insert(shard, Baseline { nonce, at: now });
    }

    /// Estimated tip for a shard at clock time `now`.
    ///
    /// `None` for shards without a recorded baseline.
    pub fn estimated_tip(&self, shard: ShardId, now: Duration) -> Option<Nonce> {
        let baseline = self.baselines.get(&shard)?;
        let elapsed = now.saturating_sub(baseline.at);
        let rounds = elapsed.as_secs() / self.round_duration.as_secs().max(1);
        Some(Nonce(baseline.nonce.0 + rounds))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_estimator() -> TipEstimator {
        let mut estimator = TipEstimator::new(Duration::from_secs(6));
        estimator.record_baseline(ShardId(0), Nonce(100), Duration::ZERO);
        estimator
    }

    #[test]
    fn test_baseline_is_the_estimate_at_capture_time() {
        let estimator = make_estimator();
        assert_eq!(
            estimator.estimated_tip(ShardId(0), Duration::ZERO),
            Some(Nonce(100))
        );
    }

    #[test]
    fn test_projection_advances_one_nonce_per_round() {
        let estimator = make_estimator();
        // 18 seconds = three full rounds.
        assert_eq!(
            estimator.estimated_tip(ShardId(0), Duration::from_secs(18)),
            Some(Nonce(103))
        );
    }

    #[test]
    fn test_partial_rounds_are_floored() {
        let estimator = make_estimator();
        assert_eq!(
            estimator.estimated_tip(ShardId(0), Duration::from_secs(5)),
            Some(Nonce(100))
        );
        assert_eq!(
            estimator.estimated_tip(ShardId(0), Duration::from_secs(6)),
            Some(Nonce(101))
        );
        assert_eq!(
            estimator.estimated_tip(ShardId(0), Duration::from_secs(11)),
            Some(Nonce(101))
        );
    }

    #[test]
    fn test_unknown_shard_has_no_estimate() {
        let estimator = make_estimator();
        assert_eq!(estimator.estimated_tip(ShardId(7), Duration::ZERO), None);
    }

    #[test]
    fn test_baselines_are_per_shard() {
        let mut estimator = make_estimator();
        estimator.record_baseline(ShardId::METACHAIN, Nonce(500), Duration::from_secs(6));

        assert_eq!(
            estimator.estimated_tip(ShardId::METACHAIN, Duration::from_secs(12)),
            Some(Nonce(501))
        );
        assert_eq!(
            estimator.estimated_tip(ShardId(0), Duration::from_secs(12)),
            Some(Nonce(102))
        );
    }
}
