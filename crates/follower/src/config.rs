//! Follower configuration.

use std::time::Duration;

/// Protocol round duration: one block is produced per shard per round.
pub const ROUND_DURATION: Duration = Duration::from_secs(6);

/// Grace period after which an unresolved cross-shard entry is pruned.
pub const PRUNE_GRACE: Duration = Duration::from_secs(600);

/// Configuration for [`Follower`](crate::Follower).
#[derive(Debug, Clone)]
pub struct FollowerConfig {
    /// Cap on how far behind the estimated tip a cursor may resume.
    /// `None` replays the full backlog on reconnect.
    pub max_look_behind: Option<u64>,

    /// Hold transactions whose execution spans shards until every emitted
    /// smart-contract result has been observed as finalized, then deliver
    /// the logical transaction once.
    pub wait_for_finalized_cross_shard_results: bool,

    /// Invoke the handler even when a block contributes no transactions.
    pub notify_empty_blocks: bool,

    /// Also deliver transactions whose destination is another shard.
    pub include_cross_shard_started_transactions: bool,

    /// Round duration used by the tip estimator.
    pub round_duration: Duration,

    /// Age at which unresolved cross-shard entries are dropped.
    pub prune_grace: Duration,
}

impl Default for FollowerConfig {
    fn default() -> Self {
        Self {
            max_look_behind: None,
            wait_for_finalized_cross_shard_results: false,
            notify_empty_blocks: false,
            include_cross_shard_started_transactions: false,
            round_duration: ROUND_DURATION,
            prune_grace: PRUNE_GRACE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = FollowerConfig::default();
        assert_eq!(config.max_look_behind, None);
        assert!(!config.wait_for_finalized_cross_shard_results);
        assert!(!config.notify_empty_blocks);
        assert_eq!(config.round_duration, Duration::from_secs(6));
        assert_eq!(config.prune_grace, Duration::from_secs(600));
    }
}
