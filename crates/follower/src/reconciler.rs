//! Cross-shard completion tracking.
//!
//! A transaction whose execution spans shards produces smart-contract
//! results (SCRs) that finalize independently on their destination shards.
//! The reconciler tracks each such logical transaction with a counter:
//! outbound SCRs leaving the originating shard increment it, inbound SCRs
//! landing on their destination shard decrement it. Net balance zero means
//! every emitted SCR has been observed as finalized, and the logical
//! transaction is released downstream exactly once.
//!
//! Success acknowledgements (`@6f6b`) are bookkeeping records with no
//! semantic effect; counting them would permanently unbalance the counter,
//! so they are ignored by both passes.

use shardtail_types::{ShardId, ShardTransaction};
use std::collections::{HashMap, HashSet};
use std::time::Duration;
use tracing::{debug, trace, warn};

/// Advisory log topic for reconciliation decisions.
pub const CROSS_SHARD_TOPIC: &str = "CrossShardSmartContractResult";

/// State for one in-flight logical transaction.
#[derive(Debug, Clone)]
struct PendingCrossShard {
    /// The originating transaction as first seen. Later SCRs referencing the
    /// same original hash never replace it.
    seed: ShardTransaction,
    /// Outbound SCRs observed minus inbound SCRs observed.
    counter: i64,
    /// Clock time at entry creation, for pruning.
    created: Duration,
}

/// Tracks in-flight cross-shard transactions until provably complete.
///
/// Keyed by the originating transaction hash. Entries are created on the
/// first outbound SCR, mutated by each subsequent matching SCR, and removed
/// when the counter returns to zero or the entry outlives the grace period.
#[derive(Debug)]
pub struct CrossShardReconciler {
    grace: Duration,
    entries: HashMap<String, PendingCrossShard>,
}

impl CrossShardReconciler {
    /// Create a reconciler that prunes unresolved entries after `grace`.
    pub fn new(grace: Duration) -> Self {
        Self {
            grace,
            entries: HashMap::new(),
        }
    }

    /// Whether a logical transaction is still in flight.
    pub fn is_pending(&self, original_hash: &str) -> bool {
        self.entries.contains_key(original_hash)
    }

    /// Number of in-flight logical transactions.
    pub fn pending_count(&self) -> usize {
        self.entries.len()
    }

    /// Apply one block's transactions and return the logical transactions
    /// that just completed, in first-touch order.
    ///
    /// `shard` is the shard the block belongs to: the same SCR population is
    /// read as outbound where this shard is the source and inbound where it
    /// is the destination. A completed transaction whose own record appears
    /// in the block is removed without being returned; the direct delivery
    /// pass picks it up instead.
    pub fn process_block(
        &mut self,
        shard: ShardId,
        transactions: &[ShardTransaction],
        now: Duration,
    ) -> Vec<ShardTransaction> {
        let block_hashes: HashSet<&str> = transactions
            .iter()
            .map(|tx| tx.hash.as_str())
            .collect();

        self.count_outbound(shard, transactions, &block_hashes, now);
        self.count_inbound(shard, transactions);
        self.sweep_completed(shard, transactions, &block_hashes)
    }

    /// Drop entries that have outlived the grace period.
    ///
    /// SCRs can be lost to follower restarts, missed blocks, or gateway
    /// anomalies; an entry that never rebalances would otherwise be retained
    /// forever. Returns the pruned original hashes.
    pub fn prune_stale(&mut self, now: Duration) -> Vec<String> {
        let mut stale: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| now.saturating_sub(entry.created) >= self.grace)
            .map(|(hash, _)| hash.clone())
            .collect();
        stale.sort();

        for hash in &stale {
            if let Some(entry) = self.entries.remove(hash) {
                warn!(
                    original = %hash,
                    counter = entry.counter,
                    age_secs = now.saturating_sub(entry.created).as_secs(),
                    "Pruning stale cross-shard entry"
                );
            }
        }

        stale
    }

    /// Count SCRs emitted from this shard toward other shards.
    fn count_outbound(
        &mut self,
        shard: ShardId,
        transactions: &[ShardTransaction],
        block_hashes: &HashSet<&str>,
        now: Duration,
    ) {
        for tx in transactions {
            let Some(original) = tx.original_transaction_hash.as_deref() else {
                continue;
            };
            if tx.source_shard != shard || tx.destination_shard == shard {
                continue;
            }

            if !self.entries.contains_key(original) {
                if !block_hashes.contains(original) {
                    warn!(
                        %shard,
                        scr = %tx.hash,
                        original,
                        "Outbound SCR without its originating transaction in the block, skipping"
                    );
                    continue;
                }
                // The seed lookup cannot fail: the hash is in the block.
                let Some(seed) = transactions.iter().find(|t| t.hash == original) else {
                    continue;
                };
                trace!(%shard, original, "Tracking new cross-shard transaction");
                self.entries.insert(
                    original.to_owned(),
                    PendingCrossShard {
                        seed: seed.clone(),
                        counter: 0,
                        created: now,
                    },
                );
            }

            if tx.is_success_ack() {
                trace!(%shard, scr = %tx.hash, original, "Success acknowledgement, counter unchanged");
                continue;
            }
            if let Some(entry) = self.entries.get_mut(original) {
                entry.counter += 1;
                debug!(
                    %shard,
                    scr = %tx.hash,
                    original,
                    counter = entry.counter,
                    "Outbound SCR counted"
                );
            }
        }
    }

    /// Count SCRs landing on this shard from other shards.
    fn count_inbound(&mut self, shard: ShardId, transactions: &[ShardTransaction]) {
        for tx in transactions {
            let Some(original) = tx.original_transaction_hash.as_deref() else {
                continue;
            };
            if tx.source_shard == shard || tx.destination_shard != shard {
                continue;
            }

            let Some(entry) = self.entries.get_mut(original) else {
                // Possible when a previous sweep already zeroed the counter
                // or the follower started mid-flight.
                debug!(
                    %shard,
                    scr = %tx.hash,
                    original,
                    "Inbound SCR for an untracked transaction, skipping"
                );
                continue;
            };

            if tx.is_success_ack() {
                trace!(%shard, scr = %tx.hash, original, "Success acknowledgement, counter unchanged");
                continue;
            }
            entry.counter -= 1;
            debug!(
                %shard,
                scr = %tx.hash,
                original,
                counter = entry.counter,
                "Inbound SCR counted"
            );
        }
    }

    /// Remove balanced entries, returning the seeds to deliver.
    fn sweep_completed(
        &mut self,
        shard: ShardId,
        transactions: &[ShardTransaction],
        block_hashes: &HashSet<&str>,
    ) -> Vec<ShardTransaction> {
        // First position at which each logical transaction was referenced in
        // this block, so completions are emitted deterministically.
        let mut touch_order: HashMap<&str, usize> = HashMap::new();
        for (position, tx) in transactions.iter().enumerate() {
            if let Some(original) = tx.original_transaction_hash.as_deref() {
                touch_order.entry(original).or_insert(position);
            }
        }

        let mut balanced: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.counter == 0)
            .map(|(hash, _)| hash.clone())
            .collect();
        balanced.sort_by(|a, b| {
            let position_a = touch_order.get(a.as_str()).copied().unwrap_or(usize::MAX);
            let position_b = touch_order.get(b.as_str()).copied().unwrap_or(usize::MAX);
            position_a.cmp(&position_b).then_with(|| a.cmp(b))
        });

        let mut completed = Vec::new();
        for hash in balanced {
            let Some(entry) = self.entries.remove(&hash) else {
                continue;
            };
            if block_hashes.contains(hash.as_str()) {
                debug!(
                    %shard,
                    original = %hash,
                    "Cross-shard transaction settled within its own block, leaving delivery to the direct pass"
                );
            } else {
                debug!(%shard, original = %hash, "Cross-shard transaction complete");
                completed.push(entry.seed);
            }
        }

        completed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;

    const GRACE: Duration = Duration::from_secs(600);

    fn make_tx(hash: &str, source: u32, destination: u32) -> ShardTransaction {
        ShardTransaction {
            hash: hash.to_owned(),
            source_shard: ShardId(source),
            destination_shard: ShardId(destination),
            ..Default::default()
        }
    }

    fn make_scr(
        hash: &str,
        original: &str,
        source: u32,
        destination: u32,
        data: &str,
    ) -> ShardTransaction {
        ShardTransaction {
            original_transaction_hash: Some(original.to_owned()),
            data: Some(STANDARD.encode(data.as_bytes())),
            ..make_tx(hash, source, destination)
        }
    }

    #[test]
    fn test_completion_across_shards() {
        let mut reconciler = CrossShardReconciler::new(GRACE);

        // Originating block on shard 0: the parent plus one outbound SCR.
        let seed = make_tx("aa", 0, 1);
        let outbound = make_scr("bb", "aa", 0, 1, "transfer@01");
        let completed =
            reconciler.process_block(ShardId(0), &[seed, outbound], Duration::ZERO);
        assert!(completed.is_empty());
        assert!(reconciler.is_pending("aa"));

        // Destination block on shard 1: the SCR lands.
        let inbound = make_scr("cc", "aa", 0, 1, "transfer@01");
        let completed =
            reconciler.process_block(ShardId(1), &[inbound], Duration::from_secs(6));
        assert_eq!(completed.len(), 1);
        assert_eq!(completed[0].hash, "aa");
        assert!(!reconciler.is_pending("aa"));
        assert_eq!(reconciler.pending_count(), 0);
    }

    #[test]
    fn test_success_ack_does_not_move_counter() {
        let mut reconciler = CrossShardReconciler::new(GRACE);

        let seed = make_tx("aa", 0, 1);
        let outbound = make_scr("bb", "aa", 0, 1, "transfer@01");
        reconciler.process_block(ShardId(0), &[seed, outbound], Duration::ZERO);

        // The inbound record is a bare acknowledgement: the counter must
        // stay at +1 and the transaction must not be released.
        let ack = make_scr("cc", "aa", 0, 1, "@6f6b");
        let completed = reconciler.process_block(ShardId(1), &[ack], Duration::from_secs(6));
        assert!(completed.is_empty());
        assert!(reconciler.is_pending("aa"));
    }

    #[test]
    fn test_outbound_ack_creates_entry_without_count() {
        let mut reconciler = CrossShardReconciler::new(GRACE);

        // An acknowledgement-only outbound SCR creates the entry at zero;
        // the sweep removes it in the same block and leaves delivery to the
        // direct pass because the parent is present.
        let seed = make_tx("aa", 0, 1);
        let ack = make_scr("bb", "aa", 0, 1, "@6f6b");
        let completed = reconciler.process_block(ShardId(0), &[seed, ack], Duration::ZERO);
        assert!(completed.is_empty());
        assert!(!reconciler.is_pending("aa"));
    }

    #[test]
    fn test_seedless_outbound_is_skipped() {
        let mut reconciler = CrossShardReconciler::new(GRACE);

        // No transaction with hash "aa" in the batch: the entry must not be
        // created at all.
        let outbound = make_scr("bb", "aa", 0, 1, "transfer@01");
        let completed = reconciler.process_block(ShardId(0), &[outbound], Duration::ZERO);
        assert!(completed.is_empty());
        assert!(!reconciler.is_pending("aa"));
        assert_eq!(reconciler.pending_count(), 0);
    }

    #[test]
    fn test_unknown_inbound_is_skipped() {
        let mut reconciler = CrossShardReconciler::new(GRACE);

        let inbound = make_scr("cc", "aa", 0, 1, "transfer@01");
        let completed = reconciler.process_block(ShardId(1), &[inbound], Duration::ZERO);
        assert!(completed.is_empty());
        assert_eq!(reconciler.pending_count(), 0);
    }

    #[test]
    fn test_all_outbound_scrs_must_land() {
        let mut reconciler = CrossShardReconciler::new(GRACE);

        let seed = make_tx("aa", 0, 1);
        let first = make_scr("b1", "aa", 0, 1, "leg@01");
        let second = make_scr("b2", "aa", 0, 2, "leg@02");
        reconciler.process_block(ShardId(0), &[seed, first, second], Duration::ZERO);

        let landed_on_one = make_scr("c1", "aa", 0, 1, "leg@01");
        let completed =
            reconciler.process_block(ShardId(1), &[landed_on_one], Duration::from_secs(6));
        assert!(completed.is_empty());
        assert!(reconciler.is_pending("aa"));

        let landed_on_two = make_scr("c2", "aa", 0, 2, "leg@02");
        let completed =
            reconciler.process_block(ShardId(2), &[landed_on_two], Duration::from_secs(12));
        assert_eq!(completed.len(), 1);
        assert_eq!(completed[0].hash, "aa");
    }

    #[test]
    fn test_seed_is_captured_at_creation() {
        let mut reconciler = CrossShardReconciler::new(GRACE);

        let mut seed = make_tx("aa", 0, 1);
        seed.value = "1".to_owned();
        let outbound = make_scr("b1", "aa", 0, 1, "leg@01");
        reconciler.process_block(ShardId(0), &[seed, outbound], Duration::ZERO);

        // A later block re-presents the parent with a mutated value; the
        // stored seed must win.
        let mut mutated = make_tx("aa", 0, 1);
        mutated.value = "999".to_owned();
        let inbound = make_scr("c1", "aa", 0, 1, "leg@01");
        let completed =
            reconciler.process_block(ShardId(1), &[inbound.clone(), mutated], Duration::ZERO);

        // The parent hash appears in this block, so delivery defers to the
        // direct pass; re-run without it to observe the stored seed.
        assert!(completed.is_empty());
        assert!(!reconciler.is_pending("aa"));

        let mut reconciler = CrossShardReconciler::new(GRACE);
        let mut seed = make_tx("aa", 0, 1);
        seed.value = "1".to_owned();
        let outbound = make_scr("b1", "aa", 0, 1, "leg@01");
        reconciler.process_block(ShardId(0), &[seed, outbound], Duration::ZERO);
        let completed = reconciler.process_block(ShardId(1), &[inbound], Duration::ZERO);
        assert_eq!(completed[0].value, "1");
    }

    #[test]
    fn test_completed_in_first_touch_order() {
        let mut reconciler = CrossShardReconciler::new(GRACE);

        let seed_x = make_tx("xx", 0, 1);
        let seed_y = make_tx("yy", 0, 1);
        let out_y = make_scr("b1", "yy", 0, 1, "leg@01");
        let out_x = make_scr("b2", "xx", 0, 1, "leg@01");
        reconciler.process_block(ShardId(0), &[seed_x, seed_y, out_y, out_x], Duration::ZERO);

        // "yy" is touched before "xx" in the destination block.
        let in_y = make_scr("c1", "yy", 0, 1, "leg@01");
        let in_x = make_scr("c2", "xx", 0, 1, "leg@01");
        let completed = reconciler.process_block(ShardId(1), &[in_y, in_x], Duration::ZERO);

        let hashes: Vec<&str> = completed.iter().map(|tx| tx.hash.as_str()).collect();
        assert_eq!(hashes, ["yy", "xx"]);
    }

    #[test]
    fn test_prune_removes_entries_past_grace() {
        let mut reconciler = CrossShardReconciler::new(GRACE);

        let seed = make_tx("aa", 0, 1);
        let outbound = make_scr("bb", "aa", 0, 1, "transfer@01");
        reconciler.process_block(ShardId(0), &[seed, outbound], Duration::ZERO);

        assert!(reconciler.prune_stale(Duration::from_secs(599)).is_empty());
        assert!(reconciler.is_pending("aa"));

        let pruned = reconciler.prune_stale(Duration::from_secs(600));
        assert_eq!(pruned, ["aa".to_owned()]);
        assert!(!reconciler.is_pending("aa"));
    }

    #[test]
    fn test_pruned_entry_is_never_delivered() {
        let mut reconciler = CrossShardReconciler::new(GRACE);

        let seed = make_tx("aa", 0, 1);
        let outbound = make_scr("bb", "aa", 0, 1, "transfer@01");
        reconciler.process_block(ShardId(0), &[seed, outbound], Duration::ZERO);
        reconciler.prune_stale(Duration::from_secs(601));

        // The SCR finally lands, but the entry is gone: nothing is released.
        let inbound = make_scr("cc", "aa", 0, 1, "transfer@01");
        let completed =
            reconciler.process_block(ShardId(1), &[inbound], Duration::from_secs(602));
        assert!(completed.is_empty());
    }
}
