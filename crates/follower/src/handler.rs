//! Consumer interface.

use crate::error::BoxError;
use async_trait::async_trait;
use shardtail_types::{Nonce, ProgressStats, ShardId, ShardTransaction};

/// Consumer of delivered transaction batches.
///
/// `on_transactions` is awaited before the shard's cursor advances: a
/// returned error aborts the run and the same block is re-delivered on the
/// next one (at-least-once).
#[async_trait]
pub trait TransactionHandler: Send + Sync {
    /// Receive the finalized transactions of one block.
    ///
    /// `transactions` holds newly-completed cross-shard transactions first,
    /// then the block's own deliverable transactions in gateway order. The
    /// list may be empty when empty-block notification is enabled.
    async fn on_transactions(
        &self,
        shard: ShardId,
        nonce: Nonce,
        transactions: &[ShardTransaction],
        stats: &ProgressStats,
        block_hash: &str,
    ) -> Result<(), BoxError>;

    /// Advisory log hook.
    ///
    /// Receives audit messages such as cross-shard completions and pruned
    /// entries. Purely informational; structured tracing output is emitted
    /// regardless. The default does nothing.
    fn on_log(&self, topic: &str, message: &str) {
        let _ = (topic, message);
    }
}
