//! Follower orchestrator and per-shard cursor loop.

use crate::clock::{Clock, SystemClock};
use crate::config::FollowerConfig;
use crate::error::FollowerError;
use crate::estimator::TipEstimator;
use crate::handler::TransactionHandler;
use crate::reconciler::{CrossShardReconciler, CROSS_SHARD_TOPIC};
use crate::store::{CursorStore, MemoryCursorStore};
use futures::future::try_join_all;
use serde::Serialize;
use shardtail_gateway::GatewayApi;
use shardtail_types::{Nonce, ProgressStats, ShardId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Summary of one completed run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    /// Full passes over the shard set.
    pub sweeps: u64,
    /// Blocks fetched and processed.
    pub blocks_processed: u64,
    /// Transactions handed to the consumer.
    pub transactions_delivered: u64,
    /// Logical transactions released through cross-shard reconciliation.
    pub cross_shard_completed: u64,
    /// Stale reconciler entries dropped before the sweep.
    pub entries_pruned: u64,
}

/// Outcome of one shard visit within a sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ShardProgress {
    /// The cursor has caught up with the estimated tip.
    AtTip,
    /// The next block is not available on the gateway yet.
    Waiting,
    /// One block was processed and the cursor advanced.
    Advanced,
}

/// State carried across runs, guarded by the run lock.
struct SweepState {
    reconciler: CrossShardReconciler,
    /// Discovered once, on the first run.
    shard_ids: Option<Vec<ShardId>>,
}

/// Tails every shard of the ledger toward its tip.
///
/// One `run` walks all shards in id order, delivering each new block's
/// transactions to the handler and advancing the per-shard cursor, until
/// every shard has caught up with its estimated tip. The caller invokes
/// `run` again on its own schedule; cursors (and in-flight cross-shard
/// state) carry over between runs.
///
/// Shards are visited strictly serially: reconciler updates from a block are
/// fully applied before that block's delivery, and nothing from another
/// shard interleaves.
pub struct Follower {
    config: FollowerConfig,
    gateway: Arc<dyn GatewayApi>,
    store: Arc<dyn CursorStore>,
    handler: Arc<dyn TransactionHandler>,
    clock: Arc<dyn Clock>,
    /// Run-exclusivity lock and cross-run state. `try_lock` failing is the
    /// already-running signal; dropping the guard releases it on every exit
    /// path.
    state: Mutex<SweepState>,
}

impl Follower {
    /// Create a follower with the default configuration, an in-memory
    /// cursor store, and the system clock.
    pub fn new(gateway: Arc<dyn GatewayApi>, handler: Arc<dyn TransactionHandler>) -> Self {
        let config = FollowerConfig::default();
        Self {
            state: Mutex::new(SweepState {
                reconciler: CrossShardReconciler::new(config.prune_grace),
                shard_ids: None,
            }),
            config,
            gateway,
            store: Arc::new(MemoryCursorStore::new()),
            handler,
            clock: Arc::new(SystemClock::new()),
        }
    }

    /// Replace the configuration.
    pub fn with_config(mut self, config: FollowerConfig) -> Self {
        self.state = Mutex::new(SweepState {
            reconciler: CrossShardReconciler::new(config.prune_grace),
            shard_ids: None,
        });
        self.config = config;
        self
    }

    /// Use an external cursor store.
    pub fn with_store(mut self, store: Arc<dyn CursorStore>) -> Self {
        self.store = store;
        self
    }

    /// Use an alternative time source.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Number of cross-shard transactions currently in flight.
    pub async fn pending_cross_shard_count(&self) -> usize {
        self.state.lock().await.reconciler.pending_count()
    }

    /// Advance every shard to its tip, delivering new blocks on the way.
    ///
    /// Fails with [`FollowerError::AlreadyRunning`] when invoked while
    /// another run on this instance is active. Store and handler errors
    /// abort the run; the affected shard's cursor is left unadvanced, so the
    /// same block is re-delivered on the next run.
    pub async fn run(&self) -> Result<RunReport, FollowerError> {
        let mut state = self
            .state
            .try_lock()
            .map_err(|_| FollowerError::AlreadyRunning)?;
        let run_started = self.clock.now();
        let mut report = RunReport::default();

        // Stale entries must never survive into delivery.
        let pruned = state.reconciler.prune_stale(run_started);
        report.entries_pruned = pruned.len() as u64;
        for hash in pruned {
            self.handler
                .on_log(CROSS_SHARD_TOPIC, &format!("pruned stale entry for {hash}"));
        }

        if state.shard_ids.is_none() {
            let ids = self.gateway.shard_ids().await?;
            info!(shards = ids.len(), "Discovered shard set");
            state.shard_ids = Some(ids);
        }
        let shards = state.shard_ids.clone().unwrap_or_default();

        // One tip poll per shard per run; the estimator projects from here.
        let gateway = &self.gateway;
        let baselines = try_join_all(shards.iter().map(|&shard| async move {
            let tip = gateway.tip_nonce(shard).await?;
            Ok::<_, FollowerError>((shard, tip))
        }))
        .await?;

        let mut estimator = TipEstimator::new(self.config.round_duration);
        let captured_at = self.clock.now();
        for (shard, tip) in baselines {
            debug!(%shard, tip = tip.0, "Captured tip baseline");
            estimator.record_baseline(shard, tip, captured_at);
        }

        // First cursor position seen per shard this run, for statistics.
        let mut start_positions: HashMap<ShardId, Nonce> = HashMap::new();

        loop {
            report.sweeps += 1;
            let mut reached_tip = true;

            for &shard in &shards {
                let progress = self
                    .visit_shard(
                        &mut state.reconciler,
                        &estimator,
                        &mut start_positions,
                        shard,
                        run_started,
                        &mut report,
                    )
                    .await?;
                if progress != ShardProgress::AtTip {
                    reached_tip = false;
                }
            }

            if reached_tip {
                break;
            }
        }

        info!(
            sweeps = report.sweeps,
            blocks = report.blocks_processed,
            transactions = report.transactions_delivered,
            "Run complete, all shards at tip"
        );
        Ok(report)
    }

    /// One cursor-loop step for one shard.
    async fn visit_shard(
        &self,
        reconciler: &mut CrossShardReconciler,
        estimator: &TipEstimator,
        start_positions: &mut HashMap<ShardId, Nonce>,
        shard: ShardId,
        run_started: Duration,
        report: &mut RunReport,
    ) -> Result<ShardProgress, FollowerError> {
        let now = self.clock.now();
        let Some(current) = estimator.estimated_tip(shard, now) else {
            return Ok(ShardProgress::AtTip);
        };

        let mut last = match self
            .store
            .load(shard, current)
            .await
            .map_err(FollowerError::Store)?
        {
            Some(last) => last,
            None => {
                // First observation: start at the tip, no history backfill.
                let seeded = Nonce(current.0.saturating_sub(1));
                debug!(%shard, cursor = seeded.0, "Seeding cursor at the tip");
                self.store
                    .save(shard, seeded)
                    .await
                    .map_err(FollowerError::Store)?;
                seeded
            }
        };

        if last == current {
            return Ok(ShardProgress::AtTip);
        }

        if last > current {
            // Nonce reset on a test network: realign downward and persist so
            // the next pass observes the realigned cursor.
            warn!(
                %shard,
                stored = last.0,
                tip = current.0,
                "Stored cursor above live tip, realigning"
            );
            last = current;
            self.store
                .save(shard, last)
                .await
                .map_err(FollowerError::Store)?;
        }

        if let Some(max_look_behind) = self.config.max_look_behind {
            if current.distance_from(last) > max_look_behind {
                last = Nonce(current.0 - max_look_behind);
                debug!(%shard, cursor = last.0, "Capping replay depth on reconnect");
            }
        }

        let nonce = last.next();
        let start_position = *start_positions.entry(shard).or_insert(last);

        let Some(block) = self.gateway.block_by_nonce(shard, nonce).await else {
            return Ok(ShardProgress::Waiting);
        };

        let mut delivered = Vec::new();
        if self.config.wait_for_finalized_cross_shard_results {
            let completed = reconciler.process_block(shard, &block.transactions, now);
            report.cross_shard_completed += completed.len() as u64;
            for tx in &completed {
                self.handler.on_log(
                    CROSS_SHARD_TOPIC,
                    &format!("completed cross-shard transaction {}", tx.hash),
                );
            }
            delivered.extend(completed);
        }
        for tx in &block.transactions {
            let routed_here = tx.destination_shard == shard
                || self.config.include_cross_shard_started_transactions;
            // A transaction whose SCR chain is still in flight is held back;
            // it surfaces through the reconciler once complete.
            if routed_here && !reconciler.is_pending(&tx.hash) {
                delivered.push(tx.clone());
            }
        }

        if !delivered.is_empty() || self.config.notify_empty_blocks {
            let stats = ProgressStats::compute(
                now.saturating_sub(run_started),
                last.distance_from(start_position),
                current.distance_from(last),
            );
            debug!(%shard, %nonce, transactions = delivered.len(), "Delivering block");
            self.handler
                .on_transactions(shard, nonce, &delivered, &stats, &block.hash)
                .await
                .map_err(FollowerError::Handler)?;
            report.transactions_delivered += delivered.len() as u64;
        }

        self.store
            .save(shard, nonce)
            .await
            .map_err(FollowerError::Store)?;
        report.blocks_processed += 1;

        Ok(ShardProgress::Advanced)
    }
}

impl fmt::Debug for Follower {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Follower")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
