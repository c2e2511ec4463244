//! Shard-aware transaction follower.
//!
//! Tails a sharded ledger through its gateway API: each shard's blocks are
//! fetched in nonce order, their transactions are delivered to a
//! [`TransactionHandler`] together with progress statistics, and the
//! per-shard cursor is persisted through a [`CursorStore`]. Transactions
//! whose execution spans shards are reassembled by the
//! [`CrossShardReconciler`] and surfaced once all of their smart-contract
//! results have finalized.
//!
//! ```text
//! ┌─────────────────┐     ┌──────────────────┐     ┌─────────────────────┐
//! │  GatewayApi     │────▶│  Follower        │────▶│ CrossShardReconciler│
//! │ (blocks, tips)  │     │ (cursor sweep)   │     │ (counter table)     │
//! └─────────────────┘     └──────┬───────────┘     └──────────┬──────────┘
//!                                │                            │
//!                         ┌──────▼───────────┐     ┌──────────▼──────────┐
//!                         │  CursorStore     │     │ TransactionHandler  │
//!                         │ (last nonce)     │     │ (consumer)          │
//!                         └──────────────────┘     └─────────────────────┘
//! ```
//!
//! Shards are visited strictly serially within a run; a single
//! [`Follower::run`] advances every shard to its estimated tip and returns,
//! leaving re-invocation cadence to the caller.

pub mod clock;
pub mod config;
pub mod error;
pub mod estimator;
pub mod handler;
pub mod reconciler;
pub mod store;

mod follower;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{FollowerConfig, PRUNE_GRACE, ROUND_DURATION};
pub use error::{BoxError, FollowerError};
pub use estimator::TipEstimator;
pub use follower::{Follower, RunReport};
pub use handler::TransactionHandler;
pub use reconciler::{CrossShardReconciler, CROSS_SHARD_TOPIC};
pub use store::{CursorStore, MemoryCursorStore};
