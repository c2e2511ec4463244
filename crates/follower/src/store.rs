//! Cursor persistence.
//!
//! The follower persists a single nonce per shard: the last block it has
//! delivered. Persistence is abstract so the cursor can live in an external
//! database; [`MemoryCursorStore`] is the process-local default.

use crate::error::BoxError;
use async_trait::async_trait;
use shardtail_types::{Nonce, ShardId};
use std::collections::HashMap;
use std::sync::Mutex;

/// Last-processed nonce storage, one entry per shard.
#[async_trait]
pub trait CursorStore: Send + Sync {
    /// Load the cursor for a shard.
    ///
    /// `current` is the live tip estimate at the time of the call, for
    /// backends that derive an initial position. `None` means no cursor has
    /// been stored yet; the follower then starts at the tip.
    async fn load(&self, shard: ShardId, current: Nonce) -> Result<Option<Nonce>, BoxError>;

    /// Persist the cursor for a shard.
    async fn save(&self, shard: ShardId, nonce: Nonce) -> Result<(), BoxError>;
}

/// In-memory cursor store.
///
/// Cursors live for the lifetime of the value; a restarted process starts
/// back at the tip.
#[derive(Debug, Default)]
pub struct MemoryCursorStore {
    cursors: Mutex<HashMap<ShardId, Nonce>>,
}

impl MemoryCursorStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CursorStore for MemoryCursorStore {
    async fn load(&self, shard: ShardId, _current: Nonce) -> Result<Option<Nonce>, BoxError> {
        Ok(self.cursors.lock().unwrap().get(&shard).copied())
    }

    async fn save(&self, shard: ShardId, nonce: Nonce) -> Result<(), BoxError> {
        self.cursors.lock().unwrap().insert(shard, nonce);
        Ok(())
    }
}
