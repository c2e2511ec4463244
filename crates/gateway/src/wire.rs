//! Typed wire layer for gateway responses.
//!
//! Every gateway response wraps its payload under a top-level `data`
//! envelope, with `error`/`code` fields alongside. Only the fields the
//! follower consumes are modeled.

use crate::client::GatewayError;
use serde::Deserialize;
use shardtail_types::{ShardBlock, ShardTransaction};

/// Top-level gateway response envelope.
#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub(crate) struct Envelope<T> {
    #[serde(default)]
    pub data: Option<T>,
    #[serde(default)]
    pub error: String,
}

impl<T> Envelope<T> {
    /// Unwrap the payload, mapping a missing `data` field to the gateway's
    /// own error string.
    pub fn into_data(self) -> Result<T, GatewayError> {
        self.data.ok_or(GatewayError::Gateway(self.error))
    }
}

/// Payload of `GET /network/config`.
#[derive(Debug, Deserialize)]
pub(crate) struct NetworkConfigData {
    pub config: NetworkConfig,
}

#[derive(Debug, Deserialize)]
pub(crate) struct NetworkConfig {
    #[serde(rename = "erd_num_shards_without_meta")]
    pub num_shards_without_meta: u32,
}

/// Payload of `GET /network/status/{shard}`.
#[derive(Debug, Deserialize)]
pub(crate) struct NetworkStatusData {
    pub status: NetworkStatus,
}

#[derive(Debug, Deserialize)]
pub(crate) struct NetworkStatus {
    #[serde(rename = "erd_nonce")]
    pub nonce: u64,
}

/// Payload of `GET /block/{shard}/by-nonce/{nonce}`.
///
/// `block` is absent when the nonce has not been committed yet.
#[derive(Debug, Deserialize)]
pub(crate) struct BlockData {
    #[serde(default)]
    pub block: Option<BlockWire>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct BlockWire {
    pub hash: String,
    #[serde(default)]
    pub mini_blocks: Vec<MiniBlockWire>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MiniBlockWire {
    #[serde(default)]
    pub transactions: Vec<ShardTransaction>,
}

impl BlockWire {
    /// Flatten all mini-block transactions in gateway order.
    pub fn into_block(self) -> ShardBlock {
        ShardBlock {
            hash: self.hash,
            transactions: self
                .mini_blocks
                .into_iter()
                .flat_map(|mini_block| mini_block.transactions)
                .collect(),
        }
    }
}
