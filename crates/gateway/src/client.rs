//! HTTP client for the gateway API.

use crate::wire::{BlockData, Envelope, NetworkConfigData, NetworkStatusData};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use shardtail_types::{Nonce, ShardBlock, ShardId};
use std::time::Duration;
use tracing::debug;

/// Read interface over the gateway.
///
/// The follower is written against this trait; [`GatewayClient`] is the HTTP
/// implementation and tests substitute scripted ones.
#[async_trait]
pub trait GatewayApi: Send + Sync {
    /// All shard ids: the execution shards in order, then the metachain.
    async fn shard_ids(&self) -> Result<Vec<ShardId>, GatewayError>;

    /// Highest committed nonce on a shard.
    async fn tip_nonce(&self, shard: ShardId) -> Result<Nonce, GatewayError>;

    /// Fetch the block at `(shard, nonce)` together with its transactions.
    ///
    /// Returns `None` when the block is not yet available or the response
    /// cannot be decoded; the caller retries on a later sweep. The gateway is
    /// eventually consistent near the tip, so transient failures here are the
    /// normal case, not an error.
    async fn block_by_nonce(&self, shard: ShardId, nonce: Nonce) -> Option<ShardBlock>;
}

/// Client for the gateway HTTP API.
pub struct GatewayClient {
    base_url: String,
    http: Client,
}

impl GatewayClient {
    /// Default public gateway endpoint.
    pub const DEFAULT_URL: &'static str = "https://gateway.elrond.com";

    /// Create a client against the given base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }

        Self { base_url, http }
    }

    /// Get the base URL of this client.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET a path and unwrap the `data` envelope.
    async fn get_data<T: DeserializeOwned>(&self, path: &str) -> Result<T, GatewayError> {
        let envelope: Envelope<T> = self
            .http
            .get(format!("{}/{}", self.base_url, path))
            .send()
            .await?
            .json()
            .await?;
        envelope.into_data()
    }
}

impl Default for GatewayClient {
    fn default() -> Self {
        Self::new(Self::DEFAULT_URL)
    }
}

#[async_trait]
impl GatewayApi for GatewayClient {
    async fn shard_ids(&self) -> Result<Vec<ShardId>, GatewayError> {
        let data: NetworkConfigData = self.get_data("network/config").await?;

        let mut ids: Vec<ShardId> = (0..data.config.num_shards_without_meta)
            .map(ShardId)
            .collect();
        ids.push(ShardId::METACHAIN);
        Ok(ids)
    }

    async fn tip_nonce(&self, shard: ShardId) -> Result<Nonce, GatewayError> {
        let data: NetworkStatusData = self
            .get_data(&format!("network/status/{}", shard.0))
            .await?;
        Ok(Nonce(data.status.nonce))
    }

    async fn block_by_nonce(&self, shard: ShardId, nonce: Nonce) -> Option<ShardBlock> {
        let path = format!("block/{}/by-nonce/{}?withTxs=true", shard.0, nonce.0);
        match self.get_data::<BlockData>(&path).await {
            Ok(data) => data.block.map(|block| block.into_block()),
            Err(error) => {
                debug!(%shard, %nonce, %error, "Block not available");
                None
            }
        }
    }
}

/// Gateway request errors.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("gateway returned no data: {0}")]
    Gateway(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_slash_trimmed() {
        let client = GatewayClient::new("https://gateway.example.com///");
        assert_eq!(client.base_url(), "https://gateway.example.com");
    }

    #[test]
    fn test_default_points_at_public_gateway() {
        let client = GatewayClient::default();
        assert_eq!(client.base_url(), GatewayClient::DEFAULT_URL);
    }
}
