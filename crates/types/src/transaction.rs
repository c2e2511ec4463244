//! Transaction and block records as delivered by the gateway.

use crate::{Nonce, ShardId};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Decoded data of a success-acknowledgement smart-contract result.
///
/// Acknowledgements carry no semantic effect and are ignored by the
/// cross-shard counter discipline.
pub const SUCCESS_ACK_DATA: &str = "@6f6b";

/// One transaction as returned by the gateway.
///
/// Smart-contract results (SCRs) are represented with the same record; they
/// carry `original_transaction_hash` pointing at the logical parent
/// transaction that produced them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShardTransaction {
    pub hash: String,
    pub nonce: Nonce,
    #[serde(default)]
    pub sender: String,
    #[serde(default)]
    pub receiver: String,
    /// Decimal string, arbitrary precision.
    #[serde(default = "default_value")]
    pub value: String,
    #[serde(default)]
    pub status: String,
    /// Base64-encoded call data.
    #[serde(default)]
    pub data: Option<String>,
    #[serde(default)]
    pub source_shard: ShardId,
    #[serde(default)]
    pub destination_shard: ShardId,
    /// Hash of the logical parent transaction, present on SCRs.
    #[serde(default)]
    pub original_transaction_hash: Option<String>,
    #[serde(default)]
    pub gas_price: Option<u64>,
    #[serde(default)]
    pub gas_limit: Option<u64>,
    /// Modeled for wire compatibility; not consumed by the follower.
    #[serde(default)]
    pub previous_transaction_hash: Option<String>,

    /// Decoded call data, computed once on first access.
    #[serde(skip)]
    pub call_data: OnceLock<CallData>,
}

fn default_value() -> String {
    "0".to_owned()
}

impl Default for ShardTransaction {
    fn default() -> Self {
        Self {
            hash: String::new(),
            nonce: Nonce(0),
            sender: String::new(),
            receiver: String::new(),
            value: default_value(),
            status: String::new(),
            data: None,
            source_shard: ShardId(0),
            destination_shard: ShardId(0),
            original_transaction_hash: None,
            gas_price: None,
            gas_limit: None,
            previous_transaction_hash: None,
            call_data: OnceLock::new(),
        }
    }
}

impl ShardTransaction {
    /// Whether this record is a smart-contract result.
    pub fn is_smart_contract_result(&self) -> bool {
        self.original_transaction_hash.is_some()
    }

    /// The call data decoded to text.
    ///
    /// Empty when `data` is absent or not valid base64.
    pub fn data_text(&self) -> &str {
        &self.call_data().text
    }

    /// The invoked function name: the segment before the first `@`.
    pub fn function_name(&self) -> Option<&str> {
        self.call_data().function.as_deref()
    }

    /// The `@`-separated call arguments following the function name.
    pub fn arguments(&self) -> &[String] {
        &self.call_data().arguments
    }

    /// Whether this is a success-acknowledgement SCR (`@6f6b`).
    pub fn is_success_ack(&self) -> bool {
        self.data_text() == SUCCESS_ACK_DATA
    }

    fn call_data(&self) -> &CallData {
        self.call_data
            .get_or_init(|| CallData::decode(self.data.as_deref()))
    }
}

/// Lazily-derived view over the base64 `data` field.
#[derive(Debug, Clone, Default)]
pub struct CallData {
    text: String,
    function: Option<String>,
    arguments: Vec<String>,
}

impl CallData {
    fn decode(data: Option<&str>) -> Self {
        let Some(raw) = data else {
            return Self::default();
        };
        let Ok(bytes) = STANDARD.decode(raw) else {
            return Self::default();
        };
        let text = String::from_utf8_lossy(&bytes).into_owned();
        if text.is_empty() {
            return Self::default();
        }

        let mut segments = text.split('@');
        let function = segments
            .next()
            .filter(|name| !name.is_empty())
            .map(str::to_owned);
        let arguments = segments.map(str::to_owned).collect();

        Self {
            text,
            function,
            arguments,
        }
    }
}

/// A normalized block: hash plus all mini-block transactions flattened in
/// the order the gateway returned them.
#[derive(Debug, Clone, Default)]
pub struct ShardBlock {
    pub hash: String,
    pub transactions: Vec<ShardTransaction>,
}
