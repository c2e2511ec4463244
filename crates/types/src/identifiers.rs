//! Shard and nonce identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of one ledger partition.
///
/// Execution shards are numbered `0..N`; the metachain carries the all-ones
/// sentinel value. The full set of live ids is discovered from the gateway's
/// network config at startup.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct ShardId(pub u32);

impl ShardId {
    /// The metachain sentinel (`4294967295`).
    pub const METACHAIN: ShardId = ShardId(u32::MAX);

    /// Whether this id is the metachain sentinel.
    pub fn is_metachain(&self) -> bool {
        *self == Self::METACHAIN
    }
}

impl fmt::Display for ShardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_metachain() {
            write!(f, "meta")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

/// Sequence number of a block within one shard.
///
/// Monotonically increasing per shard under normal operation. Test networks
/// may reset nonces to zero; the follower realigns its cursor downward when a
/// stored nonce exceeds the live tip.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Nonce(pub u64);

impl Nonce {
    /// The following nonce.
    pub fn next(&self) -> Nonce {
        Nonce(self.0 + 1)
    }

    /// Nonce distance, saturating at zero.
    pub fn distance_from(&self, earlier: Nonce) -> u64 {
        self.0.saturating_sub(earlier.0)
    }
}

impl fmt::Display for Nonce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metachain_sentinel() {
        assert_eq!(ShardId::METACHAIN.0, 4_294_967_295);
        assert!(ShardId::METACHAIN.is_metachain());
        assert!(!ShardId(0).is_metachain());
    }

    #[test]
    fn test_shard_display() {
        assert_eq!(ShardId(2).to_string(), "2");
        assert_eq!(ShardId::METACHAIN.to_string(), "meta");
    }

    #[test]
    fn test_nonce_arithmetic() {
        assert_eq!(Nonce(41).next(), Nonce(42));
        assert_eq!(Nonce(100).distance_from(Nonce(90)), 10);
        assert_eq!(Nonce(90).distance_from(Nonce(100)), 0);
    }
}
