//! Core types for the shardtail gateway follower.
//!
//! This crate provides the foundational records shared by the gateway client
//! and the follower:
//!
//! - **Identifiers**: [`ShardId`], [`Nonce`]
//! - **Gateway records**: [`ShardTransaction`], [`ShardBlock`]
//! - **Delivery metadata**: [`ProgressStats`]
//!
//! It is self-contained and does not depend on any other workspace crate.

mod identifiers;
mod stats;
mod transaction;

pub use identifiers::{Nonce, ShardId};
pub use stats::ProgressStats;
pub use transaction::{ShardBlock, ShardTransaction, SUCCESS_ACK_DATA};
