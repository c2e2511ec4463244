//! Gateway client for the shardtail follower.
//!
//! Normalizes the gateway's `data`-envelope JSON responses into the domain
//! records of `shardtail_types`:
//!
//! - [`client`]: the [`GatewayApi`] trait and its HTTP implementation
//! - [`wire`]: typed response payloads

mod client;
mod wire;

pub use client::{GatewayApi, GatewayClient, GatewayError};
