//! Follower error taxonomy.

use shardtail_gateway::GatewayError;

/// Boxed error type for user-supplied adapters (cursor stores, handlers).
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors surfaced by [`Follower::run`](crate::Follower::run).
///
/// Block fetch failures never appear here: an unavailable block leaves the
/// shard's cursor unchanged and is retried on a later run.
#[derive(Debug, thiserror::Error)]
pub enum FollowerError {
    /// `run` was invoked while another run on the same instance is active.
    #[error("a run is already in progress")]
    AlreadyRunning,

    /// Shard discovery or tip lookup failed at run start.
    #[error("gateway request failed: {0}")]
    Gateway(#[from] GatewayError),

    /// The cursor store rejected a load or save.
    #[error("cursor store failed: {0}")]
    Store(#[source] BoxError),

    /// The transaction handler rejected a delivery. The affected shard's
    /// cursor was not advanced, so the block is re-delivered next run.
    #[error("transaction handler failed: {0}")]
    Handler(#[source] BoxError),
}
