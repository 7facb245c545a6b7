//! Asynchronous submission client for a Solana-compatible chain.
//!
//! Builds on the offline primitives in `sol-sdk` and adds the network
//! side: a narrow JSON-RPC client, the blockhash-freshness and
//! duplicate-signature-avoidance cache, signature notification
//! correlation, and transaction confirmation waiting.
//!
//! Logging goes through `tracing`; installing a subscriber is the
//! application's job.

pub mod blockhash_cache;
pub mod client;
pub mod error;
pub mod rpc;
pub mod subscriptions;
pub mod timing;

pub use blockhash_cache::{BlockhashCache, SignatureKind};
pub use client::{ClientConfig, ConfirmationOutcome, Connection};
pub use error::ClientError;
pub use rpc::{
    BlockhashSource, Commitment, LatestBlockhash, RpcClient, SendOptions, SimulationResult,
};
pub use subscriptions::{SignatureNotification, SignatureSubscriptions, SubscriptionHandle};
