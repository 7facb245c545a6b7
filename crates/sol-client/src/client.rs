//! Connection: the shared client instance tying together the RPC
//! client, the blockhash cache, and confirmation waiting.
//!
//! All mutable protocol state (cached blockhash, signature sets, pending
//! subscriptions) is owned by the `Connection` value; there are no
//! globals. One `Connection` is meant to be shared (behind an `Arc`)
//! across concurrent call sites.

use std::time::Duration;

use sol_sdk::transaction::{SerializeConfig, Transaction};
use sol_sdk::{Signature, Signer};

use crate::blockhash_cache::{BlockhashCache, SignatureKind};
use crate::error::ClientError;
use crate::rpc::{Commitment, RpcClient, SendOptions, SimulationResult};
use crate::subscriptions::{SignatureNotification, SignatureSubscriptions};

/// Connection construction parameters.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub endpoint: String,
    pub commitment: Commitment,
    /// Per-request HTTP timeout.
    pub timeout: Duration,
    /// How long `confirm_transaction` waits before reporting an unknown
    /// outcome.
    pub confirmation_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:8899".to_owned(),
            commitment: Commitment::default(),
            timeout: Duration::from_secs(30),
            confirmation_timeout: Duration::from_secs(30),
        }
    }
}

/// Terminal result of waiting for a transaction confirmation.
///
/// `TimedOut` means the outcome is unknown: the transaction may still
/// land after the deadline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmationOutcome {
    Confirmed,
    Failed(String),
    TimedOut,
}

/// A client for a single RPC endpoint.
pub struct Connection {
    rpc: RpcClient,
    blockhash_cache: BlockhashCache,
    subscriptions: SignatureSubscriptions,
    commitment: Commitment,
    confirmation_timeout: Duration,
}

impl Connection {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let rpc = RpcClient::new_with_timeout(&config.endpoint, config.timeout)?;
        tracing::info!(
            endpoint = %rpc.endpoint(),
            commitment = config.commitment.as_str(),
            "connection initialized"
        );
        Ok(Self {
            rpc,
            blockhash_cache: BlockhashCache::new(config.commitment),
            subscriptions: SignatureSubscriptions::new(),
            commitment: config.commitment,
            confirmation_timeout: config.confirmation_timeout,
        })
    }

    pub fn commitment(&self) -> Commitment {
        self.commitment
    }

    /// Sign `transaction` under a collision-free blockhash and submit it.
    /// Returns the transaction's primary signature.
    pub async fn send_transaction(
        &self,
        transaction: &mut Transaction,
        signers: &[&dyn Signer],
    ) -> Result<Signature, ClientError> {
        self.send_transaction_with_options(transaction, signers, &SendOptions::default())
            .await
    }

    pub async fn send_transaction_with_options(
        &self,
        transaction: &mut Transaction,
        signers: &[&dyn Signer],
        options: &SendOptions,
    ) -> Result<Signature, ClientError> {
        self.blockhash_cache
            .assign_unique_blockhash(&self.rpc, transaction, signers, SignatureKind::Submitted)
            .await?;
        let wire = transaction.serialize(&SerializeConfig::default())?;
        self.send_raw_transaction(&wire, options).await
    }

    /// Submit already-serialized transaction bytes as-is: no blockhash
    /// management, no duplicate bookkeeping.
    pub async fn send_raw_transaction(
        &self,
        wire_transaction: &[u8],
        options: &SendOptions,
    ) -> Result<Signature, ClientError> {
        let signature = self.rpc.send_transaction(wire_transaction, options).await?;
        tracing::info!(%signature, "transaction submitted");
        Ok(signature)
    }

    /// Sign and simulate without submitting. Simulation reserves the
    /// signature in its own bookkeeping, so a later submission of the
    /// same bytes is still allowed.
    pub async fn simulate_transaction(
        &self,
        transaction: &mut Transaction,
        signers: &[&dyn Signer],
    ) -> Result<SimulationResult, ClientError> {
        self.blockhash_cache
            .assign_unique_blockhash(&self.rpc, transaction, signers, SignatureKind::Simulated)
            .await?;
        let wire = transaction.serialize(&SerializeConfig::default())?;
        self.rpc.simulate_transaction(&wire, self.commitment).await
    }

    /// Wait for a terminal notification about `signature`, up to the
    /// configured confirmation timeout. The underlying subscription is
    /// removed on every exit path, including cancellation.
    pub async fn confirm_transaction(&self, signature: &Signature) -> ConfirmationOutcome {
        let mut handle = self.subscriptions.subscribe(signature);
        let wait = async {
            loop {
                match handle.next().await {
                    // Pre-confirmation marker; keep waiting.
                    Some(SignatureNotification::Received) => continue,
                    Some(SignatureNotification::Status { err: None }) => {
                        break ConfirmationOutcome::Confirmed
                    }
                    Some(SignatureNotification::Status { err: Some(reason) }) => {
                        break ConfirmationOutcome::Failed(reason)
                    }
                    None => break ConfirmationOutcome::TimedOut,
                }
            }
        };
        match tokio::time::timeout(self.confirmation_timeout, wait).await {
            Ok(outcome) => outcome,
            Err(_) => {
                tracing::warn!(%signature, "confirmation wait timed out, outcome unknown");
                ConfirmationOutcome::TimedOut
            }
        }
    }

    /// Feed a notification from whatever transport watches the chain.
    /// Returns the number of waiters reached.
    pub fn deliver_signature_notification(
        &self,
        signature: &Signature,
        notification: &SignatureNotification,
    ) -> usize {
        self.subscriptions.notify(signature, notification)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn connection(confirmation_timeout: Duration) -> Arc<Connection> {
        Arc::new(
            Connection::new(ClientConfig {
                confirmation_timeout,
                ..ClientConfig::default()
            })
            .unwrap(),
        )
    }

    fn sig(byte: u8) -> Signature {
        Signature::new_from_array([byte; 64])
    }

    #[tokio::test(start_paused = true)]
    async fn confirm_reports_success() {
        let connection = connection(Duration::from_secs(30));
        let waiter = {
            let connection = connection.clone();
            tokio::spawn(async move { connection.confirm_transaction(&sig(1)).await })
        };
        // Let the waiter register its subscription.
        tokio::task::yield_now().await;

        connection.deliver_signature_notification(
            &sig(1),
            &SignatureNotification::Status { err: None },
        );
        assert_eq!(waiter.await.unwrap(), ConfirmationOutcome::Confirmed);
    }

    #[tokio::test(start_paused = true)]
    async fn confirm_reports_failure_reason() {
        let connection = connection(Duration::from_secs(30));
        let waiter = {
            let connection = connection.clone();
            tokio::spawn(async move { connection.confirm_transaction(&sig(2)).await })
        };
        tokio::task::yield_now().await;

        connection.deliver_signature_notification(&sig(2), &SignatureNotification::Received);
        connection.deliver_signature_notification(
            &sig(2),
            &SignatureNotification::Status {
                err: Some("InstructionError(0)".into()),
            },
        );
        assert_eq!(
            waiter.await.unwrap(),
            ConfirmationOutcome::Failed("InstructionError(0)".into())
        );
    }

    #[tokio::test(start_paused = true)]
    async fn confirm_times_out_without_notification() {
        let connection = connection(Duration::from_millis(100));
        let outcome = connection.confirm_transaction(&sig(3)).await;
        assert_eq!(outcome, ConfirmationOutcome::TimedOut);
        // The subscription must not leak past the timeout.
        assert_eq!(
            connection.deliver_signature_notification(&sig(3), &SignatureNotification::Received),
            0
        );
    }

    #[tokio::test(start_paused = true)]
    async fn received_alone_does_not_confirm() {
        let connection = connection(Duration::from_millis(100));
        let waiter = {
            let connection = connection.clone();
            tokio::spawn(async move { connection.confirm_transaction(&sig(4)).await })
        };
        tokio::task::yield_now().await;

        connection.deliver_signature_notification(&sig(4), &SignatureNotification::Received);
        assert_eq!(waiter.await.unwrap(), ConfirmationOutcome::TimedOut);
    }

    #[test]
    fn default_config_is_local_validator() {
        let config = ClientConfig::default();
        assert_eq!(config.endpoint, "http://127.0.0.1:8899");
        assert_eq!(config.commitment, Commitment::Confirmed);
    }
}
