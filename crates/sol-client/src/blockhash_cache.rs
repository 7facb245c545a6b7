//! Blockhash freshness cache and duplicate-signature avoidance.
//!
//! The network treats two byte-identical signed payloads as one
//! transaction and silently drops the second, so reusing a cached
//! blockhash is only safe while the resulting primary signature has not
//! been used before. The cache pairs each adopted blockhash with two
//! signature sets (one for simulation, one for submission) and forces a
//! blockhash refresh whenever a signature would collide.
//!
//! Locking discipline: cache fields live under a `std::sync::Mutex` held
//! only for field access, never across an await. The poll path is
//! single-flight via a `tokio::sync::Mutex` gate; concurrent callers
//! queue on the gate and pick up the freshly cached hash instead of
//! starting a second poll.

use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use sol_sdk::transaction::Transaction;
use sol_sdk::{Hash, SdkError, Signer};
use tokio::sync::Mutex as AsyncMutex;
use tokio::time::Instant;

use crate::error::ClientError;
use crate::rpc::{BlockhashSource, Commitment};
use crate::timing::{BLOCKHASH_CACHE_TTL, BLOCKHASH_POLL_ATTEMPTS, BLOCKHASH_POLL_INTERVAL};

/// What a signature is about to be used for. Simulation and submission
/// keep separate bookkeeping: a simulated signature does not block a
/// later submission of the identical bytes, but a submitted signature
/// blocks both.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureKind {
    Simulated,
    Submitted,
}

#[derive(Default)]
struct CacheState {
    blockhash: Option<Hash>,
    fetched_at: Option<Instant>,
    simulated: HashSet<String>,
    submitted: HashSet<String>,
}

/// Shared blockhash cache, one per connection.
pub struct BlockhashCache {
    state: Mutex<CacheState>,
    poll_gate: AsyncMutex<()>,
    commitment: Commitment,
}

impl BlockhashCache {
    pub fn new(commitment: Commitment) -> Self {
        Self {
            state: Mutex::new(CacheState::default()),
            poll_gate: AsyncMutex::new(()),
            commitment,
        }
    }

    /// Return a usable blockhash, fetching a new one when the cache is
    /// cold, stale, or explicitly disabled.
    pub async fn recent_blockhash<S: BlockhashSource>(
        &self,
        source: &S,
        disable_cache: bool,
    ) -> Result<Hash, ClientError> {
        if !disable_cache {
            if let Some(hash) = self.fresh_cached() {
                return Ok(hash);
            }
        }

        let _gate = self.poll_gate.lock().await;
        // A queued caller re-checks: the poll that just finished may have
        // refreshed the cache already.
        if !disable_cache {
            if let Some(hash) = self.fresh_cached() {
                return Ok(hash);
            }
        }
        self.poll_new_blockhash(source).await
    }

    /// Atomically reserve `signature` under the current blockhash.
    /// Returns false when the signature was already used, in which case
    /// the caller must refresh the blockhash and re-sign.
    pub fn try_record(&self, kind: SignatureKind, signature: &str) -> bool {
        let mut state = self.lock_state();
        match kind {
            SignatureKind::Submitted => state.submitted.insert(signature.to_owned()),
            SignatureKind::Simulated => {
                if state.submitted.contains(signature) {
                    return false;
                }
                state.simulated.insert(signature.to_owned())
            }
        }
    }

    /// Sign `transaction` under a blockhash whose primary signature has
    /// not been used before, recording the signature on success.
    ///
    /// Forces a cache-bypassing refresh on every collision; bounded by
    /// the poll loop's own attempt ceiling, since a refresh must observe
    /// a hash different from the cached one.
    pub async fn assign_unique_blockhash<S: BlockhashSource>(
        &self,
        source: &S,
        transaction: &mut Transaction,
        signers: &[&dyn Signer],
        kind: SignatureKind,
    ) -> Result<(), ClientError> {
        let mut disable_cache = false;
        loop {
            let blockhash = self.recent_blockhash(source, disable_cache).await?;
            transaction.recent_blockhash = Some(blockhash);
            transaction.sign(signers)?;
            let signature = transaction
                .primary_signature()
                .ok_or_else(|| SdkError::MissingSignature("fee payer".into()))?;
            let encoded = BASE64.encode(signature.as_bytes());
            if self.try_record(kind, &encoded) {
                return Ok(());
            }
            tracing::debug!(
                %blockhash,
                "signature already used under cached blockhash, forcing refresh"
            );
            disable_cache = true;
        }
    }

    fn fresh_cached(&self) -> Option<Hash> {
        let state = self.lock_state();
        match (state.blockhash, state.fetched_at) {
            (Some(hash), Some(at)) if at.elapsed() < BLOCKHASH_CACHE_TTL => Some(hash),
            _ => None,
        }
    }

    /// Poll until the source reports a hash different from the cached
    /// one, then adopt it and reset both signature sets. A source error
    /// aborts the poll; only "hash unchanged" observations are retried.
    async fn poll_new_blockhash<S: BlockhashSource>(&self, source: &S) -> Result<Hash, ClientError> {
        let cached = self.lock_state().blockhash;

        for attempt in 0..BLOCKHASH_POLL_ATTEMPTS {
            let hash = source.latest_blockhash(self.commitment).await?;
            if Some(hash) != cached {
                tracing::debug!(%hash, attempt, "adopted new blockhash");
                let mut state = self.lock_state();
                state.blockhash = Some(hash);
                state.fetched_at = Some(Instant::now());
                state.simulated.clear();
                state.submitted.clear();
                return Ok(hash);
            }
            tracing::debug!(attempt, "blockhash unchanged, retrying");
            tokio::time::sleep(BLOCKHASH_POLL_INTERVAL).await;
        }

        Err(ClientError::UnableToObtainNewBlockhash)
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
