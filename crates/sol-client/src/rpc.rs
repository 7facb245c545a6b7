//! Narrow JSON-RPC 2.0 client.
//!
//! Only the three methods the submission protocol needs: blockhash
//! fetching, raw transaction submission, and simulation. Wire
//! transactions travel base64-encoded; remote error payloads are
//! surfaced verbatim as [`ClientError::Rpc`].

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sol_sdk::{Hash, SdkError, Signature};
use url::Url;

use crate::error::ClientError;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Read durability level, passed through to the node opaquely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Commitment {
    Processed,
    #[default]
    Confirmed,
    Finalized,
}

impl Commitment {
    pub fn as_str(self) -> &'static str {
        match self {
            Commitment::Processed => "processed",
            Commitment::Confirmed => "confirmed",
            Commitment::Finalized => "finalized",
        }
    }
}

/// Options forwarded with `sendTransaction`.
#[derive(Debug, Clone, Default)]
pub struct SendOptions {
    pub skip_preflight: bool,
    pub preflight_commitment: Option<Commitment>,
    pub max_retries: Option<usize>,
}

/// Result of `getLatestBlockhash`.
#[derive(Debug, Clone, Copy)]
pub struct LatestBlockhash {
    pub blockhash: Hash,
    pub last_valid_block_height: u64,
}

/// Result of `simulateTransaction`. `err` is `None` when the simulated
/// execution succeeded.
#[derive(Debug, Clone, Deserialize)]
pub struct SimulationResult {
    pub err: Option<Value>,
    pub logs: Option<Vec<String>>,
    #[serde(rename = "unitsConsumed")]
    pub units_consumed: Option<u64>,
}

/// Anything that can produce the chain's latest blockhash. Implemented by
/// [`RpcClient`]; the cache protocol is written against this seam so it
/// can be exercised without a network.
pub trait BlockhashSource {
    fn latest_blockhash(
        &self,
        commitment: Commitment,
    ) -> impl Future<Output = Result<Hash, ClientError>> + Send;
}

#[derive(Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcErrorObject>,
}

#[derive(Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

impl<T> RpcResponse<T> {
    fn into_result(self, method: &str) -> Result<T, ClientError> {
        if let Some(error) = self.error {
            tracing::warn!(method, code = error.code, message = %error.message, "rpc error response");
            return Err(ClientError::Rpc {
                code: error.code,
                message: error.message,
            });
        }
        self.result.ok_or_else(|| {
            ClientError::MalformedResponse(format!("{method}: neither result nor error present"))
        })
    }
}

/// Responses like `getLatestBlockhash` and `simulateTransaction` wrap
/// their payload in a `{ context, value }` envelope.
#[derive(Deserialize)]
struct WithContext<T> {
    value: T,
}

/// HTTP JSON-RPC client for a single endpoint.
pub struct RpcClient {
    http: reqwest::Client,
    endpoint: Url,
    next_id: AtomicU64,
}

impl RpcClient {
    pub fn new(endpoint: &str) -> Result<Self, ClientError> {
        Self::new_with_timeout(endpoint, DEFAULT_TIMEOUT)
    }

    pub fn new_with_timeout(endpoint: &str, timeout: Duration) -> Result<Self, ClientError> {
        let endpoint: Url = endpoint.parse()?;
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            endpoint,
            next_id: AtomicU64::new(1),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    async fn call<R: DeserializeOwned>(&self, method: &str, params: Value) -> Result<R, ClientError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = RpcRequest {
            jsonrpc: "2.0",
            id,
            method,
            params,
        };
        tracing::debug!(method, id, "rpc request");
        let response = self
            .http
            .post(self.endpoint.clone())
            .json(&request)
            .send()
            .await?;
        let body: RpcResponse<R> = response.json().await?;
        body.into_result(method)
    }

    /// Fetch the latest blockhash at the given commitment level.
    pub async fn get_latest_blockhash(
        &self,
        commitment: Commitment,
    ) -> Result<LatestBlockhash, ClientError> {
        #[derive(Deserialize)]
        struct BlockhashValue {
            blockhash: String,
            #[serde(rename = "lastValidBlockHeight")]
            last_valid_block_height: u64,
        }

        let envelope: WithContext<BlockhashValue> = self
            .call(
                "getLatestBlockhash",
                json!([{ "commitment": commitment.as_str() }]),
            )
            .await?;
        let blockhash = envelope.value.blockhash.parse().map_err(|e: SdkError| {
            ClientError::MalformedResponse(format!("invalid blockhash in response: {e}"))
        })?;
        Ok(LatestBlockhash {
            blockhash,
            last_valid_block_height: envelope.value.last_valid_block_height,
        })
    }

    /// Submit fully serialized transaction bytes. Returns the
    /// transaction's primary signature as reported by the node.
    pub async fn send_transaction(
        &self,
        wire_transaction: &[u8],
        options: &SendOptions,
    ) -> Result<Signature, ClientError> {
        let encoded = BASE64.encode(wire_transaction);
        let signature: String = self
            .call("sendTransaction", json!([encoded, send_config(options)]))
            .await?;
        signature.parse().map_err(|e: SdkError| {
            ClientError::MalformedResponse(format!("invalid signature in response: {e}"))
        })
    }

    /// Simulate fully serialized transaction bytes without submitting.
    pub async fn simulate_transaction(
        &self,
        wire_transaction: &[u8],
        commitment: Commitment,
    ) -> Result<SimulationResult, ClientError> {
        let encoded = BASE64.encode(wire_transaction);
        let envelope: WithContext<SimulationResult> = self
            .call(
                "simulateTransaction",
                json!([encoded, { "encoding": "base64", "commitment": commitment.as_str() }]),
            )
            .await?;
        Ok(envelope.value)
    }
}

impl BlockhashSource for RpcClient {
    async fn latest_blockhash(&self, commitment: Commitment) -> Result<Hash, ClientError> {
        Ok(self.get_latest_blockhash(commitment).await?.blockhash)
    }
}

fn send_config(options: &SendOptions) -> Value {
    let mut config = serde_json::Map::new();
    config.insert("encoding".into(), json!("base64"));
    config.insert("skipPreflight".into(), json!(options.skip_preflight));
    if let Some(commitment) = options.preflight_commitment {
        config.insert("preflightCommitment".into(), json!(commitment.as_str()));
    }
    if let Some(max_retries) = options.max_retries {
        config.insert("maxRetries".into(), json!(max_retries));
    }
    Value::Object(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commitment_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Commitment::Finalized).unwrap(), "\"finalized\"");
        assert_eq!(Commitment::default().as_str(), "confirmed");
    }

    #[test]
    fn send_config_omits_unset_options() {
        let config = send_config(&SendOptions::default());
        assert_eq!(
            config,
            json!({ "encoding": "base64", "skipPreflight": false })
        );
    }

    #[test]
    fn send_config_includes_set_options() {
        let config = send_config(&SendOptions {
            skip_preflight: true,
            preflight_commitment: Some(Commitment::Processed),
            max_retries: Some(3),
        });
        assert_eq!(
            config,
            json!({
                "encoding": "base64",
                "skipPreflight": true,
                "preflightCommitment": "processed",
                "maxRetries": 3,
            })
        );
    }

    #[test]
    fn response_error_maps_to_rpc_error() {
        let body: RpcResponse<String> = serde_json::from_str(
            r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32002,"message":"Transaction simulation failed"}}"#,
        )
        .unwrap();
        let err = body.into_result("sendTransaction").unwrap_err();
        assert!(matches!(err, ClientError::Rpc { code: -32002, .. }));
    }

    #[test]
    fn response_without_result_or_error_is_malformed() {
        let body: RpcResponse<String> =
            serde_json::from_str(r#"{"jsonrpc":"2.0","id":1}"#).unwrap();
        assert!(matches!(
            body.into_result("getLatestBlockhash").unwrap_err(),
            ClientError::MalformedResponse(_)
        ));
    }

    #[test]
    fn blockhash_envelope_deserializes() {
        let body: RpcResponse<WithContext<SimulationResult>> = serde_json::from_str(
            r#"{"jsonrpc":"2.0","id":1,"result":{"context":{"slot":123},"value":{"err":null,"logs":["Program 11111111111111111111111111111111 invoke [1]"],"unitsConsumed":150}}}"#,
        )
        .unwrap();
        let result = body.into_result("simulateTransaction").unwrap().value;
        assert!(result.err.is_none());
        assert_eq!(result.units_consumed, Some(150));
        assert_eq!(result.logs.as_ref().map(Vec::len), Some(1));
    }
}
