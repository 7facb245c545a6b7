//! Client-side error types.

use thiserror::Error;

/// Errors produced while talking to an RPC node or waiting for
/// transaction confirmation.
#[derive(Debug, Error)]
pub enum ClientError {
    /// A transaction failed to build, compile, sign, or serialize.
    #[error(transparent)]
    Sdk(#[from] sol_sdk::SdkError),

    /// Transport-level failure: connect, timeout, TLS, body read.
    #[error("http transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The endpoint URL did not parse.
    #[error("invalid rpc url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The node answered with a JSON-RPC error object.
    #[error("rpc error {code}: {message}")]
    Rpc { code: i64, message: String },

    /// The node's response did not have the shape we expected.
    #[error("malformed rpc response: {0}")]
    MalformedResponse(String),

    /// The blockhash poll loop exhausted its attempts without observing
    /// a hash different from the cached one.
    #[error("unable to obtain a new blockhash")]
    UnableToObtainNewBlockhash,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rpc_error_display() {
        let err = ClientError::Rpc {
            code: -32002,
            message: "Transaction simulation failed".into(),
        };
        assert_eq!(
            err.to_string(),
            "rpc error -32002: Transaction simulation failed"
        );
    }

    #[test]
    fn sdk_error_passes_through() {
        let err = ClientError::from(sol_sdk::SdkError::MissingBlockhash);
        assert_eq!(err.to_string(), "transaction recent blockhash required");
    }
}
