use thiserror::Error;

/// Errors produced while building, compiling, signing, or (de)serializing
/// transactions.
#[derive(Debug, Error)]
pub enum SdkError {
    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("invalid blockhash: {0}")]
    InvalidBlockhash(String),

    #[error("invalid signature: {0}")]
    InvalidSignature(String),

    #[error("transaction recent blockhash required")]
    MissingBlockhash,

    #[error("transaction fee payer required")]
    MissingFeePayer,

    #[error("unknown signer: {0}")]
    UnknownSigner(String),

    #[error("missing signer: {0}")]
    MissingSigner(String),

    #[error("missing signature for {0}")]
    MissingSignature(String),

    #[error("signature verification failed for {0}")]
    SignatureVerificationFailed(String),

    #[error("transaction build error: {0}")]
    TransactionBuildError(String),

    #[error("serialization error: {0}")]
    SerializationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_missing_blockhash() {
        assert_eq!(
            SdkError::MissingBlockhash.to_string(),
            "transaction recent blockhash required"
        );
    }

    #[test]
    fn display_missing_fee_payer() {
        assert_eq!(
            SdkError::MissingFeePayer.to_string(),
            "transaction fee payer required"
        );
    }

    #[test]
    fn display_unknown_signer() {
        let err = SdkError::UnknownSigner("4vJ9...".into());
        assert_eq!(err.to_string(), "unknown signer: 4vJ9...");
    }

    #[test]
    fn display_serialization_error() {
        let err = SdkError::SerializationError("short read".into());
        assert_eq!(err.to_string(), "serialization error: short read");
    }

    #[test]
    fn error_trait_is_implemented() {
        let err: Box<dyn std::error::Error> = Box::new(SdkError::MissingBlockhash);
        assert!(err.to_string().contains("blockhash"));
    }
}
