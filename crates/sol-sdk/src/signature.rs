//! Ed25519 transaction signatures.

use std::fmt;
use std::str::FromStr;

use crate::error::SdkError;
use crate::pubkey::Pubkey;

/// Byte length of a signature.
pub const SIGNATURE_BYTES: usize = 64;

/// A 64-byte Ed25519 signature over serialized message bytes.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Signature([u8; SIGNATURE_BYTES]);

impl Signature {
    pub const fn new_from_array(bytes: [u8; SIGNATURE_BYTES]) -> Self {
        Self(bytes)
    }

    pub fn to_bytes(self) -> [u8; SIGNATURE_BYTES] {
        self.0
    }

    pub fn as_bytes(&self) -> &[u8; SIGNATURE_BYTES] {
        &self.0
    }

    /// Verify this signature against the claimed public key and message
    /// bytes. A key that is not a valid Ed25519 point fails verification.
    pub fn verify(&self, pubkey: &Pubkey, message: &[u8]) -> bool {
        let Ok(verifying_key) = ed25519_dalek::VerifyingKey::from_bytes(pubkey.as_bytes()) else {
            return false;
        };
        let signature = ed25519_dalek::Signature::from_bytes(&self.0);
        verifying_key.verify_strict(message, &signature).is_ok()
    }
}

impl Default for Signature {
    fn default() -> Self {
        Self([0u8; SIGNATURE_BYTES])
    }
}

impl TryFrom<&[u8]> for Signature {
    type Error = SdkError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        let arr: [u8; SIGNATURE_BYTES] = bytes.try_into().map_err(|_| {
            SdkError::InvalidSignature(format!("expected 64 bytes, got {}", bytes.len()))
        })?;
        Ok(Self(arr))
    }
}

impl FromStr for Signature {
    type Err = SdkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = bs58::decode(s)
            .into_vec()
            .map_err(|e| SdkError::InvalidSignature(format!("base58 decode failed: {e}")))?;
        Signature::try_from(bytes.as_slice())
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&bs58::encode(self.0).into_string())
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signer::{Keypair, Signer};

    #[test]
    fn sign_then_verify() {
        let keypair = Keypair::from_seed(&[0x42u8; 32]);
        let message = b"some message bytes";
        let signature = keypair.sign_message(message);
        assert!(signature.verify(&keypair.pubkey(), message));
    }

    #[test]
    fn verify_rejects_wrong_message() {
        let keypair = Keypair::from_seed(&[0x42u8; 32]);
        let signature = keypair.sign_message(b"message one");
        assert!(!signature.verify(&keypair.pubkey(), b"message two"));
    }

    #[test]
    fn verify_rejects_wrong_key() {
        let keypair = Keypair::from_seed(&[0x42u8; 32]);
        let other = Keypair::from_seed(&[0x43u8; 32]);
        let signature = keypair.sign_message(b"message");
        assert!(!signature.verify(&other.pubkey(), b"message"));
    }

    #[test]
    fn default_is_all_zeros() {
        assert_eq!(Signature::default().to_bytes(), [0u8; 64]);
    }

    #[test]
    fn base58_roundtrip() {
        let keypair = Keypair::from_seed(&[7u8; 32]);
        let signature = keypair.sign_message(b"x");
        let parsed: Signature = signature.to_string().parse().unwrap();
        assert_eq!(parsed, signature);
    }

    #[test]
    fn wrong_length_fails() {
        assert!(Signature::try_from(&[0u8; 63][..]).is_err());
    }
}
