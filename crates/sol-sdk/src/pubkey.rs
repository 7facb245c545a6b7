//! Account addresses.
//!
//! A Solana address is the Base58 encoding of a raw 32-byte Ed25519 public
//! key. There is no hashing step (unlike Bitcoin or Ethereum) — the public
//! key bytes ARE the address bytes.

use std::fmt;
use std::str::FromStr;

use crate::error::SdkError;

/// Byte length of a public key.
pub const PUBKEY_BYTES: usize = 32;

/// A 32-byte account address. Equality and ordering are by raw byte content.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Pubkey([u8; PUBKEY_BYTES]);

impl Pubkey {
    pub const fn new_from_array(bytes: [u8; PUBKEY_BYTES]) -> Self {
        Self(bytes)
    }

    pub fn to_bytes(self) -> [u8; PUBKEY_BYTES] {
        self.0
    }

    pub fn as_bytes(&self) -> &[u8; PUBKEY_BYTES] {
        &self.0
    }

    /// Base58 representation of the key.
    pub fn to_base58(self) -> String {
        bs58::encode(self.0).into_string()
    }
}

impl TryFrom<&[u8]> for Pubkey {
    type Error = SdkError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        let arr: [u8; PUBKEY_BYTES] = bytes.try_into().map_err(|_| {
            SdkError::InvalidPublicKey(format!("expected 32 bytes, got {}", bytes.len()))
        })?;
        Ok(Self(arr))
    }
}

impl FromStr for Pubkey {
    type Err = SdkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = bs58::decode(s)
            .into_vec()
            .map_err(|e| SdkError::InvalidPublicKey(format!("base58 decode failed: {e}")))?;
        Pubkey::try_from(bytes.as_slice())
    }
}

impl fmt::Display for Pubkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_base58())
    }
}

impl fmt::Debug for Pubkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_base58())
    }
}

impl AsRef<[u8]> for Pubkey {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}
