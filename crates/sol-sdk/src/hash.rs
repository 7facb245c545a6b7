//! Blockhash values.
//!
//! A blockhash identifies a recent ledger state and doubles as the
//! freshness/anti-replay token of every transaction. On the wire it is 32
//! raw bytes; in RPC traffic it travels as a Base58 string.

use std::fmt;
use std::str::FromStr;

use crate::error::SdkError;

/// Byte length of a blockhash.
pub const HASH_BYTES: usize = 32;

/// A 32-byte blockhash.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Hash([u8; HASH_BYTES]);

impl Hash {
    pub const fn new_from_array(bytes: [u8; HASH_BYTES]) -> Self {
        Self(bytes)
    }

    pub fn to_bytes(self) -> [u8; HASH_BYTES] {
        self.0
    }

    pub fn as_bytes(&self) -> &[u8; HASH_BYTES] {
        &self.0
    }
}

impl TryFrom<&[u8]> for Hash {
    type Error = SdkError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        let arr: [u8; HASH_BYTES] = bytes.try_into().map_err(|_| {
            SdkError::InvalidBlockhash(format!("expected 32 bytes, got {}", bytes.len()))
        })?;
        Ok(Self(arr))
    }
}

impl FromStr for Hash {
    type Err = SdkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = bs58::decode(s)
            .into_vec()
            .map_err(|e| SdkError::InvalidBlockhash(format!("base58 decode failed: {e}")))?;
        Hash::try_from(bytes.as_slice())
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&bs58::encode(self.0).into_string())
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
