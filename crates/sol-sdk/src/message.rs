//! Compiled messages and their binary wire format.
//!
//! Wire layout, in order:
//!
//! ```text
//! message:
//!   num_required_sigs     u8
//!   num_readonly_signed   u8
//!   num_readonly_unsigned u8
//!   num_accounts          shortvec
//!   account_keys          32 bytes * num_accounts
//!   recent_blockhash      32 bytes
//!   num_instructions      shortvec
//!   instructions[]:
//!     program_id_index    u8
//!     num_accounts        shortvec
//!     account_indices     u8 * num_accounts
//!     data_len            shortvec
//!     data                u8 * data_len
//! ```
//!
//! Decoding consumes the stream left-to-right with no backtracking; any
//! short read is a fatal parse failure.

use crate::error::SdkError;
use crate::hash::{Hash, HASH_BYTES};
use crate::pubkey::{Pubkey, PUBKEY_BYTES};
use crate::shortvec;

/// The three-byte header describing the signer/writable partitioning of
/// the account-key list.
///
/// The keys form four contiguous regions in this fixed order:
/// writable signers, read-only signers, writable non-signers, read-only
/// non-signers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MessageHeader {
    /// Total number of signatures the transaction requires.
    pub num_required_signatures: u8,
    /// How many of the signing accounts are read-only.
    pub num_readonly_signed_accounts: u8,
    /// How many of the non-signing accounts are read-only.
    pub num_readonly_unsigned_accounts: u8,
}

impl MessageHeader {
    pub const LEN: usize = 3;
}

/// An instruction with account references rewritten as indices into the
/// message's account-key list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledInstruction {
    /// Index of the program account that executes this instruction.
    pub program_id_index: u8,
    /// Ordered indices of the accounts passed to the program.
    pub accounts: Vec<u8>,
    /// Opaque program input, copied verbatim.
    pub data: Vec<u8>,
}

/// A list of instructions to be processed atomically, with a canonical,
/// deduplicated account-key ordering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub header: MessageHeader,
    pub account_keys: Vec<Pubkey>,
    pub recent_blockhash: Hash,
    pub instructions: Vec<CompiledInstruction>,
}

impl Message {
    /// True if the account at `index` must sign the transaction.
    pub fn is_account_signer(&self, index: usize) -> bool {
        index < self.header.num_required_signatures as usize
    }

    /// True if the account at `index` lands in a writable region.
    pub fn is_account_writable(&self, index: usize) -> bool {
        let required = self.header.num_required_signatures as usize;
        let readonly_signed = self.header.num_readonly_signed_accounts as usize;
        let readonly_unsigned = self.header.num_readonly_unsigned_accounts as usize;
        index < required - readonly_signed
            || (index >= required && index < self.account_keys.len() - readonly_unsigned)
    }

    /// The public keys of the signer region, in signature-slot order.
    pub fn signer_keys(&self) -> &[Pubkey] {
        &self.account_keys[..self.header.num_required_signatures as usize]
    }

    /// Serialize to the exact wire format.
    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(256);

        buf.push(self.header.num_required_signatures);
        buf.push(self.header.num_readonly_signed_accounts);
        buf.push(self.header.num_readonly_unsigned_accounts);

        buf.extend_from_slice(&shortvec::encode_len(self.account_keys.len()));
        for key in &self.account_keys {
            buf.extend_from_slice(key.as_bytes());
        }

        buf.extend_from_slice(self.recent_blockhash.as_bytes());

        buf.extend_from_slice(&shortvec::encode_len(self.instructions.len()));
        for ix in &self.instructions {
            buf.push(ix.program_id_index);

            buf.extend_from_slice(&shortvec::encode_len(ix.accounts.len()));
            buf.extend_from_slice(&ix.accounts);

            buf.extend_from_slice(&shortvec::encode_len(ix.data.len()));
            buf.extend_from_slice(&ix.data);
        }

        buf
    }

    /// Decode a message from wire bytes. Inverse of [`Message::serialize`].
    pub fn deserialize(bytes: &[u8]) -> Result<Self, SdkError> {
        let (header_bytes, mut rest) = take(bytes, MessageHeader::LEN)?;
        let header = MessageHeader {
            num_required_signatures: header_bytes[0],
            num_readonly_signed_accounts: header_bytes[1],
            num_readonly_unsigned_accounts: header_bytes[2],
        };

        let num_keys;
        (num_keys, rest) = shortvec::decode_len(rest)?;
        let mut account_keys = Vec::with_capacity(num_keys);
        for _ in 0..num_keys {
            let key_bytes;
            (key_bytes, rest) = take(rest, PUBKEY_BYTES)?;
            account_keys.push(Pubkey::try_from(key_bytes)?);
        }

        // The header partitions the key list into regions; counts that do
        // not fit the list would send the region math out of bounds.
        let required = usize::from(header.num_required_signatures);
        let readonly_signed = usize::from(header.num_readonly_signed_accounts);
        let readonly_unsigned = usize::from(header.num_readonly_unsigned_accounts);
        if required > num_keys
            || readonly_signed > required
            || readonly_unsigned > num_keys - required
        {
            return Err(SdkError::SerializationError(format!(
                "header counts ({required}, {readonly_signed}, {readonly_unsigned}) \
                 inconsistent with {num_keys} account keys"
            )));
        }

        let hash_bytes;
        (hash_bytes, rest) = take(rest, HASH_BYTES)?;
        let recent_blockhash = Hash::try_from(hash_bytes)?;

        let num_instructions;
        (num_instructions, rest) = shortvec::decode_len(rest)?;
        let mut instructions = Vec::with_capacity(num_instructions);
        for _ in 0..num_instructions {
            let id_byte;
            (id_byte, rest) = take(rest, 1)?;
            let program_id_index = id_byte[0];

            let num_accounts;
            (num_accounts, rest) = shortvec::decode_len(rest)?;
            let accounts;
            (accounts, rest) = take(rest, num_accounts)?;

            let data_len;
            (data_len, rest) = shortvec::decode_len(rest)?;
            let data;
            (data, rest) = take(rest, data_len)?;

            if usize::from(program_id_index) >= num_keys {
                return Err(SdkError::SerializationError(format!(
                    "program id index {program_id_index} out of range for {num_keys} account keys"
                )));
            }
            if let Some(bad) = accounts.iter().find(|&&i| usize::from(i) >= num_keys) {
                return Err(SdkError::SerializationError(format!(
                    "account index {bad} out of range for {num_keys} account keys"
                )));
            }

            instructions.push(CompiledInstruction {
                program_id_index,
                accounts: accounts.to_vec(),
                data: data.to_vec(),
            });
        }

        Ok(Message {
            header,
            account_keys,
            recent_blockhash,
            instructions,
        })
    }
}

/// Split off exactly `count` bytes, or fail on a short read.
fn take(bytes: &[u8], count: usize) -> Result<(&[u8], &[u8]), SdkError> {
    if bytes.len() < count {
        return Err(SdkError::SerializationError(format!(
            "unexpected end of data: needed {count} bytes, got {}",
            bytes.len()
        )));
    }
    Ok(bytes.split_at(count))
}
