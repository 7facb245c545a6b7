//! System Program instruction builders.
//!
//! Only the two operations the transaction lifecycle itself needs: lamport
//! transfers (the canonical fixture for wire-format checks) and nonce
//! advancement (prepended automatically on the durable-nonce path). Data
//! is the program's native layout: a `u32` little-endian instruction index
//! followed by the little-endian argument fields.

use crate::instruction::{AccountMeta, Instruction};
use crate::pubkey::Pubkey;

/// The System Program public key: 32 zero bytes.
/// Base58: `11111111111111111111111111111111`
pub const SYSTEM_PROGRAM_ID: Pubkey = Pubkey::new_from_array([0u8; 32]);

/// The RecentBlockhashes sysvar, read by `AdvanceNonceAccount`.
/// Base58: `SysvarRecentB1ockHashes11111111111111111111`
pub const RECENT_BLOCKHASHES_SYSVAR_ID: Pubkey = Pubkey::new_from_array([
    6, 167, 213, 23, 25, 44, 86, 142, 224, 138, 132, 95, 115, 210, 151, 136, 207, 3, 92, 49, 69,
    178, 26, 179, 68, 216, 6, 46, 169, 64, 0, 0,
]);

/// System Program `Transfer` instruction index.
const TRANSFER_INDEX: u32 = 2;

/// System Program `AdvanceNonceAccount` instruction index.
const ADVANCE_NONCE_ACCOUNT_INDEX: u32 = 4;

/// Move `lamports` from `from` to `to`.
pub fn transfer(from: &Pubkey, to: &Pubkey, lamports: u64) -> Instruction {
    let mut data = Vec::with_capacity(12);
    data.extend_from_slice(&TRANSFER_INDEX.to_le_bytes());
    data.extend_from_slice(&lamports.to_le_bytes());

    Instruction::new(
        SYSTEM_PROGRAM_ID,
        vec![AccountMeta::new(*from, true), AccountMeta::new(*to, false)],
        data,
    )
}

/// Consume the stored nonce in `nonce_account`, replacing it with the
/// latest blockhash. Must be the first instruction of a durable-nonce
/// transaction.
pub fn advance_nonce_account(nonce_account: &Pubkey, authorized: &Pubkey) -> Instruction {
    Instruction::new(
        SYSTEM_PROGRAM_ID,
        vec![
            AccountMeta::new(*nonce_account, false),
            AccountMeta::new_readonly(RECENT_BLOCKHASHES_SYSVAR_ID, false),
            AccountMeta::new_readonly(*authorized, true),
        ],
        ADVANCE_NONCE_ACCOUNT_INDEX.to_le_bytes().to_vec(),
    )
}
