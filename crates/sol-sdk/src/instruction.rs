//! Uncompiled instructions.
//!
//! Program-specific builders produce [`Instruction`] values; the core never
//! inspects the opaque `data` payload. Compilation into index-based form
//! happens in [`crate::transaction::Transaction::compile_message`].

use crate::pubkey::Pubkey;

/// A single account reference required by one instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountMeta {
    pub pubkey: Pubkey,
    pub is_signer: bool,
    pub is_writable: bool,
}

impl AccountMeta {
    /// A writable account reference.
    pub fn new(pubkey: Pubkey, is_signer: bool) -> Self {
        Self {
            pubkey,
            is_signer,
            is_writable: true,
        }
    }

    /// A read-only account reference.
    pub fn new_readonly(pubkey: Pubkey, is_signer: bool) -> Self {
        Self {
            pubkey,
            is_signer,
            is_writable: false,
        }
    }
}

/// An instruction before account references are rewritten as indices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    /// The program that executes this instruction.
    pub program_id: Pubkey,
    /// Ordered account references passed to the program.
    pub accounts: Vec<AccountMeta>,
    /// Opaque program input.
    pub data: Vec<u8>,
}

impl Instruction {
    pub fn new(program_id: Pubkey, accounts: Vec<AccountMeta>, data: Vec<u8>) -> Self {
        Self {
            program_id,
            accounts,
            data,
        }
    }
}
