//! Offline transaction primitives for a Solana-compatible chain.
//!
//! This crate covers everything that happens before a transaction touches
//! the network: building instructions, compiling them into the canonical
//! message form, Ed25519 signing, and the exact binary wire format. It has
//! no I/O and no async; the RPC client that submits transactions lives in
//! the companion `sol-client` crate.
//!
//! Signing uses `ed25519-dalek`, text encoding uses `bs58`.

pub mod error;
pub mod hash;
pub mod instruction;
pub mod message;
pub mod pubkey;
pub mod shortvec;
pub mod signature;
pub mod signer;
pub mod system_instruction;
pub mod transaction;

// Re-export key public types for ergonomic imports.
pub use error::SdkError;
pub use hash::{Hash, HASH_BYTES};
pub use instruction::{AccountMeta, Instruction};
pub use message::{CompiledInstruction, Message, MessageHeader};
pub use pubkey::{Pubkey, PUBKEY_BYTES};
pub use signature::{Signature, SIGNATURE_BYTES};
pub use signer::{Keypair, Signer};
pub use transaction::{NonceInformation, SerializeConfig, SignatureSlot, Transaction};
