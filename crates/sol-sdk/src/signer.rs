//! Signing capability.
//!
//! A [`Signer`] pairs a public key with the ability to produce an Ed25519
//! signature over arbitrary bytes. [`Keypair`] is the in-memory
//! implementation over `ed25519-dalek`; hardware or remote signers can
//! implement the trait without exposing key material.

use ed25519_dalek::Signer as DalekSigner;
use zeroize::Zeroize;

use crate::pubkey::Pubkey;
use crate::signature::Signature;

/// Capability to sign message bytes under a fixed public key.
pub trait Signer {
    fn pubkey(&self) -> Pubkey;
    fn sign_message(&self, message: &[u8]) -> Signature;
}

/// An in-memory Ed25519 keypair. The signing key zeroizes on drop
/// (`ed25519-dalek` behavior); seed copies made here are wiped eagerly.
pub struct Keypair {
    signing_key: ed25519_dalek::SigningKey,
}

impl Keypair {
    /// Build a keypair from a 32-byte Ed25519 seed.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        let mut seed_copy = *seed;
        let signing_key = ed25519_dalek::SigningKey::from_bytes(&seed_copy);
        seed_copy.zeroize();
        Self { signing_key }
    }
}

impl Signer for Keypair {
    fn pubkey(&self) -> Pubkey {
        Pubkey::new_from_array(self.signing_key.verifying_key().to_bytes())
    }

    fn sign_message(&self, message: &[u8]) -> Signature {
        Signature::new_from_array(self.signing_key.sign(message).to_bytes())
    }
}
