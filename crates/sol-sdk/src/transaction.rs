//! Transaction lifecycle: build, compile, sign, serialize.
//!
//! A [`Transaction`] accumulates uncompiled instructions, compiles them
//! into a canonical [`Message`], collects one signature per required
//! signer, and serializes to the wire format:
//!
//! ```text
//! transaction:
//!   num_signatures   shortvec
//!   signatures       64 bytes each (all zeros for an absent slot)
//!   message          (see crate::message)
//! ```
//!
//! Signature-slot order is pinned to the compiled message's signer region.
//! Compilation is deterministic, so recompiling between `partial_sign`
//! calls by different parties re-derives the same slot order and the
//! signatures line up.

use std::borrow::Cow;

use crate::error::SdkError;
use crate::hash::Hash;
use crate::instruction::{AccountMeta, Instruction};
use crate::message::{CompiledInstruction, Message, MessageHeader};
use crate::pubkey::Pubkey;
use crate::shortvec;
use crate::signature::{Signature, SIGNATURE_BYTES};
use crate::signer::Signer;

/// One signature slot: a required signer and its signature, if collected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureSlot {
    pub pubkey: Pubkey,
    pub signature: Option<Signature>,
}

/// Options for [`Transaction::serialize`].
#[derive(Debug, Clone, Copy)]
pub struct SerializeConfig {
    /// Fail if any signature slot is still absent.
    pub require_all_signatures: bool,
    /// Fail if any present signature does not verify against its claimed
    /// public key and the message bytes.
    pub verify_signatures: bool,
}

impl Default for SerializeConfig {
    fn default() -> Self {
        Self {
            require_all_signatures: true,
            verify_signatures: true,
        }
    }
}

/// Durable-nonce substitute for a recent blockhash. The stored nonce acts
/// as the blockhash and `nonce_instruction` (an advance-nonce instruction)
/// is guaranteed to lead the compiled instruction list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NonceInformation {
    pub nonce: Hash,
    pub nonce_instruction: Instruction,
}

/// A transaction under construction.
#[derive(Debug, Clone, Default)]
pub struct Transaction {
    /// Uncompiled instructions, in execution order.
    pub instructions: Vec<Instruction>,
    /// Signature slots, mirroring the compiled message's signer region.
    pub signatures: Vec<SignatureSlot>,
    /// Fee payer override. Defaults to the first declared signer.
    pub fee_payer: Option<Pubkey>,
    /// Freshness token; required unless `nonce_info` is set.
    pub recent_blockhash: Option<Hash>,
    /// Durable-nonce substitute for `recent_blockhash`.
    pub nonce_info: Option<NonceInformation>,
}

impl Transaction {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an instruction. No validation happens until compilation.
    pub fn add(&mut self, instruction: Instruction) -> &mut Self {
        self.instructions.push(instruction);
        self
    }

    /// Declare the authoritative, ordered list of required signers.
    ///
    /// Duplicates are dropped keeping first-occurrence order. Resets the
    /// signature slots to one absent slot per declared signer; the first
    /// entry becomes the fee payer if none was set explicitly.
    pub fn set_signers(&mut self, pubkeys: &[Pubkey]) {
        let mut seen: Vec<Pubkey> = Vec::with_capacity(pubkeys.len());
        for &pubkey in pubkeys {
            if !seen.contains(&pubkey) {
                seen.push(pubkey);
            }
        }
        self.signatures = seen
            .into_iter()
            .map(|pubkey| SignatureSlot {
                pubkey,
                signature: None,
            })
            .collect();
    }

    /// The first slot's signature, used as the transaction's identity by
    /// the submission protocol.
    pub fn primary_signature(&self) -> Option<&Signature> {
        self.signatures.first().and_then(|slot| slot.signature.as_ref())
    }

    /// Compile the current instructions, fee payer, and declared signers
    /// into a canonical message. Deterministic and side-effect free:
    /// calling twice without mutation yields byte-identical output.
    pub fn compile_message(&self) -> Result<Message, SdkError> {
        let (recent_blockhash, instructions) = self.effective_instructions()?;

        let fee_payer = self
            .fee_payer
            .or_else(|| self.signatures.first().map(|slot| slot.pubkey))
            .ok_or(SdkError::MissingFeePayer)?;

        struct AccountEntry {
            pubkey: Pubkey,
            is_signer: bool,
            is_writable: bool,
        }

        // Collect referenced accounts in first-appearance order, merging
        // duplicates with the most permissive flags.
        let mut entries: Vec<AccountEntry> = Vec::new();
        let mut upsert = |pubkey: Pubkey, signer: bool, writable: bool| {
            if let Some(entry) = entries.iter_mut().find(|e| e.pubkey == pubkey) {
                entry.is_signer |= signer;
                entry.is_writable |= writable;
            } else {
                entries.push(AccountEntry {
                    pubkey,
                    is_signer: signer,
                    is_writable: writable,
                });
            }
        };

        for ix in instructions.iter() {
            for meta in &ix.accounts {
                upsert(meta.pubkey, meta.is_signer, meta.is_writable);
            }
            // Program ids are non-signer, read-only accounts.
            upsert(ix.program_id, false, false);
        }

        // Declared signers mark their accounts as signers. A declared
        // signer that no instruction references is a caller contract
        // violation; the fee payer is exempt because it is added below.
        for slot in &self.signatures {
            if slot.pubkey == fee_payer {
                continue;
            }
            match entries.iter_mut().find(|e| e.pubkey == slot.pubkey) {
                Some(entry) => entry.is_signer = true,
                None => return Err(SdkError::UnknownSigner(slot.pubkey.to_string())),
            }
        }

        // The fee payer is forced into the writable-signer bucket at
        // index 0 regardless of how instructions reference it.
        entries.retain(|e| e.pubkey != fee_payer);

        // Stable sort on bucket rank alone keeps first-appearance order
        // within each bucket: writable signers, read-only signers,
        // writable non-signers, read-only non-signers.
        entries.sort_by_key(|e| match (e.is_signer, e.is_writable) {
            (true, true) => 0u8,
            (true, false) => 1,
            (false, true) => 2,
            (false, false) => 3,
        });

        let mut account_keys = Vec::with_capacity(entries.len() + 1);
        account_keys.push(fee_payer);
        account_keys.extend(entries.iter().map(|e| e.pubkey));
        if account_keys.len() > u8::MAX as usize + 1 {
            return Err(SdkError::TransactionBuildError(format!(
                "too many account keys: {}",
                account_keys.len()
            )));
        }

        let header = MessageHeader {
            num_required_signatures: 1 + entries.iter().filter(|e| e.is_signer).count() as u8,
            num_readonly_signed_accounts: entries
                .iter()
                .filter(|e| e.is_signer && !e.is_writable)
                .count() as u8,
            num_readonly_unsigned_accounts: entries
                .iter()
                .filter(|e| !e.is_signer && !e.is_writable)
                .count() as u8,
        };

        let compiled = instructions
            .iter()
            .map(|ix| {
                Ok(CompiledInstruction {
                    program_id_index: index_of(&account_keys, &ix.program_id)?,
                    accounts: ix
                        .accounts
                        .iter()
                        .map(|meta| index_of(&account_keys, &meta.pubkey))
                        .collect::<Result<Vec<u8>, SdkError>>()?,
                    data: ix.data.clone(),
                })
            })
            .collect::<Result<Vec<CompiledInstruction>, SdkError>>()?;

        Ok(Message {
            header,
            account_keys,
            recent_blockhash,
            instructions: compiled,
        })
    }

    /// Compile and realign the signature slots with the message's signer
    /// region. Existing signatures survive when the signer ordering is
    /// unchanged, which is what lets `partial_sign` compose across calls.
    pub fn compile(&mut self) -> Result<Message, SdkError> {
        let message = self.compile_message()?;
        let signer_keys = message.signer_keys();
        let aligned = self.signatures.len() == signer_keys.len()
            && self
                .signatures
                .iter()
                .zip(signer_keys)
                .all(|(slot, key)| slot.pubkey == *key);
        if !aligned {
            self.signatures = signer_keys
                .iter()
                .map(|&pubkey| SignatureSlot {
                    pubkey,
                    signature: None,
                })
                .collect();
        }
        Ok(message)
    }

    /// Sign with the complete signer set, overwriting every slot.
    ///
    /// The provided signers become the declared signer set; each slot of
    /// the recompiled message must find a matching signer or the call
    /// fails with a missing-signer error.
    pub fn sign(&mut self, signers: &[&dyn Signer]) -> Result<(), SdkError> {
        let unique = dedupe_signers(signers);
        self.signatures = unique
            .iter()
            .map(|signer| SignatureSlot {
                pubkey: signer.pubkey(),
                signature: None,
            })
            .collect();

        let message = self.compile()?;
        let signed_data = message.serialize();

        for slot in &mut self.signatures {
            let signer = unique
                .iter()
                .find(|s| s.pubkey() == slot.pubkey)
                .ok_or_else(|| SdkError::MissingSigner(slot.pubkey.to_string()))?;
            slot.signature = Some(signer.sign_message(&signed_data));
        }
        Ok(())
    }

    /// Fill only the slots matching the provided signers, leaving the
    /// rest untouched. The caller must not change the blockhash between
    /// partial signings of the same logical transaction.
    pub fn partial_sign(&mut self, signers: &[&dyn Signer]) -> Result<(), SdkError> {
        let unique = dedupe_signers(signers);
        let message = self.compile()?;
        let signed_data = message.serialize();

        for signer in unique {
            let slot = self
                .signatures
                .iter_mut()
                .find(|slot| slot.pubkey == signer.pubkey())
                .ok_or_else(|| SdkError::UnknownSigner(signer.pubkey().to_string()))?;
            slot.signature = Some(signer.sign_message(&signed_data));
        }
        Ok(())
    }

    /// Check every collected signature against the compiled message.
    pub fn verify_signatures(&mut self) -> Result<(), SdkError> {
        let message = self.compile()?;
        let signed_data = message.serialize();
        self.enforce_signatures(&signed_data, &SerializeConfig::default())
    }

    /// Produce the final wire bytes.
    pub fn serialize(&mut self, config: &SerializeConfig) -> Result<Vec<u8>, SdkError> {
        let message = self.compile()?;
        let signed_data = message.serialize();
        self.enforce_signatures(&signed_data, config)?;

        let sig_count = shortvec::encode_len(self.signatures.len());
        let mut wire = Vec::with_capacity(
            sig_count.len() + self.signatures.len() * SIGNATURE_BYTES + signed_data.len(),
        );
        wire.extend_from_slice(&sig_count);
        for slot in &self.signatures {
            match &slot.signature {
                Some(signature) => wire.extend_from_slice(signature.as_bytes()),
                None => wire.extend_from_slice(&[0u8; SIGNATURE_BYTES]),
            }
        }
        wire.extend_from_slice(&signed_data);
        Ok(wire)
    }

    /// Just the compiled message bytes, with no signature requirements.
    /// Used for offline fee estimation and display.
    pub fn serialize_message(&self) -> Result<Vec<u8>, SdkError> {
        Ok(self.compile_message()?.serialize())
    }

    /// Parse wire bytes back into signatures plus message. Inverse of
    /// [`Transaction::serialize`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SdkError> {
        let (num_signatures, mut rest) = shortvec::decode_len(bytes)?;
        let mut signatures = Vec::with_capacity(num_signatures);
        for _ in 0..num_signatures {
            if rest.len() < SIGNATURE_BYTES {
                return Err(SdkError::SerializationError(format!(
                    "unexpected end of data: needed {SIGNATURE_BYTES} signature bytes, got {}",
                    rest.len()
                )));
            }
            let (sig_bytes, remainder) = rest.split_at(SIGNATURE_BYTES);
            signatures.push(Signature::try_from(sig_bytes)?);
            rest = remainder;
        }
        let message = Message::deserialize(rest)?;
        Self::populate(message, signatures)
    }

    /// Reconstruct a transaction from an already-compiled message, as
    /// when rebuilding from RPC-fetched block data. All-zero signatures
    /// become absent slots.
    pub fn populate(message: Message, signatures: Vec<Signature>) -> Result<Self, SdkError> {
        let placeholder = Signature::default();
        let slots = message
            .signer_keys()
            .iter()
            .enumerate()
            .map(|(i, &pubkey)| SignatureSlot {
                pubkey,
                signature: signatures.get(i).copied().filter(|s| *s != placeholder),
            })
            .collect();

        let instructions = message
            .instructions
            .iter()
            .map(|ix| {
                let program_id = *key_at(&message, ix.program_id_index)?;
                let accounts = ix
                    .accounts
                    .iter()
                    .map(|&index| {
                        let pubkey = *key_at(&message, index)?;
                        Ok(AccountMeta {
                            pubkey,
                            is_signer: message.is_account_signer(index as usize),
                            is_writable: message.is_account_writable(index as usize),
                        })
                    })
                    .collect::<Result<Vec<AccountMeta>, SdkError>>()?;
                Ok(Instruction::new(program_id, accounts, ix.data.clone()))
            })
            .collect::<Result<Vec<Instruction>, SdkError>>()?;

        Ok(Self {
            instructions,
            signatures: slots,
            fee_payer: message.signer_keys().first().copied(),
            recent_blockhash: Some(message.recent_blockhash),
            nonce_info: None,
        })
    }

    /// Resolve the effective blockhash and instruction list, prepending
    /// the advance-nonce instruction on the durable-nonce path.
    fn effective_instructions(&self) -> Result<(Hash, Cow<'_, [Instruction]>), SdkError> {
        match &self.nonce_info {
            Some(nonce_info) => {
                if self.instructions.first() == Some(&nonce_info.nonce_instruction) {
                    Ok((nonce_info.nonce, Cow::Borrowed(self.instructions.as_slice())))
                } else {
                    let mut list = Vec::with_capacity(self.instructions.len() + 1);
                    list.push(nonce_info.nonce_instruction.clone());
                    list.extend(self.instructions.iter().cloned());
                    Ok((nonce_info.nonce, Cow::Owned(list)))
                }
            }
            None => {
                let blockhash = self.recent_blockhash.ok_or(SdkError::MissingBlockhash)?;
                Ok((blockhash, Cow::Borrowed(self.instructions.as_slice())))
            }
        }
    }

    fn enforce_signatures(
        &self,
        signed_data: &[u8],
        config: &SerializeConfig,
    ) -> Result<(), SdkError> {
        if config.verify_signatures {
            for slot in &self.signatures {
                if let Some(signature) = &slot.signature {
                    if !signature.verify(&slot.pubkey, signed_data) {
                        return Err(SdkError::SignatureVerificationFailed(
                            slot.pubkey.to_string(),
                        ));
                    }
                }
            }
        }
        if config.require_all_signatures {
            if let Some(slot) = self.signatures.iter().find(|s| s.signature.is_none()) {
                return Err(SdkError::MissingSignature(slot.pubkey.to_string()));
            }
        }
        Ok(())
    }
}

fn index_of(account_keys: &[Pubkey], pubkey: &Pubkey) -> Result<u8, SdkError> {
    account_keys
        .iter()
        .position(|key| key == pubkey)
        .map(|index| index as u8)
        .ok_or_else(|| {
            SdkError::TransactionBuildError(format!("account {pubkey} not in account keys"))
        })
}

fn key_at(message: &Message, index: u8) -> Result<&Pubkey, SdkError> {
    message.account_keys.get(index as usize).ok_or_else(|| {
        SdkError::SerializationError(format!(
            "account index {index} out of range for {} account keys",
            message.account_keys.len()
        ))
    })
}

fn dedupe_signers<'a>(signers: &[&'a dyn Signer]) -> Vec<&'a dyn Signer> {
    let mut unique: Vec<&dyn Signer> = Vec::with_capacity(signers.len());
    for &signer in signers {
        if !unique.iter().any(|s| s.pubkey() == signer.pubkey()) {
            unique.push(signer);
        }
    }
    unique
}
