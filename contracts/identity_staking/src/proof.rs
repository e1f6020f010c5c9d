//! Slash proof registry.
//!
//! Two independent sets: proof hashes consumed by percentage slashes (never
//! reusable), and the valid heads of release chains. A head commits to an
//! ordered member list and a nonce; each release swaps the head it consumed
//! for a new one. Nonces that ever seeded a head are remembered so a chain
//! cannot be steered back onto an old head.
//!
//! A head stores the burn epoch it was opened in. Funds slashed in an earlier
//! epoch have been burned and are no longer releasable.

use soroban_sdk::xdr::ToXdr;
use soroban_sdk::{BytesN, Env, Vec};

use crate::types::SlashMember;
use crate::{DataKey, Error};

/// `keccak256(xdr(members) || nonce)`. Member order is part of the commitment.
#[must_use]
pub fn compute_head(e: &Env, members: &Vec<SlashMember>, nonce: &BytesN<32>) -> BytesN<32> {
    let mut bytes = members.clone().to_xdr(e);
    bytes.extend_from_array(&nonce.to_array());
    e.crypto().keccak256(&bytes).to_bytes()
}

#[must_use]
pub fn is_proof_hash_used(e: &Env, proof_hash: &BytesN<32>) -> bool {
    e.storage()
        .persistent()
        .has(&DataKey::UsedProofHash(proof_hash.clone()))
}

pub fn consume_proof_hash(e: &Env, proof_hash: &BytesN<32>) {
    e.storage()
        .persistent()
        .set(&DataKey::UsedProofHash(proof_hash.clone()), &true);
}

/// Burn epoch of a valid head, `None` if `head` is unknown or superseded.
#[must_use]
pub fn head_epoch(e: &Env, head: &BytesN<32>) -> Option<u32> {
    e.storage()
        .persistent()
        .get(&DataKey::ProofHead(head.clone()))
}

#[must_use]
pub fn is_head_valid(e: &Env, head: &BytesN<32>) -> bool {
    head_epoch(e, head).is_some()
}

#[must_use]
pub fn is_nonce_used(e: &Env, nonce: &BytesN<32>) -> bool {
    e.storage()
        .persistent()
        .has(&DataKey::UsedNonce(nonce.clone()))
}

/// Fails `NonceAlreadyUsed` if `nonce` already seeded a head.
pub fn ensure_fresh_nonce(e: &Env, nonce: &BytesN<32>) -> Result<(), Error> {
    if is_nonce_used(e, nonce) {
        return Err(Error::NonceAlreadyUsed);
    }
    Ok(())
}

/// Registers the first head of a new chain.
pub fn open_chain(e: &Env, head: &BytesN<32>, nonce: &BytesN<32>, epoch: u32) {
    e.storage()
        .persistent()
        .set(&DataKey::UsedNonce(nonce.clone()), &true);
    e.storage()
        .persistent()
        .set(&DataKey::ProofHead(head.clone()), &epoch);
}

/// Swaps `current` for `next`, carrying the epoch over. Fails
/// `SlashProofHashNotFound` unless `current` is still a valid head.
pub fn advance_chain(
    e: &Env,
    current: &BytesN<32>,
    next: &BytesN<32>,
    next_nonce: &BytesN<32>,
) -> Result<(), Error> {
    let epoch = head_epoch(e, current).ok_or(Error::SlashProofHashNotFound)?;
    e.storage()
        .persistent()
        .remove(&DataKey::ProofHead(current.clone()));
    open_chain(e, next, next_nonce, epoch);
    Ok(())
}
