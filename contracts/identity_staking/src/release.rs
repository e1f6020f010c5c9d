//! Release engine: partial restitution of slashed funds along a hash chain.
//!
//! A release presents the full member list behind the current head together
//! with the nonce it was committed with. On success the member's tracked
//! amount drops by the released amount and the head is replaced by a
//! commitment to the updated list under a fresh nonce.

use soroban_sdk::{Address, BytesN, Env, Vec};

use crate::access;
use crate::burn;
use crate::events::SlashReleased;
use crate::ledger;
use crate::proof;
use crate::types::{Role, SlashMember};
use crate::{Error, MAX_BATCH_SIZE};

/// One link of a release chain.
pub struct ReleaseRequest {
    pub members: Vec<SlashMember>,
    pub index: u32,
    pub amount: i128,
    pub current_proof_hash: BytesN<32>,
    pub current_nonce: BytesN<32>,
    pub new_nonce: BytesN<32>,
}

/// Releases `amount` to the staker of `members[index]` and returns the new head.
pub fn release(e: &Env, caller: &Address, request: ReleaseRequest) -> Result<BytesN<32>, Error> {
    access::require_any_role(e, caller, &[Role::Releaser])?;
    let ReleaseRequest {
        members,
        index,
        amount,
        current_proof_hash,
        current_nonce,
        new_nonce,
    } = request;

    if members.len() > MAX_BATCH_SIZE {
        return Err(Error::BatchTooLarge);
    }
    let epoch = proof::head_epoch(e, &current_proof_hash).ok_or(Error::SlashProofHashNotFound)?;
    if proof::compute_head(e, &members, &current_nonce) != current_proof_hash {
        return Err(Error::SlashProofHashNotValid);
    }
    let mut member = members.get(index).ok_or(Error::InvalidMemberIndex)?;
    if amount <= 0 {
        return Err(Error::AmountMustBeGreaterThanZero);
    }
    if amount > member.amount || epoch != burn::burn_epoch(e) {
        return Err(Error::FundsNotAvailableToRelease);
    }
    let mut stake = ledger::load_stake(e, member.stake_id)?;
    let pool = ledger::total_slashed(e);
    if amount > stake.slashed_amount || amount > pool {
        return Err(Error::FundsNotAvailableToRelease);
    }
    proof::ensure_fresh_nonce(e, &new_nonce)?;
    let token = ledger::token_client(e)?;

    member.amount -= amount;
    let mut updated = members;
    updated.set(index, member.clone());
    stake.amount -= amount;
    stake.slashed_amount -= amount;
    ledger::save_stake(e, &stake);
    ledger::set_total_slashed(e, pool - amount);
    let new_head = proof::compute_head(e, &updated, &new_nonce);
    proof::advance_chain(e, &current_proof_hash, &new_head, &new_nonce)?;

    token.transfer(&e.current_contract_address(), &member.staker, &amount);
    SlashReleased {
        staker: member.staker,
        stake_id: member.stake_id,
        amount,
        previous_head: current_proof_hash,
        new_head: new_head.clone(),
    }
    .publish(e);
    Ok(new_head)
}
