//! Stake ledger: the canonical stake table, the per-identity indexes and the
//! aggregate slashed pool.
//!
//! Stakes and indexes live in persistent storage keyed by id / identity; the
//! counters and the pool live in instance storage next to the configuration.
//! Every operation validates first, writes its bookkeeping second and moves
//! tokens last.

use soroban_sdk::{token, Address, BytesN, Env, Vec};

use crate::events::{CommunityStaked, SelfStaked, StakeWithdrawn};
use crate::merkle;
use crate::types::Stake;
use crate::{DataKey, Error};

/// Client for the staking token configured at initialization.
pub fn token_client(e: &Env) -> Result<token::Client<'_>, Error> {
    let token: Address = e
        .storage()
        .instance()
        .get(&DataKey::Token)
        .ok_or(Error::NotInitialized)?;
    Ok(token::Client::new(e, &token))
}

#[must_use]
pub fn stake_count(e: &Env) -> u64 {
    e.storage()
        .instance()
        .get(&DataKey::StakeCount)
        .unwrap_or(0)
}

fn next_stake_id(e: &Env) -> Result<u64, Error> {
    let id = stake_count(e);
    let next = id.checked_add(1).ok_or(Error::ArithmeticOverflow)?;
    e.storage().instance().set(&DataKey::StakeCount, &next);
    Ok(id)
}

pub fn load_stake(e: &Env, stake_id: u64) -> Result<Stake, Error> {
    e.storage()
        .persistent()
        .get(&DataKey::Stake(stake_id))
        .ok_or(Error::StakeNotFound)
}

pub fn save_stake(e: &Env, stake: &Stake) {
    e.storage()
        .persistent()
        .set(&DataKey::Stake(stake.id), stake);
}

fn self_stake_ids(e: &Env, staker: &Address) -> Vec<u64> {
    e.storage()
        .persistent()
        .get(&DataKey::SelfStakeIds(staker.clone()))
        .unwrap_or(Vec::new(e))
}

fn community_stake_ids(e: &Env, staker: &Address, stakee: &Address) -> Vec<u64> {
    e.storage()
        .persistent()
        .get(&DataKey::CommunityStakeIds(staker.clone(), stakee.clone()))
        .unwrap_or(Vec::new(e))
}

/// The `index`-th self-stake id of `staker`, in creation order.
pub fn self_stake_id(e: &Env, staker: &Address, index: u32) -> Result<u64, Error> {
    self_stake_ids(e, staker)
        .get(index)
        .ok_or(Error::StakeNotFound)
}

/// The `index`-th community-stake id placed by `staker` on `stakee`.
pub fn community_stake_id(
    e: &Env,
    staker: &Address,
    stakee: &Address,
    index: u32,
) -> Result<u64, Error> {
    community_stake_ids(e, staker, stakee)
        .get(index)
        .ok_or(Error::StakeNotFound)
}

#[must_use]
pub fn self_stake_count(e: &Env, staker: &Address) -> u32 {
    self_stake_ids(e, staker).len()
}

#[must_use]
pub fn community_stake_count(e: &Env, staker: &Address, stakee: &Address) -> u32 {
    community_stake_ids(e, staker, stakee).len()
}

/// Slashed funds not yet released or burned.
#[must_use]
pub fn total_slashed(e: &Env) -> i128 {
    e.storage()
        .instance()
        .get(&DataKey::TotalSlashed)
        .unwrap_or(0)
}

pub fn set_total_slashed(e: &Env, total: i128) {
    e.storage().instance().set(&DataKey::TotalSlashed, &total);
}

/// Pool after adding `amount`; the caller stores it once all other checks pass.
pub fn slashed_pool_plus(e: &Env, amount: i128) -> Result<i128, Error> {
    total_slashed(e)
        .checked_add(amount)
        .ok_or(Error::ArithmeticOverflow)
}

/// Checks amount and lock duration; returns the unlock time.
fn validate_new_stake(e: &Env, amount: i128, unlock_duration: u64) -> Result<u64, Error> {
    if amount <= 0 {
        return Err(Error::AmountMustBeGreaterThanZero);
    }
    let now = e.ledger().timestamp();
    let unlock_time = now
        .checked_add(unlock_duration)
        .ok_or(Error::InvalidLockTime)?;
    if unlock_time <= now {
        return Err(Error::InvalidLockTime);
    }
    Ok(unlock_time)
}

fn create_stake(
    e: &Env,
    staker: &Address,
    stakee: &Address,
    amount: i128,
    unlock_time: u64,
) -> Result<Stake, Error> {
    let stake = Stake {
        id: next_stake_id(e)?,
        staker: staker.clone(),
        stakee: stakee.clone(),
        amount,
        slashed_amount: 0,
        unlock_time,
    };
    save_stake(e, &stake);
    Ok(stake)
}

/// Locks `amount` against the staker's own identity. Returns the stake id.
pub fn self_stake(
    e: &Env,
    staker: &Address,
    amount: i128,
    unlock_duration: u64,
) -> Result<u64, Error> {
    staker.require_auth();
    let unlock_time = validate_new_stake(e, amount, unlock_duration)?;
    let token = token_client(e)?;

    let mut ids = self_stake_ids(e, staker);
    let stake = create_stake(e, staker, staker, amount, unlock_time)?;
    ids.push_back(stake.id);
    e.storage()
        .persistent()
        .set(&DataKey::SelfStakeIds(staker.clone()), &ids);
    token.transfer(staker, &e.current_contract_address(), &amount);

    SelfStaked {
        staker: staker.clone(),
        stake_id: stake.id,
        amount,
        unlock_time,
    }
    .publish(e);
    Ok(stake.id)
}

/// Locks `amount` from `staker` vouching for `stakee`. Returns the stake id.
pub fn community_stake(
    e: &Env,
    staker: &Address,
    stakee: &Address,
    amount: i128,
    unlock_duration: u64,
) -> Result<u64, Error> {
    staker.require_auth();
    let unlock_time = validate_new_stake(e, amount, unlock_duration)?;
    if staker == stakee {
        return Err(Error::CannotStakeOnSelf);
    }
    let token = token_client(e)?;

    let mut ids = community_stake_ids(e, staker, stakee);
    let stake = create_stake(e, staker, stakee, amount, unlock_time)?;
    ids.push_back(stake.id);
    e.storage().persistent().set(
        &DataKey::CommunityStakeIds(staker.clone(), stakee.clone()),
        &ids,
    );
    token.transfer(staker, &e.current_contract_address(), &amount);

    CommunityStaked {
        staker: staker.clone(),
        stakee: stakee.clone(),
        stake_id: stake.id,
        amount,
        unlock_time,
    }
    .publish(e);
    Ok(stake.id)
}

/// Loads a stake owned by `staker` of the requested kind and checks it is unlocked.
fn load_withdrawable(
    e: &Env,
    staker: &Address,
    stake_id: u64,
    self_stake: bool,
) -> Result<Stake, Error> {
    let stake = load_stake(e, stake_id)?;
    if stake.is_self_stake() != self_stake {
        return Err(Error::StakeNotFound);
    }
    if &stake.staker != staker {
        return Err(Error::NotStakeOwner);
    }
    if e.ledger().timestamp() < stake.unlock_time {
        return Err(Error::StakeIsLocked);
    }
    if stake.remaining() <= 0 {
        return Err(Error::NothingToWithdraw);
    }
    Ok(stake)
}

/// Pays out the unslashed remainder and leaves the slashed part on the record.
fn settle_withdrawal(e: &Env, mut stake: Stake, payout: i128) -> Result<i128, Error> {
    let token = token_client(e)?;
    stake.amount = stake.slashed_amount;
    save_stake(e, &stake);

    if payout > 0 {
        token.transfer(&e.current_contract_address(), &stake.staker, &payout);
    }
    StakeWithdrawn {
        staker: stake.staker.clone(),
        stake_id: stake.id,
        amount: payout,
    }
    .publish(e);
    Ok(payout)
}

/// Withdraws `amount - slashed_amount` of an unlocked stake. Stakes covered by
/// the current Merkle root settle only through a proof.
pub fn withdraw(
    e: &Env,
    staker: &Address,
    stake_id: u64,
    self_stake: bool,
) -> Result<i128, Error> {
    staker.require_auth();
    let stake = load_withdrawable(e, staker, stake_id, self_stake)?;
    if merkle::current_root(e).is_some() && stake_id < merkle::root_stake_count(e) {
        return Err(Error::MerkleProofRequired);
    }
    let payout = stake.remaining();
    settle_withdrawal(e, stake, payout)
}

/// Settles a bulk slash of `slash_amount` proven under the current Merkle root,
/// then withdraws what remains. The settled amount is drawn from the
/// outstanding committed total; any excess (a root set without a round)
/// enters the slashed pool here.
pub fn withdraw_with_proof(
    e: &Env,
    staker: &Address,
    stake_id: u64,
    slash_amount: i128,
    proof: Vec<BytesN<32>>,
    self_stake: bool,
) -> Result<i128, Error> {
    staker.require_auth();
    let mut stake = load_withdrawable(e, staker, stake_id, self_stake)?;
    let root = merkle::current_root(e).ok_or(Error::MerkleRootNotSet)?;
    if slash_amount < 0 || slash_amount > stake.remaining() {
        return Err(Error::SlashExceedsStake);
    }
    let leaf = merkle::leaf_hash(e, staker, slash_amount, stake_id);
    if !merkle::verify(e, &proof, &root, leaf) {
        return Err(Error::InvalidMerkleProof);
    }

    let outstanding = merkle::outstanding(e);
    let covered = slash_amount.min(outstanding);
    let new_pool = slashed_pool_plus(e, slash_amount - covered)?;

    stake.slashed_amount += slash_amount;
    merkle::set_outstanding(e, outstanding - covered);
    set_total_slashed(e, new_pool);
    let payout = stake.remaining();
    settle_withdrawal(e, stake, payout)
}
