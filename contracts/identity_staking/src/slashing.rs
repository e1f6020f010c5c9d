//! Slash engine.
//!
//! Three protocols share one entry path ([`execute`]): the SLASHER role is
//! checked, then the strategy validates its entire batch and only afterwards
//! writes.
//!
//! * [`PercentageSlash`] - slashes a percentage of each stake's *remaining*
//!   balance, so repeated slashes compound. Consumes a one-shot proof hash.
//! * [`MemberListSlash`] - slashes caller-supplied amounts per member.
//! * [`MerkleRoundSlash`] - commits a bulk round; stakes settle lazily when
//!   they are withdrawn against the round's Merkle root. Each round's tree is
//!   a cumulative snapshot, so only the growth over the outstanding amount
//!   enters the pool.
//!
//! The first two open a release chain whose head commits to the slashed
//! members and a nonce (the proof hash itself for percentage slashes).

use soroban_sdk::{Address, BytesN, Env, Map, Vec};

use crate::access;
use crate::burn;
use crate::events::{
    MembersSlashed, MerkleRootSet, PercentageSlashed, SlashingRoundCommitted,
    SlashingRoundUpdated,
};
use crate::ledger;
use crate::merkle;
use crate::proof;
use crate::types::{CommunitySlashMember, Role, SelfSlashMember, SlashMember, SlashingRound, Stake};
use crate::{DataKey, Error, MAX_BATCH_SIZE};

pub const PERCENT_DENOMINATOR: i128 = 100;

/// A slashing protocol. `apply` runs with the caller already authorized.
pub trait SlashStrategy {
    type Outcome;

    fn apply(self, e: &Env) -> Result<Self::Outcome, Error>;
}

/// Authorizes `caller` as a slasher and runs `strategy`.
pub fn execute<S: SlashStrategy>(e: &Env, caller: &Address, strategy: S) -> Result<S::Outcome, Error> {
    access::require_any_role(e, caller, &[Role::Slasher])?;
    strategy.apply(e)
}

/// Rejects a second occurrence of the same stake id within one batch.
fn check_unique(seen: &mut Map<u64, bool>, stake_id: u64) -> Result<(), Error> {
    if seen.contains_key(stake_id) {
        return Err(Error::DuplicateStakeId);
    }
    seen.set(stake_id, true);
    Ok(())
}

/// Writes the slashed stakes and the pool, then opens a release chain.
fn commit_chain(
    e: &Env,
    stakes: &Vec<Stake>,
    members: &Vec<SlashMember>,
    nonce: &BytesN<32>,
    new_pool: i128,
) -> BytesN<32> {
    for stake in stakes.iter() {
        ledger::save_stake(e, &stake);
    }
    ledger::set_total_slashed(e, new_pool);
    let head = proof::compute_head(e, members, nonce);
    proof::open_chain(e, &head, nonce, burn::burn_epoch(e));
    head
}

/// Slash `percentage` (1..=100) of the remaining balance of every listed stake.
pub struct PercentageSlash {
    pub stake_ids: Vec<u64>,
    pub percentage: u32,
    pub proof_hash: BytesN<32>,
}

impl SlashStrategy for PercentageSlash {
    type Outcome = BytesN<32>;

    fn apply(self, e: &Env) -> Result<BytesN<32>, Error> {
        if self.stake_ids.len() > MAX_BATCH_SIZE {
            return Err(Error::BatchTooLarge);
        }
        if self.percentage == 0 || i128::from(self.percentage) > PERCENT_DENOMINATOR {
            return Err(Error::InvalidPercentage);
        }
        // The proof hash also seeds the chain nonce, so a hash already used as
        // any chain's nonce counts as consumed.
        if proof::is_proof_hash_used(e, &self.proof_hash)
            || proof::is_nonce_used(e, &self.proof_hash)
        {
            return Err(Error::SlashProofHashAlreadyUsed);
        }

        let mut seen = Map::new(e);
        let mut stakes = Vec::new(e);
        let mut members = Vec::new(e);
        let mut total: i128 = 0;
        for stake_id in self.stake_ids.iter() {
            check_unique(&mut seen, stake_id)?;
            let mut stake = ledger::load_stake(e, stake_id)?;
            let delta = stake
                .remaining()
                .checked_mul(i128::from(self.percentage))
                .ok_or(Error::ArithmeticOverflow)?
                / PERCENT_DENOMINATOR;
            stake.slashed_amount += delta;
            total = total.checked_add(delta).ok_or(Error::ArithmeticOverflow)?;
            members.push_back(SlashMember {
                staker: stake.staker.clone(),
                stakee: stake.stakee.clone(),
                stake_id,
                amount: delta,
            });
            stakes.push_back(stake);
        }
        let new_pool = ledger::slashed_pool_plus(e, total)?;

        proof::consume_proof_hash(e, &self.proof_hash);
        let head = commit_chain(e, &stakes, &members, &self.proof_hash, new_pool);
        PercentageSlashed {
            proof_hash: self.proof_hash,
            head: head.clone(),
            percentage: self.percentage,
            total,
        }
        .publish(e);
        Ok(head)
    }
}

/// Slash explicit amounts per member. Self members come first in the
/// committed member list, community members after them.
pub struct MemberListSlash {
    pub self_members: Vec<SelfSlashMember>,
    pub community_members: Vec<CommunitySlashMember>,
    pub nonce: BytesN<32>,
}

impl MemberListSlash {
    /// Slashed copy of the member's stake; the member must match the stake it names.
    fn slash_member(e: &Env, member: &SlashMember, self_stake: bool) -> Result<Stake, Error> {
        if member.amount <= 0 {
            return Err(Error::AmountMustBeGreaterThanZero);
        }
        let mut stake = ledger::load_stake(e, member.stake_id)?;
        if stake.is_self_stake() != self_stake
            || stake.staker != member.staker
            || stake.stakee != member.stakee
        {
            return Err(Error::SlashMemberMismatch);
        }
        if member.amount > stake.remaining() {
            return Err(Error::SlashExceedsStake);
        }
        stake.slashed_amount += member.amount;
        Ok(stake)
    }
}

impl SlashStrategy for MemberListSlash {
    type Outcome = BytesN<32>;

    fn apply(self, e: &Env) -> Result<BytesN<32>, Error> {
        let count = self
            .self_members
            .len()
            .checked_add(self.community_members.len())
            .ok_or(Error::BatchTooLarge)?;
        if count > MAX_BATCH_SIZE {
            return Err(Error::BatchTooLarge);
        }
        proof::ensure_fresh_nonce(e, &self.nonce)?;

        let mut members: Vec<SlashMember> = Vec::new(e);
        for m in self.self_members.iter() {
            members.push_back(m.into());
        }
        let self_count = members.len();
        for m in self.community_members.iter() {
            members.push_back(m.into());
        }

        let mut seen = Map::new(e);
        let mut stakes = Vec::new(e);
        let mut total: i128 = 0;
        for (i, member) in members.iter().enumerate() {
            check_unique(&mut seen, member.stake_id)?;
            let self_stake = (i as u32) < self_count;
            stakes.push_back(Self::slash_member(e, &member, self_stake)?);
            total = total
                .checked_add(member.amount)
                .ok_or(Error::ArithmeticOverflow)?;
        }
        let new_pool = ledger::slashed_pool_plus(e, total)?;

        let head = commit_chain(e, &stakes, &members, &self.nonce, new_pool);
        MembersSlashed {
            nonce: self.nonce,
            head: head.clone(),
            total,
        }
        .publish(e);
        Ok(head)
    }
}

/// Commit a bulk slashing round. Individual stakes are not touched.
///
/// `total_slash_amount` is the sum of the tree's leaves, including leaves
/// carried over unsettled from the previous round, and may not fall below
/// the outstanding amount.
pub struct MerkleRoundSlash {
    pub merkle_root: BytesN<32>,
    pub total_slash_amount: i128,
}

impl SlashStrategy for MerkleRoundSlash {
    type Outcome = u32;

    fn apply(self, e: &Env) -> Result<u32, Error> {
        if self.total_slash_amount <= 0 {
            return Err(Error::AmountMustBeGreaterThanZero);
        }
        let outstanding = merkle::outstanding(e);
        if self.total_slash_amount < outstanding {
            return Err(Error::MerkleTotalTooLow);
        }
        let index = slashing_round_count(e);
        let next = index.checked_add(1).ok_or(Error::ArithmeticOverflow)?;
        let new_pool = ledger::slashed_pool_plus(e, self.total_slash_amount - outstanding)?;

        let round = SlashingRound {
            merkle_root: self.merkle_root.clone(),
            total_slash_amount: self.total_slash_amount,
            timestamp: e.ledger().timestamp(),
        };
        e.storage()
            .persistent()
            .set(&DataKey::SlashingRound(index), &round);
        e.storage()
            .instance()
            .set(&DataKey::SlashingRoundCount, &next);
        ledger::set_total_slashed(e, new_pool);
        merkle::set_outstanding(e, self.total_slash_amount);
        merkle::set_current_root(e, &self.merkle_root, ledger::stake_count(e));

        SlashingRoundCommitted {
            index,
            merkle_root: self.merkle_root,
            total_slash_amount: self.total_slash_amount,
        }
        .publish(e);
        Ok(index)
    }
}

#[must_use]
pub fn slashing_round_count(e: &Env) -> u32 {
    e.storage()
        .instance()
        .get(&DataKey::SlashingRoundCount)
        .unwrap_or(0)
}

pub fn slashing_round(e: &Env, index: u32) -> Result<SlashingRound, Error> {
    e.storage()
        .persistent()
        .get(&DataKey::SlashingRound(index))
        .ok_or(Error::SlashingRoundNotFound)
}

/// Rounds below this index were swept by a burn and can no longer change.
#[must_use]
pub fn sealed_round_count(e: &Env) -> u32 {
    e.storage()
        .instance()
        .get(&DataKey::SealedRoundCount)
        .unwrap_or(0)
}

pub fn seal_rounds(e: &Env) {
    e.storage()
        .instance()
        .set(&DataKey::SealedRoundCount, &slashing_round_count(e));
}

/// Corrects the commitment of the latest round before it is burned. The pool
/// and the outstanding amount move by the difference of the totals; the
/// current root follows the correction unless it was replaced meanwhile.
pub fn update_slashing_round(
    e: &Env,
    caller: &Address,
    index: u32,
    merkle_root: BytesN<32>,
    total_slash_amount: i128,
) -> Result<(), Error> {
    access::require_any_role(e, caller, &[Role::Slasher])?;
    let mut round = slashing_round(e, index)?;
    if index < sealed_round_count(e) {
        return Err(Error::SlashingRoundAlreadyBurned);
    }
    if index + 1 != slashing_round_count(e) {
        return Err(Error::SlashingRoundSuperseded);
    }
    if total_slash_amount <= 0 {
        return Err(Error::AmountMustBeGreaterThanZero);
    }
    // Both totals are positive, so the difference cannot overflow.
    let delta = total_slash_amount - round.total_slash_amount;
    let new_outstanding = merkle::outstanding(e)
        .checked_add(delta)
        .filter(|amount| *amount >= 0)
        .ok_or(Error::MerkleTotalTooLow)?;
    let new_pool = ledger::total_slashed(e)
        .checked_add(delta)
        .ok_or(Error::ArithmeticOverflow)?;
    if new_pool < 0 {
        return Err(Error::MerkleTotalTooLow);
    }

    let follows_root = merkle::current_root(e).as_ref() == Some(&round.merkle_root);
    round.merkle_root = merkle_root.clone();
    round.total_slash_amount = total_slash_amount;
    e.storage()
        .persistent()
        .set(&DataKey::SlashingRound(index), &round);
    ledger::set_total_slashed(e, new_pool);
    merkle::set_outstanding(e, new_outstanding);
    if follows_root {
        merkle::set_current_root(e, &merkle_root, merkle::root_stake_count(e));
    }

    SlashingRoundUpdated {
        index,
        merkle_root,
        total_slash_amount,
    }
    .publish(e);
    Ok(())
}

/// Points Merkle withdrawals at `merkle_root` without committing a round.
/// Nothing enters the pool up front; slashes settled against this root beyond
/// the outstanding amount are added when they settle.
pub fn set_merkle_root(e: &Env, caller: &Address, merkle_root: BytesN<32>) -> Result<(), Error> {
    access::require_any_role(e, caller, &[Role::Slasher])?;
    merkle::set_current_root(e, &merkle_root, ledger::stake_count(e));
    MerkleRootSet { merkle_root }.publish(e);
    Ok(())
}
