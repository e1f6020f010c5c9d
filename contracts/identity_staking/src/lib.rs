//! # Identity Staking Contract
//!
//! Participants lock tokens on their own identity (self-stake) or vouch for
//! another identity (community stake). Slashers reduce stakes under a proof,
//! releasers hand part of the slashed funds back along an authenticated hash
//! chain, and whatever stays slashed is burned at most once per burn round.

#![no_std]

use soroban_sdk::{contract, contracterror, contractimpl, contracttype, Address, BytesN, Env, Vec};

pub mod access;
pub mod burn;
pub mod events;
pub mod ledger;
pub mod merkle;
pub mod proof;
pub mod release;
pub mod slashing;
pub mod types;

pub use types::{CommunitySlashMember, Role, SelfSlashMember, SlashMember, SlashingRound, Stake};

use release::ReleaseRequest;
use slashing::{MemberListSlash, MerkleRoundSlash, PercentageSlash};

/// Upper bound on entries processed by one slash or release call.
pub const MAX_BATCH_SIZE: u32 = 200;

#[contracttype]
#[derive(Clone)]
pub enum DataKey {
    Admin,
    Token,
    /// (account, role) -> true while granted.
    Role(Address, Role),
    /// Number of stakes ever created; also the next stake id.
    StakeCount,
    Stake(u64),
    SelfStakeIds(Address),
    CommunityStakeIds(Address, Address),
    /// Slashed funds not yet released or burned.
    TotalSlashed,
    /// Proof hashes consumed by percentage slashes.
    UsedProofHash(BytesN<32>),
    /// Valid release chain head -> burn epoch it was opened in.
    ProofHead(BytesN<32>),
    UsedNonce(BytesN<32>),
    MerkleRoot,
    /// Stake count when the current root was set; younger stakes are not in its tree.
    MerkleRootStakeCount,
    /// Committed round totals already in the pool but not yet settled on a stake.
    MerkleOutstanding,
    SlashingRound(u32),
    SlashingRoundCount,
    SealedRoundCount,
    LastBurnTimestamp,
    BurnEpoch,
}

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum Error {
    AlreadyInitialized = 1,
    NotInitialized = 2,
    Unauthorized = 3,
    InvalidLockTime = 4,
    AmountMustBeGreaterThanZero = 5,
    CannotStakeOnSelf = 6,
    StakeIsLocked = 7,
    StakeNotFound = 8,
    NotStakeOwner = 9,
    NothingToWithdraw = 10,
    SlashProofHashAlreadyUsed = 11,
    SlashProofHashNotValid = 12,
    SlashProofHashNotFound = 13,
    FundsNotAvailableToRelease = 14,
    MinimumBurnRoundDurationNotMet = 15,
    InvalidPercentage = 16,
    SlashExceedsStake = 17,
    SlashMemberMismatch = 18,
    DuplicateStakeId = 19,
    InvalidMemberIndex = 20,
    NonceAlreadyUsed = 21,
    BatchTooLarge = 22,
    InvalidMerkleProof = 23,
    MerkleRootNotSet = 24,
    MerkleProofRequired = 25,
    SlashingRoundNotFound = 26,
    SlashingRoundAlreadyBurned = 27,
    ArithmeticOverflow = 28,
    SlashingRoundSuperseded = 29,
    MerkleTotalTooLow = 30,
}

#[contract]
pub struct IdentityStaking;

#[contractimpl]
impl IdentityStaking {
    /// Initialize the ledger with its admin and staking token. One-shot.
    pub fn initialize(e: Env, admin: Address, token: Address) -> Result<(), Error> {
        if e.storage().instance().has(&DataKey::Admin) {
            return Err(Error::AlreadyInitialized);
        }
        admin.require_auth();
        e.storage().instance().set(&DataKey::Admin, &admin);
        e.storage().instance().set(&DataKey::Token, &token);
        events::Initialized { admin, token }.publish(&e);
        Ok(())
    }

    pub fn grant_role(e: Env, role: Role, account: Address) -> Result<(), Error> {
        access::grant_role(&e, role, &account)
    }

    pub fn revoke_role(e: Env, role: Role, account: Address) -> Result<(), Error> {
        access::revoke_role(&e, role, &account)
    }

    pub fn has_role(e: Env, account: Address, role: Role) -> bool {
        access::has_role(&e, &account, role)
    }

    // ---------------------------------------------------------------------
    // Staking
    // ---------------------------------------------------------------------

    /// Lock `amount` on the staker's own identity for `unlock_duration` seconds.
    /// Returns the new stake id.
    pub fn self_stake(e: Env, staker: Address, amount: i128, unlock_duration: u64) -> Result<u64, Error> {
        ledger::self_stake(&e, &staker, amount, unlock_duration)
    }

    /// Lock `amount` vouching for `stakee`. Staking on oneself this way is rejected.
    pub fn community_stake(
        e: Env,
        staker: Address,
        stakee: Address,
        amount: i128,
        unlock_duration: u64,
    ) -> Result<u64, Error> {
        ledger::community_stake(&e, &staker, &stakee, amount, unlock_duration)
    }

    /// Withdraw the unslashed remainder of an unlocked self-stake. Returns the payout.
    pub fn withdraw_self_stake(e: Env, staker: Address, stake_id: u64) -> Result<i128, Error> {
        ledger::withdraw(&e, &staker, stake_id, true)
    }

    /// Withdraw the unslashed remainder of an unlocked community stake.
    pub fn withdraw_community_stake(e: Env, staker: Address, stake_id: u64) -> Result<i128, Error> {
        ledger::withdraw(&e, &staker, stake_id, false)
    }

    /// Settle a bulk slash proven under the current Merkle root, then withdraw.
    pub fn withdraw_self_stake_with_proof(
        e: Env,
        staker: Address,
        stake_id: u64,
        slash_amount: i128,
        proof: Vec<BytesN<32>>,
    ) -> Result<i128, Error> {
        ledger::withdraw_with_proof(&e, &staker, stake_id, slash_amount, proof, true)
    }

    pub fn withdraw_community_with_proof(
        e: Env,
        staker: Address,
        stake_id: u64,
        slash_amount: i128,
        proof: Vec<BytesN<32>>,
    ) -> Result<i128, Error> {
        ledger::withdraw_with_proof(&e, &staker, stake_id, slash_amount, proof, false)
    }

    // ---------------------------------------------------------------------
    // Slashing (SLASHER)
    // ---------------------------------------------------------------------

    /// Slash `percentage` of the remaining balance of each stake under a
    /// single-use `proof_hash`. Returns the release chain head.
    pub fn slash(
        e: Env,
        caller: Address,
        stake_ids: Vec<u64>,
        percentage: u32,
        proof_hash: BytesN<32>,
    ) -> Result<BytesN<32>, Error> {
        slashing::execute(
            &e,
            &caller,
            PercentageSlash {
                stake_ids,
                percentage,
                proof_hash,
            },
        )
    }

    /// Slash explicit per-member amounts. Returns the release chain head
    /// committing to the members (self first, then community) and `nonce`.
    pub fn slash_members(
        e: Env,
        caller: Address,
        self_members: Vec<SelfSlashMember>,
        community_members: Vec<CommunitySlashMember>,
        nonce: BytesN<32>,
    ) -> Result<BytesN<32>, Error> {
        slashing::execute(
            &e,
            &caller,
            MemberListSlash {
                self_members,
                community_members,
                nonce,
            },
        )
    }

    /// Commit a bulk slashing round and make its root current. Returns the round index.
    pub fn slash_merkle(
        e: Env,
        caller: Address,
        merkle_root: BytesN<32>,
        total_slash_amount: i128,
    ) -> Result<u32, Error> {
        slashing::execute(
            &e,
            &caller,
            MerkleRoundSlash {
                merkle_root,
                total_slash_amount,
            },
        )
    }

    pub fn update_slashing_round(
        e: Env,
        caller: Address,
        index: u32,
        merkle_root: BytesN<32>,
        total_slash_amount: i128,
    ) -> Result<(), Error> {
        slashing::update_slashing_round(&e, &caller, index, merkle_root, total_slash_amount)
    }

    pub fn set_merkle_root(e: Env, caller: Address, merkle_root: BytesN<32>) -> Result<(), Error> {
        slashing::set_merkle_root(&e, &caller, merkle_root)
    }

    // ---------------------------------------------------------------------
    // Release (RELEASER) and burn (SLASHER or RELEASER)
    // ---------------------------------------------------------------------

    /// Release `amount` of `members[index]`'s slashed funds back to its staker.
    /// Returns the new chain head, committed with `new_nonce`.
    pub fn release(
        e: Env,
        caller: Address,
        members: Vec<SlashMember>,
        index: u32,
        amount: i128,
        current_proof_hash: BytesN<32>,
        current_nonce: BytesN<32>,
        new_nonce: BytesN<32>,
    ) -> Result<BytesN<32>, Error> {
        release::release(
            &e,
            &caller,
            ReleaseRequest {
                members,
                index,
                amount,
                current_proof_hash,
                current_nonce,
                new_nonce,
            },
        )
    }

    /// Burn the whole slashed pool. Returns the burned amount.
    pub fn burn(e: Env, caller: Address) -> Result<i128, Error> {
        burn::burn(&e, &caller)
    }

    // ---------------------------------------------------------------------
    // Queries
    // ---------------------------------------------------------------------

    pub fn get_admin(e: Env) -> Result<Address, Error> {
        access::get_admin(&e)
    }

    pub fn get_token(e: Env) -> Result<Address, Error> {
        e.storage()
            .instance()
            .get(&DataKey::Token)
            .ok_or(Error::NotInitialized)
    }

    pub fn get_stake(e: Env, stake_id: u64) -> Result<Stake, Error> {
        ledger::load_stake(&e, stake_id)
    }

    pub fn stake_count(e: Env) -> u64 {
        ledger::stake_count(&e)
    }

    pub fn self_stake_id(e: Env, staker: Address, index: u32) -> Result<u64, Error> {
        ledger::self_stake_id(&e, &staker, index)
    }

    pub fn self_stake_count(e: Env, staker: Address) -> u32 {
        ledger::self_stake_count(&e, &staker)
    }

    pub fn community_stake_id(e: Env, staker: Address, stakee: Address, index: u32) -> Result<u64, Error> {
        ledger::community_stake_id(&e, &staker, &stakee, index)
    }

    pub fn community_stake_count(e: Env, staker: Address, stakee: Address) -> u32 {
        ledger::community_stake_count(&e, &staker, &stakee)
    }

    /// Slashed funds not yet released or burned.
    pub fn total_slashed(e: Env) -> i128 {
        ledger::total_slashed(&e)
    }

    pub fn is_proof_hash_used(e: Env, proof_hash: BytesN<32>) -> bool {
        proof::is_proof_hash_used(&e, &proof_hash)
    }

    pub fn is_proof_head_valid(e: Env, head: BytesN<32>) -> bool {
        proof::is_head_valid(&e, &head)
    }

    pub fn is_nonce_used(e: Env, nonce: BytesN<32>) -> bool {
        proof::is_nonce_used(&e, &nonce)
    }

    pub fn merkle_root(e: Env) -> Option<BytesN<32>> {
        merkle::current_root(&e)
    }

    /// Committed Merkle slash that no stake has settled yet.
    pub fn merkle_outstanding(e: Env) -> i128 {
        merkle::outstanding(&e)
    }

    pub fn slashing_round(e: Env, index: u32) -> Result<SlashingRound, Error> {
        slashing::slashing_round(&e, index)
    }

    pub fn slashing_round_count(e: Env) -> u32 {
        slashing::slashing_round_count(&e)
    }

    pub fn last_burn_timestamp(e: Env) -> Option<u64> {
        burn::last_burn_timestamp(&e)
    }
}

#[cfg(test)]
mod test_helpers;

#[cfg(test)]
mod test_release;
