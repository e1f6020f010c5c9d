//! Ledger data types: stakes, slash members, slashing rounds and roles.

use soroban_sdk::{contracttype, Address, BytesN};

/// A single stake record.
///
/// # Fields
/// * `id` - Global, monotonically increasing stake identifier (first stake is 0).
/// * `staker` - Identity that locked the funds.
/// * `stakee` - Identity the funds vouch for; equal to `staker` for self-stakes.
/// * `amount` - Funds still held by the ledger for this stake.
/// * `slashed_amount` - Portion of `amount` that has been slashed; never exceeds `amount`.
/// * `unlock_time` - Ledger timestamp from which the unslashed remainder can be withdrawn.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Stake {
    pub id: u64,
    pub staker: Address,
    pub stakee: Address,
    pub amount: i128,
    pub slashed_amount: i128,
    pub unlock_time: u64,
}

impl Stake {
    /// True for stakes the staker placed on their own identity.
    #[must_use]
    #[inline]
    pub fn is_self_stake(&self) -> bool {
        self.staker == self.stakee
    }

    /// Unslashed balance still owed to the staker.
    #[must_use]
    #[inline]
    pub fn remaining(&self) -> i128 {
        self.amount - self.slashed_amount
    }
}

/// Self-stake entry of a member-list slash.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SelfSlashMember {
    pub account: Address,
    pub stake_id: u64,
    pub amount: i128,
}

/// Community-stake entry of a member-list slash.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CommunitySlashMember {
    pub staker: Address,
    pub stakee: Address,
    pub stake_id: u64,
    pub amount: i128,
}

/// Normalized member entry. An ordered list of these plus a nonce is what a
/// proof head commits to; `amount` is the slashed balance still tracked for
/// the member in the current link of the release chain.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SlashMember {
    pub staker: Address,
    pub stakee: Address,
    pub stake_id: u64,
    pub amount: i128,
}

impl From<SelfSlashMember> for SlashMember {
    fn from(m: SelfSlashMember) -> Self {
        SlashMember {
            staker: m.account.clone(),
            stakee: m.account,
            stake_id: m.stake_id,
            amount: m.amount,
        }
    }
}

impl From<CommunitySlashMember> for SlashMember {
    fn from(m: CommunitySlashMember) -> Self {
        SlashMember {
            staker: m.staker,
            stakee: m.stakee,
            stake_id: m.stake_id,
            amount: m.amount,
        }
    }
}

/// One bulk (Merkle) slashing cycle. Index 0 is the first round.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SlashingRound {
    pub merkle_root: BytesN<32>,
    pub total_slash_amount: i128,
    pub timestamp: u64,
}

/// Capabilities checked by the role gate.
#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Role {
    /// May slash stakes, manage slashing rounds and burn.
    Slasher = 0,
    /// May release slashed funds and burn.
    Releaser = 1,
}
