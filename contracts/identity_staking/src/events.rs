//! Contract events, one per ledger state transition.

use soroban_sdk::{contractevent, Address, BytesN};

use crate::types::Role;

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Initialized {
    pub admin: Address,
    pub token: Address,
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RoleGranted {
    #[topic]
    pub account: Address,
    pub role: Role,
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RoleRevoked {
    #[topic]
    pub account: Address,
    pub role: Role,
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SelfStaked {
    #[topic]
    pub staker: Address,
    pub stake_id: u64,
    pub amount: i128,
    pub unlock_time: u64,
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CommunityStaked {
    #[topic]
    pub staker: Address,
    #[topic]
    pub stakee: Address,
    pub stake_id: u64,
    pub amount: i128,
    pub unlock_time: u64,
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StakeWithdrawn {
    #[topic]
    pub staker: Address,
    pub stake_id: u64,
    pub amount: i128,
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PercentageSlashed {
    pub proof_hash: BytesN<32>,
    pub head: BytesN<32>,
    pub percentage: u32,
    pub total: i128,
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MembersSlashed {
    pub nonce: BytesN<32>,
    pub head: BytesN<32>,
    pub total: i128,
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SlashingRoundCommitted {
    pub index: u32,
    pub merkle_root: BytesN<32>,
    pub total_slash_amount: i128,
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SlashingRoundUpdated {
    pub index: u32,
    pub merkle_root: BytesN<32>,
    pub total_slash_amount: i128,
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MerkleRootSet {
    pub merkle_root: BytesN<32>,
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SlashReleased {
    #[topic]
    pub staker: Address,
    pub stake_id: u64,
    pub amount: i128,
    pub previous_head: BytesN<32>,
    pub new_head: BytesN<32>,
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SlashedBurned {
    pub amount: i128,
    pub timestamp: u64,
}
