//! Merkle commitments for bulk slashing rounds.
//!
//! Leaves commit to `(address, slash_amount, stake_id)`. Interior nodes hash
//! the sorted pair of children, so a proof is just the list of siblings from
//! leaf to root. Leaf 0 of a round is by convention the checksum leaf
//! `(contract address, total_slash_amount, 0)`.
//!
//! Only the current root is provable. Each round's tree is a snapshot of every
//! stake that existed when it was committed, carrying the stake's whole
//! unsettled bulk slash, so a new round supersedes the previous one. The part
//! of the committed totals that is already in the slashed pool but not yet
//! settled on a stake is tracked as the *outstanding* amount.

use soroban_sdk::xdr::ToXdr;
use soroban_sdk::{Address, Bytes, BytesN, Env, Vec};

use crate::DataKey;

/// Hash of a single `(address, slash_amount, stake_id)` leaf.
#[must_use]
pub fn leaf_hash(e: &Env, account: &Address, slash_amount: i128, stake_id: u64) -> BytesN<32> {
    let mut bytes = Bytes::new(e);
    bytes.append(&account.clone().to_xdr(e));
    bytes.extend_from_array(&slash_amount.to_be_bytes());
    bytes.extend_from_array(&stake_id.to_be_bytes());
    e.crypto().keccak256(&bytes).to_bytes()
}

/// Checksum leaf placed at index 0 of every round's tree.
#[must_use]
pub fn checksum_leaf(e: &Env, total_slash_amount: i128) -> BytesN<32> {
    leaf_hash(e, &e.current_contract_address(), total_slash_amount, 0)
}

/// Parent of two nodes, independent of their order.
#[must_use]
pub fn hash_pair(e: &Env, a: &BytesN<32>, b: &BytesN<32>) -> BytesN<32> {
    let (lo, hi) = if a.to_array() <= b.to_array() {
        (a, b)
    } else {
        (b, a)
    };
    let mut bytes = Bytes::new(e);
    bytes.extend_from_array(&lo.to_array());
    bytes.extend_from_array(&hi.to_array());
    e.crypto().keccak256(&bytes).to_bytes()
}

/// True if `leaf` hashes up to `root` through `proof`.
#[must_use]
pub fn verify(e: &Env, proof: &Vec<BytesN<32>>, root: &BytesN<32>, leaf: BytesN<32>) -> bool {
    let mut node = leaf;
    for sibling in proof.iter() {
        node = hash_pair(e, &node, &sibling);
    }
    &node == root
}

/// Root that Merkle withdrawals are currently proven against.
#[must_use]
pub fn current_root(e: &Env) -> Option<BytesN<32>> {
    e.storage().instance().get(&DataKey::MerkleRoot)
}

/// Makes `root` current for stakes with an id below `stake_count`.
pub fn set_current_root(e: &Env, root: &BytesN<32>, stake_count: u64) {
    e.storage().instance().set(&DataKey::MerkleRoot, root);
    e.storage()
        .instance()
        .set(&DataKey::MerkleRootStakeCount, &stake_count);
}

/// Stakes with an id at or above this were created after the current root and
/// withdraw without a proof.
#[must_use]
pub fn root_stake_count(e: &Env) -> u64 {
    e.storage()
        .instance()
        .get(&DataKey::MerkleRootStakeCount)
        .unwrap_or(0)
}

#[must_use]
pub fn outstanding(e: &Env) -> i128 {
    e.storage()
        .instance()
        .get(&DataKey::MerkleOutstanding)
        .unwrap_or(0)
}

pub fn set_outstanding(e: &Env, amount: i128) {
    e.storage()
        .instance()
        .set(&DataKey::MerkleOutstanding, &amount);
}
